//! `cellflow-vehicle` — the per-vehicle state machine and movement rule.
//!
//! # Lifecycle
//!
//! ```text
//! New ──set_od──▶ OdAssigned ──set_path──▶ PathAssigned ──buffer_in──▶ Buffered
//!                                                                        │
//!                              enter_network (requires FIFO activation)   │
//!                                                                        ▼
//!            Completed ◀──advance reaching an empty residual path── OnRoad
//!                │
//!                └─reset_for_next_trip─▶ New          (closed vehicles only)
//! ```
//!
//! # Movement
//!
//! [`Vehicle::advance`] applies the Nagel–Schreckenberg rule once per tick:
//! accelerate, cap to the admissible gap ahead (with a stochastic yield at
//! intersections), randomly slow, then commit the move through the target
//! cell's own capacity check.  See the method documentation for the exact
//! retry and completion semantics.

pub mod error;
pub mod trace;
pub mod vehicle;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{VehicleError, VehicleResult};
pub use trace::{TraceLog, TracePoint};
pub use vehicle::{PathNode, Vehicle, VehicleState};
