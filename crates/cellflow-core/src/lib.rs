//! `cellflow-core` — foundational types for the cellflow traffic simulator.
//!
//! This crate is a dependency of every other `cellflow-*` crate.  It
//! intentionally has no `cellflow-*` dependencies and only one external one
//! (`rand`).
//!
//! # What lives here
//!
//! | Module   | Contents                                          |
//! |----------|---------------------------------------------------|
//! | [`ids`]  | `CellId`, `LinkId`, `VehicleId`                   |
//! | [`time`] | `Tick`, `DayClock`                                |
//! | [`rng`]  | `VehicleRng` (per-vehicle), `SimRng` (scheduler)  |

pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use ids::{CellId, LinkId, VehicleId};
pub use rng::{SimRng, VehicleRng};
pub use time::{DayClock, Tick};
