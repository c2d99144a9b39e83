//! `cellflow-sim` — the per-tick scheduler.
//!
//! # Tick protocol
//!
//! ```text
//! for each tick t:
//!   (day start)  refresh the working demand curve; apply scheduled
//!                traffic-light interval changes
//!   P1 Reclaim   emit records for completed vehicles; recycle closed ones
//!                with a fresh O/D, drop open ones from the registry
//!   P2 Lights    advance every traffic light counter by one
//!   P3 Generate  inject demand-driven open vehicles into origin buffers
//!   P4 Promote   FIFO-admit buffered vehicles onto the network  (parallel)
//!   P5 Move      advance every active vehicle by one N-S step   (parallel)
//!   P6 Aggregate emit the system record; log at intervals
//! ```
//!
//! Phases are strictly ordered; each parallel phase joins before the next
//! phase starts.  Only P4 and P5 fan out, on a dedicated Rayon pool sized by
//! [`SimParams::num_threads`]; `movement.serial` degrades P5 to a
//! single-threaded sweep for bit-reproducible runs.

pub mod builder;
pub mod error;
pub mod params;
pub mod recorder;
pub mod sim;
pub mod state;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use builder::SimulationBuilder;
pub use error::{SimError, SimResult};
pub use params::{LightChange, SimParams};
pub use recorder::{NoopRecorder, Recorder, SystemRecord, TraceRecord, VehicleRecord};
pub use sim::Simulation;
pub use state::TickStats;
