//! `cellflow-fleet` — the vehicle registry.
//!
//! Tracks every live vehicle behind an `Arc<Mutex<Vehicle>>` handle and
//! partitions the population into three identity-keyed sets mirroring the
//! lifecycle: `waiting` (buffered), `active` (on the network) and
//! `completed` (arrived).  Four counters are readable atomically; the
//! `generated` counter is monotone, the other three are gauges equal to
//! their set sizes.
//!
//! Set transitions happen only at phase boundaries under the scheduler's
//! control, so counters always match set membership whenever a phase is not
//! in flight.

pub mod registry;

#[cfg(test)]
mod tests;

pub use registry::{Fleet, FleetCounts, SharedVehicle};
