//! The recorder seam: record types and the sink trait.
//!
//! The engine emits three record streams.  Sinks buffer and persist them
//! out-of-band; sink failures must never propagate back into the engine, so
//! all trait methods are infallible here and implementations stash their
//! first error for inspection after the run.

use cellflow_core::Tick;

/// Per-tick aggregate state of the whole system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemRecord {
    pub time_step: u64,
    pub generated: i64,
    pub active: i64,
    pub waiting: i64,
    pub completed: i64,
    pub average_speed: f64,
    pub density: f64,
}

/// One completed journey.
///
/// The sink assigns the monotone trip index when the record is written, so
/// record construction stays free of sink state.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRecord {
    pub vehicle_id: u64,
    pub acceleration: u32,
    pub slowing_prob: f64,
    pub origin: u32,
    pub destination: u32,
    pub in_time: u64,
    pub out_time: u64,
    pub tag: f64,
    pub closed: bool,
    pub path_length: usize,
    /// The expanded cell route, origin through destination.
    pub path_cells: Vec<u32>,
}

/// One sampled trajectory point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub vehicle_id: u64,
    pub time: u64,
    pub cell: u32,
}

/// Sink for the three record streams.
///
/// Methods take `&self` so one recorder can be shared with an out-of-band
/// flusher; implementations serialize internally.  All methods default to
/// no-ops.
pub trait Recorder {
    /// One system record per tick.
    fn record_system(&self, _record: &SystemRecord) {}

    /// One vehicle record per completed journey.
    fn record_vehicle(&self, _record: &VehicleRecord) {}

    /// The sampled trajectory of one completed journey.
    fn record_trace(&self, _points: &[TraceRecord]) {}

    /// Called at the configured flush interval and once at run end; sinks
    /// may persist buffered records here (possibly asynchronously).
    fn flush(&self, _now: Tick) {}

    /// Called exactly once after the final tick; sinks must persist
    /// everything before returning.
    fn finish(&self) {}
}

/// A [`Recorder`] that drops everything.  Useful for tests and benchmarks.
pub struct NoopRecorder;

impl Recorder for NoopRecorder {}
