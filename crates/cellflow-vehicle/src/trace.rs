//! Per-vehicle trajectory sampling.
//!
//! One policy: the origin is always recorded at `in_time`, the final
//! destination at `out_time`, and interior points whenever at least
//! `interval` ticks have passed since the last recorded point.  Recording is
//! O(1) per movement commit.  An interval of zero disables the trace
//! entirely.

use cellflow_core::{CellId, Tick};

/// One sampled trajectory point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracePoint {
    pub time: Tick,
    pub cell: CellId,
}

/// Append-only trajectory log for a single journey.
///
/// Points are appended in non-decreasing time order and at most one point is
/// recorded per tick, so `(time, cell)` pairs are unique.
#[derive(Debug, Default)]
pub struct TraceLog {
    points: Vec<TracePoint>,
    last_recorded: Option<Tick>,
    interval: u64,
}

impl TraceLog {
    /// A log sampling every `interval` ticks; `0` disables recording.
    pub fn new(interval: u64) -> Self {
        Self {
            points: Vec::new(),
            last_recorded: None,
            interval,
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.interval > 0
    }

    #[inline]
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Record an endpoint (origin or destination).  Always recorded when the
    /// log is enabled, regardless of the sampling interval.
    pub fn record_endpoint(&mut self, time: Tick, cell: CellId) {
        if !self.is_enabled() {
            return;
        }
        self.points.push(TracePoint { time, cell });
        self.last_recorded = Some(time);
    }

    /// Record an interior point if the sampling interval has elapsed.
    pub fn record_if_due(&mut self, time: Tick, cell: CellId) {
        if !self.is_enabled() {
            return;
        }
        let due = match self.last_recorded {
            None => true,
            Some(last) => time.since(last) >= self.interval,
        };
        if due {
            self.points.push(TracePoint { time, cell });
            self.last_recorded = Some(time);
        }
    }

    /// The sampled points in recording order.
    #[inline]
    pub fn points(&self) -> &[TracePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Wipe the log for a new journey (closed-vehicle recycling).
    pub fn clear(&mut self) {
        self.points.clear();
        self.last_recorded = None;
    }
}
