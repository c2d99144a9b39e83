//! Scheduler-level parameters.

use crate::error::{SimError, SimResult};

/// A scheduled traffic-light interval change, applied once at the first tick
/// of `day`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightChange {
    /// 1-based simulated day.
    pub day: u64,
    /// Positive scale factor for period, green window and counter.
    pub multiplier: f64,
}

/// Everything the scheduler needs to know about a run.
///
/// Built by the application from its configuration file and validated once
/// at startup.
#[derive(Debug, Clone)]
pub struct SimParams {
    /// Ticks per simulated day.
    pub steps_per_day: u64,
    /// Number of simulated days.
    pub sim_days: u64,
    /// Master RNG seed; the same seed reproduces the same run.
    pub seed: u64,
    /// Worker threads for the parallel phases.  `None` uses all logical
    /// cores.
    pub num_threads: Option<usize>,

    /// Closed-loop vehicles seeded before the first tick.
    pub num_closed: usize,
    /// Trace sampling interval in ticks; 0 disables trajectory recording.
    pub trace_interval: u64,

    /// Demand curve multiplier (`A` in the daily adjustment).
    pub demand_multiplier: f64,
    /// Demand curve offset (`B` in the daily adjustment).
    pub demand_fixed: f64,
    /// Daily shared noise amplitude, in [0, 1].
    pub day_noise: f64,
    /// Per-tick noise amplitude, in [0, 1].
    pub tick_noise: f64,

    /// Scheduled light interval changes.
    pub light_changes: Vec<LightChange>,

    /// Run the movement phase single-threaded for bit-reproducible runs.
    pub serial_movement: bool,

    /// Ticks between human log lines.
    pub log_interval: u64,
    /// Ticks between recorder flushes.
    pub flush_interval: u64,
}

impl SimParams {
    /// Validate all parameter domains.  Violations abort the run at startup.
    pub fn validate(&self) -> SimResult<()> {
        if self.steps_per_day == 0 {
            return Err(SimError::Config("steps_per_day must be positive".into()));
        }
        if self.sim_days == 0 {
            return Err(SimError::Config("sim_days must be positive".into()));
        }
        if self.log_interval == 0 {
            return Err(SimError::Config("log_interval must be positive".into()));
        }
        if self.flush_interval == 0 {
            return Err(SimError::Config("flush_interval must be positive".into()));
        }
        for (name, noise) in [("day_noise", self.day_noise), ("tick_noise", self.tick_noise)] {
            if !(0.0..=1.0).contains(&noise) {
                return Err(SimError::Config(format!("{name} must be within [0, 1]")));
            }
        }
        if self.demand_multiplier <= 0.0 {
            return Err(SimError::Config("demand_multiplier must be positive".into()));
        }
        for change in &self.light_changes {
            if change.day == 0 {
                return Err(SimError::Config("light change day must be at least 1".into()));
            }
            if change.multiplier <= 0.0 {
                return Err(SimError::Config(
                    "light change multiplier must be positive".into(),
                ));
            }
        }
        Ok(())
    }

    /// Total ticks in the run.
    pub fn total_ticks(&self) -> u64 {
        self.steps_per_day * self.sim_days
    }
}

impl Default for SimParams {
    /// A small deterministic configuration suitable for tests.
    fn default() -> Self {
        Self {
            steps_per_day: 100,
            sim_days: 1,
            seed: 42,
            num_threads: Some(2),
            num_closed: 0,
            trace_interval: 0,
            demand_multiplier: 1.0,
            demand_fixed: 0.0,
            day_noise: 0.0,
            tick_noise: 0.0,
            light_changes: Vec::new(),
            serial_movement: true,
            // Large intervals keep test runs quiet.
            log_interval: 1 << 40,
            flush_interval: 1 << 40,
        }
    }
}
