//! The daily demand curve and its per-tick draw.

use cellflow_core::SimRng;
use log::warn;

/// One real-valued demand entry per time-of-day step.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandCurve {
    values: Vec<f64>,
}

impl DemandCurve {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Demand value at `time_of_day`, clamped into range.
    ///
    /// A curve shorter than the configured day length is a configuration
    /// smell but not fatal; the clamp keeps the run going on the last entry.
    fn value_at(&self, time_of_day: usize) -> f64 {
        if time_of_day >= self.values.len() {
            warn!(
                "time of day {time_of_day} outside demand curve of length {}",
                self.values.len()
            );
            return *self.values.last().expect("non-empty curve");
        }
        self.values[time_of_day]
    }

    /// Derive the working curve for a new day:
    /// `out[i] = max(0, (raw[i] · multiplier + fixed) · (1 + U(-noise, +noise)))`.
    ///
    /// The noise factor is drawn once and shared across all time-of-day
    /// indices, modelling day-to-day variation rather than per-slot jitter.
    pub fn adjusted(
        &self,
        multiplier: f64,
        fixed: f64,
        day_noise: f64,
        rng: &mut SimRng,
    ) -> DemandCurve {
        let day_noise = clamp_noise(day_noise);
        let factor = 1.0 + (rng.unit() * 2.0 * day_noise - day_noise);
        let values = self
            .values
            .iter()
            .map(|&raw| ((raw * multiplier + fixed) * factor).max(0.0))
            .collect();
        DemandCurve { values }
    }

    /// Number of vehicles to inject this tick.
    ///
    /// `base = value(t) · (1 + U(-noise, +noise))` clamped to ≥ 0; the count
    /// is `floor(base)` plus a Bernoulli draw on the fractional part.
    pub fn generate_count(&self, time_of_day: usize, noise: f64, rng: &mut SimRng) -> usize {
        if self.values.is_empty() {
            return 0;
        }
        let noise = clamp_noise(noise);
        let factor = 1.0 + (rng.unit() * 2.0 * noise - noise);
        let base = (self.value_at(time_of_day) * factor).max(0.0);

        let whole = base.floor();
        let extra = if rng.chance(base - whole) { 1 } else { 0 };
        whole as usize + extra
    }
}

fn clamp_noise(noise: f64) -> f64 {
    if !(0.0..=1.0).contains(&noise) {
        warn!("noise {noise} outside [0, 1], clamping");
        noise.clamp(0.0, 1.0)
    } else {
        noise
    }
}
