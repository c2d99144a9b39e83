//! Mile-based trip-distance sampling.
//!
//! Trip lengths follow an empirical banded distribution: a draw picks a
//! distance band (short through extreme) from cumulative probabilities, and
//! the band's mile bounds convert to cell counts at 7.5 m per cell.

use cellflow_core::SimRng;

/// Miles to kilometres.
const MILE_TO_KM: f64 = 1.609_34;

/// Physical length of one cell in metres.
const CELL_LENGTH_M: f64 = 7.5;

/// Band boundaries in miles.
const DIST_VERY_SHORT: f64 = 1.01;
const DIST_SHORT: f64 = 3.85;
const DIST_MEDIUM: f64 = 7.65;
const DIST_LONG: f64 = 11.59;
const DIST_VERY_LONG: f64 = 19.68;
const DIST_EXTREME: f64 = 30.0;

/// Convert a distance in miles into a whole number of cells.
pub fn miles_to_cells(miles: f64) -> usize {
    (miles * MILE_TO_KM * 1000.0 / CELL_LENGTH_M).round() as usize
}

/// Banded trip-distance distribution with cumulative probabilities.
///
/// The five probabilities are cumulative cut points; draws are normalized
/// within the extreme cap so the bands partition the unit interval.
#[derive(Debug, Clone)]
pub struct TripDistancePolicy {
    /// When false, destinations are drawn uniformly with no distance bound.
    pub enable_limit: bool,
    pub prob_short: f64,
    pub prob_medium: f64,
    pub prob_long: f64,
    pub prob_very_long: f64,
    pub prob_extreme: f64,
    /// Scales the lower bound of the sampled band.
    pub min_dist_multiplier: f64,
    /// Scales the upper bound of the sampled band.
    pub max_dist_multiplier: f64,
}

impl Default for TripDistancePolicy {
    fn default() -> Self {
        Self {
            enable_limit: true,
            prob_short: 0.51,
            prob_medium: 0.71,
            prob_long: 0.81,
            prob_very_long: 0.92,
            prob_extreme: 0.95,
            min_dist_multiplier: 1.0,
            max_dist_multiplier: 1.0,
        }
    }
}

impl TripDistancePolicy {
    /// Sample a `[min, max]` trip length bound in cells.
    ///
    /// With the limit disabled the range is effectively unbounded.
    pub fn sample_range(&self, rng: &mut SimRng) -> (usize, usize) {
        if !self.enable_limit {
            return (1, usize::MAX);
        }

        // Normalize the draw within the extreme cap so the five bands
        // partition [0, 1).
        let dice = rng.unit() / self.prob_extreme;

        let (min_miles, max_miles) = if dice <= self.prob_short / self.prob_extreme {
            (DIST_VERY_SHORT, DIST_SHORT)
        } else if dice <= self.prob_medium / self.prob_extreme {
            (DIST_SHORT, DIST_MEDIUM)
        } else if dice <= self.prob_long / self.prob_extreme {
            (DIST_MEDIUM, DIST_LONG)
        } else if dice <= self.prob_very_long / self.prob_extreme {
            (DIST_LONG, DIST_VERY_LONG)
        } else {
            (DIST_VERY_LONG, DIST_EXTREME)
        };

        (
            miles_to_cells(min_miles * self.min_dist_multiplier),
            miles_to_cells(max_miles * self.max_dist_multiplier),
        )
    }
}
