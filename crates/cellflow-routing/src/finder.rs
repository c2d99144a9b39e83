//! The pluggable path-finder seam.
//!
//! The scheduler computes paths only from its sequential phases, so finders
//! receive the scheduler's `SimRng` explicitly; none keep internal state.

use cellflow_core::{CellId, SimRng};
use cellflow_net::Network;

use crate::error::RoutingResult;
use crate::kshortest::k_shortest_paths;
use crate::path::{random_shortest_path, shortest_path};

/// How [`KShortestPathFinder`] picks among its k candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSelection {
    /// Uniform draw.
    Random,
    /// Length-weighted roulette: `w_i = exp(-factor · len_i / len_max)`, so
    /// shorter paths win more often and `factor` sharpens the preference.
    Weighted,
}

/// Pluggable route computation.
///
/// Implementations must be `Send + Sync`; the simulation holds one behind a
/// `Box<dyn PathFinder>` chosen at startup from configuration.
pub trait PathFinder: Send + Sync {
    /// Compute a cell path from `origin` to `destination`, inclusive of both.
    fn find_path(
        &self,
        net: &Network,
        origin: CellId,
        destination: CellId,
        rng: &mut SimRng,
    ) -> RoutingResult<Vec<CellId>>;
}

// ── Shortest ──────────────────────────────────────────────────────────────────

/// Deterministic BFS shortest path.
pub struct ShortestPathFinder;

impl PathFinder for ShortestPathFinder {
    fn find_path(
        &self,
        net: &Network,
        origin: CellId,
        destination: CellId,
        _rng: &mut SimRng,
    ) -> RoutingResult<Vec<CellId>> {
        shortest_path(net, origin, destination)
    }
}

// ── Random ────────────────────────────────────────────────────────────────────

/// Uniform draw from the shortest-path set.
pub struct RandomPathFinder;

impl PathFinder for RandomPathFinder {
    fn find_path(
        &self,
        net: &Network,
        origin: CellId,
        destination: CellId,
        rng: &mut SimRng,
    ) -> RoutingResult<Vec<CellId>> {
        random_shortest_path(net, origin, destination, rng)
    }
}

// ── K-shortest ────────────────────────────────────────────────────────────────

/// Yen's k shortest paths with a configurable selection strategy.
pub struct KShortestPathFinder {
    pub k: usize,
    pub selection: PathSelection,
    pub length_weight_factor: f64,
}

impl PathFinder for KShortestPathFinder {
    fn find_path(
        &self,
        net: &Network,
        origin: CellId,
        destination: CellId,
        rng: &mut SimRng,
    ) -> RoutingResult<Vec<CellId>> {
        let mut paths = k_shortest_paths(net, origin, destination, self.k)?;
        if paths.len() == 1 {
            return Ok(paths.pop().expect("one path"));
        }

        let idx = match self.selection {
            PathSelection::Random => rng.index(paths.len()),
            PathSelection::Weighted => {
                let len_max = paths
                    .iter()
                    .map(|p| p.len())
                    .max()
                    .expect("non-empty path set") as f64;
                let weights: Vec<f64> = paths
                    .iter()
                    .map(|p| (-self.length_weight_factor * p.len() as f64 / len_max).exp())
                    .collect();
                roulette(&weights, rng)
            }
        };
        Ok(paths.swap_remove(idx))
    }
}

/// Index drawn proportionally to `weights` (all positive).
fn roulette(weights: &[f64], rng: &mut SimRng) -> usize {
    let total: f64 = weights.iter().sum();
    let mut draw = rng.unit() * total;
    for (i, w) in weights.iter().enumerate() {
        draw -= w;
        if draw <= 0.0 {
            return i;
        }
    }
    weights.len() - 1
}
