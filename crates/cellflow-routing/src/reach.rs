//! Hop-bounded reachability and destination sampling.

use std::collections::VecDeque;

use cellflow_core::{CellId, SimRng};
use cellflow_net::Network;

use crate::distance::TripDistancePolicy;

/// All cells whose BFS hop distance from `origin` lies in `[min, max]`,
/// excluding the origin itself.
///
/// The search stops expanding past `max`, so tight bounds stay cheap even on
/// large networks.
pub fn nodes_within(net: &Network, origin: CellId, min: usize, max: usize) -> Vec<CellId> {
    let mut dist = vec![u32::MAX; net.cell_count()];
    let mut queue = VecDeque::new();
    let mut found = Vec::new();

    dist[origin.index()] = 0;
    queue.push_back(origin);
    while let Some(u) = queue.pop_front() {
        let d = dist[u.index()] as usize;
        if d >= max {
            continue;
        }
        for &next in net.successors(u) {
            if dist[next.index()] == u32::MAX {
                dist[next.index()] = d as u32 + 1;
                if d + 1 >= min && next != origin {
                    found.push(next);
                }
                queue.push_back(next);
            }
        }
    }
    found
}

/// The destination oracle for trip generation.
///
/// Draws a distance band from its [`TripDistancePolicy`] and picks a uniform
/// destination among the cells inside the band; with the limit disabled it
/// picks uniformly among all cells other than the origin.
pub struct TripSampler {
    policy: TripDistancePolicy,
}

impl TripSampler {
    pub fn new(policy: TripDistancePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TripDistancePolicy {
        &self.policy
    }

    /// Pick a destination for a trip starting at `origin`.
    ///
    /// Returns `None` when no cell satisfies the sampled bound — the caller
    /// drops the trip.
    pub fn sample_destination(
        &self,
        net: &Network,
        origin: CellId,
        rng: &mut SimRng,
    ) -> Option<CellId> {
        if !self.policy.enable_limit {
            // Uniform over all cells except the origin.
            let n = net.cell_count();
            if n < 2 {
                return None;
            }
            let mut idx = rng.index(n - 1);
            if idx >= origin.index() {
                idx += 1;
            }
            return Some(CellId(idx as u32));
        }

        let (min, max) = self.policy.sample_range(rng);
        let candidates = nodes_within(net, origin, min, max);
        rng.pick(&candidates).copied()
    }
}
