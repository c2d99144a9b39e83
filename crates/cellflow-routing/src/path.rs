//! BFS shortest paths over the unit-cost cell graph.

use std::collections::VecDeque;

use cellflow_core::{CellId, SimRng};
use cellflow_net::Network;

use crate::error::{RoutingError, RoutingResult};

/// Distance (in edges) from every cell to `target`, following edges
/// backwards.  Unreachable cells get `u32::MAX`.
///
/// This is the shared substrate for both the deterministic and the
/// randomized shortest-path walks.
pub(crate) fn distances_to(net: &Network, target: CellId) -> Vec<u32> {
    let mut dist = vec![u32::MAX; net.cell_count()];
    let mut queue = VecDeque::new();
    dist[target.index()] = 0;
    queue.push_back(target);
    while let Some(u) = queue.pop_front() {
        let next_dist = dist[u.index()] + 1;
        for &prev in net.predecessors(u) {
            if dist[prev.index()] == u32::MAX {
                dist[prev.index()] = next_dist;
                queue.push_back(prev);
            }
        }
    }
    dist
}

/// The deterministic BFS shortest path from `origin` to `destination`,
/// inclusive of both endpoints.  Ties break toward the lowest cell id.
pub fn shortest_path(
    net: &Network,
    origin: CellId,
    destination: CellId,
) -> RoutingResult<Vec<CellId>> {
    walk_by_distance(net, origin, destination, |candidates| candidates[0])
}

/// A uniformly random member of the shortest-path set from `origin` to
/// `destination`: at every step one of the equally-near successors is chosen
/// uniformly.
pub fn random_shortest_path(
    net: &Network,
    origin: CellId,
    destination: CellId,
    rng: &mut SimRng,
) -> RoutingResult<Vec<CellId>> {
    walk_by_distance(net, origin, destination, |candidates| {
        *rng.pick(candidates).expect("non-empty candidate set")
    })
}

/// Walk the distance-to-destination field greedily from `origin`, choosing
/// among the successors one step closer with `pick`.
fn walk_by_distance(
    net: &Network,
    origin: CellId,
    destination: CellId,
    mut pick: impl FnMut(&[CellId]) -> CellId,
) -> RoutingResult<Vec<CellId>> {
    let dist = distances_to(net, destination);
    if dist[origin.index()] == u32::MAX {
        return Err(RoutingError::NoPath {
            from: origin,
            to: destination,
        });
    }

    let mut path = Vec::with_capacity(dist[origin.index()] as usize + 1);
    let mut current = origin;
    path.push(current);
    let mut candidates = Vec::new();
    while current != destination {
        let here = dist[current.index()];
        candidates.clear();
        candidates.extend(
            net.successors(current)
                .iter()
                .copied()
                .filter(|next| dist[next.index()] == here - 1),
        );
        debug_assert!(!candidates.is_empty(), "distance field inconsistent");
        current = pick(&candidates);
        path.push(current);
    }
    Ok(path)
}
