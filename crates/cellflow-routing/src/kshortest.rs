//! Yen's k-shortest loopless paths over the unit-cost cell graph.

use std::collections::{HashSet, VecDeque};

use cellflow_core::CellId;
use cellflow_net::Network;

use crate::error::{RoutingError, RoutingResult};

/// Up to `k` loopless paths from `origin` to `destination` in non-decreasing
/// length order.  Always returns at least one path or `NoPath`.
pub fn k_shortest_paths(
    net: &Network,
    origin: CellId,
    destination: CellId,
    k: usize,
) -> RoutingResult<Vec<Vec<CellId>>> {
    let k = k.max(1);
    let first = bfs_with_bans(net, origin, destination, &HashSet::new(), &HashSet::new())
        .ok_or(RoutingError::NoPath {
            from: origin,
            to: destination,
        })?;

    let mut paths: Vec<Vec<CellId>> = vec![first];
    let mut candidates: Vec<Vec<CellId>> = Vec::new();

    while paths.len() < k {
        let prev = paths.last().expect("at least one accepted path").clone();

        // Deviate at every node of the previous path except the destination.
        for i in 0..prev.len() - 1 {
            let spur_node = prev[i];
            let root = &prev[..=i];

            // Ban the outgoing edge of every accepted path sharing this root,
            // so each spur search is forced onto a new continuation.
            let mut banned_edges: HashSet<(CellId, CellId)> = HashSet::new();
            for p in &paths {
                if p.len() > i + 1 && p[..=i] == *root {
                    banned_edges.insert((p[i], p[i + 1]));
                }
            }
            // Ban the root nodes (except the spur itself) to keep paths loopless.
            let banned_nodes: HashSet<CellId> = root[..i].iter().copied().collect();

            if let Some(spur) =
                bfs_with_bans(net, spur_node, destination, &banned_nodes, &banned_edges)
            {
                let mut total = root[..i].to_vec();
                total.extend(spur);
                if !paths.contains(&total) && !candidates.contains(&total) {
                    candidates.push(total);
                }
            }
        }

        if candidates.is_empty() {
            break;
        }
        // Accept the shortest remaining candidate; ties break toward the
        // lexicographically smallest so the result order is stable.
        let best = candidates
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .map(|(idx, _)| idx)
            .expect("non-empty candidate set");
        paths.push(candidates.swap_remove(best));
    }

    Ok(paths)
}

/// Forward BFS from `origin` to `destination` avoiding banned nodes and
/// banned directed edges.  Returns the path inclusive of both endpoints.
fn bfs_with_bans(
    net: &Network,
    origin: CellId,
    destination: CellId,
    banned_nodes: &HashSet<CellId>,
    banned_edges: &HashSet<(CellId, CellId)>,
) -> Option<Vec<CellId>> {
    if banned_nodes.contains(&origin) {
        return None;
    }
    if origin == destination {
        return Some(vec![origin]);
    }

    let mut parent = vec![CellId::INVALID; net.cell_count()];
    let mut visited = vec![false; net.cell_count()];
    let mut queue = VecDeque::new();
    visited[origin.index()] = true;
    queue.push_back(origin);

    while let Some(u) = queue.pop_front() {
        for &next in net.successors(u) {
            if visited[next.index()]
                || banned_nodes.contains(&next)
                || banned_edges.contains(&(u, next))
            {
                continue;
            }
            visited[next.index()] = true;
            parent[next.index()] = u;
            if next == destination {
                let mut path = vec![destination];
                let mut cur = destination;
                while cur != origin {
                    cur = parent[cur.index()];
                    path.push(cur);
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next);
        }
    }
    None
}
