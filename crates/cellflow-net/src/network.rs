//! The directed cell graph and its builder.
//!
//! # Data layout
//!
//! Cells live in an arena `Vec<Cell>` where `CellId` is the index.  Adjacency
//! uses CSR form twice:
//!
//! ```text
//! successors of n   = succ_targets[ succ_start[n] .. succ_start[n+1] ]
//! predecessors of n = pred_targets[ pred_start[n] .. pred_start[n+1] ]
//! ```
//!
//! The predecessor CSR serves two hot consumers: the in-degree check of the
//! intersection rule, and the reverse BFS of the strong-connectivity test.

use cellflow_core::{CellId, LinkId};

use crate::cell::Cell;
use crate::error::{NetError, NetResult};
use crate::light::TrafficLight;
use crate::link::Link;

// ── Network ───────────────────────────────────────────────────────────────────

/// Directed graph over arena-allocated cells.
///
/// Construct with [`NetworkBuilder`].  The graph structure is frozen after
/// `build()`; only per-cell state (occupancy, buffers, light timing) mutates
/// during a run.
pub struct Network {
    cells: Vec<Cell>,
    links: Vec<Link>,
    lights: Vec<CellId>,

    succ_start: Vec<u32>,
    succ_targets: Vec<CellId>,
    pred_start: Vec<u32>,
    pred_targets: Vec<CellId>,
}

impl Network {
    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn edge_count(&self) -> usize {
        self.succ_targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    // ── Cell access ───────────────────────────────────────────────────────

    /// The cell with the given id.
    ///
    /// # Panics
    /// Panics if `id` is out of range; ids handed out by the builder are
    /// always valid for the network they were created in.
    #[inline]
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.index()]
    }

    /// Iterator over all cells in id order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Ids of all signalized cells.
    #[inline]
    pub fn lights(&self) -> &[CellId] {
        &self.lights
    }

    #[inline]
    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.index()]
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    // ── Adjacency ─────────────────────────────────────────────────────────

    /// Successors of `id` — the cells a vehicle may step into from `id`.
    #[inline]
    pub fn successors(&self, id: CellId) -> &[CellId] {
        let start = self.succ_start[id.index()] as usize;
        let end = self.succ_start[id.index() + 1] as usize;
        &self.succ_targets[start..end]
    }

    /// Predecessors of `id` — the cells that may step into `id`.
    #[inline]
    pub fn predecessors(&self, id: CellId) -> &[CellId] {
        let start = self.pred_start[id.index()] as usize;
        let end = self.pred_start[id.index() + 1] as usize;
        &self.pred_targets[start..end]
    }

    #[inline]
    pub fn out_degree(&self, id: CellId) -> usize {
        self.successors(id).len()
    }

    /// In-degree of `id`.  Cells with in-degree above one are intersections
    /// for the purposes of the movement rule.
    #[inline]
    pub fn in_degree(&self, id: CellId) -> usize {
        self.predecessors(id).len()
    }

    // ── Capacity aggregates ───────────────────────────────────────────────

    /// Sum of all cell capacities.
    pub fn total_capacity(&self) -> f64 {
        self.cells.iter().map(|c| c.capacity()).sum()
    }

    /// Mean capacity per cell (0 for an empty network).
    pub fn avg_capacity(&self) -> f64 {
        if self.cells.is_empty() {
            0.0
        } else {
            self.total_capacity() / self.cells.len() as f64
        }
    }

    // ── Connectivity ──────────────────────────────────────────────────────

    /// `true` if every cell can reach every other cell.
    ///
    /// Checked as: forward BFS from cell 0 visits everything, and backward
    /// BFS (over predecessors) from cell 0 visits everything.
    pub fn is_strongly_connected(&self) -> bool {
        if self.cells.is_empty() {
            return false;
        }
        let forward = self.bfs_count(CellId(0), false);
        if forward != self.cells.len() {
            return false;
        }
        self.bfs_count(CellId(0), true) == self.cells.len()
    }

    /// Enumerate all ordered pairs `(u, v)` where `v` is unreachable from
    /// `u`, by BFS from every cell.  O(N·(N+E)) — a diagnostic for
    /// construction-time checks on small graphs, not a runtime operation.
    pub fn unreachable_pairs(&self) -> Vec<(CellId, CellId)> {
        let n = self.cells.len();
        let mut pairs = Vec::new();
        let mut visited = vec![false; n];
        let mut queue = std::collections::VecDeque::new();
        for source in 0..n {
            visited.iter_mut().for_each(|v| *v = false);
            queue.clear();
            visited[source] = true;
            queue.push_back(CellId(source as u32));
            while let Some(u) = queue.pop_front() {
                for &next in self.successors(u) {
                    if !visited[next.index()] {
                        visited[next.index()] = true;
                        queue.push_back(next);
                    }
                }
            }
            for (target, seen) in visited.iter().enumerate() {
                if !seen {
                    pairs.push((CellId(source as u32), CellId(target as u32)));
                }
            }
        }
        pairs
    }

    fn bfs_count(&self, source: CellId, reverse: bool) -> usize {
        let mut visited = vec![false; self.cells.len()];
        let mut queue = std::collections::VecDeque::new();
        visited[source.index()] = true;
        queue.push_back(source);
        let mut count = 1;
        while let Some(u) = queue.pop_front() {
            let neighbors = if reverse {
                self.predecessors(u)
            } else {
                self.successors(u)
            };
            for &next in neighbors {
                if !visited[next.index()] {
                    visited[next.index()] = true;
                    count += 1;
                    queue.push_back(next);
                }
            }
        }
        count
    }
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Construct a [`Network`] incrementally, then call [`build`](Self::build).
///
/// Cell ids are handed out from a monotone counter in creation order; link
/// ids from their own counter.  Edges may be added in any order and are
/// deduplicated at build time.
///
/// # Example
///
/// ```
/// use cellflow_net::NetworkBuilder;
///
/// let mut b = NetworkBuilder::new();
/// let a = b.add_cell(5, 1.0);
/// let c = b.add_cell(5, 1.0);
/// b.add_edge(a, c);
/// let net = b.build();
/// assert_eq!(net.cell_count(), 2);
/// assert_eq!(net.successors(a), &[c]);
/// ```
#[derive(Default)]
pub struct NetworkBuilder {
    cells: Vec<Cell>,
    links: Vec<Link>,
    lights: Vec<CellId>,
    edges: Vec<(CellId, CellId)>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate for the expected number of cells and edges.
    pub fn with_capacity(cells: usize, edges: usize) -> Self {
        Self {
            cells: Vec::with_capacity(cells),
            links: Vec::new(),
            lights: Vec::new(),
            edges: Vec::with_capacity(edges),
        }
    }

    /// Add a common cell and return its id.
    pub fn add_cell(&mut self, max_speed: u32, capacity: f64) -> CellId {
        let id = CellId(self.cells.len() as u32);
        self.cells.push(Cell::common(id, max_speed, capacity));
        id
    }

    /// Add a signalized cell and return its id.
    pub fn add_light(
        &mut self,
        max_speed: u32,
        capacity: f64,
        period: u32,
        green_window: (u32, u32),
    ) -> NetResult<CellId> {
        let id = CellId(self.cells.len() as u32);
        let light = TrafficLight::new(period, green_window)?;
        self.cells.push(Cell::signalized(id, max_speed, capacity, light));
        self.lights.push(id);
        Ok(id)
    }

    /// Add a **directed** edge from `from` to `to`.
    pub fn add_edge(&mut self, from: CellId, to: CellId) {
        debug_assert!(from.index() < self.cells.len());
        debug_assert!(to.index() < self.cells.len());
        self.edges.push((from, to));
    }

    /// Create a link of `num_cells` fresh chained cells (length ≥ 2) sharing
    /// one speed limit and capacity, and return its id.  Internal edges
    /// between successive cells are added here; attach the endpoints with
    /// [`connect_to_link`](Self::connect_to_link) and
    /// [`connect_from_link`](Self::connect_from_link).
    pub fn add_link(
        &mut self,
        num_cells: usize,
        max_speed: u32,
        capacity: f64,
    ) -> NetResult<LinkId> {
        if num_cells < 2 {
            return Err(NetError::Topology(format!(
                "link must span at least 2 cells, got {num_cells}"
            )));
        }
        let cells: Vec<CellId> = (0..num_cells)
            .map(|_| self.add_cell(max_speed, capacity))
            .collect();
        for pair in cells.windows(2) {
            self.add_edge(pair[0], pair[1]);
        }
        let id = LinkId(self.links.len() as u32);
        self.links.push(Link::new(id, cells, max_speed, capacity));
        Ok(id)
    }

    /// Attach `node` upstream of the link's entry cell.
    pub fn connect_to_link(&mut self, node: CellId, link: LinkId) {
        let entry = self.links[link.index()].entry();
        self.add_edge(node, entry);
    }

    /// Attach the link's exit cell upstream of `node`.
    pub fn connect_from_link(&mut self, link: LinkId, node: CellId) {
        let exit = self.links[link.index()].exit();
        self.add_edge(exit, node);
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Consume the builder and produce a [`Network`].
    ///
    /// Sorts and deduplicates edges, then lays out both CSR adjacency
    /// structures.  Time complexity O(E log E).
    pub fn build(self) -> Network {
        let n = self.cells.len();

        let mut edges = self.edges;
        edges.sort_unstable_by_key(|&(f, t)| (f.0, t.0));
        edges.dedup();

        let (succ_start, succ_targets) = build_csr(n, edges.iter().copied());

        let mut reversed: Vec<(CellId, CellId)> =
            edges.iter().map(|&(f, t)| (t, f)).collect();
        reversed.sort_unstable_by_key(|&(f, t)| (f.0, t.0));
        let (pred_start, pred_targets) = build_csr(n, reversed.into_iter());

        Network {
            cells: self.cells,
            links: self.links,
            lights: self.lights,
            succ_start,
            succ_targets,
            pred_start,
            pred_targets,
        }
    }
}

/// Build one CSR adjacency from edges sorted by source.
fn build_csr(
    n: usize,
    edges: impl Iterator<Item = (CellId, CellId)> + Clone,
) -> (Vec<u32>, Vec<CellId>) {
    let mut start = vec![0u32; n + 1];
    for (from, _) in edges.clone() {
        start[from.index() + 1] += 1;
    }
    for i in 1..=n {
        start[i] += start[i - 1];
    }
    let targets: Vec<CellId> = edges.map(|(_, to)| to).collect();
    debug_assert_eq!(start[n] as usize, targets.len());
    (start, targets)
}
