//! Road links: chains of cells between two graph endpoints.

use cellflow_core::{CellId, LinkId};

/// A directed road segment made of a contiguous chain of cells sharing one
/// speed limit and per-cell capacity.
///
/// The link's cells are ordinary arena cells; the link itself only records
/// the ordered sequence so paths expressed at link granularity can be
/// flattened into cell paths.  Links are created through
/// [`NetworkBuilder::add_link`][crate::NetworkBuilder::add_link], which also
/// wires the internal edges between successive cells.
pub struct Link {
    id: LinkId,
    cells: Vec<CellId>,
    max_speed: u32,
    capacity: f64,
}

impl Link {
    pub(crate) fn new(id: LinkId, cells: Vec<CellId>, max_speed: u32, capacity: f64) -> Self {
        debug_assert!(cells.len() >= 2, "a link spans at least two cells");
        Self {
            id,
            cells,
            max_speed,
            capacity,
        }
    }

    #[inline]
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// The link's cell sequence, in traversal order.  This is the
    /// flattening used during path expansion.
    #[inline]
    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    /// Number of cells in the link.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// First cell — where upstream nodes attach.
    #[inline]
    pub fn entry(&self) -> CellId {
        self.cells[0]
    }

    /// Last cell — where the link attaches to downstream nodes.
    #[inline]
    pub fn exit(&self) -> CellId {
        self.cells[self.cells.len() - 1]
    }

    #[inline]
    pub fn max_speed(&self) -> u32 {
        self.max_speed
    }

    #[inline]
    pub fn capacity(&self) -> f64 {
        self.capacity
    }
}
