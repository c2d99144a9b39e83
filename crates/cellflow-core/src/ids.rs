//! Identifiers for the three object populations.
//!
//! Cells and links are arena-allocated: their ids are dense indices handed
//! out by the network builder in creation order, so `arena[id.index()]`
//! addressing needs no lookup structure.  Vehicle ids come from the
//! registry's monotone counter and are never reused — a closed vehicle
//! keeps its id across every recycled journey, which is what keeps
//! per-vehicle records and random streams stable over a whole run.
//!
//! `Display` prints the bare number; messages supply their own noun
//! ("cell 17", "vehicle 9").

use std::fmt;

// ── CellId ────────────────────────────────────────────────────────────────────

/// Position of a cell in the network arena.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CellId(pub u32);

impl CellId {
    /// "Not on any cell": an off-network vehicle position, an unset parent
    /// in a graph search.
    pub const INVALID: CellId = CellId(u32::MAX);

    /// The cell's index in the arena.
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── LinkId ────────────────────────────────────────────────────────────────────

/// Position of a link in the network's link table.
///
/// Links number their own id space, disjoint from cells; a link id is only
/// ever resolved through the network that created it.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct LinkId(pub u32);

impl LinkId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ── VehicleId ─────────────────────────────────────────────────────────────────

/// Identity of a vehicle, unique for the whole run.
///
/// 64 bits wide so the demand generator can inject vehicles every tick for
/// any realistic horizon without wrapping.  Ordering follows issue order,
/// which the scheduler relies on for deterministic phase iteration.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct VehicleId(pub u64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
