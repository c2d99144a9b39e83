//! `cellflow-net` — the road network data model.
//!
//! # Data layout
//!
//! The network is an **arena of cells addressed by dense indices**: a
//! `CellId` is both the cell's identity and its position in the arena `Vec`.
//! Adjacency is stored in **Compressed Sparse Row (CSR)** form, once for
//! successors and once for predecessors, so the hot paths of the movement
//! rule (successor scans, in-degree checks) are contiguous memory reads.
//!
//! # Concurrency
//!
//! Cells carry interior mutability so the whole network is shared as
//! `&Network` across worker threads:
//!
//! - container + occupation: one mutex per cell
//! - entry buffer: one mutex per cell
//! - traffic-light phase: a lock-free boolean, written once per tick by the
//!   light sweep and read by every admissibility check
//!
//! Cross-cell ordering is never guaranteed; each cell's own operations are
//! serialized by its locks.

pub mod cell;
pub mod error;
pub mod light;
pub mod link;
pub mod network;
pub mod topology;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use cell::{BufferEntry, Cell};
pub use error::{NetError, NetResult};
pub use light::TrafficLight;
pub use link::Link;
pub use network::{Network, NetworkBuilder};
