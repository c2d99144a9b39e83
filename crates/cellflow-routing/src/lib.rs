//! `cellflow-routing` — path finding and trip sampling over the cell graph.
//!
//! Every edge in the network costs one cell, so all shortest-path machinery
//! here is BFS-based.  Three interchangeable finders sit behind the
//! [`PathFinder`] trait:
//!
//! | Finder                | Strategy                                        |
//! |-----------------------|-------------------------------------------------|
//! | [`ShortestPathFinder`]| deterministic BFS shortest path                  |
//! | [`RandomPathFinder`]  | uniform draw from the shortest-path set          |
//! | [`KShortestPathFinder`]| Yen's algorithm + random or length-weighted pick |
//!
//! The crate also hosts the destination-sampling side of trip generation:
//! the hop-bounded reachability oracle and the mile-based trip-distance
//! policy it draws its bounds from.

pub mod distance;
pub mod error;
pub mod finder;
pub mod kshortest;
pub mod path;
pub mod reach;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use distance::TripDistancePolicy;
pub use error::{RoutingError, RoutingResult};
pub use finder::{KShortestPathFinder, PathFinder, PathSelection, RandomPathFinder, ShortestPathFinder};
pub use kshortest::k_shortest_paths;
pub use path::{random_shortest_path, shortest_path};
pub use reach::{nodes_within, TripSampler};
