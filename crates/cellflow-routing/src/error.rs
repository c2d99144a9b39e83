use cellflow_core::CellId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("no path from {from} to {to}")]
    NoPath { from: CellId, to: CellId },

    #[error("no reachable destination from {from}")]
    NoDestination { from: CellId },
}

pub type RoutingResult<T> = Result<T, RoutingError>;
