use cellflow_core::CellId;
use cellflow_net::NetError;
use thiserror::Error;

use crate::vehicle::VehicleState;

#[derive(Debug, Error)]
pub enum VehicleError {
    #[error("origin and destination are the same cell ({0})")]
    SameEndpoints(CellId),

    #[error("path cannot be empty")]
    EmptyPath,

    #[error("path starts at {got}, expected origin {expected}")]
    PathOriginMismatch { expected: CellId, got: CellId },

    #[error("path ends at {got}, expected destination {expected}")]
    PathDestinationMismatch { expected: CellId, got: CellId },

    #[error("operation requires state {expected:?}, vehicle is {actual:?}")]
    InvalidState {
        expected: VehicleState,
        actual: VehicleState,
    },

    #[error("vehicle is not activated for network entry")]
    NotActivated,

    #[error(transparent)]
    Net(#[from] NetError),
}

pub type VehicleResult<T> = Result<T, VehicleError>;
