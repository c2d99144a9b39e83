use cellflow_core::{CellId, VehicleId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error(
        "cell {cell} occupation {occupation:.3} + vehicle occupy {occupy:.3} \
         exceeds capacity {capacity:.3}"
    )]
    CapacityExceeded {
        cell: CellId,
        occupation: f64,
        occupy: f64,
        capacity: f64,
    },

    #[error("cell {cell} does not contain vehicle {vehicle}")]
    NotPresent { cell: CellId, vehicle: VehicleId },

    #[error("vehicle {vehicle} not found in buffer of cell {cell}")]
    NotInBuffer { cell: CellId, vehicle: VehicleId },

    #[error("invalid green window [{lo}, {hi}] for period {period}")]
    InvalidGreenWindow { lo: u32, hi: u32, period: u32 },

    #[error("light counter {counter} outside [1, {period}]")]
    CounterOutOfRange { counter: u32, period: u32 },

    #[error("interval multiplier {0} must be positive")]
    InvalidMultiplier(f64),

    #[error("invalid topology: {0}")]
    Topology(String),
}

pub type NetResult<T> = Result<T, NetError>;
