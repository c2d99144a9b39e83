use cellflow_net::NetError;
use cellflow_vehicle::VehicleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(
        "network is not strongly connected ({pairs} unreachable pairs); \
         closed-loop vehicles require strong connectivity"
    )]
    NotStronglyConnected { pairs: usize },

    #[error(transparent)]
    Vehicle(#[from] VehicleError),

    #[error(transparent)]
    Net(#[from] NetError),
}

pub type SimResult<T> = Result<T, SimError>;
