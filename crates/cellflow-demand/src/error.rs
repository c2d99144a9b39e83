use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemandError {
    #[error("demand curve is empty")]
    EmptyCurve,

    #[error("unparseable demand value {value:?} at record {record}")]
    Parse { record: usize, value: String },

    #[error("demand record {record} has {got} fields, expected at least 2")]
    ShortRecord { record: usize, got: usize },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type DemandResult<T> = Result<T, DemandError>;
