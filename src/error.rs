use thiserror::Error as ThisError;

/// Failure of a single sample read.
///
/// These never escape the scheduler: a failed read only means "no
/// notification this cycle".
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
    #[error("no direct sensor or measure callback configured")]
    NoSource,

    #[error("sensor not ready after {waited_ms} ms")]
    NotReady { waited_ms: u64 },
}

#[derive(ThisError, Debug)]
pub enum ServiceError {
    #[error("period write too short: got {0} bytes, need 4")]
    TruncatedWrite(usize),

    #[error("Invalid service configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
