use crate::processor::CheckpointError;
use crate::resilience::BreakerError;

/// Errors that cross the `process_batch` boundary or the configuration layer.
///
/// Per-message failures never show up here; they are contained at the message
/// boundary and reported through logs, counters and the poison sink.
#[derive(Debug, thiserror::Error)]
pub enum DispatcherError {
    /// The admission check was cancelled by the host
    #[error("Batch admission was cancelled")]
    Cancelled,

    /// Checkpointing failed with a non-transient error
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Poison sink error: {0}")]
    Poison(String),

    /// A batch was delivered for a partition this host does not own
    #[error("Partition {0} is not owned by this host")]
    PartitionNotOwned(String),
}

impl From<BreakerError> for DispatcherError {
    fn from(err: BreakerError) -> Self {
        match err {
            BreakerError::Cancelled => DispatcherError::Cancelled,
        }
    }
}

impl From<crate::config::ConfigurationError> for DispatcherError {
    fn from(err: crate::config::ConfigurationError) -> Self {
        DispatcherError::Configuration(err.to_string())
    }
}

impl From<crate::poison::PoisonError> for DispatcherError {
    fn from(err: crate::poison::PoisonError) -> Self {
        DispatcherError::Poison(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DispatcherError>;
