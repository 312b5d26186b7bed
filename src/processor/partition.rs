//! Partition host contract consumed by the processor.

use async_trait::async_trait;
use std::fmt;

/// Checkpoint failures reported by the partition host
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// Checkpoint storage could not be reached
    #[error("Checkpoint storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The lease on the partition was lost before the checkpoint landed
    #[error("Partition lease lost: {0}")]
    LeaseLost(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CheckpointError {
    /// Transient failures are subsumed by the next batch's checkpoint
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CheckpointError::StorageUnavailable(_) | CheckpointError::LeaseLost(_)
        )
    }
}

/// Why the host stopped delivering a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    LeaseLost,
    Shutdown,
    Other,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CloseReason::LeaseLost => "LeaseLost",
            CloseReason::Shutdown => "Shutdown",
            CloseReason::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Host-owned handle on a single leased partition
#[async_trait]
pub trait PartitionContext: Send + Sync {
    fn partition_id(&self) -> &str;

    /// Record the current batch as attempted
    async fn checkpoint(&self) -> Result<(), CheckpointError>;
}
