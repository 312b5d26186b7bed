//! # Event Processing
//!
//! Per-partition batch processing: the partition host contract, the
//! [`EventProcessor`] itself, the factory that creates one per partition and
//! the coordinator that tracks owned partitions.

pub mod completion;
pub mod coordinator;
pub mod event_processor;
pub mod factory;
pub mod partition;

pub use completion::CompletionGuard;
pub use coordinator::ProcessingCoordinator;
pub use event_processor::EventProcessor;
pub use factory::{load_breaker_factory, CircuitBreakerFactory, EventProcessorFactory};
pub use partition::{CheckpointError, CloseReason, PartitionContext};
