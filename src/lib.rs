#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Dispatcher Core
//!
//! Per-partition event dispatcher for a partitioned event stream.
//!
//! ## Overview
//!
//! A partition host delivers batches of events for the partitions it has
//! leased. For each batch the dispatcher:
//!
//! 1. Passes a circuit breaker that stalls intake while too many handlers are
//!    in flight
//! 2. Resolves each event's `{type, version}` to a registered handler
//! 3. Runs handlers on a bounded worker pool, racing each against its
//!    declared timeout
//! 4. Reports unknown types, failures and timeouts to a poison sink
//! 5. Checkpoints the partition once the pool drains
//!
//! ## Module Organization
//!
//! - [`resilience`] - Load circuit breaker (admission control)
//! - [`registry`] - Message registrations and handler resolution
//! - [`processor`] - Event processor, factory and partition coordinator
//! - [`poison`] - Poison message reporting
//! - [`instrumentation`] - Fire-and-forget dispatcher counters
//! - [`handlers`] - Sample vehicle telemetry handlers
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dispatcher_core::config::ConfigManager;
//! use dispatcher_core::handlers;
//! use dispatcher_core::instrumentation::InstrumentationManager;
//! use dispatcher_core::poison;
//! use dispatcher_core::processor::{EventProcessorFactory, ProcessingCoordinator};
//! use dispatcher_core::registry::MessageHandlerResolver;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! dispatcher_core::logging::init_structured_logging();
//! let manager = ConfigManager::load()?;
//! let config = manager.config();
//!
//! let sink = poison::create_poison_sink(&config.poison).await?;
//! let resolver = MessageHandlerResolver::builder(sink.clone())
//!     .register_all(handlers::registrations(&config.handlers))
//!     .build();
//! let instrumentation = InstrumentationManager::new(config.instrumentation.enabled)
//!     .create_publisher(&config.dispatcher.stream_name);
//!
//! let factory = EventProcessorFactory::from_config(config, Arc::new(resolver), instrumentation, sink)?;
//! let coordinator = ProcessingCoordinator::new(factory);
//! // coordinator.open_partition(..), coordinator.process_batch(..), ...
//! # let _ = coordinator;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod instrumentation;
pub mod logging;
pub mod messaging;
pub mod poison;
pub mod processor;
pub mod registry;
pub mod resilience;

pub use config::{ConfigManager, DispatcherConfig};
pub use error::{DispatcherError, Result};
pub use messaging::{Event, ProcessingContext};
pub use processor::{
    CheckpointError, CloseReason, EventProcessor, EventProcessorFactory, PartitionContext,
    ProcessingCoordinator,
};
pub use registry::{MessageHandler, MessageHandlerResolver, MessageRegistration};
pub use resilience::{CircuitBreaker, LoadCircuitBreaker};
