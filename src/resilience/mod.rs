//! # Resilience Module
//!
//! Admission control for batch intake. A circuit breaker tracks the number of
//! in-flight handler executions for one partition and stalls new batches while
//! that level stays above its trip threshold.
//!
//! ## Architecture
//!
//! - **Level tracking**: `increment`/`decrement` around every handler execution,
//!   never blocking
//! - **Admission gate**: `check_break` is awaited once per batch and may suspend
//!   the whole batch until load subsides
//! - **Configuration**: warning/trip thresholds, stall interval and log cooldown
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dispatcher_core::resilience::{CircuitBreaker, CircuitBreakerConfig, LoadCircuitBreaker};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let breaker = LoadCircuitBreaker::new("processor", "0", CircuitBreakerConfig::default());
//! let cancel = CancellationToken::new();
//!
//! breaker.check_break(&cancel).await?;
//! breaker.increment();
//! // ... handler runs ...
//! breaker.decrement();
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod config;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

pub use circuit_breaker::LoadCircuitBreaker;
pub use config::CircuitBreakerConfig;

/// Errors surfaced by the admission check
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BreakerError {
    /// The cancel signal fired while the breaker was stalling
    #[error("Circuit breaker check was cancelled")]
    Cancelled,
}

/// Band the current level falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Below the warning level
    Closed,
    /// At or above the warning level, below the trip level
    Warning,
    /// At or above the trip level; intake stalls
    Tripped,
}

/// Admission-control contract used by the event processor
#[async_trait]
pub trait CircuitBreaker: Send + Sync {
    /// Record the start of a handler execution
    fn increment(&self);

    /// Record the end of a handler execution
    fn decrement(&self);

    /// Wait until intake is allowed. Only suspends when the breaker is tripped.
    async fn check_break(&self, cancel: &CancellationToken) -> Result<(), BreakerError>;
}
