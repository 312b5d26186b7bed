//! # Load Circuit Breaker
//!
//! Leaky-bucket style admission control. Handler executions raise and lower an
//! atomic level; batch intake checks that level and stalls while it sits at or
//! above the trip threshold. Handler execution itself is never blocked, so the
//! gate cannot deadlock against the work it gates.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{BreakerError, CircuitBreaker, CircuitBreakerConfig, CircuitState};

/// Circuit breaker keyed by processor role and partition
#[derive(Debug)]
pub struct LoadCircuitBreaker {
    /// Role of the owning processor, used in logs
    processor_name: String,

    /// Partition this breaker guards
    partition_id: String,

    config: CircuitBreakerConfig,

    /// In-flight level. Increments and decrements are unordered, so the value
    /// may dip below zero transiently.
    level: AtomicI64,

    /// Earliest time the next warning-band log line may be written. Races on
    /// this value only affect log frequency.
    next_warning_log_time: Mutex<Option<Instant>>,

    /// Earliest time the next "still tripped" line may be written while stalling
    next_error_log_time: Mutex<Option<Instant>>,
}

impl LoadCircuitBreaker {
    pub fn new(
        processor_name: impl Into<String>,
        partition_id: impl Into<String>,
        config: CircuitBreakerConfig,
    ) -> Self {
        let processor_name = processor_name.into();
        let partition_id = partition_id.into();

        info!(
            processor = %processor_name,
            partition_id = %partition_id,
            warning_level = config.warning_level,
            trip_level = config.trip_level,
            stall_interval_ms = config.stall_interval.as_millis() as u64,
            log_cooldown_ms = config.log_cooldown.as_millis() as u64,
            "🛡️ Circuit breaker initialized"
        );

        Self {
            processor_name,
            partition_id,
            config,
            level: AtomicI64::new(0),
            next_warning_log_time: Mutex::new(None),
            next_error_log_time: Mutex::new(None),
        }
    }

    /// Current in-flight level
    pub fn level(&self) -> i64 {
        self.level.load(Ordering::Acquire)
    }

    /// Band the current level falls into
    pub fn state(&self) -> CircuitState {
        self.classify(self.level())
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub(crate) fn next_warning_log_time(&self) -> Option<Instant> {
        *self.next_warning_log_time.lock()
    }

    pub(crate) fn next_error_log_time(&self) -> Option<Instant> {
        *self.next_error_log_time.lock()
    }

    fn classify(&self, level: i64) -> CircuitState {
        if level < self.config.warning_level {
            CircuitState::Closed
        } else if level < self.config.trip_level {
            CircuitState::Warning
        } else {
            CircuitState::Tripped
        }
    }

    fn log_warning_if_due(&self, level: i64) {
        let now = Instant::now();
        let mut next = self.next_warning_log_time.lock();
        if next.map_or(true, |at| at <= now) {
            warn!(
                processor = %self.processor_name,
                partition_id = %self.partition_id,
                warning_level = self.config.warning_level,
                level = level,
                "🟡 Circuit breaker warning level reached"
            );
            *next = Some(now + self.config.log_cooldown);
        }
    }

    fn log_still_tripped_if_due(&self, level: i64) {
        let now = Instant::now();
        let mut next = self.next_error_log_time.lock();
        if next.map_or(true, |at| at <= now) {
            error!(
                processor = %self.processor_name,
                partition_id = %self.partition_id,
                trip_level = self.config.trip_level,
                level = level,
                "🔴 Circuit breaker still tripped"
            );
            *next = Some(now + self.config.log_cooldown);
        }
    }

    async fn stall_until_restored(
        &self,
        mut level: i64,
        cancel: &CancellationToken,
    ) -> Result<(), BreakerError> {
        error!(
            processor = %self.processor_name,
            partition_id = %self.partition_id,
            trip_level = self.config.trip_level,
            level = level,
            "🔴 Circuit breaker tripped"
        );
        *self.next_error_log_time.lock() = Some(Instant::now() + self.config.log_cooldown);

        loop {
            debug!(
                processor = %self.processor_name,
                partition_id = %self.partition_id,
                trip_level = self.config.trip_level,
                level = level,
                stall_interval_ms = self.config.stall_interval.as_millis() as u64,
                "Circuit breaker stalling intake"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(
                        processor = %self.processor_name,
                        partition_id = %self.partition_id,
                        level = level,
                        "Circuit breaker stall cancelled"
                    );
                    return Err(BreakerError::Cancelled);
                }
                _ = sleep(self.config.stall_interval) => {}
            }

            level = self.level();

            if level < self.config.warning_level {
                info!(
                    processor = %self.processor_name,
                    partition_id = %self.partition_id,
                    warning_level = self.config.warning_level,
                    level = level,
                    "🟢 Circuit breaker restored"
                );
                *self.next_warning_log_time.lock() = None;
                *self.next_error_log_time.lock() = None;
                return Ok(());
            }

            self.log_still_tripped_if_due(level);
        }
    }
}

#[async_trait]
impl CircuitBreaker for LoadCircuitBreaker {
    fn increment(&self) {
        self.level.fetch_add(1, Ordering::AcqRel);
    }

    fn decrement(&self) {
        self.level.fetch_sub(1, Ordering::AcqRel);
    }

    async fn check_break(&self, cancel: &CancellationToken) -> Result<(), BreakerError> {
        let level = self.level();

        match self.classify(level) {
            CircuitState::Closed => {
                debug!(
                    processor = %self.processor_name,
                    partition_id = %self.partition_id,
                    level = level,
                    "Circuit breaker closed"
                );
                *self.next_warning_log_time.lock() = None;
                Ok(())
            }
            CircuitState::Warning => {
                self.log_warning_if_due(level);
                Ok(())
            }
            CircuitState::Tripped => self.stall_until_restored(level, cancel).await,
        }
    }
}
