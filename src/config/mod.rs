//! # Dispatcher Configuration
//!
//! YAML-based configuration with development/test/production overrides.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dispatcher_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load_from_directory(Some("config".into()))?;
//! let config = manager.config();
//!
//! let breaker = config.circuit_breaker.to_breaker_config();
//! let concurrency = config.dispatcher.max_concurrency_per_processor;
//! # let _ = (breaker, concurrency);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::resilience::CircuitBreakerConfig;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring dispatcher-config.yaml
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DispatcherConfig {
    /// Stream intake and per-processor concurrency
    pub dispatcher: DispatcherSettings,

    /// Admission control thresholds
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,

    #[serde(default)]
    pub poison: PoisonSettings,

    #[serde(default)]
    pub instrumentation: InstrumentationSettings,

    /// Settings read by the sample handlers
    #[serde(default)]
    pub handlers: HandlerSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatcherSettings {
    pub stream_name: String,
    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_prefetch_count")]
    pub prefetch_count: usize,
    #[serde(default = "default_receive_timeout_ms")]
    pub receive_timeout_ms: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency_per_processor: usize,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            stream_name: String::new(),
            consumer_group: default_consumer_group(),
            max_batch_size: default_max_batch_size(),
            prefetch_count: default_prefetch_count(),
            receive_timeout_ms: default_receive_timeout_ms(),
            max_concurrency_per_processor: default_max_concurrency(),
        }
    }
}

impl DispatcherSettings {
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }
}

fn default_consumer_group() -> String {
    "$Default".to_string()
}

fn default_max_batch_size() -> usize {
    100
}

fn default_prefetch_count() -> usize {
    300
}

fn default_receive_timeout_ms() -> u64 {
    // seven days
    7 * 24 * 60 * 60 * 1000
}

fn default_max_concurrency() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CircuitBreakerSettings {
    #[serde(default = "default_warning_level")]
    pub warning_level: i64,
    #[serde(default = "default_trip_level")]
    pub trip_level: i64,
    #[serde(default = "default_stall_interval_ms")]
    pub stall_interval_ms: u64,
    #[serde(default = "default_log_cooldown_ms")]
    pub log_cooldown_ms: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            warning_level: default_warning_level(),
            trip_level: default_trip_level(),
            stall_interval_ms: default_stall_interval_ms(),
            log_cooldown_ms: default_log_cooldown_ms(),
        }
    }
}

impl CircuitBreakerSettings {
    pub fn stall_interval(&self) -> Duration {
        Duration::from_millis(self.stall_interval_ms)
    }

    pub fn log_cooldown(&self) -> Duration {
        Duration::from_millis(self.log_cooldown_ms)
    }

    /// Convert to the runtime breaker configuration
    pub fn to_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            warning_level: self.warning_level,
            trip_level: self.trip_level,
            stall_interval: self.stall_interval(),
            log_cooldown: self.log_cooldown(),
        }
    }
}

fn default_warning_level() -> i64 {
    200
}

fn default_trip_level() -> i64 {
    400
}

fn default_stall_interval_ms() -> u64 {
    30_000
}

fn default_log_cooldown_ms() -> u64 {
    15 * 60 * 1000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoisonSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_poison_directory")]
    pub directory: PathBuf,
}

impl Default for PoisonSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_poison_directory(),
        }
    }
}

fn default_poison_directory() -> PathBuf {
    PathBuf::from("poison-messages")
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InstrumentationSettings {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HandlerSettings {
    #[serde(default = "default_long_running_task_duration_ms")]
    pub long_running_task_duration_ms: u64,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            long_running_task_duration_ms: default_long_running_task_duration_ms(),
        }
    }
}

impl HandlerSettings {
    pub fn long_running_task_duration(&self) -> Duration {
        Duration::from_millis(self.long_running_task_duration_ms)
    }
}

fn default_long_running_task_duration_ms() -> u64 {
    60_000
}

fn default_true() -> bool {
    true
}

impl DispatcherConfig {
    /// Validate configuration for consistency and required fields
    pub fn validate(&self) -> ConfigResult<()> {
        if self.dispatcher.stream_name.trim().is_empty() {
            return Err(ConfigurationError::missing(
                "stream_name",
                "dispatcher configuration",
            ));
        }

        if self.dispatcher.max_concurrency_per_processor == 0 {
            return Err(ConfigurationError::invalid_value(
                "max_concurrency_per_processor",
                "0",
                "must be at least 1",
            ));
        }

        if self.dispatcher.max_batch_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "max_batch_size",
                "0",
                "must be at least 1",
            ));
        }

        let breaker = &self.circuit_breaker;
        if breaker.warning_level <= 0 {
            return Err(ConfigurationError::invalid_value(
                "circuit_breaker.warning_level",
                breaker.warning_level.to_string(),
                "must be greater than 0",
            ));
        }

        if breaker.trip_level <= breaker.warning_level {
            return Err(ConfigurationError::invalid_value(
                "circuit_breaker.trip_level",
                breaker.trip_level.to_string(),
                format!(
                    "must be greater than warning_level ({})",
                    breaker.warning_level
                ),
            ));
        }

        if breaker.stall_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "circuit_breaker.stall_interval_ms",
                "0",
                "must be greater than 0",
            ));
        }

        if self.poison.enabled && self.poison.directory.as_os_str().is_empty() {
            return Err(ConfigurationError::missing(
                "poison.directory",
                "poison configuration",
            ));
        }

        Ok(())
    }
}
