use std::time::Duration;

/// Thresholds and timings for a [`LoadCircuitBreaker`](super::LoadCircuitBreaker)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Level at which warnings start being logged
    pub warning_level: i64,
    /// Level at which intake stalls
    pub trip_level: i64,
    /// Sleep between level checks while tripped
    pub stall_interval: Duration,
    /// Minimum time between repeated warning/tripped log lines
    pub log_cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            warning_level: 200,
            trip_level: 400,
            stall_interval: Duration::from_secs(30),
            log_cooldown: Duration::from_secs(15 * 60),
        }
    }
}
