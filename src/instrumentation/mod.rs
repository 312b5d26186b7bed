//! # Dispatcher Instrumentation
//!
//! Fire-and-forget counters published by the event processor. Publishers never
//! block and never fail; when instrumentation is disabled the
//! [`NullInstrumentationPublisher`] is handed out instead.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Counter surface used by the processor
pub trait InstrumentationPublisher: Send + Sync {
    fn task_started(&self);
    fn task_ended(&self);
    fn message_processed(&self);
    fn timeout_occurred(&self);
    fn task_faulted(&self);

    /// Current counter values, when this publisher keeps any
    fn counters(&self) -> Option<InstrumentationSnapshot> {
        None
    }
}

/// Publisher that drops every signal
#[derive(Debug, Default, Clone, Copy)]
pub struct NullInstrumentationPublisher;

impl InstrumentationPublisher for NullInstrumentationPublisher {
    fn task_started(&self) {}
    fn task_ended(&self) {}
    fn message_processed(&self) {}
    fn timeout_occurred(&self) {}
    fn task_faulted(&self) {}
}

/// Point-in-time view of a [`CounterInstrumentationPublisher`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentationSnapshot {
    pub total_tasks_faulted: u64,
    pub total_processed_messages: u64,
    pub total_timeouts: u64,
    pub current_task_count: i64,
}

/// In-process counters, one instance per processor
#[derive(Debug, Default)]
pub struct CounterInstrumentationPublisher {
    instance_name: String,
    total_tasks_faulted: AtomicU64,
    total_processed_messages: AtomicU64,
    total_timeouts: AtomicU64,
    current_task_count: AtomicI64,
}

impl CounterInstrumentationPublisher {
    pub fn new(instance_name: impl Into<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
            ..Self::default()
        }
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn snapshot(&self) -> InstrumentationSnapshot {
        InstrumentationSnapshot {
            total_tasks_faulted: self.total_tasks_faulted.load(Ordering::Relaxed),
            total_processed_messages: self.total_processed_messages.load(Ordering::Relaxed),
            total_timeouts: self.total_timeouts.load(Ordering::Relaxed),
            current_task_count: self.current_task_count.load(Ordering::Relaxed),
        }
    }
}

impl InstrumentationPublisher for CounterInstrumentationPublisher {
    fn task_started(&self) {
        self.current_task_count.fetch_add(1, Ordering::Relaxed);
    }

    fn task_ended(&self) {
        self.current_task_count.fetch_sub(1, Ordering::Relaxed);
    }

    fn message_processed(&self) {
        self.total_processed_messages.fetch_add(1, Ordering::Relaxed);
    }

    fn timeout_occurred(&self) {
        self.total_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    fn task_faulted(&self) {
        self.total_tasks_faulted.fetch_add(1, Ordering::Relaxed);
    }

    fn counters(&self) -> Option<InstrumentationSnapshot> {
        Some(self.snapshot())
    }
}

/// Hands out publishers according to the instrumentation setting
#[derive(Debug, Clone, Copy)]
pub struct InstrumentationManager {
    enabled: bool,
}

impl InstrumentationManager {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn create_publisher(&self, instance_name: &str) -> Arc<dyn InstrumentationPublisher> {
        if !self.enabled {
            debug!(instance = instance_name, "Instrumentation disabled, using null publisher");
            return Arc::new(NullInstrumentationPublisher);
        }
        Arc::new(CounterInstrumentationPublisher::new(instance_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_publisher_tracks_task_lifecycle() {
        let publisher = CounterInstrumentationPublisher::new("telemetry-0");
        publisher.task_started();
        publisher.task_started();
        publisher.task_ended();
        publisher.message_processed();
        publisher.timeout_occurred();
        publisher.task_faulted();

        let snapshot = publisher.snapshot();
        assert_eq!(snapshot.current_task_count, 1);
        assert_eq!(snapshot.total_processed_messages, 1);
        assert_eq!(snapshot.total_timeouts, 1);
        assert_eq!(snapshot.total_tasks_faulted, 1);
        assert_eq!(publisher.instance_name(), "telemetry-0");
    }

    #[test]
    fn test_null_publisher_accepts_all_signals() {
        let publisher: Arc<dyn InstrumentationPublisher> = Arc::new(NullInstrumentationPublisher);
        publisher.task_started();
        publisher.task_ended();
        publisher.message_processed();
        publisher.timeout_occurred();
        publisher.task_faulted();
        assert_eq!(publisher.counters(), None);
    }

    #[test]
    fn test_manager_exposes_counters_only_when_enabled() {
        let enabled = InstrumentationManager::new(true).create_publisher("telemetry");
        enabled.message_processed();
        assert_eq!(
            enabled.counters().map(|c| c.total_processed_messages),
            Some(1)
        );

        let disabled = InstrumentationManager::new(false).create_publisher("telemetry");
        disabled.message_processed();
        assert_eq!(disabled.counters(), None);
    }
}
