//! Mock collaborators for processor, resolver and coordinator tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use dispatcher_core::messaging::ProcessingContext;
use dispatcher_core::poison::{FailureMode, PoisonError, PoisonMessage, PoisonSink};
use dispatcher_core::processor::{CheckpointError, PartitionContext};
use dispatcher_core::registry::MessageHandler;
use dispatcher_core::resilience::{BreakerError, CircuitBreaker};

/// Breaker that never stalls and records every call
#[derive(Debug, Default)]
pub struct MockCircuitBreaker {
    level: AtomicI64,
    increments: AtomicUsize,
    decrements: AtomicUsize,
    checks: AtomicUsize,
}

impl MockCircuitBreaker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn level(&self) -> i64 {
        self.level.load(Ordering::SeqCst)
    }

    pub fn increments(&self) -> usize {
        self.increments.load(Ordering::SeqCst)
    }

    pub fn decrements(&self) -> usize {
        self.decrements.load(Ordering::SeqCst)
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CircuitBreaker for MockCircuitBreaker {
    fn increment(&self) {
        self.increments.fetch_add(1, Ordering::SeqCst);
        self.level.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        self.decrements.fetch_add(1, Ordering::SeqCst);
        self.level.fetch_sub(1, Ordering::SeqCst);
    }

    async fn check_break(&self, _cancel: &CancellationToken) -> Result<(), BreakerError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Poison sink that keeps every report in memory
#[derive(Debug, Default)]
pub struct RecordingPoisonSink {
    published: Mutex<Vec<PoisonMessage>>,
    fail: bool,
    delay: Duration,
}

impl RecordingPoisonSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A sink whose every publish fails after recording the attempt
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    /// A sink that takes `delay` to accept each report, like a slow disk
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    pub fn messages(&self) -> Vec<PoisonMessage> {
        self.published.lock().clone()
    }

    pub fn with_mode(&self, mode: FailureMode) -> Vec<PoisonMessage> {
        self.published
            .lock()
            .iter()
            .filter(|m| m.failure_mode == mode)
            .cloned()
            .collect()
    }

    pub fn count(&self, mode: FailureMode) -> usize {
        self.with_mode(mode).len()
    }

    pub fn total(&self) -> usize {
        self.published.lock().len()
    }
}

#[async_trait]
impl PoisonSink for RecordingPoisonSink {
    async fn publish(&self, message: PoisonMessage) -> Result<(), PoisonError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let name = message.context.to_string();
        self.published.lock().push(message);
        if self.fail {
            return Err(PoisonError::Io {
                name,
                source: std::io::Error::new(std::io::ErrorKind::Other, "sink offline"),
            });
        }
        Ok(())
    }
}

/// What the next checkpoint call returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointBehavior {
    Succeed,
    StorageUnavailable,
    LeaseLost,
    Fail,
}

/// Partition handle with a scripted checkpoint outcome
#[derive(Debug)]
pub struct MockPartitionContext {
    partition_id: String,
    behavior: Mutex<CheckpointBehavior>,
    checkpoints: AtomicUsize,
}

impl MockPartitionContext {
    pub fn new(partition_id: &str) -> Arc<Self> {
        Self::with_behavior(partition_id, CheckpointBehavior::Succeed)
    }

    pub fn with_behavior(partition_id: &str, behavior: CheckpointBehavior) -> Arc<Self> {
        Arc::new(Self {
            partition_id: partition_id.to_string(),
            behavior: Mutex::new(behavior),
            checkpoints: AtomicUsize::new(0),
        })
    }

    pub fn set_behavior(&self, behavior: CheckpointBehavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn checkpoints(&self) -> usize {
        self.checkpoints.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PartitionContext for MockPartitionContext {
    fn partition_id(&self) -> &str {
        &self.partition_id
    }

    async fn checkpoint(&self) -> Result<(), CheckpointError> {
        self.checkpoints.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behavior.lock();
        match behavior {
            CheckpointBehavior::Succeed => Ok(()),
            CheckpointBehavior::StorageUnavailable => Err(CheckpointError::StorageUnavailable(
                "checkpoint store returned 503".to_string(),
            )),
            CheckpointBehavior::LeaseLost => Err(CheckpointError::LeaseLost(format!(
                "lease on {} taken by another host",
                self.partition_id
            ))),
            CheckpointBehavior::Fail => {
                Err(CheckpointError::Other(anyhow::anyhow!("checkpoint rejected")))
            }
        }
    }
}

/// How a [`MockHandler`] behaves once invoked
#[derive(Debug, Clone)]
pub enum HandlerBehavior {
    Succeed,
    Fail(String),
    Panic(String),
}

/// One recorded handler invocation
#[derive(Debug, Clone)]
pub struct HandlerCall {
    pub context: ProcessingContext,
    pub payload: Bytes,
    pub headers: HashMap<String, String>,
}

/// Handler with scripted work time, outcome and timeout
#[derive(Debug)]
pub struct MockHandler {
    name: String,
    timeout: Duration,
    work: Duration,
    behavior: HandlerBehavior,
    calls: Mutex<Vec<HandlerCall>>,
    completed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockHandler {
    pub fn new(name: &str, work: Duration, timeout: Duration, behavior: HandlerBehavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            timeout,
            work,
            behavior,
            calls: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn succeeding(work: Duration, timeout: Duration) -> Arc<Self> {
        Self::new("MockHandler", work, timeout, HandlerBehavior::Succeed)
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::new(
            "FailingHandler",
            Duration::ZERO,
            Duration::from_secs(1),
            HandlerBehavior::Fail(message.to_string()),
        )
    }

    pub fn panicking(message: &str) -> Arc<Self> {
        Self::new(
            "PanickingHandler",
            Duration::ZERO,
            Duration::from_secs(1),
            HandlerBehavior::Panic(message.to_string()),
        )
    }

    pub fn calls(&self) -> Vec<HandlerCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageHandler for MockHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn execute(
        &self,
        context: &ProcessingContext,
        payload: &Bytes,
        headers: &HashMap<String, String>,
    ) -> anyhow::Result<()> {
        self.calls.lock().push(HandlerCall {
            context: context.clone(),
            payload: payload.clone(),
            headers: headers.clone(),
        });
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.work.is_zero() {
            tokio::time::sleep(self.work).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            HandlerBehavior::Succeed => Ok(()),
            HandlerBehavior::Fail(message) => Err(anyhow::anyhow!("{message}")),
            HandlerBehavior::Panic(message) => panic!("{message}"),
        }
    }
}
