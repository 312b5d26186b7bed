//! # Event Processor
//!
//! Per-partition batch dispatcher. Each batch passes the circuit breaker,
//! fans out over a bounded worker pool, drains, and then checkpoints.
//!
//! ## Per-message flow
//!
//! ```text
//! event → resolve handler → breaker.increment()
//!       → spawn(handler.execute) ─────────────┐
//!       → race(handler result, timeout)       │ completion continuation
//!            timeout wins: report Timeout     │   (finalize once)
//!            handler wins: await continuation ▼
//!                                   decrement, ended, processed,
//!                                   report Error on fault
//! ```
//!
//! Handlers are never cancelled. A handler that outlives its timeout keeps
//! running past the checkpoint and finalizes on its own.

use bytes::Bytes;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::completion::CompletionGuard;
use super::partition::{CloseReason, PartitionContext};
use crate::constants::{headers, system};
use crate::error::{DispatcherError, Result};
use crate::instrumentation::InstrumentationPublisher;
use crate::logging::log_batch_operation;
use crate::messaging::{Event, ProcessingContext};
use crate::poison::{FailureMode, PoisonMessage, PoisonSink};
use crate::registry::{HandlerResolver, MessageHandler};
use crate::resilience::CircuitBreaker;

/// Dispatches batches for exactly one partition
pub struct EventProcessor {
    dispatch: MessageDispatch,
    max_concurrency: usize,
}

/// Everything a worker needs, cloned into each spawned task
#[derive(Clone)]
struct MessageDispatch {
    resolver: Arc<dyn HandlerResolver>,
    breaker: Arc<dyn CircuitBreaker>,
    instrumentation: Arc<dyn InstrumentationPublisher>,
    poison_sink: Arc<dyn PoisonSink>,
    stream_name: Arc<str>,
}

impl EventProcessor {
    /// Create a processor. A concurrency limit of zero is raised to one.
    pub fn new(
        resolver: Arc<dyn HandlerResolver>,
        breaker: Arc<dyn CircuitBreaker>,
        max_concurrency: usize,
        stream_name: impl Into<String>,
        instrumentation: Arc<dyn InstrumentationPublisher>,
        poison_sink: Arc<dyn PoisonSink>,
    ) -> Self {
        let stream_name: String = stream_name.into();
        Self {
            dispatch: MessageDispatch {
                resolver,
                breaker,
                instrumentation,
                poison_sink,
                stream_name: Arc::from(stream_name),
            },
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn stream_name(&self) -> &str {
        &self.dispatch.stream_name
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn on_open(&self, partition: &dyn PartitionContext) {
        info!(
            stream = %self.dispatch.stream_name,
            partition_id = partition.partition_id(),
            "🔓 Partition lease obtained"
        );
    }

    pub fn on_close(&self, partition: &dyn PartitionContext, reason: CloseReason) {
        match reason {
            CloseReason::LeaseLost => warn!(
                stream = %self.dispatch.stream_name,
                partition_id = partition.partition_id(),
                reason = %reason,
                "⚠️ Partition lease lost"
            ),
            CloseReason::Shutdown | CloseReason::Other => info!(
                stream = %self.dispatch.stream_name,
                partition_id = partition.partition_id(),
                reason = %reason,
                "🔒 Partition closed"
            ),
        }
    }

    /// Process one batch for `partition`.
    ///
    /// Returns once every event has been attempted and the checkpoint was
    /// requested. Only admission cancellation and non-transient checkpoint
    /// failures are returned as errors.
    pub async fn process_batch(
        &self,
        partition: &dyn PartitionContext,
        events: Option<Vec<Event>>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let events = events.unwrap_or_default();
        let partition_id = partition.partition_id().to_string();
        let count = events.len();
        let batch_start = Instant::now();

        self.dispatch.breaker.check_break(cancel).await?;

        debug!(
            stream = %self.dispatch.stream_name,
            partition_id = %partition_id,
            count = count,
            max_concurrency = self.max_concurrency,
            "Dispatching batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut workers = JoinSet::new();

        for event in events {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(e) => {
                    error!(
                        partition_id = %partition_id,
                        offset = %event.offset,
                        error = %e,
                        "Worker pool semaphore closed, dispatching without a permit"
                    );
                    None
                }
            };

            let dispatch = self.dispatch.clone();
            let partition_id = partition_id.clone();
            workers.spawn(async move {
                dispatch.process_message(&partition_id, event).await;
                drop(permit);
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(
                    partition_id = %partition_id,
                    error = %e,
                    "Worker task ended abnormally"
                );
            }
        }

        if let Some(counters) = self.dispatch.instrumentation.counters() {
            info!(
                stream = %self.dispatch.stream_name,
                partition_id = %partition_id,
                processed = counters.total_processed_messages,
                faulted = counters.total_tasks_faulted,
                timeouts = counters.total_timeouts,
                in_flight = counters.current_task_count,
                "📊 Dispatcher counters"
            );
        }

        let elapsed_ms = batch_start.elapsed().as_millis() as u64;
        match partition.checkpoint().await {
            Ok(()) => {
                log_batch_operation(&self.dispatch.stream_name, &partition_id, count, "OK", elapsed_ms);
                Ok(())
            }
            Err(e) if e.is_transient() => {
                log_batch_operation(&self.dispatch.stream_name, &partition_id, count, "ERR", elapsed_ms);
                warn!(
                    stream = %self.dispatch.stream_name,
                    partition_id = %partition_id,
                    error = %e,
                    "⚠️ Checkpoint failed, a later batch will advance the cursor"
                );
                Ok(())
            }
            Err(e) => {
                log_batch_operation(&self.dispatch.stream_name, &partition_id, count, "ERR", elapsed_ms);
                error!(
                    stream = %self.dispatch.stream_name,
                    partition_id = %partition_id,
                    error = %e,
                    "❌ Checkpoint failed"
                );
                Err(DispatcherError::Checkpoint(e))
            }
        }
    }
}

impl MessageDispatch {
    /// Run the per-message protocol. Never fails; everything that goes wrong
    /// outside the handler is reported to the poison sink here.
    async fn process_message(&self, partition_id: &str, event: Event) {
        let context = ProcessingContext::new(&*self.stream_name, partition_id, &event.offset);
        let message_id = event.message_id(&self.stream_name);
        let payload = event.body.clone();
        let event_headers = correlation_headers(&event, &message_id);
        let mut handler_name = system::UNRESOLVED_HANDLER_NAME.to_string();

        let outcome = AssertUnwindSafe(self.dispatch_message(
            &context,
            &message_id,
            &payload,
            &event_headers,
            &mut handler_name,
        ))
        .catch_unwind()
        .await;

        let failure = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(panic) => format!("Dispatch panicked: {}", panic_message(panic.as_ref())),
        };

        error!(
            message_id = %message_id,
            handler = %handler_name,
            error = %failure,
            "❌ Message could not be dispatched"
        );
        let message = PoisonMessage::new(FailureMode::Error, context, payload, event_headers)
            .with_error(format!("{handler_name}: {failure}"));
        if let Err(e) = self.poison_sink.publish(message).await {
            error!(message_id = %message_id, error = %e, "Failed to report undispatched message");
        }
    }

    async fn dispatch_message(
        &self,
        context: &ProcessingContext,
        message_id: &str,
        payload: &Bytes,
        event_headers: &HashMap<String, String>,
        handler_name: &mut String,
    ) -> Result<()> {
        let handler = self.resolver.get_handler(event_headers, message_id)?;
        *handler_name = handler.name().to_string();
        let timeout = handler.timeout();

        self.breaker.increment();
        self.instrumentation.task_started();
        let guard = Arc::new(CompletionGuard::new(
            self.breaker.clone(),
            self.instrumentation.clone(),
        ));

        let (handler_done, mut handler_finished) = oneshot::channel();
        let execution = tokio::spawn(self.clone().execute_handler(
            handler,
            context.clone(),
            payload.clone(),
            event_headers.clone(),
            guard.clone(),
            handler_done,
        ));

        // Only the handler's own result races the timer, not its continuation
        let handler_won = tokio::select! {
            biased;
            _ = &mut handler_finished => true,
            _ = tokio::time::sleep(timeout) => false,
        };

        if handler_won {
            if let Err(e) = execution.await {
                error!(message_id = %message_id, handler = %handler_name, error = %e, "Handler task ended abnormally");
            }
        } else {
            guard.mark_timed_out();
            self.report_timeout(context, message_id, handler_name, timeout, payload, event_headers).await;
        }

        Ok(())
    }

    /// Execute the handler and run its completion continuation
    async fn execute_handler(
        self,
        handler: Arc<dyn MessageHandler>,
        context: ProcessingContext,
        payload: Bytes,
        event_headers: HashMap<String, String>,
        guard: Arc<CompletionGuard>,
        handler_done: oneshot::Sender<()>,
    ) {
        let started = Instant::now();
        let result = AssertUnwindSafe(handler.execute(&context, &payload, &event_headers))
            .catch_unwind()
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        guard.finalize();
        // The racing worker may have given up already
        let _ = handler_done.send(());

        let error = match result {
            Ok(Ok(())) => {
                debug!(
                    context = %context,
                    handler = handler.name(),
                    elapsed_ms = elapsed_ms,
                    timed_out = guard.timed_out(),
                    "✅ Handler completed"
                );
                return;
            }
            Ok(Err(e)) => format!("{e:#}"),
            Err(panic) => format!("Handler panicked: {}", panic_message(panic.as_ref())),
        };

        self.instrumentation.task_faulted();
        warn!(
            context = %context,
            handler = handler.name(),
            elapsed_ms = elapsed_ms,
            error = %error,
            "❌ Handler failed"
        );
        let message = PoisonMessage::new(FailureMode::Error, context.clone(), payload, event_headers)
            .with_error(error);
        if let Err(e) = self.poison_sink.publish(message).await {
            error!(context = %context, error = %e, "Failed to report handler failure");
        }
    }

    async fn report_timeout(
        &self,
        context: &ProcessingContext,
        message_id: &str,
        handler_name: &str,
        timeout: Duration,
        payload: &Bytes,
        event_headers: &HashMap<String, String>,
    ) {
        self.instrumentation.timeout_occurred();

        let mut timeout_headers = event_headers.clone();
        timeout_headers.insert(headers::TIMEOUT_DURATION.to_string(), format!("{timeout:?}"));

        warn!(
            message_id = %message_id,
            handler = %handler_name,
            timeout_ms = timeout.as_millis() as u64,
            "⏱️ Handler exceeded its timeout, leaving it running"
        );

        let message = PoisonMessage::new(
            FailureMode::Timeout,
            context.clone(),
            payload.clone(),
            timeout_headers,
        )
        .with_error(format!("{handler_name} did not complete within {timeout:?}"));
        if let Err(e) = self.poison_sink.publish(message).await {
            error!(message_id = %message_id, error = %e, "Failed to report handler timeout");
        }
    }
}

/// Event headers plus the synthetic correlation entries, which replace any
/// producer header of the same name
fn correlation_headers(event: &Event, message_id: &str) -> HashMap<String, String> {
    let mut map = event.headers.clone();
    map.insert(headers::ID.to_string(), message_id.to_string());
    map.insert(headers::MSG_OFFSET.to_string(), event.offset.clone());
    map.insert(headers::PARTITION.to_string(), event.partition_key.clone());
    map
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
