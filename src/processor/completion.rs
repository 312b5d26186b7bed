use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::instrumentation::InstrumentationPublisher;
use crate::resilience::CircuitBreaker;

/// Finalize-once gate for a single message's bookkeeping.
///
/// The handler's completion continuation and the timeout path both hold the
/// guard; only the first `finalize` (or the drop, if the handler task never
/// ran to completion) decrements the breaker and emits the ended/processed
/// signals.
pub struct CompletionGuard {
    breaker: Arc<dyn CircuitBreaker>,
    instrumentation: Arc<dyn InstrumentationPublisher>,
    finalized: AtomicBool,
    timed_out: AtomicBool,
}

impl CompletionGuard {
    pub fn new(
        breaker: Arc<dyn CircuitBreaker>,
        instrumentation: Arc<dyn InstrumentationPublisher>,
    ) -> Self {
        Self {
            breaker,
            instrumentation,
            finalized: AtomicBool::new(false),
            timed_out: AtomicBool::new(false),
        }
    }

    /// Run the bookkeeping. Returns `false` if it already ran.
    pub fn finalize(&self) -> bool {
        if self.finalized.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.breaker.decrement();
        self.instrumentation.task_ended();
        self.instrumentation.message_processed();
        true
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::Acquire)
    }

    /// Record that the timeout already reported this message
    pub fn mark_timed_out(&self) {
        self.timed_out.store(true, Ordering::Release);
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out.load(Ordering::Acquire)
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.finalize();
    }
}
