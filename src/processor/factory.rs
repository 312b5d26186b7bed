use std::sync::Arc;
use tracing::{debug, info};

use super::EventProcessor;
use crate::config::DispatcherConfig;
use crate::constants::system;
use crate::error::Result;
use crate::instrumentation::InstrumentationPublisher;
use crate::poison::PoisonSink;
use crate::registry::HandlerResolver;
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, LoadCircuitBreaker};

/// Builds a circuit breaker for a `(processor role, partition id)` pair
pub type CircuitBreakerFactory =
    Arc<dyn Fn(&str, &str) -> Arc<dyn CircuitBreaker> + Send + Sync + 'static>;

/// Creates one [`EventProcessor`] per leased partition.
///
/// The resolver, instrumentation and poison sink are shared; every processor
/// gets a breaker of its own.
#[derive(Clone)]
pub struct EventProcessorFactory {
    resolver: Arc<dyn HandlerResolver>,
    breaker_factory: CircuitBreakerFactory,
    max_concurrency: usize,
    stream_name: String,
    instrumentation: Arc<dyn InstrumentationPublisher>,
    poison_sink: Arc<dyn PoisonSink>,
}

impl EventProcessorFactory {
    pub fn new(
        resolver: Arc<dyn HandlerResolver>,
        breaker_factory: CircuitBreakerFactory,
        max_concurrency: usize,
        stream_name: impl Into<String>,
        instrumentation: Arc<dyn InstrumentationPublisher>,
        poison_sink: Arc<dyn PoisonSink>,
    ) -> Self {
        let stream_name = stream_name.into();
        info!(
            stream = %stream_name,
            max_concurrency = max_concurrency,
            "🏭 Event processor factory created"
        );
        Self {
            resolver,
            breaker_factory,
            max_concurrency,
            stream_name,
            instrumentation,
            poison_sink,
        }
    }

    /// Wire the factory from configuration, using load-based breakers.
    /// The configuration is validated first.
    pub fn from_config(
        config: &DispatcherConfig,
        resolver: Arc<dyn HandlerResolver>,
        instrumentation: Arc<dyn InstrumentationPublisher>,
        poison_sink: Arc<dyn PoisonSink>,
    ) -> Result<Self> {
        config.validate()?;
        let breaker_config = config.circuit_breaker.to_breaker_config();
        Ok(Self::new(
            resolver,
            load_breaker_factory(breaker_config),
            config.dispatcher.max_concurrency_per_processor,
            config.dispatcher.stream_name.clone(),
            instrumentation,
            poison_sink,
        ))
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn create_event_processor(&self, partition_id: &str) -> EventProcessor {
        debug!(
            stream = %self.stream_name,
            partition_id = partition_id,
            "Creating event processor"
        );
        let breaker = (self.breaker_factory)(system::PROCESSOR_ROLE, partition_id);
        EventProcessor::new(
            self.resolver.clone(),
            breaker,
            self.max_concurrency,
            self.stream_name.clone(),
            self.instrumentation.clone(),
            self.poison_sink.clone(),
        )
    }
}

/// Breaker factory producing a [`LoadCircuitBreaker`] per partition
pub fn load_breaker_factory(config: CircuitBreakerConfig) -> CircuitBreakerFactory {
    Arc::new(move |role: &str, partition_id: &str| -> Arc<dyn CircuitBreaker> {
        Arc::new(LoadCircuitBreaker::new(role, partition_id, config.clone()))
    })
}
