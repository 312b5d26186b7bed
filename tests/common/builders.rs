//! Builders for events and processors used across the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use dispatcher_core::constants::headers;
use dispatcher_core::instrumentation::{CounterInstrumentationPublisher, InstrumentationPublisher};
use dispatcher_core::messaging::Event;
use dispatcher_core::poison::PoisonSink;
use dispatcher_core::processor::EventProcessor;
use dispatcher_core::registry::{MessageHandler, MessageHandlerResolver, MessageRegistration};
use dispatcher_core::resilience::CircuitBreaker;

pub const STREAM_NAME: &str = "telemetry";
pub const TEST_MESSAGE: &str = "TestMessage";

/// Events of one type at version 1, offsets `0..count`
pub fn test_events(message_type: &str, count: usize) -> Vec<Event> {
    (0..count)
        .map(|i| {
            Event::new(i.to_string(), format!("car-{i}"), format!("{{\"seq\":{i}}}"))
                .with_message_type(message_type, 1)
                .with_header(headers::DEVICE_ID, format!("device-{i}"))
        })
        .collect()
}

/// Resolver with a single `TestMessage` v1 binding
pub fn single_handler_resolver(
    handler: Arc<dyn MessageHandler>,
    sink: Arc<dyn PoisonSink>,
) -> Arc<MessageHandlerResolver> {
    Arc::new(
        MessageHandlerResolver::builder(sink)
            .register_handler(MessageRegistration::new(TEST_MESSAGE, 1), handler)
            .build(),
    )
}

/// Processor wiring with the collaborators the tests inspect afterwards
pub struct ProcessorHarness {
    pub processor: EventProcessor,
    pub instrumentation: Arc<CounterInstrumentationPublisher>,
}

pub fn processor_with(
    handler: Arc<dyn MessageHandler>,
    breaker: Arc<dyn CircuitBreaker>,
    sink: Arc<dyn PoisonSink>,
    max_concurrency: usize,
) -> ProcessorHarness {
    let instrumentation = Arc::new(CounterInstrumentationPublisher::new(STREAM_NAME));
    let publisher: Arc<dyn InstrumentationPublisher> = instrumentation.clone();
    let processor = EventProcessor::new(
        single_handler_resolver(handler, sink.clone()),
        breaker,
        max_concurrency,
        STREAM_NAME,
        publisher,
        sink,
    );
    ProcessorHarness {
        processor,
        instrumentation,
    }
}
