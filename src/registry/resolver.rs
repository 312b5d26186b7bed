//! # Message Handler Resolver
//!
//! Builds the immutable `MessageRegistration -> MessageHandler` dispatch table
//! once at startup and resolves event headers against it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dispatcher_core::poison::FilePoisonSink;
//! use dispatcher_core::registry::{MessageHandlerResolver, MessageRegistration};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sink = Arc::new(FilePoisonSink::create("poison").await?);
//! let resolver = MessageHandlerResolver::builder(sink)
//!     // .register(MessageRegistration::new("UpdateLocationMessage", 1), || Ok(Arc::new(MyHandler)))
//!     .build();
//! assert_eq!(resolver.len(), 0);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{HandlerFactory, MessageHandler, MessageRegistration, UnknownTypeMessageHandler};
use crate::constants::headers;
use crate::poison::PoisonSink;

/// Header contents that cannot be turned into a registration key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Message {message_id} has non-numeric {key} header: {value:?}")]
    InvalidVersion {
        message_id: String,
        key: &'static str,
        value: String,
    },
}

impl From<ResolveError> for crate::error::DispatcherError {
    fn from(err: ResolveError) -> Self {
        crate::error::DispatcherError::Resolution(err.to_string())
    }
}

/// Resolution seam used by the event processor
pub trait HandlerResolver: Send + Sync {
    /// Resolve the handler for an event.
    ///
    /// Unregistered types resolve to the unknown-type handler; only malformed
    /// registration headers produce an error.
    fn get_handler(
        &self,
        headers: &HashMap<String, String>,
        message_id: &str,
    ) -> Result<Arc<dyn MessageHandler>, ResolveError>;
}

/// One `(registration, factory)` binding
pub struct HandlerRegistration {
    pub registration: MessageRegistration,
    pub factory: HandlerFactory,
}

impl HandlerRegistration {
    pub fn new<F>(registration: MessageRegistration, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn MessageHandler>> + Send + Sync + 'static,
    {
        Self {
            registration,
            factory: Box::new(factory),
        }
    }
}

/// Collects bindings in order and produces the immutable resolver
pub struct MessageHandlerResolverBuilder {
    poison_sink: Arc<dyn PoisonSink>,
    registrations: Vec<HandlerRegistration>,
}

impl MessageHandlerResolverBuilder {
    /// Bind a registration to a handler factory
    pub fn register<F>(mut self, registration: MessageRegistration, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn MessageHandler>> + Send + Sync + 'static,
    {
        self.registrations
            .push(HandlerRegistration::new(registration, factory));
        self
    }

    /// Bind a registration to an already constructed handler
    pub fn register_handler(
        self,
        registration: MessageRegistration,
        handler: Arc<dyn MessageHandler>,
    ) -> Self {
        self.register(registration, move || Ok(handler.clone()))
    }

    /// Append a prepared list of bindings, e.g. a static registration table
    pub fn register_all(mut self, registrations: impl IntoIterator<Item = HandlerRegistration>) -> Self {
        self.registrations.extend(registrations);
        self
    }

    /// Build the dispatch table.
    ///
    /// Factories that fail are logged and skipped. When a registration appears
    /// twice the first binding wins.
    pub fn build(self) -> MessageHandlerResolver {
        let mut dispatch_table: HashMap<MessageRegistration, Arc<dyn MessageHandler>> =
            HashMap::with_capacity(self.registrations.len());

        for HandlerRegistration {
            registration,
            factory,
        } in self.registrations
        {
            let handler = match factory() {
                Ok(handler) => handler,
                Err(e) => {
                    error!(
                        registration = %registration,
                        error = %format!("{e:#}"),
                        "❌ Handler factory did not produce a valid handler, skipping"
                    );
                    continue;
                }
            };

            if dispatch_table.contains_key(&registration) {
                error!(
                    registration = %registration,
                    handler = handler.name(),
                    "❌ Duplicate handler registration, keeping the first binding"
                );
                continue;
            }

            debug!(
                registration = %registration,
                handler = handler.name(),
                "Registering handler"
            );
            dispatch_table.insert(registration, handler);
        }

        info!(handlers = dispatch_table.len(), "📚 Dispatch table built");

        MessageHandlerResolver {
            dispatch_table,
            default_handler: Arc::new(UnknownTypeMessageHandler::new(self.poison_sink)),
        }
    }
}

/// Immutable dispatch table plus the shared unknown-type fallback
pub struct MessageHandlerResolver {
    dispatch_table: HashMap<MessageRegistration, Arc<dyn MessageHandler>>,
    default_handler: Arc<dyn MessageHandler>,
}

impl MessageHandlerResolver {
    pub fn builder(poison_sink: Arc<dyn PoisonSink>) -> MessageHandlerResolverBuilder {
        MessageHandlerResolverBuilder {
            poison_sink,
            registrations: Vec::new(),
        }
    }

    /// Number of registrations in the table
    pub fn len(&self) -> usize {
        self.dispatch_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dispatch_table.is_empty()
    }

    pub fn contains(&self, registration: &MessageRegistration) -> bool {
        self.dispatch_table.contains_key(registration)
    }

    /// Registrations in the table, sorted for stable output
    pub fn registrations(&self) -> Vec<MessageRegistration> {
        let mut keys: Vec<_> = self.dispatch_table.keys().cloned().collect();
        keys.sort_by(|a, b| {
            a.message_type
                .cmp(&b.message_type)
                .then(a.version.cmp(&b.version))
        });
        keys
    }

    /// The shared unknown-type handler
    pub fn default_handler(&self) -> &Arc<dyn MessageHandler> {
        &self.default_handler
    }
}

impl HandlerResolver for MessageHandlerResolver {
    fn get_handler(
        &self,
        event_headers: &HashMap<String, String>,
        message_id: &str,
    ) -> Result<Arc<dyn MessageHandler>, ResolveError> {
        debug!(message_id = message_id, "Resolving handler");

        let registration = MessageRegistration::from_headers(event_headers).map_err(|_| {
            ResolveError::InvalidVersion {
                message_id: message_id.to_string(),
                key: headers::MESSAGE_TYPE_VERSION,
                value: event_headers
                    .get(headers::MESSAGE_TYPE_VERSION)
                    .cloned()
                    .unwrap_or_default(),
            }
        })?;

        match self.dispatch_table.get(&registration) {
            Some(handler) => Ok(handler.clone()),
            None => {
                warn!(
                    message_id = message_id,
                    registration = %registration,
                    "No handler was found for message"
                );
                Ok(self.default_handler.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::ProcessingContext;
    use crate::poison::{FailureMode, PoisonError, PoisonMessage};
    use async_trait::async_trait;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::time::Duration;

    const REGISTERED_MESSAGE_TYPE: &str = "TestMessage";
    const UNKNOWN_MESSAGE_TYPE: &str = "UnknownType";

    #[derive(Default)]
    struct RecordingSink {
        published: Mutex<Vec<PoisonMessage>>,
    }

    #[async_trait]
    impl PoisonSink for RecordingSink {
        async fn publish(&self, message: PoisonMessage) -> Result<(), PoisonError> {
            self.published.lock().push(message);
            Ok(())
        }
    }

    struct TestMessageHandler;

    #[async_trait]
    impl MessageHandler for TestMessageHandler {
        fn name(&self) -> &str {
            "TestMessageHandler"
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }

        async fn execute(
            &self,
            _context: &ProcessingContext,
            _payload: &Bytes,
            _headers: &HashMap<String, String>,
        ) -> anyhow::Result<()> {
            anyhow::bail!("not implemented")
        }
    }

    fn resolver(sink: Arc<RecordingSink>) -> MessageHandlerResolver {
        MessageHandlerResolver::builder(sink)
            .register(MessageRegistration::new(REGISTERED_MESSAGE_TYPE, 1), || {
                Ok(Arc::new(TestMessageHandler))
            })
            .build()
    }

    fn headers_for(message_type: &str, version: Option<&str>) -> HashMap<String, String> {
        let mut map = HashMap::from([(headers::MESSAGE_TYPE.to_string(), message_type.to_string())]);
        if let Some(version) = version {
            map.insert(headers::MESSAGE_TYPE_VERSION.to_string(), version.to_string());
        }
        map
    }

    #[test]
    fn test_registered_type_resolves_to_its_handler() {
        let resolver = resolver(Arc::new(RecordingSink::default()));
        let handler = resolver
            .get_handler(&headers_for(REGISTERED_MESSAGE_TYPE, Some("1")), "m-1")
            .unwrap();
        assert_eq!(handler.name(), "TestMessageHandler");
    }

    #[test]
    fn test_unknown_type_resolves_to_default_handler() {
        let resolver = resolver(Arc::new(RecordingSink::default()));
        let handler = resolver
            .get_handler(&headers_for(UNKNOWN_MESSAGE_TYPE, None), "m-2")
            .unwrap();
        assert!(Arc::ptr_eq(&handler, resolver.default_handler()));
        assert_eq!(handler.name(), system_name());
    }

    #[test]
    fn test_version_mismatch_resolves_to_default_handler() {
        let resolver = resolver(Arc::new(RecordingSink::default()));
        let handler = resolver
            .get_handler(&headers_for(REGISTERED_MESSAGE_TYPE, None), "m-3")
            .unwrap();
        assert_eq!(handler.name(), system_name());
    }

    #[test]
    fn test_malformed_version_is_a_resolution_error() {
        let resolver = resolver(Arc::new(RecordingSink::default()));
        let err = resolver
            .get_handler(&headers_for(REGISTERED_MESSAGE_TYPE, Some("v1")), "m-4")
            .err()
            .expect("expected resolution error");
        assert!(matches!(err, ResolveError::InvalidVersion { ref value, .. } if value == "v1"));
    }

    #[test]
    fn test_failing_factory_is_skipped_without_aborting_build() {
        let resolver = MessageHandlerResolver::builder(Arc::new(RecordingSink::default()))
            .register(MessageRegistration::new("Broken", 1), || {
                Err(anyhow::anyhow!("missing dependency"))
            })
            .register(MessageRegistration::new(REGISTERED_MESSAGE_TYPE, 1), || {
                Ok(Arc::new(TestMessageHandler))
            })
            .build();

        assert_eq!(resolver.len(), 1);
        assert!(!resolver.contains(&MessageRegistration::new("Broken", 1)));
        assert!(resolver.contains(&MessageRegistration::new(REGISTERED_MESSAGE_TYPE, 1)));
    }

    #[test]
    fn test_duplicate_registration_keeps_first_binding() {
        struct Second;
        #[async_trait]
        impl MessageHandler for Second {
            fn name(&self) -> &str {
                "Second"
            }
            fn timeout(&self) -> Duration {
                Duration::from_secs(1)
            }
            async fn execute(
                &self,
                _: &ProcessingContext,
                _: &Bytes,
                _: &HashMap<String, String>,
            ) -> anyhow::Result<()> {
                Ok(())
            }
        }

        let registration = MessageRegistration::new(REGISTERED_MESSAGE_TYPE, 1);
        let resolver = MessageHandlerResolver::builder(Arc::new(RecordingSink::default()))
            .register_handler(registration.clone(), Arc::new(TestMessageHandler))
            .register_handler(registration.clone(), Arc::new(Second))
            .build();

        let handler = resolver
            .get_handler(&headers_for(REGISTERED_MESSAGE_TYPE, Some("1")), "m-5")
            .unwrap();
        assert_eq!(resolver.len(), 1);
        assert_eq!(handler.name(), "TestMessageHandler");
    }

    #[tokio::test]
    async fn test_unknown_type_handler_reports_unknown_payload_with_headers() {
        let sink = Arc::new(RecordingSink::default());
        let resolver = resolver(sink.clone());
        let event_headers = headers_for(UNKNOWN_MESSAGE_TYPE, Some("3"));

        let handler = resolver.get_handler(&event_headers, "m-6").unwrap();
        let context = ProcessingContext::new("stream", "0", "12");
        handler
            .execute(&context, &Bytes::from_static(b"body"), &event_headers)
            .await
            .expect("unknown type handler never fails");

        let published = sink.published.lock();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].failure_mode, FailureMode::UnknownPayload);
        assert_eq!(published[0].headers, event_headers);
        assert_eq!(published[0].payload, Bytes::from_static(b"body"));
        assert_eq!(published[0].context, context);
    }

    fn system_name() -> &'static str {
        crate::constants::system::UNKNOWN_TYPE_HANDLER_NAME
    }
}
