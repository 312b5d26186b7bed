use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

use super::MessageHandler;
use crate::constants::system;
use crate::messaging::ProcessingContext;
use crate::poison::{FailureMode, PoisonMessage, PoisonSink};

/// Fallback handler for events whose type/version has no registration.
///
/// Always diverts the event to the poison sink as `UnknownPayload` and never
/// reports a failure of its own.
pub struct UnknownTypeMessageHandler {
    poison_sink: Arc<dyn PoisonSink>,
}

impl UnknownTypeMessageHandler {
    pub fn new(poison_sink: Arc<dyn PoisonSink>) -> Self {
        Self { poison_sink }
    }
}

#[async_trait]
impl MessageHandler for UnknownTypeMessageHandler {
    fn name(&self) -> &str {
        system::UNKNOWN_TYPE_HANDLER_NAME
    }

    fn timeout(&self) -> Duration {
        system::UNKNOWN_TYPE_HANDLER_TIMEOUT
    }

    async fn execute(
        &self,
        context: &ProcessingContext,
        payload: &Bytes,
        headers: &HashMap<String, String>,
    ) -> anyhow::Result<()> {
        let mut listed: Vec<String> = headers.iter().map(|(k, v)| format!("{k}:{v}")).collect();
        listed.sort();

        warn!(
            context = %context,
            headers = %listed.join("\n"),
            "❓ No handler was found for event"
        );

        let message = PoisonMessage::new(
            FailureMode::UnknownPayload,
            context.clone(),
            payload.clone(),
            headers.clone(),
        );
        if let Err(e) = self.poison_sink.publish(message).await {
            error!(context = %context, error = %e, "Failed to report unknown payload");
        }

        Ok(())
    }
}
