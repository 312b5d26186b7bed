use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::messaging::ProcessingContext;
use crate::registry::MessageHandler;

/// Records an engine notification raised by a vehicle
#[derive(Debug, Default, Clone, Copy)]
pub struct UpdateEngineNotificationHandler;

#[async_trait]
impl MessageHandler for UpdateEngineNotificationHandler {
    fn name(&self) -> &str {
        "UpdateEngineNotification"
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(100)
    }

    async fn execute(
        &self,
        context: &ProcessingContext,
        _payload: &Bytes,
        _headers: &HashMap<String, String>,
    ) -> anyhow::Result<()> {
        debug!(context = %context, "🔧 Recording engine notification");
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(())
    }
}
