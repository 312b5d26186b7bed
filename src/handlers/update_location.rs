use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::messaging::ProcessingContext;
use crate::registry::MessageHandler;

const WORK_DURATION: Duration = Duration::from_millis(250);

/// Updates a vehicle's last known location.
///
/// The state update itself is simulated with a fixed delay.
#[derive(Debug, Default, Clone, Copy)]
pub struct UpdateLocationHandler;

#[async_trait]
impl MessageHandler for UpdateLocationHandler {
    fn name(&self) -> &str {
        "UpdateLocation"
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(300)
    }

    async fn execute(
        &self,
        context: &ProcessingContext,
        payload: &Bytes,
        _headers: &HashMap<String, String>,
    ) -> anyhow::Result<()> {
        debug!(context = %context, bytes = payload.len(), "📍 Updating vehicle location");
        tokio::time::sleep(WORK_DURATION).await;
        Ok(())
    }
}
