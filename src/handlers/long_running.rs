use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

use crate::messaging::ProcessingContext;
use crate::registry::MessageHandler;

/// Sleeps for a configured duration. Used to exercise the timeout path.
#[derive(Debug, Clone, Copy)]
pub struct LongRunningHandler {
    duration: Duration,
}

impl LongRunningHandler {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

#[async_trait]
impl MessageHandler for LongRunningHandler {
    fn name(&self) -> &str {
        "LongRunningHandler"
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(1)
    }

    async fn execute(
        &self,
        context: &ProcessingContext,
        _payload: &Bytes,
        _headers: &HashMap<String, String>,
    ) -> anyhow::Result<()> {
        info!(
            context = %context,
            duration_ms = self.duration.as_millis() as u64,
            "🐢 Long running handler started"
        );
        tokio::time::sleep(self.duration).await;
        Ok(())
    }
}
