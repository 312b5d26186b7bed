use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

use crate::messaging::ProcessingContext;
use crate::registry::MessageHandler;

/// Well-known failure raised by [`ThrowsExceptionHandler`]
#[derive(Debug, thiserror::Error)]
#[error("Intentional failure for testing")]
pub struct JustForTestingError;

/// Always fails. Used to exercise the fault path end to end.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThrowsExceptionHandler;

#[async_trait]
impl MessageHandler for ThrowsExceptionHandler {
    fn name(&self) -> &str {
        "ThrowsExceptionHandler"
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
        info!(context = %context, "Intentionally failing");
        Err(JustForTestingError.into())
    }
}
