use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::messaging::ProcessingContext;

/// A message handler bound to one or more registrations
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handler name, used for logging and poison reports
    fn name(&self) -> &str;

    /// Advisory timeout. Past this the handler is reported as timed out but
    /// keeps running; it is never cancelled.
    fn timeout(&self) -> Duration;

    /// Handle one message
    async fn execute(
        &self,
        context: &ProcessingContext,
        payload: &Bytes,
        headers: &HashMap<String, String>,
    ) -> anyhow::Result<()>;
}

/// Produces a handler instance when the dispatch table is built
pub type HandlerFactory =
    Box<dyn Fn() -> anyhow::Result<Arc<dyn MessageHandler>> + Send + Sync + 'static>;
