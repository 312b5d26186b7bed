//! # Poison Message Reporting
//!
//! Side channel for events that could not be processed: unknown message types,
//! handler faults and handler timeouts. The processor publishes a
//! [`PoisonMessage`] for each and carries on with the batch.

pub mod file_sink;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::PoisonSettings;
use crate::error::Result;
use crate::messaging::ProcessingContext;

pub use file_sink::FilePoisonSink;

/// Why a message was diverted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureMode {
    /// No handler was registered for the message type/version
    UnknownPayload,
    /// The handler failed or panicked
    Error,
    /// The handler ran past its declared timeout
    Timeout,
}

impl fmt::Display for FailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureMode::UnknownPayload => "UnknownPayload",
            FailureMode::Error => "Error",
            FailureMode::Timeout => "Timeout",
        };
        f.write_str(name)
    }
}

/// A single poison report
#[derive(Debug, Clone)]
pub struct PoisonMessage {
    pub failure_mode: FailureMode,
    pub context: ProcessingContext,
    pub payload: Bytes,
    pub headers: HashMap<String, String>,
    /// Rendered error chain, when the failure carried one
    pub error: Option<String>,
}

impl PoisonMessage {
    pub fn new(
        failure_mode: FailureMode,
        context: ProcessingContext,
        payload: Bytes,
        headers: HashMap<String, String>,
    ) -> Self {
        Self {
            failure_mode,
            context,
            payload,
            headers,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl fmt::Display) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PoisonError {
    #[error("Failed to write poison message {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize poison message headers: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable destination for poison messages. Called concurrently from many workers.
#[async_trait]
pub trait PoisonSink: Send + Sync {
    async fn publish(&self, message: PoisonMessage) -> std::result::Result<(), PoisonError>;
}

/// Sink used when poison reporting is switched off. Reports are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPoisonSink;

#[async_trait]
impl PoisonSink for NullPoisonSink {
    async fn publish(&self, message: PoisonMessage) -> std::result::Result<(), PoisonError> {
        debug!(
            context = %message.context,
            failure_mode = %message.failure_mode,
            "Poison reporting disabled, dropping report"
        );
        Ok(())
    }
}

/// Build the sink described by `settings`
pub async fn create_poison_sink(settings: &PoisonSettings) -> Result<Arc<dyn PoisonSink>> {
    if !settings.enabled {
        info!("☠️ Poison reporting disabled");
        return Ok(Arc::new(NullPoisonSink));
    }
    let sink = FilePoisonSink::create(&settings.directory).await?;
    Ok(Arc::new(sink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_mode_display_matches_variant_names() {
        assert_eq!(FailureMode::UnknownPayload.to_string(), "UnknownPayload");
        assert_eq!(FailureMode::Error.to_string(), "Error");
        assert_eq!(FailureMode::Timeout.to_string(), "Timeout");
    }

    #[test]
    fn test_with_error_renders_anyhow_chain() {
        let err = anyhow::anyhow!("disk full").context("saving car state");
        let message = PoisonMessage::new(
            FailureMode::Error,
            ProcessingContext::new("s", "0", "1"),
            Bytes::new(),
            HashMap::new(),
        )
        .with_error(format!("{err:#}"));

        assert_eq!(message.error.as_deref(), Some("saving car state: disk full"));
    }

    #[tokio::test]
    async fn test_disabled_settings_write_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("poison");
        let settings = PoisonSettings {
            enabled: false,
            directory: root.clone(),
        };

        let sink = create_poison_sink(&settings).await.unwrap();
        sink.publish(PoisonMessage::new(
            FailureMode::Error,
            ProcessingContext::new("telemetry", "0", "7"),
            Bytes::from_static(b"{}"),
            HashMap::new(),
        ))
        .await
        .unwrap();

        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_enabled_settings_create_the_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("poison");
        let settings = PoisonSettings {
            enabled: true,
            directory: root.clone(),
        };

        create_poison_sink(&settings).await.unwrap();

        assert!(root.is_dir());
    }
}
