//! # File Poison Sink
//!
//! Writes each poison message under a directory tree that encodes the nature
//! of the failure:
//!
//! ```text
//! <root>/<FailureMode>/<stream>/<partition>/<offset>_<uuid>             payload bytes
//! <root>/<FailureMode>/<stream>/<partition>/<offset>_<uuid>.json        headers
//! <root>/<FailureMode>/<stream>/<partition>/<offset>_<uuid>_exception   error text (optional)
//! ```
//!
//! The uuid suffix keeps repeated reports for the same offset (for example a
//! timeout followed by a late fault) from overwriting each other.

use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use uuid::Uuid;

use super::{PoisonError, PoisonMessage, PoisonSink};

#[derive(Debug, Clone)]
pub struct FilePoisonSink {
    root: PathBuf,
}

impl FilePoisonSink {
    /// Create the sink, creating the root directory if needed
    pub async fn create(root: impl Into<PathBuf>) -> Result<Self, PoisonError> {
        let root = root.into();
        if !tokio::fs::try_exists(&root).await.unwrap_or(false) {
            tokio::fs::create_dir_all(&root)
                .await
                .map_err(|source| PoisonError::Io {
                    name: root.display().to_string(),
                    source,
                })?;
            info!(root = %root.display(), "📁 Created poison message directory");
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, message: &PoisonMessage) -> PathBuf {
        let file_name = format!(
            "{}_{}",
            sanitize(message.context.offset()),
            Uuid::new_v4().simple()
        );
        self.root
            .join(message.failure_mode.to_string())
            .join(sanitize(message.context.stream_name()))
            .join(sanitize(message.context.partition_id()))
            .join(file_name)
    }

    async fn write(&self, message: &PoisonMessage) -> Result<PathBuf, PoisonError> {
        let path = self.blob_path(message);
        let io_err = |path: &Path| {
            let name = path.display().to_string();
            move |source: std::io::Error| PoisonError::Io { name, source }
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io_err(parent))?;
        }

        tokio::fs::write(&path, &message.payload)
            .await
            .map_err(io_err(&path))?;

        let metadata = json!({
            "failureMode": message.failure_mode,
            "context": message.context.to_string(),
            "messageProperties": message.headers,
        });
        let metadata_path = with_suffix(&path, ".json");
        tokio::fs::write(&metadata_path, serde_json::to_vec_pretty(&metadata)?)
            .await
            .map_err(io_err(&metadata_path))?;

        if let Some(ref err) = message.error {
            let exception_path = with_suffix(&path, "_exception");
            tokio::fs::write(&exception_path, err.as_bytes())
                .await
                .map_err(io_err(&exception_path))?;
        }

        Ok(path)
    }
}

#[async_trait]
impl PoisonSink for FilePoisonSink {
    async fn publish(&self, message: PoisonMessage) -> Result<(), PoisonError> {
        match self.write(&message).await {
            Ok(path) => {
                info!(
                    failure_mode = %message.failure_mode,
                    context = %message.context,
                    path = %path.display(),
                    "☠️ Poison message stored"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    failure_mode = %message.failure_mode,
                    context = %message.context,
                    headers = ?message.headers,
                    error = %e,
                    "Could not publish poison message"
                );
                Err(e)
            }
        }
    }
}

fn sanitize(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "_".to_string()
    } else {
        cleaned
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
