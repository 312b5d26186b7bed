//! # Event and Processing Context
//!
//! Defines the event shape delivered by the stream and the correlation context
//! that accompanies each event through dispatch, logging and poison reporting.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::constants::headers;

/// A single event read from a partition
///
/// The body is captured once as an immutable buffer; cloning an `Event` shares
/// the buffer rather than copying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Position of the event within its partition
    pub offset: String,
    /// Producer-assigned partition key
    pub partition_key: String,
    /// Raw payload
    #[serde(with = "body_serde")]
    pub body: Bytes,
    /// Application headers (message type, version, device id, ...)
    pub headers: HashMap<String, String>,
}

impl Event {
    /// Create an event with no headers
    pub fn new(
        offset: impl Into<String>,
        partition_key: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            offset: offset.into(),
            partition_key: partition_key.into(),
            body: body.into(),
            headers: HashMap::new(),
        }
    }

    /// Add a header, returning the event for chaining
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Tag the event with a message type and version
    pub fn with_message_type(self, message_type: impl Into<String>, version: i32) -> Self {
        self.with_header(headers::MESSAGE_TYPE, message_type)
            .with_header(headers::MESSAGE_TYPE_VERSION, version.to_string())
    }

    /// Correlation id used in logs and headers: `stream/partitionKey/offset`
    pub fn message_id(&self, stream_name: &str) -> String {
        format!("{}/{}/{}", stream_name, self.partition_key, self.offset)
    }
}

mod body_serde {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(body)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let raw: Vec<u8> = Deserialize::deserialize(deserializer)?;
        Ok(Bytes::from(raw))
    }
}

/// Correlation triple for a single event being processed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessingContext {
    stream_name: String,
    partition_id: String,
    offset: String,
}

impl ProcessingContext {
    pub fn new(
        stream_name: impl Into<String>,
        partition_id: impl Into<String>,
        offset: impl Into<String>,
    ) -> Self {
        Self {
            stream_name: stream_name.into(),
            partition_id: partition_id.into(),
            offset: offset.into(),
        }
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn partition_id(&self) -> &str {
        &self.partition_id
    }

    pub fn offset(&self) -> &str {
        &self.offset
    }
}

impl fmt::Display for ProcessingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.stream_name, self.partition_id, self.offset)
    }
}
