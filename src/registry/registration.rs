use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::constants::headers;

/// Key identifying a handler's message contract
///
/// Equality is structural on both fields, so the same type at two versions is
/// two distinct registrations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRegistration {
    pub message_type: String,
    pub version: i32,
}

impl MessageRegistration {
    pub fn new(message_type: impl Into<String>, version: i32) -> Self {
        Self {
            message_type: message_type.into(),
            version,
        }
    }

    /// Extract the registration key from event headers.
    ///
    /// A missing type maps to the empty string and a missing version to 0; a
    /// version that is present but not an integer is an error.
    pub fn from_headers(
        event_headers: &HashMap<String, String>,
    ) -> Result<Self, std::num::ParseIntError> {
        let message_type = event_headers
            .get(headers::MESSAGE_TYPE)
            .cloned()
            .unwrap_or_default();
        let version = match event_headers.get(headers::MESSAGE_TYPE_VERSION) {
            Some(raw) => raw.trim().parse::<i32>()?,
            None => 0,
        };
        Ok(Self::new(message_type, version))
    }
}

impl fmt::Display for MessageRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Type: {}, Version: {}]", self.message_type, self.version)
    }
}
