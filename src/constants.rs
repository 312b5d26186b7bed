//! # Dispatcher Constants
//!
//! Header keys that make up the event wire contract, plus a handful of
//! defaults shared between the processor and the configuration layer.

/// Well-known header keys carried on every event
pub mod headers {
    /// Message type used for handler resolution
    pub const MESSAGE_TYPE: &str = "MessageType";

    /// Message contract version; absent means version 0
    pub const MESSAGE_TYPE_VERSION: &str = "MessageTypeVersion";

    /// Producer-side device identifier
    pub const DEVICE_ID: &str = "DeviceId";

    /// Synthetic correlation id: `stream/partitionKey/offset`
    pub const ID: &str = "Id";

    /// Synthetic copy of the event offset
    pub const MSG_OFFSET: &str = "MessageOffset";

    /// Synthetic copy of the event partition key
    pub const PARTITION: &str = "Partition";

    /// Added to the poison report when a handler exceeds its timeout
    pub const TIMEOUT_DURATION: &str = "timeoutDuration";
}

/// System-level names and defaults
pub mod system {
    use std::time::Duration;

    /// Handler name reported when a failure happens before resolution
    pub const UNRESOLVED_HANDLER_NAME: &str = "[handler not yet resolved]";

    /// Name of the unknown-type handler
    pub const UNKNOWN_TYPE_HANDLER_NAME: &str = "UnknownTypeMessageHandler";

    /// Timeout of the unknown-type handler
    pub const UNKNOWN_TYPE_HANDLER_TIMEOUT: Duration = Duration::from_secs(5);

    /// Circuit breaker role used for dispatching processors
    pub const PROCESSOR_ROLE: &str = "processor";

    /// Configuration file name looked up in the config directory
    pub const CONFIG_FILE_NAME: &str = "dispatcher-config.yaml";
}
