//! # Handler Registry
//!
//! Message registrations, the handler contract, and the resolver that maps
//! event headers to handlers.
//!
//! ## Architecture
//!
//! ```text
//! Registry
//! ├── MessageRegistration      ({type, version} dispatch key)
//! ├── MessageHandler           (name, timeout, execute)
//! ├── MessageHandlerResolver   (immutable dispatch table, built once)
//! └── UnknownTypeMessageHandler (fallback, reports UnknownPayload)
//! ```

pub mod handler;
pub mod registration;
pub mod resolver;
pub mod unknown_type;

pub use handler::{HandlerFactory, MessageHandler};
pub use registration::MessageRegistration;
pub use resolver::{
    HandlerRegistration, HandlerResolver, MessageHandlerResolver, MessageHandlerResolverBuilder,
    ResolveError,
};
pub use unknown_type::UnknownTypeMessageHandler;
