//! # Messaging
//!
//! Event and correlation types shared by the resolver, the processor and the
//! poison sink.

pub mod message;

pub use message::{Event, ProcessingContext};
