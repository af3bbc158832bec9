//! Dispatcher services: payload normalization and handler invocation.
//!
//! Everything stateful about a notification lives for one request only.

pub mod command;
pub mod handler;

pub use command::{normalize, MissingTarget, UpdateCommand};
pub use handler::{invoke, HandlerConfig};
