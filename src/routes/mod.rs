//! HTTP routes for the webhook listener.

pub mod health;
pub mod notify;

pub use health::{health_check, usage_hint, version_info};
pub use notify::{handle_notification, RejectReason};
