//! seedgate - blocklist reconciliation for a cross-seeding media stack
//!
//! Two loosely coupled concerns share this crate:
//!
//! - **Reconciliation** (`seedgate` binary): one batch pass that collects
//!   the identifiers Radarr and Sonarr still manage, diffs them against
//!   the qBittorrent inventory, rewrites cross-seed's blockList, and
//!   restarts the cross-seed container so the new list takes effect.
//! - **Notification dispatch** (`seedgate-webhook` binary): a small HTTP
//!   listener that turns What's Up Docker update webhooks into bounded
//!   invocations of the local update handler.
//!
//! The config artifact on disk is the only durable state; everything else
//! lives for one run or one request.

pub mod activate;
pub mod artifact;
pub mod blocklist;
pub mod config;
pub mod model;
pub mod routes;
pub mod run;
pub mod server;
pub mod services;
pub mod sources;
pub mod types;

pub use run::{ReconciliationRun, RunReport, RunStage};
pub use types::{Result, SyncError};
