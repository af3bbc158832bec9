//! Upstream collectors.
//!
//! Two kinds of source feed a reconciliation run: identity sources (the
//! media managers, which say what is still wanted) and the inventory source
//! (the download client, which says what actually exists). Both are traits
//! so the orchestrator can be driven by mocks in tests; the real
//! implementations are thin HTTP clients.

pub mod arr;
pub mod qbittorrent;

pub use arr::{ArrClient, ArrConfig};
pub use qbittorrent::{QbitClient, QbitConfig};

use async_trait::async_trait;

use crate::model::{Inventory, ManagedSet};
use crate::types::Result;

/// A media manager that knows which downloads are currently wanted.
///
/// Instances are invoked independently and never see each other; the
/// caller unions their results.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// Source label for reports ("radarr", "sonarr").
    fn label(&self) -> &str;

    /// Collect the full set of managed identifiers.
    async fn collect(&self) -> Result<ManagedSet>;
}

/// The download client holding the actual torrents.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Collect the full inventory in one pass.
    async fn collect(&self) -> Result<Inventory>;
}
