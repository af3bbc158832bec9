//! qBittorrent inventory collection.
//!
//! The WebUI API is session based: one login request sets the SID cookie
//! and subsequent calls ride on the client's cookie store. The whole
//! inventory comes back from a single torrents/info call.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::model::{InfoHash, Inventory, InventoryItem};
use crate::sources::InventorySource;
use crate::types::{Result, SyncError};

const SOURCE: &str = "qbittorrent";

/// Connection settings for the qBittorrent WebUI.
#[derive(Debug, Clone)]
pub struct QbitConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub request_timeout: Duration,
}

/// Session-authenticated WebUI client.
pub struct QbitClient {
    config: QbitConfig,
    http: reqwest::Client,
}

impl QbitClient {
    pub fn new(config: QbitConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");
        Self { config, http }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/api/v2/{}",
            self.config.base_url.trim_end_matches('/'),
            path
        )
    }

    async fn login(&self) -> Result<()> {
        let response = self
            .http
            .post(self.url("auth/login"))
            .form(&[
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SyncError::unavailable(SOURCE, e))?
            .error_for_status()
            .map_err(|e| SyncError::unavailable(SOURCE, e))?;

        // The WebUI answers 200 with a literal "Ok." or "Fails." body.
        let body = response
            .text()
            .await
            .map_err(|e| SyncError::malformed(SOURCE, e))?;
        if body != "Ok." {
            return Err(SyncError::unavailable(SOURCE, "login rejected"));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct TorrentEntry {
    #[serde(default)]
    hash: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    ratio: f64,
}

/// Fold raw entries into the inventory map.
///
/// Identifiers are normalized to lowercase; a duplicate identifier
/// overwrites the earlier entry (last seen wins) rather than erroring.
/// Entries without a 40-hex identifier (BitTorrent v2-only torrents) are
/// skipped: they can never match a managed set, and admitting them would
/// block every one of them.
fn build_inventory(entries: Vec<TorrentEntry>) -> Inventory {
    let mut inventory = Inventory::new();
    for entry in entries {
        let Some(hash) = InfoHash::parse(&entry.hash) else {
            warn!(
                hash = %entry.hash,
                name = %entry.name,
                "skipping torrent without a v1 info hash"
            );
            continue;
        };
        let item = InventoryItem {
            name: entry.name,
            category: entry.category,
            state: entry.state,
            ratio: entry.ratio,
        };
        if inventory.insert(hash.clone(), item).is_some() {
            debug!(hash = %hash, "duplicate inventory identifier, keeping the last entry");
        }
    }
    inventory
}

#[async_trait]
impl InventorySource for QbitClient {
    async fn collect(&self) -> Result<Inventory> {
        self.login().await?;

        let entries: Vec<TorrentEntry> = self
            .http
            .get(self.url("torrents/info"))
            .send()
            .await
            .map_err(|e| SyncError::unavailable(SOURCE, e))?
            .error_for_status()
            .map_err(|e| SyncError::unavailable(SOURCE, e))?
            .json()
            .await
            .map_err(|e| SyncError::malformed(SOURCE, e))?;

        let inventory = build_inventory(entries);
        info!("Found {} torrents in qBittorrent", inventory.len());
        Ok(inventory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(hash: &str, name: &str, category: &str) -> TorrentEntry {
        TorrentEntry {
            hash: hash.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            state: "uploading".to_string(),
            ratio: 1.5,
        }
    }

    #[test]
    fn test_build_inventory_normalizes_case() {
        let inventory = build_inventory(vec![entry(
            "ABCDEF0123456789ABCDEF0123456789ABCDEF01",
            "movie",
            "movies",
        )]);
        let hash = InfoHash::parse("abcdef0123456789abcdef0123456789abcdef01").unwrap();
        assert!(inventory.contains_key(&hash));
    }

    #[test]
    fn test_build_inventory_last_entry_wins_on_duplicates() {
        let hash = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        let inventory = build_inventory(vec![
            entry(hash, "first", "movies"),
            entry(&hash.to_uppercase(), "second", "tv"),
        ]);

        assert_eq!(inventory.len(), 1);
        let item = inventory.values().next().unwrap();
        assert_eq!(item.name, "second");
        assert_eq!(item.category, "tv");
    }

    #[test]
    fn test_build_inventory_skips_non_v1_hashes() {
        // 64 hex characters - a v2-only torrent's identifier.
        let v2 = "a".repeat(64);
        let inventory = build_inventory(vec![
            entry(&v2, "v2 torrent", ""),
            entry("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb", "v1 torrent", ""),
        ]);
        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn test_torrent_entry_tolerates_sparse_response() {
        let entries: Vec<TorrentEntry> = serde_json::from_str(
            r#"[{"hash": "cccccccccccccccccccccccccccccccccccccccc", "name": "bare"}]"#,
        )
        .unwrap();
        let inventory = build_inventory(entries);

        let item = inventory.values().next().unwrap();
        assert_eq!(item.name, "bare");
        assert_eq!(item.category, "");
        assert_eq!(item.ratio, 0.0);
    }
}
