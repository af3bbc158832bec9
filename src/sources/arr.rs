//! Radarr/Sonarr identity collection.
//!
//! Both managers expose the same v3 API surface, so one client type covers
//! them, instantiated once per service. The managed set comes from the
//! event history: every grab or import event names the torrent it acted
//! on. The entity list is fetched too, but only to put a count in the run
//! report.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use crate::model::{InfoHash, ManagedSet};
use crate::sources::IdentitySource;
use crate::types::{Result, SyncError};

/// Event types whose records carry the info hash of a wanted download.
const MANAGED_EVENT_TYPES: [&str; 3] = ["grabbed", "downloadFolderImported", "downloadImported"];

/// Connection settings for one Radarr/Sonarr instance.
#[derive(Debug, Clone)]
pub struct ArrConfig {
    pub base_url: String,
    pub api_key: String,
    pub history_page_size: u32,
    pub request_timeout: Duration,
}

/// HTTP client for one media-manager instance.
pub struct ArrClient {
    label: &'static str,
    entity_path: &'static str,
    config: ArrConfig,
    http: reqwest::Client,
}

impl ArrClient {
    /// Radarr instance; its entity list lives at /api/v3/movie.
    pub fn radarr(config: ArrConfig) -> Self {
        Self::new("radarr", "movie", config)
    }

    /// Sonarr instance; its entity list lives at /api/v3/series.
    pub fn sonarr(config: ArrConfig) -> Self {
        Self::new("sonarr", "series", config)
    }

    fn new(label: &'static str, entity_path: &'static str, config: ArrConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            label,
            entity_path,
            config,
            http,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!(
            "{}/api/v3/{}",
            self.config.base_url.trim_end_matches('/'),
            path
        );
        let response = self
            .http
            .get(&url)
            .header("X-Api-Key", &self.config.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| SyncError::unavailable(self.label, e))?
            .error_for_status()
            .map_err(|e| SyncError::unavailable(self.label, e))?;

        response
            .json::<T>()
            .await
            .map_err(|e| SyncError::malformed(self.label, e))
    }
}

/// One page of the event history. A missing records field is treated as an
/// empty page, matching the tolerance of the rest of the walk.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryPage {
    #[serde(default)]
    records: Vec<HistoryRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRecord {
    #[serde(default)]
    event_type: String,
    #[serde(default)]
    download_id: String,
}

impl HistoryRecord {
    /// Identifier of a wanted download, if this record names one.
    ///
    /// Records with other event types, or whose downloadId does not have
    /// the 40-hex hash shape, are upstream noise and yield None rather
    /// than an error.
    fn managed_hash(&self) -> Option<InfoHash> {
        if !MANAGED_EVENT_TYPES.contains(&self.event_type.as_str()) {
            return None;
        }
        InfoHash::parse(&self.download_id)
    }
}

#[async_trait]
impl IdentitySource for ArrClient {
    fn label(&self) -> &str {
        self.label
    }

    async fn collect(&self) -> Result<ManagedSet> {
        let entities: Vec<serde_json::Value> = self.get_json(self.entity_path, &[]).await?;
        info!(
            "Found {} {} entries in {}",
            entities.len(),
            self.entity_path,
            self.label
        );

        let page: HistoryPage = self
            .get_json(
                "history",
                &[
                    ("pageSize", self.config.history_page_size.to_string()),
                    ("sortKey", "date".to_string()),
                    ("sortDirection", "descending".to_string()),
                ],
            )
            .await?;

        let mut set = ManagedSet::new(self.label);
        for record in &page.records {
            if let Some(hash) = record.managed_hash() {
                set.insert(hash);
            }
        }

        info!("Found {} {} torrent hashes", set.len(), self.label);
        Ok(set)
    }
}
