//! Config artifact mutation.
//!
//! cross-seed reads its blocklist from one field of a JavaScript config
//! file. Only that field is ours to touch; every byte around it must
//! survive a rewrite unchanged. The matching strategy (a regex over the
//! field syntax) is an implementation detail behind the `BlocklistStore`
//! contract.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex::{NoExpand, Regex};
use tracing::warn;

use crate::model::BlockDecision;
use crate::types::{Result, SyncError};

/// Matches the mutable field. `[^\]]*` keeps the match inside one bracket
/// pair; rendered entries never contain `]`.
const BLOCK_LIST_PATTERN: &str = r"blockList:\s*\[[^\]]*\]";

/// Outcome of one apply pass. The three cases are observably distinct: a
/// real update, an idempotent no-op, and a drifted artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The field was found and rewritten; the artifact changed on disk.
    Applied { blocked: usize },
    /// The field was found and already carries exactly this blocklist.
    /// Nothing was written.
    Unchanged { blocked: usize },
    /// The field was not found. Nothing was written - the artifact format
    /// has drifted and the operator needs to look at it.
    FormatDrift,
}

/// Where calculated decisions get persisted.
#[async_trait]
pub trait BlocklistStore: Send + Sync {
    async fn apply(&self, decisions: &[BlockDecision]) -> Result<ApplyOutcome>;
}

/// Render decisions into cross-seed's blockList syntax.
///
/// The empty list renders as the explicit empty literal, never omitted.
/// Entries keep their input order; callers hand them over already sorted.
pub fn render_block_list(decisions: &[BlockDecision]) -> String {
    if decisions.is_empty() {
        return "blockList: []".to_string();
    }

    let entries: Vec<String> = decisions
        .iter()
        .map(|d| format!("\"infoHash:{}\"", d.hash))
        .collect();
    format!("blockList: [\n        {}\n    ]", entries.join(",\n        "))
}

/// The persisted cross-seed configuration file.
#[derive(Debug, Clone)]
pub struct ConfigArtifact {
    path: PathBuf,
}

impl ConfigArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl BlocklistStore for ConfigArtifact {
    async fn apply(&self, decisions: &[BlockDecision]) -> Result<ApplyOutcome> {
        let current = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SyncError::ArtifactUnreadable {
                path: self.path.clone(),
                source: e,
            }
        })?;

        let pattern = Regex::new(BLOCK_LIST_PATTERN).expect("block list pattern is valid");
        if !pattern.is_match(&current) {
            warn!(
                path = %self.path.display(),
                "blockList field not found, leaving artifact untouched"
            );
            return Ok(ApplyOutcome::FormatDrift);
        }

        let rendered = render_block_list(decisions);
        let updated = pattern
            .replacen(&current, 1, NoExpand(&rendered))
            .into_owned();
        if updated == current {
            return Ok(ApplyOutcome::Unchanged {
                blocked: decisions.len(),
            });
        }

        // Temp file next to the artifact, then rename over it, so a crash
        // mid-write cannot leave a truncated config behind.
        let temp = self.temp_path();
        let unwritable = |e| SyncError::ArtifactUnwritable {
            path: self.path.clone(),
            source: e,
        };
        tokio::fs::write(&temp, &updated).await.map_err(unwritable)?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(unwritable)?;

        Ok(ApplyOutcome::Applied {
            blocked: decisions.len(),
        })
    }
}
