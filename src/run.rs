//! Reconciliation run orchestration.
//!
//! One run is a single sequential pass: collect managed identifiers from
//! every media manager (fork-join, the only concurrency in the core),
//! collect the download-client inventory, compute the blocklist, apply it
//! to the config artifact, restart the consumer. Any collection or
//! artifact failure aborts before the artifact is touched: a blocklist
//! computed from incomplete inputs would block downloads that are merely
//! unreachable, not unwanted.
//!
//! Nothing here retries. A failed run reports, exits non-zero, and leaves
//! the next attempt to the external scheduler.

use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::activate::ActivationTrigger;
use crate::artifact::{ApplyOutcome, BlocklistStore};
use crate::blocklist;
use crate::model::ManagedSet;
use crate::sources::{IdentitySource, InventorySource};
use crate::types::{Result, SyncError};

/// Stages a run moves through, in order. `Failed` is terminal and
/// reachable from every non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    CollectingIdentities,
    CollectingInventory,
    Computing,
    Mutating,
    Activating,
    Done,
    Failed,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Idle => "idle",
            RunStage::CollectingIdentities => "collecting-identities",
            RunStage::CollectingInventory => "collecting-inventory",
            RunStage::Computing => "computing",
            RunStage::Mutating => "mutating",
            RunStage::Activating => "activating",
            RunStage::Done => "done",
            RunStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of one completed run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// (source label, managed hash count) per identity source.
    pub managed_counts: Vec<(String, usize)>,
    pub managed_total: usize,
    pub inventory_total: usize,
    pub blocked: usize,
    pub outcome: ApplyOutcome,
}

impl RunReport {
    /// Torrents still searchable after this run.
    pub fn searchable(&self) -> usize {
        self.inventory_total - self.blocked
    }
}

/// Orchestrates one full reconciliation pass over pluggable collaborators.
pub struct ReconciliationRun {
    identity_sources: Vec<Arc<dyn IdentitySource>>,
    inventory_source: Arc<dyn InventorySource>,
    store: Arc<dyn BlocklistStore>,
    trigger: Arc<dyn ActivationTrigger>,
    protected_category: String,
    stage: RunStage,
}

impl ReconciliationRun {
    pub fn new(
        identity_sources: Vec<Arc<dyn IdentitySource>>,
        inventory_source: Arc<dyn InventorySource>,
        store: Arc<dyn BlocklistStore>,
        trigger: Arc<dyn ActivationTrigger>,
        protected_category: impl Into<String>,
    ) -> Self {
        Self {
            identity_sources,
            inventory_source,
            store,
            trigger,
            protected_category: protected_category.into(),
            stage: RunStage::Idle,
        }
    }

    pub fn stage(&self) -> RunStage {
        self.stage
    }

    fn advance(&mut self, next: RunStage) {
        debug!(from = %self.stage, to = %next, "run stage transition");
        self.stage = next;
    }

    fn fail(&mut self, error: SyncError) -> SyncError {
        self.advance(RunStage::Failed);
        error
    }

    /// Execute the full pass.
    ///
    /// On error the run is left in `Failed` and no later stage has run -
    /// in particular, no source failure ever reaches the artifact.
    pub async fn execute(&mut self) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let started_at = chrono::Utc::now();
        info!(run_id = %run_id, "reconciliation run starting");

        // The identity collections have no data dependency on each other
        // and run fork-join; both must land before anything else happens.
        self.advance(RunStage::CollectingIdentities);
        let collected = try_join_all(self.identity_sources.iter().map(|s| s.collect())).await;
        let sets = match collected {
            Ok(sets) => sets,
            Err(e) => return Err(self.fail(e)),
        };
        let managed_counts: Vec<(String, usize)> = sets
            .iter()
            .map(|s| (s.label().to_string(), s.len()))
            .collect();
        let managed = ManagedSet::union_all(&sets);
        info!("Total managed hashes: {}", managed.len());

        self.advance(RunStage::CollectingInventory);
        let collected = self.inventory_source.collect().await;
        let inventory = match collected {
            Ok(inventory) => inventory,
            Err(e) => return Err(self.fail(e)),
        };

        self.advance(RunStage::Computing);
        let decisions = blocklist::calculate(&inventory, &managed, &self.protected_category);
        info!("Calculated {} torrents to block", decisions.len());

        self.advance(RunStage::Mutating);
        let applied = self.store.apply(&decisions).await;
        let outcome = match applied {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(e)),
        };
        match &outcome {
            ApplyOutcome::Applied { blocked } => {
                info!("Updated blocklist with {} blocked hashes", blocked);
            }
            ApplyOutcome::Unchanged { .. } => {
                info!("Blocklist already up to date, nothing written");
            }
            ApplyOutcome::FormatDrift => {
                warn!("blockList field not found, artifact left untouched");
                return Err(self.fail(SyncError::ArtifactFormatDrift));
            }
        }

        self.advance(RunStage::Activating);
        let activation = self.trigger.activate().await;
        if let Err(e) = activation {
            return Err(self.fail(e));
        }

        self.advance(RunStage::Done);
        Ok(RunReport {
            run_id,
            started_at,
            managed_counts,
            managed_total: managed.len(),
            inventory_total: inventory.len(),
            blocked: decisions.len(),
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockDecision, InfoHash, Inventory, InventoryItem};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn hash(fill: char) -> InfoHash {
        InfoHash::parse(&fill.to_string().repeat(40)).unwrap()
    }

    struct StaticIdentity {
        label: &'static str,
        hashes: Vec<InfoHash>,
        fail: bool,
    }

    #[async_trait]
    impl IdentitySource for StaticIdentity {
        fn label(&self) -> &str {
            self.label
        }

        async fn collect(&self) -> Result<ManagedSet> {
            if self.fail {
                return Err(SyncError::unavailable(self.label, "connection refused"));
            }
            let mut set = ManagedSet::new(self.label);
            for h in &self.hashes {
                set.insert(h.clone());
            }
            Ok(set)
        }
    }

    struct StaticInventory {
        entries: Vec<(InfoHash, &'static str)>,
        fail: bool,
    }

    #[async_trait]
    impl InventorySource for StaticInventory {
        async fn collect(&self) -> Result<Inventory> {
            if self.fail {
                return Err(SyncError::unavailable("qbittorrent", "login rejected"));
            }
            let mut inventory = Inventory::new();
            for (h, category) in &self.entries {
                inventory.insert(
                    h.clone(),
                    InventoryItem {
                        name: h.to_string(),
                        category: category.to_string(),
                        state: String::new(),
                        ratio: 0.0,
                    },
                );
            }
            Ok(inventory)
        }
    }

    struct RecordingStore {
        applies: AtomicUsize,
        last_decisions: Mutex<Vec<BlockDecision>>,
        outcome: ApplyOutcome,
    }

    impl RecordingStore {
        fn new(outcome: ApplyOutcome) -> Self {
            Self {
                applies: AtomicUsize::new(0),
                last_decisions: Mutex::new(Vec::new()),
                outcome,
            }
        }
    }

    #[async_trait]
    impl BlocklistStore for RecordingStore {
        async fn apply(&self, decisions: &[BlockDecision]) -> Result<ApplyOutcome> {
            self.applies.fetch_add(1, Ordering::SeqCst);
            *self.last_decisions.lock().unwrap() = decisions.to_vec();
            Ok(self.outcome.clone())
        }
    }

    struct RecordingTrigger {
        fired: AtomicBool,
    }

    impl RecordingTrigger {
        fn new() -> Self {
            Self {
                fired: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl ActivationTrigger for RecordingTrigger {
        async fn activate(&self) -> Result<()> {
            self.fired.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn make_run(
        identity_sources: Vec<Arc<dyn IdentitySource>>,
        inventory: StaticInventory,
        store: Arc<RecordingStore>,
        trigger: Arc<RecordingTrigger>,
    ) -> ReconciliationRun {
        ReconciliationRun::new(
            identity_sources,
            Arc::new(inventory),
            store,
            trigger,
            "cross-seed-link",
        )
    }

    #[tokio::test]
    async fn test_happy_path_reaches_done() {
        let managed = hash('a');
        let orphan = hash('b');

        let store = Arc::new(RecordingStore::new(ApplyOutcome::Applied { blocked: 1 }));
        let trigger = Arc::new(RecordingTrigger::new());
        let mut run = make_run(
            vec![
                Arc::new(StaticIdentity {
                    label: "radarr",
                    hashes: vec![managed.clone()],
                    fail: false,
                }),
                Arc::new(StaticIdentity {
                    label: "sonarr",
                    hashes: vec![],
                    fail: false,
                }),
            ],
            StaticInventory {
                entries: vec![(managed, ""), (orphan.clone(), "")],
                fail: false,
            },
            Arc::clone(&store),
            Arc::clone(&trigger),
        );

        let report = run.execute().await.unwrap();
        assert_eq!(run.stage(), RunStage::Done);
        assert_eq!(report.managed_total, 1);
        assert_eq!(report.inventory_total, 2);
        assert_eq!(report.blocked, 1);
        assert_eq!(report.searchable(), 1);
        assert_eq!(store.applies.load(Ordering::SeqCst), 1);
        assert!(trigger.fired.load(Ordering::SeqCst));

        let decisions = store.last_decisions.lock().unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].hash, orphan);
    }

    #[tokio::test]
    async fn test_identity_failure_aborts_before_artifact() {
        let store = Arc::new(RecordingStore::new(ApplyOutcome::Applied { blocked: 0 }));
        let trigger = Arc::new(RecordingTrigger::new());
        let mut run = make_run(
            vec![
                Arc::new(StaticIdentity {
                    label: "radarr",
                    hashes: vec![hash('a')],
                    fail: false,
                }),
                Arc::new(StaticIdentity {
                    label: "sonarr",
                    hashes: vec![],
                    fail: true,
                }),
            ],
            StaticInventory {
                entries: vec![(hash('b'), "")],
                fail: false,
            },
            Arc::clone(&store),
            Arc::clone(&trigger),
        );

        let err = run.execute().await.unwrap_err();
        assert!(matches!(err, SyncError::SourceUnavailable { .. }));
        assert_eq!(run.stage(), RunStage::Failed);
        // The artifact was never touched and nothing restarted.
        assert_eq!(store.applies.load(Ordering::SeqCst), 0);
        assert!(!trigger.fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_inventory_failure_aborts_before_artifact() {
        let store = Arc::new(RecordingStore::new(ApplyOutcome::Applied { blocked: 0 }));
        let trigger = Arc::new(RecordingTrigger::new());
        let mut run = make_run(
            vec![Arc::new(StaticIdentity {
                label: "radarr",
                hashes: vec![],
                fail: false,
            })],
            StaticInventory {
                entries: vec![],
                fail: true,
            },
            Arc::clone(&store),
            Arc::clone(&trigger),
        );

        let err = run.execute().await.unwrap_err();
        assert!(matches!(err, SyncError::SourceUnavailable { .. }));
        assert_eq!(run.stage(), RunStage::Failed);
        assert_eq!(store.applies.load(Ordering::SeqCst), 0);
        assert!(!trigger.fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_format_drift_fails_without_activation() {
        let store = Arc::new(RecordingStore::new(ApplyOutcome::FormatDrift));
        let trigger = Arc::new(RecordingTrigger::new());
        let mut run = make_run(
            vec![Arc::new(StaticIdentity {
                label: "radarr",
                hashes: vec![],
                fail: false,
            })],
            StaticInventory {
                entries: vec![(hash('a'), "")],
                fail: false,
            },
            Arc::clone(&store),
            Arc::clone(&trigger),
        );

        let err = run.execute().await.unwrap_err();
        assert!(matches!(err, SyncError::ArtifactFormatDrift));
        assert_eq!(run.stage(), RunStage::Failed);
        assert!(!trigger.fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_protected_category_survives_empty_managed_set() {
        let protected = hash('a');
        let plain = hash('b');

        let store = Arc::new(RecordingStore::new(ApplyOutcome::Applied { blocked: 1 }));
        let trigger = Arc::new(RecordingTrigger::new());
        let mut run = make_run(
            vec![Arc::new(StaticIdentity {
                label: "radarr",
                hashes: vec![],
                fail: false,
            })],
            StaticInventory {
                entries: vec![(protected, "cross-seed-link"), (plain.clone(), "")],
                fail: false,
            },
            Arc::clone(&store),
            Arc::clone(&trigger),
        );

        run.execute().await.unwrap();
        let decisions = store.last_decisions.lock().unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].hash, plain);
    }

    #[tokio::test]
    async fn test_unchanged_apply_still_activates() {
        let store = Arc::new(RecordingStore::new(ApplyOutcome::Unchanged { blocked: 0 }));
        let trigger = Arc::new(RecordingTrigger::new());
        let mut run = make_run(
            vec![Arc::new(StaticIdentity {
                label: "radarr",
                hashes: vec![],
                fail: false,
            })],
            StaticInventory {
                entries: vec![],
                fail: false,
            },
            Arc::clone(&store),
            Arc::clone(&trigger),
        );

        let report = run.execute().await.unwrap();
        assert_eq!(report.outcome, ApplyOutcome::Unchanged { blocked: 0 });
        assert!(trigger.fired.load(Ordering::SeqCst));
    }
}
