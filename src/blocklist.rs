//! Blocklist calculation.
//!
//! Pure set difference between the download-client inventory and the union
//! of managed identifier sets. No I/O; everything this module needs was
//! collected before it runs.

use std::collections::HashSet;

use tracing::debug;

use crate::model::{BlockDecision, BlockReason, InfoHash, Inventory};

/// Compute which inventory entries should be excluded from automated
/// search.
///
/// Items carrying `protected_category` are the client's own cross-seed
/// injected copies and are never blocked - blocking them would undo the
/// injection this tool exists to protect. Every other item whose identifier
/// is absent from `managed` produces a decision.
///
/// Iteration order over the inventory is stable, so identical inputs yield
/// an identical decision list. Consumers verifying correctness should still
/// treat the result as a set.
pub fn calculate(
    inventory: &Inventory,
    managed: &HashSet<InfoHash>,
    protected_category: &str,
) -> Vec<BlockDecision> {
    let mut decisions = Vec::new();

    for (hash, item) in inventory {
        if item.category == protected_category {
            continue;
        }

        if !managed.contains(hash) {
            debug!(
                hash = %hash,
                name = %item.name,
                category = %item.category,
                "blocking unmanaged torrent"
            );
            decisions.push(BlockDecision {
                hash: hash.clone(),
                name: item.name.clone(),
                category: item.category.clone(),
                reason: BlockReason::Unmanaged,
            });
        }
    }

    decisions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InventoryItem, ManagedSet};

    fn hash(fill: char) -> InfoHash {
        InfoHash::parse(&fill.to_string().repeat(40)).unwrap()
    }

    fn item(name: &str, category: &str) -> InventoryItem {
        InventoryItem {
            name: name.to_string(),
            category: category.to_string(),
            state: "uploading".to_string(),
            ratio: 1.0,
        }
    }

    #[test]
    fn test_union_exclusion_property() {
        // Everything in M1 or M2 survives; everything else is blocked.
        let managed_by_radarr = hash('a');
        let managed_by_sonarr = hash('b');
        let orphan = hash('c');

        let mut inventory = Inventory::new();
        inventory.insert(managed_by_radarr.clone(), item("movie", "movies"));
        inventory.insert(managed_by_sonarr.clone(), item("episode", "tv"));
        inventory.insert(orphan.clone(), item("deleted", "movies"));

        let mut radarr = ManagedSet::new("radarr");
        radarr.insert(managed_by_radarr);
        let mut sonarr = ManagedSet::new("sonarr");
        sonarr.insert(managed_by_sonarr);
        let managed = ManagedSet::union_all(&[radarr, sonarr]);

        let decisions = calculate(&inventory, &managed, "cross-seed-link");
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].hash, orphan);
        assert_eq!(decisions[0].reason, BlockReason::Unmanaged);
    }

    #[test]
    fn test_protected_category_exempt_even_when_unmanaged() {
        // Nothing managed at all: the injected copy survives, the plain
        // torrent is blocked.
        let a = hash('a');
        let b = hash('b');

        let mut inventory = Inventory::new();
        inventory.insert(a, item("injected copy", "cross-seed-link"));
        inventory.insert(b.clone(), item("plain torrent", ""));

        let decisions = calculate(&inventory, &HashSet::new(), "cross-seed-link");
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].hash, b);
    }

    #[test]
    fn test_empty_inventory_yields_nothing() {
        let mut managed = HashSet::new();
        managed.insert(hash('a'));

        let decisions = calculate(&Inventory::new(), &managed, "cross-seed-link");
        assert!(decisions.is_empty());
    }

    #[test]
    fn test_empty_managed_set_blocks_everything_unprotected() {
        // Intended behavior: an empty managed set blocks the whole
        // inventory. Guarding against unreachable managers happens upstream
        // in the orchestrator's fail-fast, not here.
        let mut inventory = Inventory::new();
        inventory.insert(hash('a'), item("one", "movies"));
        inventory.insert(hash('b'), item("two", "tv"));

        let decisions = calculate(&inventory, &HashSet::new(), "cross-seed-link");
        assert_eq!(decisions.len(), 2);
    }

    #[test]
    fn test_output_order_is_deterministic() {
        let mut inventory = Inventory::new();
        inventory.insert(hash('c'), item("three", ""));
        inventory.insert(hash('a'), item("one", ""));
        inventory.insert(hash('b'), item("two", ""));

        let decisions = calculate(&inventory, &HashSet::new(), "cross-seed-link");
        let hashes: Vec<&str> = decisions.iter().map(|d| d.hash.as_str()).collect();
        let mut sorted = hashes.clone();
        sorted.sort();
        assert_eq!(hashes, sorted);
    }
}
