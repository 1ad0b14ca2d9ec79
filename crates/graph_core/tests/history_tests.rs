//! Tests for the version history manager: ordering, eviction, persistence

use async_trait::async_trait;
use chrono::{Duration, Utc};
use graph_core::traits::persistence::{HistoryLog, HistoryPersistence, PersistenceResult};
use graph_core::{BranchMetadata, BranchReason, HistoryConfig, NodeId, VersionHistoryManager};

fn event(node: &NodeId, offset_secs: i64) -> BranchMetadata {
    BranchMetadata {
        original_node_id: node.clone(),
        new_node_id: NodeId::generate(),
        branch_reason: BranchReason::PromptEdit,
        branch_timestamp: Utc::now() + Duration::seconds(offset_secs),
        edit_source: "chat".to_string(),
    }
}

#[test]
fn test_version_chain_sorted_ascending() {
    let mut history = VersionHistoryManager::new();
    let node = NodeId::generate();

    history.record_branch(event(&node, 30));
    history.record_branch(event(&node, 10));
    history.record_branch(event(&node, 20));

    let chain = history.get_version_chain(&node);
    assert_eq!(chain.len(), 3);
    assert!(chain[0].branch_timestamp < chain[1].branch_timestamp);
    assert!(chain[1].branch_timestamp < chain[2].branch_timestamp);
}

#[test]
fn test_chain_for_unknown_node_is_empty() {
    let history = VersionHistoryManager::new();
    assert!(history.get_version_chain(&NodeId::generate()).is_empty());
}

#[test]
fn test_clear_node_history() {
    let mut history = VersionHistoryManager::new();
    let kept = NodeId::generate();
    let cleared = NodeId::generate();

    history.record_branch(event(&kept, 0));
    history.record_branch(event(&cleared, 1));
    history.record_branch(event(&cleared, 2));

    history.clear_node_history(&cleared);

    assert!(history.get_version_chain(&cleared).is_empty());
    assert_eq!(history.get_version_chain(&kept).len(), 1);
    assert_eq!(history.summary().total_branches, 1);
}

#[test]
fn test_summary() {
    let mut history = VersionHistoryManager::new();
    let a = NodeId::generate();
    let b = NodeId::generate();

    let oldest = event(&a, -100);
    let newest = event(&b, 100);
    history.record_branch(oldest.clone());
    history.record_branch(event(&a, 0));
    history.record_branch(newest.clone());

    let summary = history.summary();
    assert_eq!(summary.total_nodes, 2);
    assert_eq!(summary.total_branches, 3);
    assert_eq!(summary.oldest_branch, Some(oldest.branch_timestamp));
    assert_eq!(summary.newest_branch, Some(newest.branch_timestamp));
}

#[test]
fn test_empty_summary() {
    let history = VersionHistoryManager::new();
    let summary = history.summary();
    assert_eq!(summary.total_nodes, 0);
    assert_eq!(summary.total_branches, 0);
    assert!(summary.oldest_branch.is_none());
    assert!(summary.newest_branch.is_none());
}

#[test]
fn test_eviction_drops_oldest_fifth_globally() {
    let mut history = VersionHistoryManager::with_config(HistoryConfig {
        max_entries: 10,
        cleanup_ratio: 0.8,
    });
    let old_node = NodeId::generate();
    let busy_node = NodeId::generate();

    // The single oldest entry lives under its own node.
    history.record_branch(event(&old_node, 0));
    for i in 1..8 {
        history.record_branch(event(&busy_node, i * 10));
    }

    // Reaching the threshold (8 of 10) evicted the oldest 20% of 8 entries,
    // which is one entry, and pruned its now-empty node key.
    let summary = history.summary();
    assert_eq!(summary.total_branches, 7);
    assert_eq!(summary.total_nodes, 1);
    assert!(history.get_version_chain(&old_node).is_empty());
    assert_eq!(history.get_version_chain(&busy_node).len(), 7);
}

#[test]
fn test_eviction_counts_entries_on_equal_timestamps() {
    let mut history = VersionHistoryManager::with_config(HistoryConfig {
        max_entries: 10,
        cleanup_ratio: 0.8,
    });
    let node = NodeId::generate();
    let now = Utc::now();

    // Eight events sharing one timestamp: eviction at the threshold must
    // still drop exactly 20% of 8, not the whole equal-timestamp cohort.
    for _ in 0..8 {
        let mut burst = event(&node, 0);
        burst.branch_timestamp = now;
        history.record_branch(burst);
    }

    assert_eq!(history.summary().total_branches, 7);
    assert_eq!(history.get_version_chain(&node).len(), 7);
}

#[test]
fn test_entries_survive_node_deletion_elsewhere() {
    // History is independent of the live tree: entries referencing deleted
    // nodes are reported as-is.
    use graph_core::{BlockType, BranchEditRequest, BranchingService, GraphStore};

    let mut store = GraphStore::new();
    let mut history = VersionHistoryManager::new();
    let root = store.add_root(None, None).unwrap();
    let block = store.add_block(&root, BlockType::Prompt, "Hi").unwrap();

    BranchingService::new()
        .create_branch_from_edit(
            &mut store,
            &mut history,
            BranchEditRequest {
                node_id: root.clone(),
                block_id: block,
                new_content: "Hello".to_string(),
                edit_source: "chat".to_string(),
            },
        )
        .unwrap();

    store.delete_node(&root).unwrap();
    assert!(!store.contains(&root));
    assert_eq!(history.get_version_chain(&root).len(), 1);
}

struct FailingStorage;

#[async_trait]
impl HistoryPersistence for FailingStorage {
    async fn load_history(&self) -> PersistenceResult<HistoryLog> {
        Err("disk offline".into())
    }

    async fn save_history(&self, _log: &HistoryLog) -> PersistenceResult<()> {
        Err("disk offline".into())
    }
}

#[tokio::test]
async fn test_load_failure_degrades_to_empty_history() {
    let mut history = VersionHistoryManager::new();
    let node = NodeId::generate();
    history.record_branch(event(&node, 0));

    history.load_from(&FailingStorage).await;

    assert_eq!(history.summary().total_branches, 0);
    assert!(history.get_version_chain(&node).is_empty());
}
