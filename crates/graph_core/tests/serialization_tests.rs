//! Tests for the persisted blob format and snapshot round-trips

use graph_core::{
    BlockType, BranchEditRequest, BranchOutcome, BranchingService, GraphSnapshot, GraphStore,
    NodeId, VersionHistoryManager,
};
use serde_json::json;

fn populated_store() -> GraphStore {
    let mut store = GraphStore::new();
    let mut history = VersionHistoryManager::new();

    let root = store.add_root(Some("Topic".to_string()), None).unwrap();
    let child = store.add_child(&root, Some("Follow-up".to_string())).unwrap();
    let prompt = store.add_block(&child, BlockType::Prompt, "Hi").unwrap();
    store.add_block(&child, BlockType::Markdown, "notes").unwrap();

    let outcome = BranchingService::new()
        .create_branch_from_edit(
            &mut store,
            &mut history,
            BranchEditRequest {
                node_id: child,
                block_id: prompt,
                new_content: "Hello".to_string(),
                edit_source: "chat".to_string(),
            },
        )
        .unwrap();
    assert!(matches!(outcome, BranchOutcome::Forked { .. }));

    store.set_canvas(json!({ "zoom": 0.8, "pan": { "x": 12, "y": -4 } }));
    store
}

#[test]
fn test_snapshot_round_trip_preserves_structure() {
    let store = populated_store();
    let blob = serde_json::to_string(&store.to_snapshot()).unwrap();

    let snapshot: GraphSnapshot = serde_json::from_str(&blob).unwrap();
    let restored = GraphStore::from_snapshot(snapshot).unwrap();

    assert_eq!(restored.node_count(), store.node_count());
    assert_eq!(restored.roots(), store.roots());
    for (id, node) in store.nodes() {
        let loaded = restored.node(id).unwrap();
        assert_eq!(loaded.name, node.name);
        assert_eq!(loaded.depth, node.depth);
        assert_eq!(loaded.parent_id, node.parent_id);
        assert_eq!(loaded.branched_from, node.branched_from);
        assert_eq!(loaded.children, node.children);
        assert_eq!(loaded.branches, node.branches);
        assert_eq!(loaded.blocks, node.blocks);
    }
    assert_eq!(restored.canvas(), store.canvas());
    assert!(restored.check_integrity().is_ok());
}

#[test]
fn test_blob_uses_camel_case_and_typed_ids() {
    let store = populated_store();
    let blob = serde_json::to_string(&store.to_snapshot()).unwrap();

    assert!(blob.contains("\"branchedFrom\""));
    assert!(blob.contains("\"parentId\""));
    assert!(blob.contains("\"createdAt\""));
    assert!(blob.contains("\"zIndex\""));
    assert!(blob.contains("\"node-"));
    assert!(blob.contains("\"block-"));
}

#[test]
fn test_missing_canvas_defaults() {
    let snapshot: GraphSnapshot = serde_json::from_str("{\"nodes\":{}}").unwrap();
    assert!(snapshot.canvas.is_null());
    assert!(snapshot.nodes.is_empty());
}

#[test]
fn test_malformed_node_id_is_rejected() {
    let store = populated_store();
    let blob = serde_json::to_string(&store.to_snapshot()).unwrap();
    let corrupted = blob.replacen("node-", "vertex-", 1);

    let result: Result<GraphSnapshot, _> = serde_json::from_str(&corrupted);
    assert!(result.is_err());
}

#[test]
fn test_mismatched_map_key_is_rejected() {
    // A blob whose map key disagrees with the node's embedded id must fail
    // at load; accepting it would leave the root order pointing at a key
    // the node map does not hold.
    let mut store = GraphStore::new();
    store.add_root(Some("Only".to_string()), None).unwrap();

    let mut snapshot = store.to_snapshot();
    let (key, node) = snapshot.nodes.drain().next().unwrap();
    assert_eq!(key, node.id);
    snapshot.nodes.insert(NodeId::generate(), node);

    assert!(GraphStore::from_snapshot(snapshot).is_err());
}

#[test]
fn test_from_snapshot_rejects_inconsistent_tree() {
    let store = populated_store();
    let mut snapshot = store.to_snapshot();

    // Orphan a child list entry.
    let root_id = store.roots()[0].clone();
    snapshot.nodes.get_mut(&root_id).unwrap().children.clear();

    assert!(GraphStore::from_snapshot(snapshot).is_err());
}

#[test]
fn test_root_order_reconstructed_by_creation_time() {
    let mut store = GraphStore::new();
    let first = store.add_root(Some("First".to_string()), None).unwrap();
    let second = store.add_root(Some("Second".to_string()), None).unwrap();
    let third = store.add_root(Some("Third".to_string()), None).unwrap();

    let restored = GraphStore::from_snapshot(store.to_snapshot()).unwrap();
    assert_eq!(restored.roots(), &[first, second, third]);
}
