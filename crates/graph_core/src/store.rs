//! The authoritative node/block registry.
//!
//! All structural mutation of the conversation tree goes through
//! `GraphStore`; every other component reads snapshots. Operations are
//! synchronous and run to completion, so a caller issuing edits
//! back-to-back always observes each mutation fully applied.

use std::collections::HashMap;

use crate::error::{GraphError, IntegrityError, Result};
use crate::integrity;
use crate::structs::block::{Block, BlockType};
use crate::structs::ids::{BlockId, NodeId};
use crate::structs::node::{Node, NodePosition, ParentLink};
use crate::structs::snapshot::GraphSnapshot;

const DEFAULT_NODE_NAME: &str = "Untitled";
const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Default, Clone)]
pub struct GraphStore {
    nodes: HashMap<NodeId, Node>,
    /// Root order, used by the layout engine to place trees left-to-right.
    roots: Vec<NodeId>,
    /// Host canvas/view state, carried through snapshots uninterpreted.
    canvas: serde_json::Value,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root node at depth 0.
    pub fn add_root(
        &mut self,
        name: Option<String>,
        position: Option<NodePosition>,
    ) -> Result<NodeId> {
        let name = validate_name(name)?;
        if let Some(position) = &position {
            if !position.is_finite() {
                return Err(GraphError::Validation(
                    "position coordinates must be finite".to_string(),
                ));
            }
        }

        let id = NodeId::generate();
        let mut node = Node::new(id.clone(), name);
        if let Some(position) = position {
            node.position = position;
        }
        self.nodes.insert(id.clone(), node);
        self.roots.push(id.clone());

        tracing::info!(node_id = %id, "GraphStore: root added");
        self.debug_validate();
        Ok(id)
    }

    /// Create a structural child one level below `parent_id`.
    pub fn add_child(&mut self, parent_id: &NodeId, name: Option<String>) -> Result<NodeId> {
        let name = validate_name(name)?;
        let parent_depth = self
            .nodes
            .get(parent_id)
            .ok_or_else(|| GraphError::NodeNotFound(parent_id.clone()))?
            .depth;

        let id = NodeId::generate();
        let mut node = Node::new(id.clone(), name);
        node.parent_id = Some(parent_id.clone());
        node.depth = parent_depth + 1;
        self.nodes.insert(id.clone(), node);

        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.children.push(id.clone());
            parent.touch();
        }

        tracing::info!(node_id = %id, parent_id = %parent_id, "GraphStore: child added");
        self.debug_validate();
        Ok(id)
    }

    /// Register a fork of `source_id` carrying `cloned_blocks`.
    ///
    /// The new node shares the source's depth and structural parent id,
    /// starts with empty children/branches, and is appended to the source's
    /// `branches` list. The node is only inserted once fully constructed, so
    /// a failure never leaves a partial node behind.
    pub fn add_branch(&mut self, source_id: &NodeId, cloned_blocks: Vec<Block>) -> Result<NodeId> {
        let source = self
            .nodes
            .get(source_id)
            .ok_or_else(|| GraphError::NodeNotFound(source_id.clone()))?;

        let id = NodeId::generate();
        let mut node = Node::new(id.clone(), source.name.clone());
        node.parent_id = source.parent_id.clone();
        node.branched_from = Some(source_id.clone());
        node.depth = source.depth;
        node.position = source.position;
        node.blocks = cloned_blocks;
        for (position, block) in node.blocks.iter_mut().enumerate() {
            block.position = position;
        }

        self.nodes.insert(id.clone(), node);
        if let Some(source) = self.nodes.get_mut(source_id) {
            source.branches.push(id.clone());
            source.touch();
        }

        tracing::info!(node_id = %id, source_id = %source_id, "GraphStore: branch added");
        self.debug_validate();
        Ok(id)
    }

    /// Delete a node and its entire structural subtree.
    ///
    /// Branch nodes hanging off any deleted node are not part of the
    /// cascade; they are promoted to roots of their own sub-trees, with
    /// depths recomputed from zero.
    pub fn delete_node(&mut self, id: &NodeId) -> Result<()> {
        let edge = self
            .nodes
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?
            .edge();

        // Detach from the parent side first.
        match edge {
            Some(ParentLink::Structural(parent_id)) => {
                if let Some(parent) = self.nodes.get_mut(&parent_id) {
                    parent.children.retain(|c| c != id);
                    parent.touch();
                }
            }
            Some(ParentLink::Branch(source_id)) => {
                if let Some(source) = self.nodes.get_mut(&source_id) {
                    source.branches.retain(|b| b != id);
                    source.touch();
                }
            }
            None => self.roots.retain(|r| r != id),
        }

        // Collect the structural subtree iteratively. Branch nodes never
        // appear in a `children` list, so they are never collected here.
        let mut doomed = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().cloned());
            }
            doomed.push(current);
        }

        let mut promoted = Vec::new();
        for doomed_id in &doomed {
            if let Some(node) = self.nodes.get(doomed_id) {
                promoted.extend(node.branches.iter().cloned());
            }
        }
        for branch_id in &promoted {
            self.promote_to_root(branch_id);
        }

        // A surviving branch node deeper in a promoted sub-tree may still
        // anchor its structural position on a node that is going away;
        // clear those references so nothing dangles.
        let doomed_set: std::collections::HashSet<&NodeId> = doomed.iter().collect();
        for node in self.nodes.values_mut() {
            if doomed_set.contains(&node.id) {
                continue;
            }
            if let Some(parent_id) = &node.parent_id {
                if doomed_set.contains(parent_id) {
                    node.parent_id = None;
                    node.touch();
                }
            }
        }

        for doomed_id in &doomed {
            self.nodes.remove(doomed_id);
        }

        tracing::info!(
            node_id = %id,
            removed = doomed.len(),
            promoted = promoted.len(),
            "GraphStore: node deleted"
        );
        self.debug_validate();
        Ok(())
    }

    /// Move a node to an author-chosen position.
    pub fn move_node(&mut self, id: &NodeId, position: NodePosition) -> Result<()> {
        if !position.is_finite() {
            return Err(GraphError::Validation(
                "position coordinates must be finite".to_string(),
            ));
        }
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        node.position = position;
        node.touch();

        tracing::debug!(node_id = %id, x = position.x, y = position.y, "GraphStore: node moved");
        self.debug_validate();
        Ok(())
    }

    /// Rename a node's display label.
    pub fn rename_node(&mut self, id: &NodeId, name: impl Into<String>) -> Result<()> {
        let name = validate_name(Some(name.into()))?;
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        node.name = name;
        node.touch();

        tracing::debug!(node_id = %id, "GraphStore: node renamed");
        self.debug_validate();
        Ok(())
    }

    /// Append a block at the next contiguous position.
    pub fn add_block(
        &mut self,
        node_id: &NodeId,
        block_type: BlockType,
        content: impl Into<String>,
    ) -> Result<BlockId> {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))?;
        let block = Block::new(block_type, content, node.blocks.len());
        let block_id = block.id.clone();
        node.blocks.push(block);
        node.touch();

        tracing::info!(
            node_id = %node_id,
            block_id = %block_id,
            block_type = ?block_type,
            "GraphStore: block added"
        );
        self.debug_validate();
        Ok(block_id)
    }

    /// Remove a block and renumber the remainder to stay contiguous.
    pub fn delete_block(&mut self, node_id: &NodeId, block_id: &BlockId) -> Result<()> {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))?;
        let index = node
            .blocks
            .iter()
            .position(|b| &b.id == block_id)
            .ok_or_else(|| GraphError::BlockNotFound(block_id.clone()))?;
        node.blocks.remove(index);
        for (position, block) in node.blocks.iter_mut().enumerate() {
            block.position = position;
        }
        node.touch();

        tracing::info!(node_id = %node_id, block_id = %block_id, "GraphStore: block deleted");
        self.debug_validate();
        Ok(())
    }

    /// Replace a block's content in place. Id and position are unchanged;
    /// this is the non-destructive half of the edit policy.
    pub fn update_block_content(
        &mut self,
        node_id: &NodeId,
        block_id: &BlockId,
        content: impl Into<String>,
    ) -> Result<()> {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))?;
        let block = node
            .blocks
            .iter_mut()
            .find(|b| &b.id == block_id)
            .ok_or_else(|| GraphError::BlockNotFound(block_id.clone()))?;
        block.content = content.into();
        block.metadata.modified_at = chrono::Utc::now();
        node.touch();

        tracing::debug!(node_id = %node_id, block_id = %block_id, "GraphStore: block content updated");
        self.debug_validate();
        Ok(())
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn nodes(&self) -> &HashMap<NodeId, Node> {
        &self.nodes
    }

    pub fn canvas(&self) -> &serde_json::Value {
        &self.canvas
    }

    pub fn set_canvas(&mut self, canvas: serde_json::Value) {
        self.canvas = canvas;
    }

    /// Serialize the registry into the persisted blob shape.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            canvas: self.canvas.clone(),
        }
    }

    /// Rebuild a store from a persisted blob, validating names and full
    /// tree integrity. Root order is reconstructed from creation time
    /// (id as tiebreak), matching the order they were first added in.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        for node in snapshot.nodes.values() {
            validate_name(Some(node.name.clone()))?;
        }

        let mut root_nodes: Vec<&Node> = snapshot.nodes.values().filter(|n| n.is_root()).collect();
        root_nodes.sort_by(|a, b| {
            a.metadata
                .created_at
                .cmp(&b.metadata.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        let roots = root_nodes.into_iter().map(|n| n.id.clone()).collect();

        let store = Self {
            nodes: snapshot.nodes,
            roots,
            canvas: snapshot.canvas,
        };
        store.check_integrity()?;
        Ok(store)
    }

    /// Full integrity check: the node-map invariants plus consistency of
    /// the root order. Exposed for tests and defensive hosts.
    pub fn check_integrity(&self) -> std::result::Result<(), IntegrityError> {
        integrity::validate(&self.nodes)?;
        let mut seen = std::collections::HashSet::new();
        for root_id in &self.roots {
            let is_root = self.nodes.get(root_id).is_some_and(|n| n.is_root());
            if !is_root || !seen.insert(root_id) {
                return Err(IntegrityError::InconsistentParent {
                    node_id: root_id.clone(),
                    parent_id: root_id.clone(),
                });
            }
        }
        let root_count = self.nodes.values().filter(|n| n.is_root()).count();
        if root_count != self.roots.len() {
            if let Some(missing) = self
                .nodes
                .values()
                .find(|n| n.is_root() && !self.roots.contains(&n.id))
            {
                return Err(IntegrityError::InconsistentParent {
                    node_id: missing.id.clone(),
                    parent_id: missing.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Promote a surviving branch node to a root after its fork source was
    /// deleted (open-question decision: promote, never cascade and never
    /// reject). Depths are recomputed through its whole sub-tree.
    fn promote_to_root(&mut self, id: &NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent_id = None;
            node.branched_from = None;
            node.touch();
        }
        self.roots.push(id.clone());
        self.recompute_depths(id);
        tracing::info!(node_id = %id, "GraphStore: branch promoted to root");
    }

    /// Walk a sub-tree assigning depths: structural children are one level
    /// deeper, branch nodes share their source's depth.
    fn recompute_depths(&mut self, root: &NodeId) {
        let mut stack = vec![(root.clone(), 0u32)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            node.depth = depth;
            for child in node.children.clone() {
                stack.push((child, depth + 1));
            }
            for branch in node.branches.clone() {
                stack.push((branch, depth));
            }
        }
    }

    /// Integrity violations after a mutation are engine defects. Checked in
    /// debug and test builds only.
    fn debug_validate(&self) {
        #[cfg(debug_assertions)]
        if let Err(err) = self.check_integrity() {
            panic!("graph integrity violated after mutation: {err}");
        }
    }
}

fn validate_name(name: Option<String>) -> Result<String> {
    let name = name.unwrap_or_else(|| DEFAULT_NODE_NAME.to_string());
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(GraphError::Validation(format!(
            "node name must be 1-{MAX_NAME_LEN} characters, got {len}"
        )));
    }
    Ok(name)
}
