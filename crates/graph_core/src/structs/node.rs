use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::structs::block::Block;
use crate::structs::ids::NodeId;

/// A vertex in the conversation tree.
///
/// A node has two distinct kinds of descendants: structural `children`
/// (one level deeper) and `branches` (forked versions sharing this node's
/// depth). The node/block registry is exclusively owned by GraphStore;
/// other components read snapshots but never mutate nodes directly.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    /// Display label, 1-100 characters.
    pub name: String,
    /// The structural-position parent. For a branch node this is the parent
    /// of the node it was forked from, which is why a branch of a root has
    /// no parent id at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    /// Set if and only if this node appears in some node's `branches` list.
    /// Mutually exclusive with appearing in any `children` list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branched_from: Option<NodeId>,
    /// Structural descendants, in display order.
    #[serde(default)]
    pub children: Vec<NodeId>,
    /// Forked versions of this node, in creation order.
    #[serde(default)]
    pub branches: Vec<NodeId>,
    pub blocks: Vec<Block>,
    pub position: NodePosition,
    /// Roots are depth 0, structural children are parent depth + 1, branch
    /// nodes share the depth of the node they forked from.
    pub depth: u32,
    pub metadata: NodeMetadata,
}

/// The single tagged view of a node's incoming edge (data-model redesign:
/// one relation with a tag, not two lists interpreted independently).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParentLink {
    /// Ordinary child: listed in `parent.children`.
    Structural(NodeId),
    /// Fork sibling: listed in `source.branches`, shares the source's depth.
    Branch(NodeId),
}

impl Node {
    pub(crate) fn new(id: NodeId, name: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            parent_id: None,
            branched_from: None,
            children: Vec::new(),
            branches: Vec::new(),
            blocks: Vec::new(),
            position: NodePosition::default(),
            depth: 0,
            metadata: NodeMetadata {
                created_at: now,
                modified_at: now,
                version: 1,
            },
        }
    }

    /// The tagged edge this node hangs from. A set `branched_from` always
    /// wins: a branch node keeps its source's `parent_id` for structural
    /// placement, but its membership edge is the branch edge.
    pub fn edge(&self) -> Option<ParentLink> {
        match (&self.branched_from, &self.parent_id) {
            (Some(source), _) => Some(ParentLink::Branch(source.clone())),
            (None, Some(parent)) => Some(ParentLink::Structural(parent.clone())),
            (None, None) => None,
        }
    }

    /// True for nodes that belong in the root order: no structural parent
    /// and not a fork of anything.
    pub fn is_root(&self) -> bool {
        self.edge().is_none()
    }

    pub fn block(&self, id: &crate::structs::ids::BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    pub(crate) fn touch(&mut self) {
        self.metadata.modified_at = Utc::now();
        self.metadata.version += 1;
    }
}

/// Author-visible layout coordinates. Recomputed by the layout engine,
/// otherwise opaque to the rest of the engine.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z_index: i32,
}

impl NodePosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z_index: 0 }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// Monotonically increasing; bumped on every mutation of the node.
    pub version: u64,
}
