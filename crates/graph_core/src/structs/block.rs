use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::structs::branch::BranchReason;
use crate::structs::ids::BlockId;

/// An ordered content unit inside a node. `position` is zero-based and
/// contiguous within the owning node; GraphStore renumbers on deletion.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: String,
    pub position: usize,
    #[serde(default)]
    pub dimensions: BlockDimensions,
    pub metadata: BlockMetadata,
}

/// The closed set of block kinds. The branching policy only cares about the
/// promptable/non-promptable split; the finer kinds drive rendering and the
/// recorded branch reason.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Prompt,
    Response,
    Markdown,
    Code,
}

impl BlockType {
    /// Promptable blocks carry the conversation itself; editing one forks a
    /// new version instead of mutating in place.
    pub fn is_promptable(&self) -> bool {
        matches!(self, BlockType::Prompt | BlockType::Response)
    }

    /// The reason recorded in branch history when an edit to a block of this
    /// type forks. `None` for non-promptable kinds.
    pub fn branch_reason(&self) -> Option<BranchReason> {
        match self {
            BlockType::Prompt => Some(BranchReason::PromptEdit),
            BlockType::Response => Some(BranchReason::ResponseEdit),
            BlockType::Markdown | BlockType::Code => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct BlockDimensions {
    pub width: f64,
    pub height: f64,
}

impl Default for BlockDimensions {
    fn default() -> Self {
        Self {
            width: 280.0,
            height: 80.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockMetadata {
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Block {
    pub fn new(block_type: BlockType, content: impl Into<String>, position: usize) -> Self {
        let now = Utc::now();
        Self {
            id: BlockId::generate(),
            block_type,
            content: content.into(),
            position,
            dimensions: BlockDimensions::default(),
            metadata: BlockMetadata {
                created_at: now,
                modified_at: now,
            },
        }
    }
}
