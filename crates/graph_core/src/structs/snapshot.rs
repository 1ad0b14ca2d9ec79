use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::structs::ids::NodeId;
use crate::structs::node::Node;

/// The unit persisted and loaded via the persistence collaborator: the full
/// node map plus the host's canvas/view state, which the engine carries but
/// never interprets.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct GraphSnapshot {
    pub nodes: HashMap<NodeId, Node>,
    #[serde(default)]
    pub canvas: serde_json::Value,
}
