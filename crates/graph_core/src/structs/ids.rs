use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GraphError;

/// Identifier of a node: `node-<uuid>`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

/// Identifier of a block within a node: `block-<uuid>`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct BlockId(String);

impl NodeId {
    pub fn generate() -> Self {
        Self(format!("node-{}", Uuid::new_v4()))
    }

    pub fn parse(value: impl Into<String>) -> Result<Self, GraphError> {
        let value = value.into();
        validate_id(&value, "node-")?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl BlockId {
    pub fn generate() -> Self {
        Self(format!("block-{}", Uuid::new_v4()))
    }

    pub fn parse(value: impl Into<String>) -> Result<Self, GraphError> {
        let value = value.into();
        validate_id(&value, "block-")?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_id(value: &str, prefix: &str) -> Result<(), GraphError> {
    let suffix = value.strip_prefix(prefix).ok_or_else(|| {
        GraphError::Validation(format!("id '{value}' does not start with '{prefix}'"))
    })?;
    Uuid::parse_str(suffix)
        .map_err(|_| GraphError::Validation(format!("id '{value}' has a malformed uuid suffix")))?;
    Ok(())
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NodeId {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl TryFrom<String> for BlockId {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<BlockId> for String {
    fn from(id: BlockId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_node_ids_round_trip() {
        let id = NodeId::generate();
        assert!(id.as_str().starts_with("node-"));
        assert_eq!(NodeId::parse(id.as_str().to_string()).unwrap(), id);
    }

    #[test]
    fn rejects_wrong_prefix_and_bad_uuid() {
        assert!(NodeId::parse("block-5bb2a9f0-0000-0000-0000-000000000000").is_err());
        assert!(NodeId::parse("node-not-a-uuid").is_err());
        assert!(BlockId::parse("").is_err());
    }
}
