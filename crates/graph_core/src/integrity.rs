//! Structural integrity checks for the node registry.
//!
//! Pure functions over the id-keyed node map. GraphStore runs these in
//! debug builds after every mutation; a failure there is an engine defect,
//! not bad input.

use std::collections::{HashMap, HashSet};

use crate::error::IntegrityError;
use crate::structs::ids::NodeId;
use crate::structs::node::{Node, ParentLink};

/// Validate the whole registry, failing on the first violation found.
///
/// Checks, in order per node: the map key matches the node's embedded id,
/// the tagged parent edge resolves and is mirrored by the parent's
/// membership list, the membership lists point back at this node, block
/// positions are contiguous from zero, and the structural children
/// relation is acyclic. Branch edges never participate in cycle formation,
/// so the traversal descends through `children` only.
pub fn validate(nodes: &HashMap<NodeId, Node>) -> Result<(), IntegrityError> {
    for (key, node) in nodes {
        if key != &node.id {
            return Err(IntegrityError::IdMismatch {
                key: key.clone(),
                node_id: node.id.clone(),
            });
        }
        check_edge(nodes, node)?;
        check_memberships(nodes, node)?;
        check_blocks(node)?;
    }
    check_acyclic(nodes)
}

fn check_edge(nodes: &HashMap<NodeId, Node>, node: &Node) -> Result<(), IntegrityError> {
    let Some(edge) = node.edge() else {
        return Ok(());
    };
    match edge {
        ParentLink::Structural(parent_id) => {
            let parent =
                nodes
                    .get(&parent_id)
                    .ok_or_else(|| IntegrityError::MissingParent {
                        node_id: node.id.clone(),
                        parent_id: parent_id.clone(),
                    })?;
            if !parent.children.contains(&node.id) || parent.branches.contains(&node.id) {
                return Err(IntegrityError::InconsistentParent {
                    node_id: node.id.clone(),
                    parent_id,
                });
            }
        }
        ParentLink::Branch(source_id) => {
            let source =
                nodes
                    .get(&source_id)
                    .ok_or_else(|| IntegrityError::MissingParent {
                        node_id: node.id.clone(),
                        parent_id: source_id.clone(),
                    })?;
            if !source.branches.contains(&node.id) || source.children.contains(&node.id) {
                return Err(IntegrityError::InconsistentParent {
                    node_id: node.id.clone(),
                    parent_id: source_id,
                });
            }
        }
    }
    Ok(())
}

fn check_memberships(nodes: &HashMap<NodeId, Node>, node: &Node) -> Result<(), IntegrityError> {
    let mut seen = HashSet::new();
    for child_id in node.children.iter().chain(node.branches.iter()) {
        if !seen.insert(child_id) {
            return Err(IntegrityError::InconsistentParent {
                node_id: child_id.clone(),
                parent_id: node.id.clone(),
            });
        }
    }
    for child_id in &node.children {
        let child = nodes.get(child_id);
        let points_back =
            child.is_some_and(|c| c.edge() == Some(ParentLink::Structural(node.id.clone())));
        if !points_back {
            return Err(IntegrityError::InconsistentParent {
                node_id: child_id.clone(),
                parent_id: node.id.clone(),
            });
        }
    }
    for branch_id in &node.branches {
        let branch = nodes.get(branch_id);
        let points_back =
            branch.is_some_and(|b| b.edge() == Some(ParentLink::Branch(node.id.clone())));
        if !points_back {
            return Err(IntegrityError::InconsistentParent {
                node_id: branch_id.clone(),
                parent_id: node.id.clone(),
            });
        }
    }
    Ok(())
}

fn check_blocks(node: &Node) -> Result<(), IntegrityError> {
    for (expected, block) in node.blocks.iter().enumerate() {
        if block.position != expected {
            return Err(IntegrityError::NonContiguousBlocks {
                node_id: node.id.clone(),
            });
        }
    }
    Ok(())
}

/// Iterative DFS with an explicit stack, a current-path set, and a
/// globally-visited set, so traversal depth is bounded by heap, not the
/// call stack.
fn check_acyclic(nodes: &HashMap<NodeId, Node>) -> Result<(), IntegrityError> {
    enum Frame<'a> {
        Enter(&'a NodeId),
        Exit(&'a NodeId),
    }

    let mut visited: HashSet<&NodeId> = HashSet::new();
    let mut on_path: HashSet<&NodeId> = HashSet::new();

    for start in nodes.keys() {
        if visited.contains(start) {
            continue;
        }
        let mut stack = vec![Frame::Enter(start)];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(id) => {
                    if on_path.contains(id) {
                        return Err(IntegrityError::CycleDetected {
                            node_id: id.clone(),
                        });
                    }
                    if !visited.insert(id) {
                        continue;
                    }
                    on_path.insert(id);
                    stack.push(Frame::Exit(id));
                    if let Some(node) = nodes.get(id) {
                        for child_id in node.children.iter().rev() {
                            stack.push(Frame::Enter(child_id));
                        }
                    }
                }
                Frame::Exit(id) => {
                    on_path.remove(id);
                }
            }
        }
    }
    Ok(())
}
