//! Pending render operations
//!
//! The root records what each batch changed and replays it to the render
//! manager at the end of the batch, in the order it was recorded.

use std::sync::Arc;

use crate::DomNode;

/// Structural operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomOperationKind {
    Create,
    Update,
    Delete,
}

/// Structural operation over a set of nodes
#[derive(Debug, Clone)]
pub struct DomOperation {
    pub kind: DomOperationKind,
    pub nodes: Vec<Arc<DomNode>>,
}

impl DomOperation {
    pub fn new(kind: DomOperationKind, nodes: Vec<Arc<DomNode>>) -> Self {
        Self { kind, nodes }
    }

    /// Ids of the affected nodes, in order
    pub fn node_ids(&self) -> Vec<u32> {
        self.nodes.iter().map(|n| n.id()).collect()
    }
}

/// Listener registration operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOperationKind {
    Add,
    Remove,
}

/// Listener registration change on one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOperation {
    pub kind: EventOperationKind,
    pub id: u32,
    pub name: String,
}

impl EventOperation {
    pub fn new(kind: EventOperationKind, id: u32, name: &str) -> Self {
        Self {
            kind,
            id,
            name: name.to_string(),
        }
    }
}
