//! Mutation interceptors

use std::sync::Arc;

use crate::DomNode;

/// Observer invoked with each incoming batch before the tree accepts it.
///
/// Interceptors see the proposals exactly as submitted, including ones the
/// tree will go on to skip. They cannot veto a batch.
pub trait DomActionInterceptor: Send + Sync {
    fn on_dom_node_create(&self, nodes: &[Arc<DomNode>]);

    fn on_dom_node_update(&self, nodes: &[Arc<DomNode>]);

    fn on_dom_node_delete(&self, nodes: &[Arc<DomNode>]);
}
