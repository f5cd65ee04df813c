//! Render collaborator
//!
//! The native view tree lives outside the DOM core. At the end of every
//! batch the root replays its pending operations through this trait, in a
//! fixed order: structure, listener registrations, layout, end of batch.

use std::sync::Arc;

use crate::{CallFunctionCallback, DomArgument, DomNode, RootNode};

/// Render tree capability consumed by the DOM core
pub trait RenderManager: Send + Sync {
    /// Materialize newly attached nodes
    fn create_render_node(&self, root: &Arc<RootNode>, nodes: &[Arc<DomNode>]);

    /// Apply property changes; each node carries its `diff_style` and `delete_props`
    fn update_render_node(&self, root: &Arc<RootNode>, nodes: &[Arc<DomNode>]);

    /// Tear down detached nodes
    fn delete_render_node(&self, root: &Arc<RootNode>, nodes: &[Arc<DomNode>]);

    /// Apply new geometry to nodes whose layout changed
    fn update_layout(&self, root: &Arc<RootNode>, nodes: &[Arc<DomNode>]);

    /// Start delivering `name` events for `node`
    fn add_event_listener(&self, root: &Arc<RootNode>, node: &Arc<DomNode>, name: &str);

    /// Stop delivering `name` events for `node`
    fn remove_event_listener(&self, root: &Arc<RootNode>, node: &Arc<DomNode>, name: &str);

    /// Invoke a named native function on `node`
    fn call_function(
        &self,
        _root: &Arc<RootNode>,
        _node: &Arc<DomNode>,
        _name: &str,
        _param: &DomArgument,
        _cb: CallFunctionCallback,
    ) {
    }

    fn before_layout(&self, _root: &Arc<RootNode>) {}

    fn after_layout(&self, _root: &Arc<RootNode>) {}

    /// Signal that every operation of the batch has been delivered
    fn end_batch(&self, root: &Arc<RootNode>);
}
