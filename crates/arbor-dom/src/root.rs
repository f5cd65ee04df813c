//! Root Node - the document
//!
//! Owns one tree, indexes it by id, and queues what each batch changed until
//! the render manager is synced. Every mutation here is expected to run on
//! the document's dom runner; events are handed to the delegate event runner
//! and never run inline.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock, Weak};

use arbor_task::TaskRunner;

use crate::dispatch::Propagation;
use crate::sync::{lock, read, write};
use crate::{
    diff_props, CallFunctionCallback, DomArgument, DomEvent, DomNode, DomOperation,
    DomOperationKind, EventCallback, EventOperation, EventOperationKind, LayoutEngine, LayoutSize,
    ListenerId, RenderManager, DOM_CREATED, DOM_DELETED, DOM_TREE_CREATED, DOM_TREE_DELETED,
    DOM_TREE_UPDATED, DOM_UPDATED,
};

/// Document root
pub struct RootNode {
    node: Arc<DomNode>,
    /// Non-owning id index; only parent -> child edges own nodes
    nodes: Mutex<HashMap<u32, Weak<DomNode>>>,
    dom_operations: Mutex<Vec<DomOperation>>,
    event_operations: Mutex<Vec<EventOperation>>,
    root_size: Mutex<LayoutSize>,
    delegate_task_runner: RwLock<Weak<TaskRunner>>,
    layout_engine: RwLock<Option<Arc<dyn LayoutEngine>>>,
}

impl fmt::Debug for RootNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootNode")
            .field("id", &self.id())
            .field("nodes", &lock(&self.nodes).len())
            .field("dom_operations", &lock(&self.dom_operations).len())
            .field("event_operations", &lock(&self.event_operations).len())
            .field("root_size", &*lock(&self.root_size))
            .finish()
    }
}

impl RootNode {
    /// Create an empty document whose root node has `id`
    pub fn new(id: u32) -> Arc<Self> {
        Arc::new(Self {
            node: DomNode::builder(id).build(),
            nodes: Mutex::new(HashMap::new()),
            dom_operations: Mutex::new(Vec::new()),
            event_operations: Mutex::new(Vec::new()),
            root_size: Mutex::new(LayoutSize::default()),
            delegate_task_runner: RwLock::new(Weak::new()),
            layout_engine: RwLock::new(None),
        })
    }

    pub fn id(&self) -> u32 {
        self.node.id()
    }

    /// The root node of the tree
    pub fn node(&self) -> &Arc<DomNode> {
        &self.node
    }

    /// Set the runner that delivers events
    pub fn set_delegate_task_runner(&self, runner: &Arc<TaskRunner>) {
        *write(&self.delegate_task_runner) = Arc::downgrade(runner);
    }

    pub fn set_layout_engine(&self, engine: Arc<dyn LayoutEngine>) {
        *write(&self.layout_engine) = Some(engine);
        self.node.mark_layout_dirty();
    }

    pub fn root_size(&self) -> LayoutSize {
        *lock(&self.root_size)
    }

    /// Set the space available to layout
    pub fn set_root_size(&self, width: f32, height: f32) {
        *lock(&self.root_size) = LayoutSize::new(width, height);
        self.node.mark_layout_dirty();
    }

    /// Resolve a node by id; expired or unknown ids resolve to `None`
    pub fn get_node(&self, id: u32) -> Option<Arc<DomNode>> {
        if id == self.id() {
            return Some(Arc::clone(&self.node));
        }
        lock(&self.nodes).get(&id).and_then(Weak::upgrade)
    }

    /// Number of live indexed nodes, not counting the root
    pub fn node_count(&self) -> usize {
        lock(&self.nodes)
            .values()
            .filter(|node| node.strong_count() > 0)
            .count()
    }

    /// Structural operations queued since the last sync
    pub fn pending_dom_operations(&self) -> Vec<DomOperation> {
        lock(&self.dom_operations).clone()
    }

    /// Listener registrations queued since the last sync
    pub fn pending_event_operations(&self) -> Vec<EventOperation> {
        lock(&self.event_operations).clone()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Attach new nodes under their declared parents
    pub fn create_dom_nodes(&self, nodes: Vec<Arc<DomNode>>) {
        let mut nodes_to_create = Vec::with_capacity(nodes.len());
        for node in nodes {
            if self.get_node(node.id()).is_some() {
                tracing::debug!("Node {} already exists, skipping create", node.id());
                continue;
            }
            let Some(parent) = self.get_node(node.pid()) else {
                tracing::debug!("Parent {} of node {} not found, skipping create", node.pid(), node.id());
                continue;
            };

            parent.add_child_at(Arc::clone(&node), node.index() as usize);
            node.mark_layout_dirty();
            self.on_dom_node_created(&node);

            self.handle_event(Arc::new(DomEvent::new(DOM_CREATED, &node)));
            nodes_to_create.push(node);
        }

        self.handle_event(Arc::new(DomEvent::new(DOM_TREE_CREATED, &self.node)));
        self.push_dom_operation(DomOperationKind::Create, nodes_to_create);
    }

    /// Diff and apply new properties to existing nodes.
    ///
    /// The diff is stored on both the live node and the proposal.
    pub fn update_dom_nodes(&self, nodes: Vec<Arc<DomNode>>) {
        let mut nodes_to_update = Vec::with_capacity(nodes.len());
        for incoming in nodes {
            let Some(node) = self.get_node(incoming.id()) else {
                tracing::debug!("Node {} not found, skipping update", incoming.id());
                continue;
            };

            let style_diff = diff_props(&node.style_map(), &incoming.style_map());
            let ext_diff = diff_props(&node.ext_style(), &incoming.ext_style());
            let layout_changed = !style_diff.is_empty();
            let diff = style_diff.merge(ext_diff);

            node.set_style_map(incoming.style_map());
            node.set_ext_style(incoming.ext_style());
            node.set_diff(&diff);
            incoming.set_diff(&diff);
            if layout_changed {
                node.mark_layout_dirty();
            }

            self.handle_event(Arc::new(DomEvent::new(DOM_UPDATED, &node)));
            nodes_to_update.push(node);
        }

        self.handle_event(Arc::new(DomEvent::new(DOM_TREE_UPDATED, &self.node)));
        self.push_dom_operation(DomOperationKind::Update, nodes_to_update);
    }

    /// Detach nodes and drop their subtrees from the index
    pub fn delete_dom_nodes(&self, nodes: Vec<Arc<DomNode>>) {
        let mut nodes_to_delete = Vec::with_capacity(nodes.len());
        for incoming in nodes {
            if incoming.id() == self.id() {
                tracing::warn!("Root node {} cannot be deleted", self.id());
                continue;
            }
            let Some(node) = self.get_node(incoming.id()) else {
                tracing::debug!("Node {} not found, skipping delete", incoming.id());
                continue;
            };

            if let Some(parent) = node.parent() {
                if let Some(index) = parent.index_of(&node) {
                    parent.remove_child_at(index);
                }
                parent.mark_layout_dirty();
            }

            self.handle_event(Arc::new(DomEvent::new(DOM_DELETED, &node)));
            self.on_dom_node_deleted(&node);
            nodes_to_delete.push(node);
        }

        self.handle_event(Arc::new(DomEvent::new(DOM_TREE_DELETED, &self.node)));
        self.push_dom_operation(DomOperationKind::Delete, nodes_to_delete);
    }

    /// Re-sync nodes whose styles were changed in place by an animation
    pub fn update_animation(&self, nodes: Vec<Arc<DomNode>>) {
        let mut nodes_to_update = Vec::with_capacity(nodes.len());
        for incoming in nodes {
            let Some(node) = self.get_node(incoming.id()) else {
                tracing::debug!("Node {} not found, skipping animation update", incoming.id());
                continue;
            };
            node.mark_layout_dirty();
            self.handle_event(Arc::new(DomEvent::new(DOM_UPDATED, &node)));
            nodes_to_update.push(node);
        }

        self.handle_event(Arc::new(DomEvent::new(DOM_TREE_UPDATED, &self.node)));
        self.push_dom_operation(DomOperationKind::Update, nodes_to_update);
    }

    fn push_dom_operation(&self, kind: DomOperationKind, nodes: Vec<Arc<DomNode>>) {
        if nodes.is_empty() {
            return;
        }
        tracing::trace!("Queued {:?} of {} nodes", kind, nodes.len());
        lock(&self.dom_operations).push(DomOperation::new(kind, nodes));
    }

    fn on_dom_node_created(&self, node: &Arc<DomNode>) {
        lock(&self.nodes).insert(node.id(), Arc::downgrade(node));
    }

    fn on_dom_node_deleted(&self, node: &Arc<DomNode>) {
        let mut nodes = lock(&self.nodes);
        let mut stack = vec![Arc::clone(node)];
        while let Some(current) = stack.pop() {
            stack.extend(current.children());
            nodes.remove(&current.id());
        }
    }

    // ------------------------------------------------------------------
    // Listeners & events
    // ------------------------------------------------------------------

    /// Attach a listener to node `id`.
    ///
    /// Returns [`ListenerId::INVALID`] if the node does not exist. The first
    /// listener for `name` on a node queues a registration for the render
    /// manager.
    pub fn add_event_listener(&self, id: u32, name: &str, use_capture: bool, cb: EventCallback) -> ListenerId {
        let Some(node) = self.get_node(id) else {
            tracing::debug!("Node {} not found, cannot listen for '{}'", id, name);
            return ListenerId::INVALID;
        };

        let (listener_id, first) = node.add_event_listener(name, use_capture, cb);
        if first {
            lock(&self.event_operations).push(EventOperation::new(EventOperationKind::Add, id, name));
        }
        listener_id
    }

    /// Detach a listener; the last one for `name` queues an unregistration
    pub fn remove_event_listener(&self, id: u32, name: &str, listener_id: ListenerId) -> bool {
        let Some(node) = self.get_node(id) else {
            return false;
        };

        let (removed, now_empty) = node.remove_event_listener(name, listener_id);
        if now_empty {
            lock(&self.event_operations).push(EventOperation::new(EventOperationKind::Remove, id, name));
        }
        removed
    }

    /// Dispatch an event on the delegate event runner.
    ///
    /// The target's listeners are snapshotted now; the call returns without
    /// waiting for any of them.
    pub fn handle_event(&self, event: Arc<DomEvent>) {
        let event_type = event.event_type().to_string();
        let Some(propagation) = Propagation::prepare(event) else {
            tracing::debug!("Target of '{}' is gone, not dispatching", event_type);
            return;
        };

        let runner = read(&self.delegate_task_runner).upgrade();
        let Some(runner) = runner else {
            tracing::debug!("No event runner, dropping '{}'", event_type);
            return;
        };

        let name = event_type.clone();
        if let Err(err) = runner.post_task(move || {
            let state = propagation.run();
            tracing::trace!("Dispatch of '{}' ended in {:?}", name, state);
        }) {
            tracing::warn!("Failed to dispatch '{}': {}", event_type, err);
        }
    }

    /// Forward a named function call on node `id` to the render manager
    pub fn call_function(
        self: &Arc<Self>,
        render_manager: &dyn RenderManager,
        id: u32,
        name: &str,
        param: &DomArgument,
        cb: CallFunctionCallback,
    ) {
        let Some(node) = self.get_node(id) else {
            tracing::debug!("Node {} not found, skipping call '{}'", id, name);
            return;
        };
        render_manager.call_function(self, &node, name, param, cb);
    }

    // ------------------------------------------------------------------
    // Render sync
    // ------------------------------------------------------------------

    /// Flush the batch: structure, then listener registrations, then
    /// layout, then the end-of-batch signal
    pub fn sync_with_render_manager(self: &Arc<Self>, render_manager: &dyn RenderManager) {
        self.flush_dom_operations(render_manager);
        self.flush_event_operations(render_manager);
        self.do_and_flush_layout(render_manager);
        render_manager.end_batch(self);
    }

    /// Push a single node straight to the render manager, then sync
    pub fn update_render_node(self: &Arc<Self>, render_manager: &dyn RenderManager, node: &Arc<DomNode>) {
        node.mark_layout_dirty();
        render_manager.update_render_node(self, std::slice::from_ref(node));
        self.sync_with_render_manager(render_manager);
    }

    /// Run layout and report nodes whose geometry changed
    pub fn do_and_flush_layout(self: &Arc<Self>, render_manager: &dyn RenderManager) {
        render_manager.before_layout(self);
        let changed = self.do_layout();
        render_manager.after_layout(self);

        if !changed.is_empty() {
            render_manager.update_layout(self, &changed);
        }
    }

    fn flush_dom_operations(self: &Arc<Self>, render_manager: &dyn RenderManager) {
        let operations = std::mem::take(&mut *lock(&self.dom_operations));
        for operation in &operations {
            match operation.kind {
                DomOperationKind::Create => render_manager.create_render_node(self, &operation.nodes),
                DomOperationKind::Update => render_manager.update_render_node(self, &operation.nodes),
                DomOperationKind::Delete => render_manager.delete_render_node(self, &operation.nodes),
            }
        }

        for node in operations.iter().flat_map(|operation| &operation.nodes) {
            node.clear_diff();
        }
    }

    fn flush_event_operations(self: &Arc<Self>, render_manager: &dyn RenderManager) {
        let operations = std::mem::take(&mut *lock(&self.event_operations));
        for operation in operations {
            let Some(node) = self.get_node(operation.id) else {
                tracing::debug!("Node {} gone before '{}' registration flushed", operation.id, operation.name);
                continue;
            };
            match operation.kind {
                EventOperationKind::Add => render_manager.add_event_listener(self, &node, &operation.name),
                EventOperationKind::Remove => render_manager.remove_event_listener(self, &node, &operation.name),
            }
        }
    }

    fn do_layout(&self) -> Vec<Arc<DomNode>> {
        if !self.node.is_layout_dirty() {
            return Vec::new();
        }
        let engine = read(&self.layout_engine).clone();
        let Some(engine) = engine else {
            return Vec::new();
        };

        let results = engine.compute_layout(&self.node, self.root_size());

        let mut changed = Vec::new();
        self.node.clear_layout_dirty();
        let mut stack: Vec<_> = self.node.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if let Some(layout) = results.get(&node.id()) {
                if node.set_layout_result(*layout) {
                    changed.push(Arc::clone(&node));
                }
            }
            node.clear_layout_dirty();
            stack.extend(node.children().into_iter().rev());
        }

        tracing::debug!("Layout complete: {} of {} nodes changed", changed.len(), results.len());
        changed
    }
}
