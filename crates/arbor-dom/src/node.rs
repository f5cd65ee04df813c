//! DOM Node
//!
//! Nodes are always handled through `Arc<DomNode>`. A parent owns its
//! children; a child only keeps a `Weak` back-reference, resolved on demand.
//! Mutable state sits behind a lock because the dom runner mutates nodes
//! while the event runner reads their listeners.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use crate::listener::ListenerTable;
use crate::sync::{read, write};
use crate::{DomValue, DomValueMap, EventCallback, EventListener, LayoutResult, ListenerId, PropDiff};

/// DOM Node
pub struct DomNode {
    id: u32,
    pid: u32,
    index: u32,
    tag_name: String,
    view_name: String,
    state: RwLock<NodeState>,
}

#[derive(Default)]
struct NodeState {
    parent: Weak<DomNode>,
    children: Vec<Arc<DomNode>>,
    style_map: DomValueMap,
    ext_style: DomValueMap,
    // Transient, cleared once the render side consumed the batch
    diff_style: DomValueMap,
    delete_props: Vec<String>,
    layout: LayoutResult,
    layout_dirty: bool,
    listeners: HashMap<String, ListenerTable>,
    last_listener_id: u32,
}

impl fmt::Debug for DomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = read(&self.state);
        f.debug_struct("DomNode")
            .field("id", &self.id)
            .field("pid", &self.pid)
            .field("index", &self.index)
            .field("view_name", &self.view_name)
            .field("children", &state.children.len())
            .field("layout", &state.layout)
            .finish()
    }
}

impl DomNode {
    /// Create a detached node
    pub fn new(
        id: u32,
        pid: u32,
        index: u32,
        tag_name: &str,
        view_name: &str,
        style_map: DomValueMap,
        ext_style: DomValueMap,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            pid,
            index,
            tag_name: tag_name.to_string(),
            view_name: view_name.to_string(),
            state: RwLock::new(NodeState {
                style_map,
                ext_style,
                ..NodeState::default()
            }),
        })
    }

    /// Start building a node
    pub fn builder(id: u32) -> DomNodeBuilder {
        DomNodeBuilder::new(id)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Declared parent id
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Declared sibling position
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn view_name(&self) -> &str {
        &self.view_name
    }

    // ------------------------------------------------------------------
    // Tree
    // ------------------------------------------------------------------

    /// Resolve the parent, if attached and still alive
    pub fn parent(&self) -> Option<Arc<DomNode>> {
        read(&self.state).parent.upgrade()
    }

    /// Snapshot of the children in order
    pub fn children(&self) -> Vec<Arc<DomNode>> {
        read(&self.state).children.clone()
    }

    pub fn child_count(&self) -> usize {
        read(&self.state).children.len()
    }

    /// Insert `child` at `index`; an index past the end appends
    pub fn add_child_at(self: &Arc<Self>, child: Arc<DomNode>, index: usize) {
        if Arc::ptr_eq(self, &child) {
            tracing::warn!("Refusing to attach node {} to itself", self.id);
            return;
        }
        write(&child.state).parent = Arc::downgrade(self);

        let mut state = write(&self.state);
        let index = index.min(state.children.len());
        state.children.insert(index, child);
    }

    /// Detach the child at `index`; `None` if out of range
    pub fn remove_child_at(&self, index: usize) -> Option<Arc<DomNode>> {
        let child = {
            let mut state = write(&self.state);
            if index >= state.children.len() {
                return None;
            }
            state.children.remove(index)
        };
        write(&child.state).parent = Weak::new();
        Some(child)
    }

    /// Position of `child` among this node's children
    pub fn index_of(&self, child: &Arc<DomNode>) -> Option<usize> {
        read(&self.state)
            .children
            .iter()
            .position(|c| Arc::ptr_eq(c, child))
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    pub fn style_map(&self) -> DomValueMap {
        read(&self.state).style_map.clone()
    }

    pub fn ext_style(&self) -> DomValueMap {
        read(&self.state).ext_style.clone()
    }

    /// Look up one style value
    pub fn style(&self, key: &str) -> Option<DomValue> {
        read(&self.state).style_map.get(key).cloned()
    }

    pub fn set_style_map(&self, style_map: DomValueMap) {
        write(&self.state).style_map = style_map;
    }

    pub fn set_ext_style(&self, ext_style: DomValueMap) {
        write(&self.state).ext_style = ext_style;
    }

    /// Keys added or changed by the last update
    pub fn diff_style(&self) -> DomValueMap {
        read(&self.state).diff_style.clone()
    }

    /// Keys removed by the last update
    pub fn delete_props(&self) -> Vec<String> {
        read(&self.state).delete_props.clone()
    }

    pub(crate) fn set_diff(&self, diff: &PropDiff) {
        let mut state = write(&self.state);
        state.diff_style = diff.updated.clone();
        state.delete_props = diff.removed.clone();
    }

    pub(crate) fn clear_diff(&self) {
        let mut state = write(&self.state);
        state.diff_style.clear();
        state.delete_props.clear();
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    pub fn layout_result(&self) -> LayoutResult {
        read(&self.state).layout
    }

    /// Store new geometry, returning whether it changed
    pub(crate) fn set_layout_result(&self, layout: LayoutResult) -> bool {
        let mut state = write(&self.state);
        let changed = state.layout != layout;
        state.layout = layout;
        changed
    }

    pub fn is_layout_dirty(&self) -> bool {
        read(&self.state).layout_dirty
    }

    /// Mark this node and all its ancestors as needing layout
    pub fn mark_layout_dirty(&self) {
        let mut parent = {
            let mut state = write(&self.state);
            state.layout_dirty = true;
            state.parent.upgrade()
        };
        while let Some(node) = parent {
            let mut state = write(&node.state);
            if state.layout_dirty {
                break;
            }
            state.layout_dirty = true;
            parent = state.parent.upgrade();
        }
    }

    pub(crate) fn clear_layout_dirty(&self) {
        write(&self.state).layout_dirty = false;
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Register a listener.
    ///
    /// Returns the new id and whether it is the first listener for `name`
    /// on this node.
    pub(crate) fn add_event_listener(
        &self,
        name: &str,
        use_capture: bool,
        cb: EventCallback,
    ) -> (ListenerId, bool) {
        let mut state = write(&self.state);
        // 0 is reserved for ListenerId::INVALID
        state.last_listener_id = state.last_listener_id.wrapping_add(1).max(1);
        let id = ListenerId(state.last_listener_id);

        let first = !state.listeners.contains_key(name);
        state
            .listeners
            .entry(name.to_string())
            .or_default()
            .push(EventListener::new(id, name, use_capture, cb));
        (id, first)
    }

    /// Remove a listener.
    ///
    /// Returns whether it was found and whether `name` has no listener left.
    pub(crate) fn remove_event_listener(&self, name: &str, id: ListenerId) -> (bool, bool) {
        let mut state = write(&self.state);
        let Some(table) = state.listeners.get_mut(name) else {
            return (false, false);
        };
        let removed = table.remove(id);
        let now_empty = table.is_empty();
        if now_empty {
            state.listeners.remove(name);
        }
        (removed, removed && now_empty)
    }

    /// Snapshot the listeners registered for `name` in one phase
    pub fn event_listeners(&self, name: &str, use_capture: bool) -> Vec<Arc<EventListener>> {
        read(&self.state)
            .listeners
            .get(name)
            .map(|table| table.get(use_capture))
            .unwrap_or_default()
    }

    pub fn has_event_listener(&self, name: &str) -> bool {
        read(&self.state).listeners.contains_key(name)
    }
}

/// Builder for [`DomNode`]
#[derive(Debug, Default)]
pub struct DomNodeBuilder {
    id: u32,
    pid: u32,
    index: u32,
    tag_name: String,
    view_name: String,
    style_map: DomValueMap,
    ext_style: DomValueMap,
}

impl DomNodeBuilder {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    pub fn index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    pub fn tag_name(mut self, tag_name: &str) -> Self {
        self.tag_name = tag_name.to_string();
        self
    }

    pub fn view_name(mut self, view_name: &str) -> Self {
        self.view_name = view_name.to_string();
        self
    }

    /// Set one style entry
    pub fn style(mut self, key: &str, value: DomValue) -> Self {
        self.style_map.insert(key.to_string(), value);
        self
    }

    /// Set one ext-style entry
    pub fn ext(mut self, key: &str, value: DomValue) -> Self {
        self.ext_style.insert(key.to_string(), value);
        self
    }

    pub fn style_map(mut self, style_map: DomValueMap) -> Self {
        self.style_map = style_map;
        self
    }

    pub fn ext_style(mut self, ext_style: DomValueMap) -> Self {
        self.ext_style = ext_style;
        self
    }

    pub fn build(self) -> Arc<DomNode> {
        DomNode::new(
            self.id,
            self.pid,
            self.index,
            &self.tag_name,
            &self.view_name,
            self.style_map,
            self.ext_style,
        )
    }
}
