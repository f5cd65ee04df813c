//! DOM Events
//!
//! Node lifecycle events and host events dispatched through the tree.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::sync::lock;
use crate::{DomNode, DomValue};

/// Fired on each node accepted by a create batch
pub const DOM_CREATED: &str = "DomCreated";
/// Fired on each node accepted by an update batch
pub const DOM_UPDATED: &str = "DomUpdated";
/// Fired on each node accepted by a delete batch
pub const DOM_DELETED: &str = "DomDeleted";
/// Fired on the root once per create batch
pub const DOM_TREE_CREATED: &str = "DomTreeCreated";
/// Fired on the root once per update batch
pub const DOM_TREE_UPDATED: &str = "DomTreeUpdated";
/// Fired on the root once per delete batch
pub const DOM_TREE_DELETED: &str = "DomTreeDeleted";

/// Propagation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventPhase {
    None = 0,
    Capturing = 1,
    AtTarget = 2,
    Bubbling = 3,
}

impl EventPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Capturing,
            2 => Self::AtTarget,
            3 => Self::Bubbling,
            _ => Self::None,
        }
    }
}

/// DOM event
///
/// Shared between the dispatching code and every listener it reaches. The
/// two prevent flags are sticky: once set they stay set for the rest of the
/// dispatch.
#[derive(Debug)]
pub struct DomEvent {
    event_type: String,
    target: Weak<DomNode>,
    current_target: Mutex<Weak<DomNode>>,
    can_capture: bool,
    value: Option<DomValue>,
    phase: AtomicU8,
    prevent_capture: AtomicBool,
    prevent_bubble: AtomicBool,
}

impl DomEvent {
    /// Create an event targeting `target`.
    ///
    /// The event reaches only the target until [`with_capture`](Self::with_capture)
    /// enables the capture and bubble paths.
    pub fn new(event_type: &str, target: &Arc<DomNode>) -> Self {
        Self {
            event_type: event_type.to_string(),
            target: Arc::downgrade(target),
            current_target: Mutex::new(Arc::downgrade(target)),
            can_capture: false,
            value: None,
            phase: AtomicU8::new(EventPhase::None as u8),
            prevent_capture: AtomicBool::new(false),
            prevent_bubble: AtomicBool::new(false),
        }
    }

    /// Enable or disable propagation through the ancestors
    pub fn with_capture(mut self, can_capture: bool) -> Self {
        self.can_capture = can_capture;
        self
    }

    /// Attach a payload
    pub fn with_value(mut self, value: DomValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Resolve the target, if it is still alive
    pub fn target(&self) -> Option<Arc<DomNode>> {
        self.target.upgrade()
    }

    /// Resolve the node whose listeners are currently running
    pub fn current_target(&self) -> Option<Arc<DomNode>> {
        lock(&self.current_target).upgrade()
    }

    pub(crate) fn set_current_target(&self, node: &Arc<DomNode>) {
        *lock(&self.current_target) = Arc::downgrade(node);
    }

    pub fn can_capture(&self) -> bool {
        self.can_capture
    }

    pub fn value(&self) -> Option<&DomValue> {
        self.value.as_ref()
    }

    pub fn phase(&self) -> EventPhase {
        EventPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub(crate) fn set_phase(&self, phase: EventPhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    /// Stop the capture phase, and with it every later phase
    pub fn prevent_capture(&self) {
        self.prevent_capture.store(true, Ordering::Release);
    }

    /// Stop the bubble phase
    pub fn prevent_bubble(&self) {
        self.prevent_bubble.store(true, Ordering::Release);
    }

    /// Stop propagation past the current node.
    ///
    /// While capturing this ends the whole dispatch; at the target or while
    /// bubbling it only ends the bubble phase.
    pub fn stop_propagation(&self) {
        match self.phase() {
            EventPhase::Capturing => self.prevent_capture(),
            _ => self.prevent_bubble(),
        }
    }

    pub fn is_prevent_capture(&self) -> bool {
        self.prevent_capture.load(Ordering::Acquire)
    }

    pub fn is_prevent_bubble(&self) -> bool {
        self.prevent_bubble.load(Ordering::Acquire)
    }
}
