//! Event listeners

use std::fmt;
use std::sync::Arc;

use crate::DomEvent;

/// Listener identifier, unique per node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u32);

impl ListenerId {
    /// Returned when the listener could not be attached
    pub const INVALID: ListenerId = ListenerId(0);

    /// Check if this is a real listener
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Listener callback
pub type EventCallback = Arc<dyn Fn(&DomEvent) + Send + Sync>;

/// Registered event listener
pub struct EventListener {
    id: ListenerId,
    event_name: String,
    use_capture: bool,
    cb: EventCallback,
}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener")
            .field("id", &self.id)
            .field("event_name", &self.event_name)
            .field("use_capture", &self.use_capture)
            .finish()
    }
}

impl EventListener {
    pub(crate) fn new(id: ListenerId, event_name: &str, use_capture: bool, cb: EventCallback) -> Self {
        Self {
            id,
            event_name: event_name.to_string(),
            use_capture,
            cb,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn use_capture(&self) -> bool {
        self.use_capture
    }

    /// Invoke the callback
    #[inline]
    pub fn invoke(&self, event: &DomEvent) {
        (self.cb)(event)
    }
}

/// Capturing and bubbling listeners for one event name on one node
#[derive(Debug, Default)]
pub(crate) struct ListenerTable {
    capture: Vec<Arc<EventListener>>,
    bubble: Vec<Arc<EventListener>>,
}

impl ListenerTable {
    pub(crate) fn push(&mut self, listener: EventListener) {
        let list = if listener.use_capture {
            &mut self.capture
        } else {
            &mut self.bubble
        };
        list.push(Arc::new(listener));
    }

    /// Remove a listener from either phase
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.capture.len() + self.bubble.len();
        self.capture.retain(|l| l.id != id);
        self.bubble.retain(|l| l.id != id);
        self.capture.len() + self.bubble.len() < before
    }

    /// Snapshot one phase
    pub(crate) fn get(&self, use_capture: bool) -> Vec<Arc<EventListener>> {
        if use_capture {
            self.capture.clone()
        } else {
            self.bubble.clone()
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.capture.is_empty() && self.bubble.is_empty()
    }
}
