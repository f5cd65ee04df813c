//! Event propagation
//!
//! Capture visits the ancestors outermost first, then the target runs its
//! capturing and bubbling listeners, then bubbling visits the ancestors
//! nearest first. The target's listeners are snapshotted when the event is
//! raised; ancestor listeners are looked up when the propagation reaches
//! them.

use std::sync::Arc;

use crate::{DomEvent, DomNode, EventListener, EventPhase};

/// Propagation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DispatchState {
    Capturing,
    AtTarget,
    Bubbling,
    /// Every phase ran to completion
    Done,
    /// `prevent_capture` ended the dispatch before bubbling
    CaptureAborted,
    /// `prevent_bubble` ended the bubble phase
    BubbleAborted,
}

impl DispatchState {
    /// Check if no further phase will run
    pub(crate) fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::CaptureAborted | Self::BubbleAborted)
    }
}

/// One event's propagation, prepared on the dom runner and run on the
/// event runner
pub(crate) struct Propagation {
    event: Arc<DomEvent>,
    target: Arc<DomNode>,
    /// Ancestors, outermost first
    capture_path: Vec<Arc<DomNode>>,
    /// Ancestors visited by capture, bubbled in reverse
    bubble_path: Vec<Arc<DomNode>>,
    capture_target: Vec<Arc<EventListener>>,
    bubble_target: Vec<Arc<EventListener>>,
}

impl Propagation {
    /// Resolve the target and snapshot its listeners.
    ///
    /// Returns `None` if the target has already been dropped.
    pub(crate) fn prepare(event: Arc<DomEvent>) -> Option<Self> {
        let target = event.target()?;

        let mut capture_path = Vec::new();
        if event.can_capture() {
            let mut parent = target.parent();
            while let Some(node) = parent {
                parent = node.parent();
                capture_path.push(node);
            }
            capture_path.reverse();
        }

        let name = event.event_type();
        let capture_target = target.event_listeners(name, true);
        let bubble_target = target.event_listeners(name, false);

        Some(Self {
            bubble_path: Vec::with_capacity(capture_path.len()),
            event,
            target,
            capture_path,
            capture_target,
            bubble_target,
        })
    }

    /// Run every phase to a terminal state
    pub(crate) fn run(mut self) -> DispatchState {
        let mut state = DispatchState::Capturing;
        while !state.is_terminal() {
            state = self.step(state);
        }
        self.event.set_phase(EventPhase::None);
        state
    }

    fn step(&mut self, state: DispatchState) -> DispatchState {
        match state {
            DispatchState::Capturing => self.capture(),
            DispatchState::AtTarget => self.at_target(),
            DispatchState::Bubbling => self.bubble(),
            terminal => terminal,
        }
    }

    fn capture(&mut self) -> DispatchState {
        self.event.set_phase(EventPhase::Capturing);
        let name = self.event.event_type().to_string();

        for node in std::mem::take(&mut self.capture_path) {
            self.event.set_current_target(&node);
            invoke(&node.event_listeners(&name, true), &self.event);
            if self.event.is_prevent_capture() {
                return DispatchState::CaptureAborted;
            }
            self.bubble_path.push(node);
        }
        DispatchState::AtTarget
    }

    fn at_target(&mut self) -> DispatchState {
        self.event.set_phase(EventPhase::AtTarget);
        self.event.set_current_target(&self.target);

        invoke(&self.capture_target, &self.event);
        if self.event.is_prevent_capture() {
            return DispatchState::CaptureAborted;
        }
        invoke(&self.bubble_target, &self.event);
        if self.event.is_prevent_bubble() {
            return DispatchState::BubbleAborted;
        }
        DispatchState::Bubbling
    }

    fn bubble(&mut self) -> DispatchState {
        self.event.set_phase(EventPhase::Bubbling);
        let name = self.event.event_type().to_string();

        while let Some(node) = self.bubble_path.pop() {
            self.event.set_current_target(&node);
            invoke(&node.event_listeners(&name, false), &self.event);
            if self.event.is_prevent_bubble() {
                return DispatchState::BubbleAborted;
            }
        }
        DispatchState::Done
    }
}

// Every listener on a node runs even if an earlier one set a prevent flag.
fn invoke(listeners: &[Arc<EventListener>], event: &DomEvent) {
    for listener in listeners {
        listener.invoke(event);
    }
}
