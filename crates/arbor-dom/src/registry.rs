//! Manager registry
//!
//! Process-wide lookup of live dom managers by id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::sync::lock;
use crate::DomManager;

/// Registry of dom managers keyed by manager id
#[derive(Debug, Default)]
pub struct DomManagerRegistry {
    managers: Mutex<HashMap<u32, Arc<DomManager>>>,
}

impl DomManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a manager, replacing any previous one with the same id
    pub fn insert(&self, manager: Arc<DomManager>) {
        let id = manager.id();
        if lock(&self.managers).insert(id, manager).is_some() {
            tracing::warn!("Dom manager {} registered twice", id);
        }
    }

    pub fn find(&self, id: u32) -> Option<Arc<DomManager>> {
        lock(&self.managers).get(&id).cloned()
    }

    /// Unregister by id
    pub fn erase(&self, id: u32) -> bool {
        lock(&self.managers).remove(&id).is_some()
    }

    /// Unregister a manager, only if it is the one registered under its id
    pub fn erase_manager(&self, manager: &Arc<DomManager>) -> bool {
        let mut managers = lock(&self.managers);
        match managers.get(&manager.id()) {
            Some(registered) if Arc::ptr_eq(registered, manager) => managers.remove(&manager.id()).is_some(),
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.managers).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.managers).is_empty()
    }
}
