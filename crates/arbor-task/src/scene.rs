//! Scene - an ordered batch of closures executed as one task

use std::fmt;

use crate::TaskFn;

/// Ordered batch of operations.
///
/// A scene is posted as a single task, so the operations of two scenes
/// submitted from different threads never interleave.
#[derive(Default)]
pub struct Scene {
    ops: Vec<TaskFn>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene").field("ops", &self.ops.len()).finish()
    }
}

impl Scene {
    /// Create a scene from boxed operations
    pub fn new(ops: Vec<TaskFn>) -> Self {
        Self { ops }
    }

    /// Append an operation
    pub fn push<F>(&mut self, op: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.ops.push(Box::new(op));
    }

    /// Append an operation (builder style)
    pub fn then<F>(mut self, op: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(op);
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Run all operations in order
    pub fn build(self) {
        for op in self.ops {
            op();
        }
    }
}

impl FromIterator<TaskFn> for Scene {
    fn from_iter<I: IntoIterator<Item = TaskFn>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
