//! Layout capability
//!
//! The layout algorithm itself lives outside the DOM core. The root hands the
//! styled tree to a [`LayoutEngine`] and stores the geometry it returns.

use std::collections::HashMap;
use std::sync::Arc;

use crate::DomNode;

/// Computed geometry of one node
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutResult {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutResult {
    /// Create with position and size
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }
}

/// Available space for the root
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutSize {
    pub width: f32,
    pub height: f32,
}

impl LayoutSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Layout collaborator
pub trait LayoutEngine: Send + Sync {
    /// Compute geometry for `root` and its subtree, keyed by node id.
    ///
    /// Must be a pure function of the node styles and `available`.
    fn compute_layout(&self, root: &Arc<DomNode>, available: LayoutSize) -> HashMap<u32, LayoutResult>;
}
