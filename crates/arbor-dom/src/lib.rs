//! Arbor DOM - Document Object Model core
//!
//! Owns the tree of UI nodes, reconciles mutation batches against it,
//! dispatches capture/bubble events and keeps an external render tree in
//! sync.
//!
//! # Example
//! ```rust,ignore
//! use arbor_dom::{DomManager, DomNode};
//!
//! let manager = DomManager::new(1);
//! manager.set_render_manager(&render_manager);
//! manager.start_task_runner()?;
//! let root = manager.create_root();
//!
//! let weak_root = Arc::downgrade(&root);
//! let m = Arc::clone(&manager);
//! manager.post_task(Scene::default().then(move || {
//!     m.create_dom_nodes(&weak_root, vec![DomNode::builder(2).pid(1).build()]);
//!     let _ = m.end_batch(&weak_root);
//! }))?;
//! ```

mod diff;
mod dispatch;
mod error;
mod event;
mod interceptor;
mod layout;
mod listener;
mod manager;
mod node;
mod operation;
mod registry;
mod render;
mod root;
mod sync;

use std::collections::HashMap;
use std::sync::Arc;

pub use diff::{diff_props, PropDiff};
pub use error::{DomError, DomResult};
pub use event::{
    DomEvent, EventPhase, DOM_CREATED, DOM_DELETED, DOM_TREE_CREATED, DOM_TREE_DELETED,
    DOM_TREE_UPDATED, DOM_UPDATED,
};
pub use interceptor::DomActionInterceptor;
pub use layout::{LayoutEngine, LayoutResult, LayoutSize};
pub use listener::{EventCallback, EventListener, ListenerId};
pub use manager::DomManager;
pub use node::{DomNode, DomNodeBuilder};
pub use operation::{DomOperation, DomOperationKind, EventOperation, EventOperationKind};
pub use registry::DomManagerRegistry;
pub use render::RenderManager;
pub use root::RootNode;

/// Opaque property value
pub type DomValue = serde_json::Value;

/// Property map (style or ext-style)
pub type DomValueMap = HashMap<String, DomValue>;

/// Argument passed to node functions
pub type DomArgument = DomValue;

/// Result callback for node function calls
pub type CallFunctionCallback = Arc<dyn Fn(DomArgument) + Send + Sync>;
