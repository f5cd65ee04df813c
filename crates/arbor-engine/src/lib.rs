//! Arbor Engine
//!
//! Document lifecycle on top of the Arbor DOM core: one shared event runner,
//! one dom runner per document, and a registry to find documents by id.
//!
//! # Example
//! ```rust,ignore
//! use arbor_engine::{Config, Engine, Scene};
//!
//! arbor_engine::logging::init_tracing();
//! let engine = Engine::new(Config::default())?;
//! let document = engine.create_document(1)?;
//! document.manager().set_render_manager(&render_manager);
//!
//! let manager = Arc::clone(document.manager());
//! let root = document.weak_root();
//! document.post_task(Scene::default().then(move || {
//!     manager.create_dom_nodes(&root, vec![DomNode::builder(2).pid(1).build()]);
//!     let _ = manager.end_batch(&root);
//! }))?;
//! document.flush()?;
//! ```

mod config;
mod engine;
pub mod logging;

pub use config::Config;
pub use engine::{Document, Engine, EngineError};

// Re-export core sub-crates
pub use arbor_dom as dom;
pub use arbor_task as task;
pub use arbor_task::Scene;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
