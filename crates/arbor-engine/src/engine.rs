//! Engine - Main entry point

use std::fmt;
use std::sync::{Arc, Weak};

use arbor_dom::{DomError, DomManager, DomManagerRegistry, LayoutEngine, RootNode};
use arbor_task::{Scene, TaskError, TaskRunner};

use crate::Config;

/// The Arbor engine
pub struct Engine {
    config: Config,
    registry: DomManagerRegistry,
    event_runner: Arc<TaskRunner>,
}

impl Engine {
    /// Create a new engine with the given configuration
    pub fn new(config: Config) -> Result<Self, EngineError> {
        let event_runner = Arc::new(TaskRunner::new(&config.event_thread_name));
        if config.start_event_runner {
            event_runner.start()?;
        }

        tracing::info!("Arbor Engine {} initialized", crate::VERSION);
        Ok(Self {
            config,
            registry: DomManagerRegistry::new(),
            event_runner,
        })
    }

    /// Get engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runner shared by every document for event delivery
    pub fn event_runner(&self) -> &Arc<TaskRunner> {
        &self.event_runner
    }

    pub fn registry(&self) -> &DomManagerRegistry {
        &self.registry
    }

    /// Create a document with its own dom runner and register it
    pub fn create_document(&self, root_id: u32) -> Result<Document, EngineError> {
        let manager = DomManager::with_thread_name(root_id, &self.config.dom_thread_prefix);
        manager.set_delegate_task_runner(&self.event_runner);
        manager.start_task_runner()?;
        self.registry.insert(Arc::clone(&manager));

        let root = manager.create_root();
        root.set_root_size(self.config.default_root_width, self.config.default_root_height);

        tracing::debug!("Created document {} (root {})", manager.id(), root_id);
        Ok(Document {
            manager,
            root,
            event_runner: Arc::clone(&self.event_runner),
        })
    }

    /// Look up a document's manager by manager id
    pub fn find_document(&self, id: u32) -> Option<Arc<DomManager>> {
        self.registry.find(id)
    }

    /// Unregister a document and stop its dom runner.
    ///
    /// Batches already queued still run.
    pub fn destroy_document(&self, id: u32) -> bool {
        let Some(manager) = self.registry.find(id) else {
            return false;
        };
        self.registry.erase_manager(&manager);
        manager.terminate_task_runner();

        tracing::debug!("Destroyed document {}", id);
        true
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.event_runner.terminate();
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("documents", &self.registry.len())
            .field("event_runner", &self.event_runner)
            .finish()
    }
}

/// A live document: its manager and its root
#[derive(Debug)]
pub struct Document {
    manager: Arc<DomManager>,
    root: Arc<RootNode>,
    event_runner: Arc<TaskRunner>,
}

impl Document {
    /// Manager id, used with [`Engine::find_document`]
    pub fn id(&self) -> u32 {
        self.manager.id()
    }

    pub fn manager(&self) -> &Arc<DomManager> {
        &self.manager
    }

    pub fn root(&self) -> &Arc<RootNode> {
        &self.root
    }

    /// Handle passed to manager operations
    pub fn weak_root(&self) -> Weak<RootNode> {
        Arc::downgrade(&self.root)
    }

    /// Use `engine` for this document's layout passes
    pub fn set_layout_engine(&self, engine: Arc<dyn LayoutEngine>) {
        self.manager.set_layout_engine(Arc::clone(&engine));
        self.root.set_layout_engine(engine);
    }

    /// Post a batch to the document's dom runner
    pub fn post_task(&self, scene: Scene) -> Result<(), EngineError> {
        self.manager.post_task(scene)?;
        Ok(())
    }

    /// Wait for every batch posted so far and the events it raised
    pub fn flush(&self) -> Result<(), EngineError> {
        self.manager.dom_task_runner().barrier()?;
        if self.event_runner.is_running() {
            self.event_runner.barrier()?;
        }
        Ok(())
    }
}

/// Engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Task runner error: {0}")]
    Task(#[from] TaskError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}
