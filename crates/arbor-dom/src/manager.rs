//! DOM Manager
//!
//! Front door for one document. Owns the dom task runner that serializes
//! every mutation, holds the collaborators the root needs at flush time, and
//! forwards each operation to the root it is given.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock, Weak};

use arbor_task::{Scene, TaskError, TaskRunner};

use crate::error::DomResult;
use crate::sync::{read, write};
use crate::{
    CallFunctionCallback, DomActionInterceptor, DomArgument, DomError, DomEvent, DomNode,
    EventCallback, LayoutEngine, ListenerId, RenderManager, RootNode,
};

static NEXT_DOM_MANAGER_ID: AtomicU32 = AtomicU32::new(1);

/// DOM manager
pub struct DomManager {
    id: u32,
    root_id: u32,
    render_manager: RwLock<Option<Weak<dyn RenderManager>>>,
    layout_engine: RwLock<Option<Arc<dyn LayoutEngine>>>,
    delegate_task_runner: RwLock<Weak<TaskRunner>>,
    dom_task_runner: Arc<TaskRunner>,
    interceptors: RwLock<Vec<Arc<dyn DomActionInterceptor>>>,
}

impl fmt::Debug for DomManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomManager")
            .field("id", &self.id)
            .field("root_id", &self.root_id)
            .field("dom_task_runner", &self.dom_task_runner)
            .field("has_render_manager", &self.render_manager().is_some())
            .field("interceptors", &read(&self.interceptors).len())
            .finish()
    }
}

impl DomManager {
    /// Create a manager whose documents have root id `root_id`
    pub fn new(root_id: u32) -> Arc<Self> {
        let id = NEXT_DOM_MANAGER_ID.fetch_add(1, Ordering::Relaxed);
        Self::build(id, root_id, TaskRunner::new(&format!("arbor-dom-{}", id)))
    }

    /// Create a manager whose dom thread is named `{prefix}-{id}`
    pub fn with_thread_name(root_id: u32, prefix: &str) -> Arc<Self> {
        let id = NEXT_DOM_MANAGER_ID.fetch_add(1, Ordering::Relaxed);
        Self::build(id, root_id, TaskRunner::new(&format!("{}-{}", prefix, id)))
    }

    fn build(id: u32, root_id: u32, runner: TaskRunner) -> Arc<Self> {
        tracing::debug!("Creating dom manager {} (root {})", id, root_id);
        Arc::new(Self {
            id,
            root_id,
            render_manager: RwLock::new(None),
            layout_engine: RwLock::new(None),
            delegate_task_runner: RwLock::new(Weak::new()),
            dom_task_runner: Arc::new(runner),
            interceptors: RwLock::new(Vec::new()),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn root_id(&self) -> u32 {
        self.root_id
    }

    // ------------------------------------------------------------------
    // Wiring
    // ------------------------------------------------------------------

    /// Attach the render collaborator. Only a weak reference is kept.
    ///
    /// Every accepted node is forwarded as is; no layout-only node is
    /// flattened out of the render tree.
    pub fn set_render_manager(&self, render_manager: &Arc<dyn RenderManager>) {
        *write(&self.render_manager) = Some(Arc::downgrade(render_manager));
    }

    /// Resolve the render collaborator, if it is still alive
    pub fn render_manager(&self) -> Option<Arc<dyn RenderManager>> {
        read(&self.render_manager).as_ref().and_then(Weak::upgrade)
    }

    /// Set the runner that delivers events for roots created afterwards
    pub fn set_delegate_task_runner(&self, runner: &Arc<TaskRunner>) {
        *write(&self.delegate_task_runner) = Arc::downgrade(runner);
    }

    /// Set the layout collaborator for roots created afterwards
    pub fn set_layout_engine(&self, engine: Arc<dyn LayoutEngine>) {
        *write(&self.layout_engine) = Some(engine);
    }

    /// Register an observer of incoming batches
    pub fn add_interceptor(&self, interceptor: Arc<dyn DomActionInterceptor>) {
        write(&self.interceptors).push(interceptor);
    }

    /// Create a root wired to this manager's collaborators
    pub fn create_root(&self) -> Arc<RootNode> {
        let root = RootNode::new(self.root_id);
        if let Some(runner) = read(&self.delegate_task_runner).upgrade() {
            root.set_delegate_task_runner(&runner);
        }
        if let Some(engine) = read(&self.layout_engine).clone() {
            root.set_layout_engine(engine);
        }
        root
    }

    fn interceptors(&self) -> Vec<Arc<dyn DomActionInterceptor>> {
        read(&self.interceptors).clone()
    }

    // ------------------------------------------------------------------
    // Tree
    // ------------------------------------------------------------------

    pub fn get_node(&self, root: &Weak<RootNode>, id: u32) -> Option<Arc<DomNode>> {
        root.upgrade().and_then(|root| root.get_node(id))
    }

    pub fn create_dom_nodes(&self, root: &Weak<RootNode>, nodes: Vec<Arc<DomNode>>) {
        self.check_run_thread("create_dom_nodes");
        let Some(root) = root.upgrade() else {
            return;
        };
        for interceptor in self.interceptors() {
            interceptor.on_dom_node_create(&nodes);
        }
        root.create_dom_nodes(nodes);
    }

    pub fn update_dom_nodes(&self, root: &Weak<RootNode>, nodes: Vec<Arc<DomNode>>) {
        self.check_run_thread("update_dom_nodes");
        let Some(root) = root.upgrade() else {
            return;
        };
        for interceptor in self.interceptors() {
            interceptor.on_dom_node_update(&nodes);
        }
        root.update_dom_nodes(nodes);
    }

    pub fn delete_dom_nodes(&self, root: &Weak<RootNode>, nodes: Vec<Arc<DomNode>>) {
        self.check_run_thread("delete_dom_nodes");
        let Some(root) = root.upgrade() else {
            return;
        };
        for interceptor in self.interceptors() {
            interceptor.on_dom_node_delete(&nodes);
        }
        root.delete_dom_nodes(nodes);
    }

    pub fn update_animation(&self, root: &Weak<RootNode>, nodes: Vec<Arc<DomNode>>) {
        self.check_run_thread("update_animation");
        if let Some(root) = root.upgrade() {
            root.update_animation(nodes);
        }
    }

    /// Flush everything queued on the root to the render manager.
    ///
    /// A released root is a no-op; a released render manager is a wiring
    /// bug and fails the batch.
    pub fn end_batch(&self, root: &Weak<RootNode>) -> DomResult<()> {
        self.check_run_thread("end_batch");
        let render_manager = self.render_manager();
        debug_assert!(
            render_manager.is_some(),
            "end_batch on dom manager {} without a render manager",
            self.id
        );
        let Some(render_manager) = render_manager else {
            tracing::error!("Dom manager {} has no render manager, batch dropped", self.id);
            return Err(DomError::RenderManagerUnavailable);
        };
        let Some(root) = root.upgrade() else {
            return Ok(());
        };

        root.sync_with_render_manager(render_manager.as_ref());
        Ok(())
    }

    /// Push one node's properties to the render manager right away
    pub fn update_render_node(&self, root: &Weak<RootNode>, node: &Arc<DomNode>) -> DomResult<()> {
        self.check_run_thread("update_render_node");
        let render_manager = self.render_manager().ok_or(DomError::RenderManagerUnavailable)?;
        if let Some(root) = root.upgrade() {
            root.update_render_node(render_manager.as_ref(), node);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Listeners & events
    // ------------------------------------------------------------------

    /// Attach a listener and report its id through `callback`.
    ///
    /// The id is [`ListenerId::INVALID`] if the root or node is gone.
    pub fn add_event_listener(
        &self,
        root: &Weak<RootNode>,
        id: u32,
        name: &str,
        use_capture: bool,
        cb: EventCallback,
        callback: impl FnOnce(ListenerId),
    ) {
        self.check_run_thread("add_event_listener");
        let listener_id = root
            .upgrade()
            .map(|root| root.add_event_listener(id, name, use_capture, cb))
            .unwrap_or(ListenerId::INVALID);
        callback(listener_id);
    }

    pub fn remove_event_listener(&self, root: &Weak<RootNode>, id: u32, name: &str, listener_id: ListenerId) -> bool {
        self.check_run_thread("remove_event_listener");
        root.upgrade()
            .is_some_and(|root| root.remove_event_listener(id, name, listener_id))
    }

    /// Dispatch a host event through the tree
    pub fn handle_event(&self, root: &Weak<RootNode>, event: Arc<DomEvent>) {
        if let Some(root) = root.upgrade() {
            root.handle_event(event);
        }
    }

    /// Invoke a named native function on node `id`
    pub fn call_function(
        &self,
        root: &Weak<RootNode>,
        id: u32,
        name: &str,
        param: &DomArgument,
        cb: CallFunctionCallback,
    ) {
        self.check_run_thread("call_function");
        let Some(render_manager) = self.render_manager() else {
            tracing::warn!("Dom manager {} has no render manager, dropping call '{}'", self.id, name);
            return;
        };
        if let Some(root) = root.upgrade() {
            root.call_function(render_manager.as_ref(), id, name, param, cb);
        }
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    pub fn set_root_size(&self, root: &Weak<RootNode>, width: f32, height: f32) {
        self.check_run_thread("set_root_size");
        if let Some(root) = root.upgrade() {
            root.set_root_size(width, height);
        }
    }

    /// Run layout outside a batch and push changed geometry
    pub fn do_layout(&self, root: &Weak<RootNode>) -> DomResult<()> {
        self.check_run_thread("do_layout");
        let render_manager = self.render_manager().ok_or(DomError::RenderManagerUnavailable)?;
        if let Some(root) = root.upgrade() {
            root.do_and_flush_layout(render_manager.as_ref());
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Task runner
    // ------------------------------------------------------------------

    /// Post a batch of operations to the dom runner
    pub fn post_task(&self, scene: Scene) -> Result<(), TaskError> {
        self.dom_task_runner.post_task(move || scene.build())
    }

    pub fn start_task_runner(&self) -> DomResult<()> {
        self.dom_task_runner.start()?;
        Ok(())
    }

    pub fn terminate_task_runner(&self) {
        self.dom_task_runner.terminate();
    }

    pub fn dom_task_runner(&self) -> &Arc<TaskRunner> {
        &self.dom_task_runner
    }

    #[track_caller]
    fn check_run_thread(&self, operation: &str) {
        debug_assert!(
            self.dom_task_runner.is_current(),
            "{} must run on the dom task runner '{}'",
            operation,
            self.dom_task_runner.name()
        );
    }
}
