//! Engine Configuration

/// Engine configuration options
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the shared event delivery thread
    pub event_thread_name: String,

    /// Prefix of each document's dom thread; the manager id is appended
    pub dom_thread_prefix: String,

    /// Initial root width of new documents
    pub default_root_width: f32,

    /// Initial root height of new documents
    pub default_root_height: f32,

    /// Start the event runner in `Engine::new`
    pub start_event_runner: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_thread_name: "arbor-event".to_string(),
            dom_thread_prefix: "arbor-dom".to_string(),
            default_root_width: 0.0,
            default_root_height: 0.0,
            start_event_runner: true,
        }
    }
}
