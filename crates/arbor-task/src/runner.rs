//! Task Runner
//!
//! A named OS thread draining an unbounded channel, one task at a time.
//!
//! Tasks posted before [`TaskRunner::start`] are queued and run once the
//! thread is up. [`TaskRunner::terminate`] closes the channel: tasks that are
//! already queued still drain, later posts fail with
//! [`TaskError::Terminated`].

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use smol::channel::{self, Receiver, Sender};

use crate::TaskError;

/// Task function type
pub type TaskFn = Box<dyn FnOnce() + Send + 'static>;

/// Runner ID counter
static NEXT_RUNNER_ID: AtomicU32 = AtomicU32::new(1);

/// Dedicated single-threaded executor
pub struct TaskRunner {
    /// Process-unique runner ID
    id: u32,
    /// Thread name
    name: String,
    /// Task queue (producer side)
    sender: Sender<TaskFn>,
    /// Task queue (consumer side, cloned into the thread on start)
    receiver: Receiver<TaskFn>,
    /// Thread handle
    thread: Mutex<Option<JoinHandle<()>>>,
    /// ID of the runner thread, set by the thread itself
    thread_id: Arc<OnceLock<ThreadId>>,
}

impl fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRunner")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("pending_tasks", &self.pending_tasks())
            .finish()
    }
}

impl TaskRunner {
    /// Create a runner; the thread is not spawned until [`start`](Self::start)
    pub fn new(name: &str) -> Self {
        let (sender, receiver) = channel::unbounded();
        Self {
            id: NEXT_RUNNER_ID.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
            sender,
            receiver,
            thread: Mutex::new(None),
            thread_id: Arc::new(OnceLock::new()),
        }
    }

    /// Get runner ID
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Get thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawn the runner thread. Starting twice is a no-op.
    pub fn start(&self) -> Result<(), TaskError> {
        let mut slot = self.handle();
        if slot.is_some() {
            return Ok(());
        }
        if self.sender.is_closed() {
            return Err(self.terminated());
        }

        let receiver = self.receiver.clone();
        let thread_id = Arc::clone(&self.thread_id);
        let name = self.name.clone();

        let handle = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                let _ = thread_id.set(thread::current().id());
                tracing::debug!("Task runner '{}' started", name);

                while let Ok(task) = receiver.recv_blocking() {
                    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                        tracing::error!("Task panicked on runner '{}'", name);
                    }
                }

                tracing::debug!("Task runner '{}' stopped", name);
            })?;

        *slot = Some(handle);
        Ok(())
    }

    /// Submit a task
    pub fn post_task<F>(&self, task: F) -> Result<(), TaskError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender
            .try_send(Box::new(task))
            .map_err(|_| self.terminated())
    }

    /// Block until every task posted before this call has run.
    ///
    /// Must not be called from the runner thread itself.
    pub fn barrier(&self) -> Result<(), TaskError> {
        debug_assert!(
            !self.is_current(),
            "barrier on task runner '{}' called from its own thread",
            self.name
        );
        if !self.is_running() {
            return Err(TaskError::NotStarted {
                name: self.name.clone(),
            });
        }

        let (done_tx, done_rx) = channel::bounded::<()>(1);
        self.post_task(move || {
            let _ = done_tx.try_send(());
        })?;
        done_rx.recv_blocking().map_err(|_| TaskError::Disconnected {
            name: self.name.clone(),
        })
    }

    /// Check if the caller is running on this runner's thread
    pub fn is_current(&self) -> bool {
        self.thread_id.get() == Some(&thread::current().id())
    }

    /// Check if the thread has been spawned
    pub fn is_running(&self) -> bool {
        self.handle().is_some()
    }

    /// Check if the runner stopped accepting tasks
    pub fn is_terminated(&self) -> bool {
        self.sender.is_closed()
    }

    /// Get pending task count
    pub fn pending_tasks(&self) -> usize {
        self.sender.len()
    }

    /// Stop accepting tasks, drain the queue and join the thread.
    ///
    /// When called from the runner thread itself the thread is detached
    /// instead and exits once the queue is empty.
    pub fn terminate(&self) {
        if self.sender.close() {
            tracing::debug!("Terminating task runner '{}'", self.name);
        }

        let Some(handle) = self.handle().take() else {
            if !self.receiver.is_empty() {
                tracing::warn!(
                    "Task runner '{}' terminated before start, dropping {} queued tasks",
                    self.name,
                    self.receiver.len()
                );
            }
            return;
        };

        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            tracing::error!("Task runner '{}' thread panicked", self.name);
        }
    }

    fn handle(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.thread.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn terminated(&self) -> TaskError {
        TaskError::Terminated {
            name: self.name.clone(),
        }
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        self.terminate();
    }
}
