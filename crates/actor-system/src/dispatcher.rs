//! # Dispatchers
//!
//! A [`Dispatcher`] binds a name to a thread-pool executor. The executor is a tokio
//! multi-thread [`Runtime`] owned exclusively by the dispatcher; mailboxes only keep a
//! [`DispatcherHandle`] to submit work, so thousands of mailboxes can share one pool
//! and none of them keeps the runtime alive.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, info, warn};

pub struct Dispatcher {
    name: Arc<str>,
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
}

impl Dispatcher {
    /// Builds an executor with `threads` named worker threads (`<name>-<n>`).
    pub fn fixed_thread_pool(name: &str, threads: usize) -> std::io::Result<Runtime> {
        let prefix = name.to_string();
        let counter = Arc::new(AtomicUsize::new(0));
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(threads.max(1))
            .thread_name_fn(move || {
                let n = counter.fetch_add(1, Ordering::Relaxed);
                format!("{prefix}-{n}")
            })
            .enable_all()
            .build()
    }

    pub(crate) fn new(name: impl Into<String>, executor: Runtime) -> Self {
        let handle = executor.handle().clone();
        Self {
            name: Arc::from(name.into()),
            runtime: Mutex::new(Some(executor)),
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn handle(&self) -> DispatcherHandle {
        DispatcherHandle {
            name: self.name.clone(),
            handle: self.handle.clone(),
        }
    }

    /// Stops the executor without waiting; running batches are abandoned.
    pub(crate) fn shutdown_now(&self) {
        if let Some(runtime) = self.runtime.lock().take() {
            info!(dispatcher = %self.name, "Dispatcher shut down");
            runtime.shutdown_background();
        }
    }

    /// Waits up to `timeout` for the workers to finish, then abandons them.
    pub(crate) fn shutdown_gracefully(&self, timeout: Duration) {
        let Some(runtime) = self.runtime.lock().take() else {
            return;
        };
        if Handle::try_current().is_ok() {
            // Blocking on a runtime from inside another one panics.
            warn!(dispatcher = %self.name, "Stopping dispatcher from an async context, not waiting for workers");
            runtime.shutdown_background();
        } else {
            debug!(dispatcher = %self.name, ?timeout, "Awaiting dispatcher termination");
            runtime.shutdown_timeout(timeout);
            info!(dispatcher = %self.name, "Dispatcher stopped");
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.get_mut().take() {
            runtime.shutdown_background();
        }
    }
}

/// Cheap, cloneable submission handle to a dispatcher's executor.
#[derive(Clone)]
pub(crate) struct DispatcherHandle {
    name: Arc<str>,
    handle: Handle,
}

impl DispatcherHandle {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Runs `task` on one of the dispatcher's workers. Silently dropped once the
    /// executor has been shut down.
    pub(crate) fn execute<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.spawn(async move { task() });
    }
}
