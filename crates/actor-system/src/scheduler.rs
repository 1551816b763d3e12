//! Shared delayed-task scheduler.
//!
//! One small runtime serves every delayed action in the system: init retries, and the
//! timeouts actors arrange for themselves by sending a message to their own mailbox
//! after a delay. The scheduler only waits; the real work is always handed back to a
//! dispatcher.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::info;

/// Handle for submitting delayed tasks. Cheap to clone.
#[derive(Clone)]
pub struct Scheduler {
    handle: Handle,
}

impl Scheduler {
    /// Runs `task` on the scheduler after `delay`.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> ScheduledTask
    where
        F: FnOnce() + Send + 'static,
    {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        ScheduledTask { join }
    }
}

/// A pending delayed task.
pub struct ScheduledTask {
    join: JoinHandle<()>,
}

impl ScheduledTask {
    /// Cancels the task if it has not fired yet.
    pub fn cancel(&self) {
        self.join.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Owns the scheduler runtime.
pub(crate) struct SchedulerPool {
    runtime: Mutex<Option<Runtime>>,
    scheduler: Scheduler,
}

impl SchedulerPool {
    pub(crate) fn new(pool_size: usize) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(pool_size.max(1))
            .thread_name("actor-scheduler")
            .enable_time()
            .build()?;
        let scheduler = Scheduler {
            handle: runtime.handle().clone(),
        };
        Ok(Self {
            runtime: Mutex::new(Some(runtime)),
            scheduler,
        })
    }

    pub(crate) fn scheduler(&self) -> Scheduler {
        self.scheduler.clone()
    }

    pub(crate) fn shutdown(&self) {
        if let Some(runtime) = self.runtime.lock().take() {
            info!("Scheduler stopped");
            runtime.shutdown_background();
        }
    }
}

impl Drop for SchedulerPool {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.get_mut().take() {
            runtime.shutdown_background();
        }
    }
}
