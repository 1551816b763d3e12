//! # Mailbox
//!
//! A [`Mailbox`] owns one actor, two unbounded FIFO queues and the state machine that
//! drives the actor on its dispatcher:
//!
//! ```text
//! UNINIT -> INIT_PENDING(attempt) -> READY <-> {FREE, BUSY} -> DESTROY_IN_PROGRESS -> DESTROYED
//!                  ^                                                                   |
//!                  +------------- ComponentUpdated (high priority, INIT_FAILED only) --+
//! ```
//!
//! ## Scheduling
//!
//! No mailbox owns a thread. Enqueueing a message flips `busy` from free to busy with a
//! compare-and-swap and, if it won, submits one batch to the dispatcher. A batch handles at
//! most `actor_throughput` messages, high-priority first, then either resubmits itself (the
//! queues still hold work) or releases `busy` and checks the queues once more so a message
//! that raced the release is not stranded.
//!
//! ## Supervision
//!
//! Every actor callback runs inside [`guarded`], so a panic becomes
//! [`ActorError::Panicked`]. Failures turn into strategy values from the actor; a `stop`
//! decision is escalated to the [`ActorSystem`] so children are stopped too.

use crate::actor::Actor;
use crate::context::ActorCtx;
use crate::dispatcher::DispatcherHandle;
use crate::error::ActorError;
use crate::id::ActorId;
use crate::message::{ActorMsg, StopReason};
use crate::scheduler::Scheduler;
use crate::strategy::{InitFailureStrategy, ProcessFailureStrategy};
use crate::system::ActorSystem;
use crossbeam_queue::SegQueue;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace, warn};

pub(crate) struct Mailbox<M: ActorMsg> {
    self_ref: Weak<Mailbox<M>>,
    system: Weak<ActorSystem<M>>,
    self_id: ActorId,
    parent: Option<ParentLink<M>>,
    throughput: usize,
    max_init_attempts: u32,
    dispatcher: DispatcherHandle,
    scheduler: Scheduler,
    actor: Mutex<Box<dyn Actor<M>>>,
    high_priority: SegQueue<M>,
    normal_priority: SegQueue<M>,
    busy: AtomicBool,
    ready: AtomicBool,
    destroy_in_progress: AtomicBool,
    stop_reason: Mutex<Option<StopReason>>,
}

/// Lookup-only link to the parent mailbox.
pub(crate) struct ParentLink<M: ActorMsg> {
    pub(crate) id: ActorId,
    pub(crate) mailbox: Weak<Mailbox<M>>,
}

impl<M: ActorMsg> Clone for ParentLink<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            mailbox: self.mailbox.clone(),
        }
    }
}

impl<M: ActorMsg> Mailbox<M> {
    pub(crate) fn new(
        system: &ActorSystem<M>,
        self_id: ActorId,
        parent: Option<ParentLink<M>>,
        actor: Box<dyn Actor<M>>,
        dispatcher: DispatcherHandle,
    ) -> Arc<Self> {
        let settings = system.settings();
        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            system: system.downgrade(),
            self_id,
            parent,
            throughput: settings.actor_throughput.max(1),
            max_init_attempts: settings.max_actor_init_attempts,
            dispatcher,
            scheduler: system.scheduler(),
            actor: Mutex::new(actor),
            high_priority: SegQueue::new(),
            normal_priority: SegQueue::new(),
            busy: AtomicBool::new(false),
            ready: AtomicBool::new(false),
            destroy_in_progress: AtomicBool::new(false),
            stop_reason: Mutex::new(None),
        })
    }

    pub(crate) fn self_id(&self) -> &ActorId {
        &self.self_id
    }

    pub(crate) fn parent_id(&self) -> Option<&ActorId> {
        self.parent.as_ref().map(|parent| &parent.id)
    }

    pub(crate) fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub(crate) fn pending_messages(&self) -> usize {
        self.high_priority.len() + self.normal_priority.len()
    }

    pub(crate) fn is_destroying(&self) -> bool {
        self.destroy_in_progress.load(Ordering::SeqCst)
    }

    fn ctx(&self) -> ActorCtx<M> {
        ActorCtx::new(
            self.self_id.clone(),
            self.self_ref.clone(),
            self.parent.clone(),
            self.system.clone(),
        )
    }

    fn stop_reason(&self) -> StopReason {
        (*self.stop_reason.lock()).unwrap_or(StopReason::Stopped)
    }

    pub(crate) fn dispatcher_name(&self) -> &str {
        self.dispatcher.name()
    }

    /// Runs `task` on this mailbox's dispatcher. If the dispatcher drops the task without
    /// running it, the mailbox is terminated.
    fn execute<F>(&self, task: F)
    where
        F: FnOnce(&Mailbox<M>) + Send + 'static,
    {
        if let Some(this) = self.self_ref.upgrade() {
            let mut pending = PendingTask { mailbox: Some(this) };
            self.dispatcher.execute(move || {
                if let Some(mailbox) = pending.mailbox.take() {
                    task(&mailbox);
                }
            });
        }
    }

    // --- Initialization ---

    pub(crate) fn init_actor(&self) {
        self.execute(|mailbox| mailbox.try_init(1));
    }

    fn try_init(&self, attempt: u32) {
        if self.is_destroying() {
            return;
        }
        debug!(actor_id = %self.self_id, attempt, "Trying to init actor");

        let mut actor = self.actor.lock();
        let error = match guarded(|| actor.init(self.ctx())) {
            Ok(()) => {
                drop(actor);
                if !self.is_destroying() {
                    self.ready.store(true, Ordering::SeqCst);
                    self.try_process_queue(false);
                }
                return;
            }
            Err(error) => error,
        };
        let strategy = guarded(|| Ok(actor.on_init_failure(attempt, &error)))
            .unwrap_or_else(|_| InitFailureStrategy::stop());
        drop(actor);

        let next_attempt = attempt + 1;
        if strategy.is_stop()
            || (self.max_init_attempts > 0 && next_attempt > self.max_init_attempts)
        {
            info!(actor_id = %self.self_id, attempt, %error, "Failed to init actor, going to stop attempts");
            *self.stop_reason.lock() = Some(StopReason::InitFailed);
            self.destroy();
        } else if let Some(delay) = strategy.retry_delay() {
            info!(actor_id = %self.self_id, attempt, %error, ?delay, "Failed to init actor, scheduling retry");
            if let Some(this) = self.self_ref.upgrade() {
                self.scheduler.schedule(delay, move || {
                    this.execute(move |mailbox| mailbox.try_init(next_attempt));
                });
            }
        } else {
            info!(actor_id = %self.self_id, attempt, %error, "Failed to init actor, retrying immediately");
            self.execute(move |mailbox| mailbox.try_init(next_attempt));
        }
    }

    // --- Enqueue & scheduling gate ---

    pub(crate) fn enqueue(&self, msg: M, high_priority: bool) {
        if !self.is_destroying() {
            if high_priority {
                self.high_priority.push(msg);
            } else {
                self.normal_priority.push(msg);
            }
            if self.is_destroying() {
                // Raced a destroy that may already have drained the queues.
                self.execute(|mailbox| {
                    if mailbox.is_destroying() {
                        mailbox.notify_pending_stopped(mailbox.stop_reason());
                    }
                });
            } else {
                self.try_process_queue(true);
            }
        } else if high_priority && msg.msg_type().is_reinit_trigger() {
            let mut stop_reason = self.stop_reason.lock();
            if *stop_reason == Some(StopReason::InitFailed) {
                info!(actor_id = %self.self_id, "Re-initializing actor after init failure");
                *stop_reason = None;
                self.ready.store(false, Ordering::SeqCst);
                self.destroy_in_progress.store(false, Ordering::SeqCst);
                drop(stop_reason);
                self.init_actor();
            } else {
                let reason = (*stop_reason).unwrap_or(StopReason::Stopped);
                drop(stop_reason);
                msg.on_actor_stopped(reason);
            }
        } else {
            msg.on_actor_stopped(self.stop_reason());
        }
    }

    fn try_process_queue(&self, new_msg: bool) {
        if !self.ready.load(Ordering::SeqCst) || self.is_destroying() {
            trace!(actor_id = %self.self_id, new_msg, "Mailbox is not ready");
            return;
        }
        if !new_msg && self.high_priority.is_empty() && self.normal_priority.is_empty() {
            trace!(actor_id = %self.self_id, new_msg, "Mailbox is empty");
            return;
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.execute(|mailbox| mailbox.process_mailbox());
        } else {
            trace!(actor_id = %self.self_id, new_msg, "Mailbox is busy");
        }
    }

    // --- Batch processing ---

    fn process_mailbox(&self) {
        let mut drained = false;
        {
            let mut actor = self.actor.lock();
            for _ in 0..self.throughput {
                if self.is_destroying() || !self.ready.load(Ordering::SeqCst) {
                    drained = true;
                    break;
                }
                let Some(msg) = self.high_priority.pop().or_else(|| self.normal_priority.pop())
                else {
                    drained = true;
                    break;
                };
                let msg_type = msg.msg_type();
                trace!(actor_id = %self.self_id, ?msg_type, "Processing message");
                match guarded(|| actor.process(msg)) {
                    Ok(()) => {}
                    Err(ActorError::ReinitRequired(reason)) => {
                        info!(actor_id = %self.self_id, %reason, "Actor requested re-initialization");
                        *self.stop_reason.lock() = Some(StopReason::InitFailed);
                        self.destroy();
                    }
                    Err(error) => {
                        let strategy = guarded(|| Ok(actor.on_process_failure(&error)))
                            .unwrap_or_else(|_| ProcessFailureStrategy::stop());
                        if strategy.is_stop() {
                            warn!(actor_id = %self.self_id, ?msg_type, %error, "Failed to process message, stopping actor");
                            if let Some(system) = self.system.upgrade() {
                                system.stop(&self.self_id);
                            } else {
                                self.destroy();
                            }
                        } else {
                            debug!(actor_id = %self.self_id, ?msg_type, %error, "Failed to process message, resuming");
                        }
                    }
                }
            }
        }

        if drained {
            self.busy.store(false, Ordering::SeqCst);
            self.try_process_queue(false);
        } else {
            self.execute(|mailbox| mailbox.process_mailbox());
        }
    }

    // --- Destruction ---

    /// Starts termination: new messages are refused from now on, and the actor's
    /// `destroy` callback plus the stopped-notifications run on the dispatcher.
    pub(crate) fn destroy(&self) {
        {
            let mut stop_reason = self.stop_reason.lock();
            if stop_reason.is_none() {
                *stop_reason = Some(StopReason::Stopped);
            }
        }
        self.destroy_in_progress.store(true, Ordering::SeqCst);
        self.execute(|mailbox| {
            if !mailbox.is_destroying() {
                // Revived by a re-init trigger before this task ran.
                return;
            }
            mailbox.ready.store(false, Ordering::SeqCst);
            let reason = mailbox.stop_reason();
            let mut actor = mailbox.actor.lock();
            if let Err(error) = guarded(|| {
                actor.destroy(reason);
                Ok(())
            }) {
                warn!(actor_id = %mailbox.self_id, %error, "Failed to destroy actor");
            }
            drop(actor);
            debug!(actor_id = %mailbox.self_id, %reason, "Actor destroyed");
            mailbox.notify_pending_stopped(reason);
        });
    }

    /// Terminates in place when the dispatcher is gone: no `destroy` callback, but queued
    /// messages are still told that their target stopped. Final: the stop reason becomes
    /// `Stopped`, so a re-init trigger can no longer revive the mailbox.
    pub(crate) fn terminate(&self) {
        {
            let mut stop_reason = self.stop_reason.lock();
            *stop_reason = Some(StopReason::Stopped);
            self.destroy_in_progress.store(true, Ordering::SeqCst);
        }
        self.ready.store(false, Ordering::SeqCst);
        debug!(actor_id = %self.self_id, "Actor terminated");
        self.notify_pending_stopped(StopReason::Stopped);
    }

    fn notify_pending_stopped(&self, reason: StopReason) {
        while let Some(msg) = self.high_priority.pop() {
            msg.on_actor_stopped(reason);
        }
        while let Some(msg) = self.normal_priority.pop() {
            msg.on_actor_stopped(reason);
        }
    }
}

/// Mailbox task submitted to a dispatcher. Dropped unrun only when the executor is shut
/// down, which terminates the mailbox.
struct PendingTask<M: ActorMsg> {
    mailbox: Option<Arc<Mailbox<M>>>,
}

impl<M: ActorMsg> Drop for PendingTask<M> {
    fn drop(&mut self) {
        if let Some(mailbox) = self.mailbox.take() {
            warn!(actor_id = %mailbox.self_id, dispatcher = mailbox.dispatcher.name(), "Dispatcher is shut down, terminating actor");
            mailbox.terminate();
        }
    }
}

/// Runs an actor callback, turning a panic into [`ActorError::Panicked`].
fn guarded<T>(callback: impl FnOnce() -> Result<T, ActorError>) -> Result<T, ActorError> {
    match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(result) => result,
        Err(payload) => Err(ActorError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
