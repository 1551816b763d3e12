//! # Actor Contract
//!
//! This module defines what a collaborator implements to run on the framework
//! ([`Actor`], [`ActorCreator`]) and the handle the rest of the platform uses to talk to a
//! running actor ([`ActorRef`]).
//!
//! ## Lifecycle
//!
//! 1. [`ActorSystem::create_root_actor`](crate::ActorSystem::create_root_actor) (or a child
//!    variant) asks the [`ActorCreator`] for the id, and - only if no mailbox exists for it
//!    yet - for the actor itself.
//! 2. [`Actor::init`] runs on the dispatcher. Until it succeeds, messages wait in the queues.
//!    On failure [`Actor::on_init_failure`] picks the retry policy.
//! 3. [`Actor::process`] receives messages one at a time, never concurrently.
//!    On failure [`Actor::on_process_failure`] decides between resuming and stopping.
//! 4. [`Actor::destroy`] runs once the actor is stopped.
//!
//! Every callback is guarded by the mailbox: errors *and panics* become [`ActorError`]
//! values, and only the returned strategy influences what happens next.
//!
//! ```rust
//! use actor_system::{Actor, ActorCtx, ActorError, ActorMsg, MsgType};
//!
//! struct Ping;
//! impl ActorMsg for Ping {
//!     fn msg_type(&self) -> MsgType { MsgType::Other }
//! }
//!
//! #[derive(Default)]
//! struct Counter { seen: usize, ctx: Option<ActorCtx<Ping>> }
//!
//! impl Actor<Ping> for Counter {
//!     fn init(&mut self, ctx: ActorCtx<Ping>) -> Result<(), ActorError> {
//!         self.ctx = Some(ctx);
//!         Ok(())
//!     }
//!
//!     fn process(&mut self, _msg: Ping) -> Result<(), ActorError> {
//!         self.seen += 1;
//!         Ok(())
//!     }
//! }
//! ```

use crate::context::ActorCtx;
use crate::error::ActorError;
use crate::id::ActorId;
use crate::mailbox::Mailbox;
use crate::message::{ActorMsg, StopReason};
use crate::strategy::{InitFailureStrategy, ProcessFailureStrategy};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Delay used by the default [`Actor::on_init_failure`].
pub const DEFAULT_INIT_RETRY_DELAY_MS: u64 = 5000;

/// A unit of strictly sequential message processing.
pub trait Actor<M: ActorMsg>: Send + 'static {
    /// Called on the dispatcher before any message is processed. Keep `ctx` if the actor
    /// needs to send messages, spawn children or stop itself later.
    fn init(&mut self, _ctx: ActorCtx<M>) -> Result<(), ActorError> {
        Ok(())
    }

    fn process(&mut self, msg: M) -> Result<(), ActorError>;

    fn destroy(&mut self, _reason: StopReason) {}

    fn on_init_failure(&mut self, _attempt: u32, _error: &ActorError) -> InitFailureStrategy {
        InitFailureStrategy::retry_with_delay(DEFAULT_INIT_RETRY_DELAY_MS)
    }

    /// Panics stop the actor, ordinary errors are skipped.
    fn on_process_failure(&mut self, error: &ActorError) -> ProcessFailureStrategy {
        if error.is_panic() {
            ProcessFailureStrategy::stop()
        } else {
            ProcessFailureStrategy::resume()
        }
    }
}

/// Factory for one actor. Consumed by the system only when a new mailbox is needed.
pub trait ActorCreator<M: ActorMsg>: Send {
    fn create_actor_id(&self) -> ActorId;

    fn create_actor(self) -> Result<Box<dyn Actor<M>>, ActorError>;
}

/// Handle to a registered mailbox.
///
/// Holding an `ActorRef` does not keep the actor registered: after a stop, messages sent
/// through a stale handle get [`ActorMsg::on_actor_stopped`] instead of being queued.
pub struct ActorRef<M: ActorMsg> {
    mailbox: Arc<Mailbox<M>>,
}

impl<M: ActorMsg> ActorRef<M> {
    pub(crate) fn new(mailbox: Arc<Mailbox<M>>) -> Self {
        Self { mailbox }
    }

    pub fn id(&self) -> &ActorId {
        self.mailbox.self_id()
    }

    pub fn tell(&self, msg: M) {
        self.mailbox.enqueue(msg, false);
    }

    pub fn tell_with_high_priority(&self, msg: M) {
        self.mailbox.enqueue(msg, true);
    }

    /// Sends `msg` after `delay` through the system scheduler. If the scheduler stops
    /// before the delay elapses, the message is told that its target stopped.
    pub fn tell_with_delay(&self, msg: M, delay: Duration) {
        let mailbox = self.mailbox.clone();
        let mut delayed = DelayedMsg { msg: Some(msg) };
        self.mailbox.scheduler().schedule(delay, move || {
            if let Some(msg) = delayed.msg.take() {
                mailbox.enqueue(msg, false);
            }
        });
    }

    /// Messages waiting in both queues.
    pub fn pending_messages(&self) -> usize {
        self.mailbox.pending_messages()
    }

    pub fn is_stopped(&self) -> bool {
        self.mailbox.is_destroying()
    }

    pub(crate) fn mailbox(&self) -> &Arc<Mailbox<M>> {
        &self.mailbox
    }
}

struct DelayedMsg<M: ActorMsg> {
    msg: Option<M>,
}

impl<M: ActorMsg> Drop for DelayedMsg<M> {
    fn drop(&mut self) {
        if let Some(msg) = self.msg.take() {
            msg.on_actor_stopped(StopReason::Stopped);
        }
    }
}

impl<M: ActorMsg> Clone for ActorRef<M> {
    fn clone(&self) -> Self {
        Self {
            mailbox: self.mailbox.clone(),
        }
    }
}

impl<M: ActorMsg> PartialEq for ActorRef<M> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.mailbox, &other.mailbox)
    }
}

impl<M: ActorMsg> fmt::Debug for ActorRef<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRef").field("id", self.id()).finish()
    }
}
