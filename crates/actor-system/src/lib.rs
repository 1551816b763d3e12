//! # Actor System
//!
//! A lightweight, in-process actor framework for device-management workloads: device
//! sessions, rule-chain processors and fleet housekeeping all run as actors on top of it.
//!
//! ## Why a custom actor core?
//!
//! A fleet holds hundreds of thousands of devices. Giving each one a task with its own
//! channel works, but the platform needs more than a channel:
//!
//! - **Shared pools**: actors are multiplexed onto a few named thread pools ([`Dispatcher`]s),
//!   and one busy actor cannot starve the others on the same pool.
//! - **Priority lanes**: control traffic (configuration updates, partition changes) jumps
//!   ahead of telemetry.
//! - **Supervised initialization**: an actor whose `init` fails is retried on its own
//!   schedule, and an actor that exhausted its attempts can be revived by a configuration
//!   update.
//! - **Hierarchies**: a tenant actor owns its device actors; stopping the tenant stops them.
//!
//! ## Architecture Overview
//!
//! 1. **Identity** ([`ActorId`]) - closed set of keys, one mailbox per key.
//! 2. **Execution** ([`Dispatcher`], [`Scheduler`]) - named thread pools and delayed tasks.
//! 3. **Mailbox** - two FIFO queues plus the state machine that drives one actor.
//! 4. **Registry** ([`ActorSystem`]) - creation, lookup, send, broadcast, recursive stop.
//! 5. **Contract** ([`Actor`], [`ActorCreator`], [`ActorCtx`], [`ActorMsg`]) - what
//!    collaborators implement and what they get back.
//!
//! ## Concurrency Model
//!
//! - An actor's `process` is never called before its `init` succeeded, and never
//!   concurrently with itself.
//! - A scheduled batch handles at most [`ActorSystemSettings::actor_throughput`] messages,
//!   then yields the worker thread.
//! - High-priority messages are taken before normal ones whenever both are queued; FIFO
//!   holds inside each lane, not across them.
//! - Queues are unbounded. Callers that need admission control can look at
//!   [`ActorRef::pending_messages`].
//!
//! ## Failure Handling
//!
//! Actor callbacks return [`ActorError`]; panics are caught and converted too. The actor
//! then answers with an [`InitFailureStrategy`] or a [`ProcessFailureStrategy`] and the
//! mailbox acts on it. Nothing thrown by an actor ever unwinds a dispatcher thread.
//!
//! ## Observability
//!
//! All lifecycle events are logged with `tracing`, keyed by `actor_id`. See
//! [`tracing::setup_tracing`] for the subscriber used by the demo binaries.

pub mod actor;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod id;
mod mailbox;
pub mod message;
pub mod scheduler;
pub mod settings;
pub mod strategy;
pub mod system;
pub mod tracing;

// Re-export core types for convenience
pub use actor::{Actor, ActorCreator, ActorRef};
pub use context::ActorCtx;
pub use dispatcher::Dispatcher;
pub use error::{ActorError, ActorSystemError, BoxError};
pub use id::{ActorId, EntityId, EntityType};
pub use message::{ActorMsg, MsgType, StopReason};
pub use scheduler::{ScheduledTask, Scheduler};
pub use settings::ActorSystemSettings;
pub use strategy::{InitFailureStrategy, ProcessFailureStrategy};
pub use system::ActorSystem;
