//! # Actor System
//!
//! [`ActorSystem`] is the registry every actor lives in. It owns:
//!
//! - the dispatchers (name -> executor binding),
//! - the mailboxes (one per [`ActorId`]),
//! - the parent -> children adjacency,
//! - the shared [`Scheduler`].
//!
//! All three maps are concurrent (`DashMap`), so lookups and sends never contend on a
//! global lock. First-time creation of an actor is serialised per id through a lock that
//! exists only while that id is being created.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use actor_system::{ActorSystem, ActorSystemSettings, Dispatcher};
//! # use actor_system::{ActorMsg, MsgType};
//! # struct Msg;
//! # impl ActorMsg for Msg { fn msg_type(&self) -> MsgType { MsgType::Other } }
//!
//! let system = ActorSystem::<Msg>::new(ActorSystemSettings::default()).unwrap();
//! system
//!     .create_dispatcher("device-dispatcher", Dispatcher::fixed_thread_pool("device", 4).unwrap())
//!     .unwrap();
//! // system.create_root_actor("device-dispatcher", creator)?;
//! system.shutdown();
//! ```

use crate::actor::{ActorCreator, ActorRef};
use crate::dispatcher::{Dispatcher, DispatcherHandle};
use crate::error::ActorSystemError;
use crate::id::ActorId;
use crate::mailbox::{Mailbox, ParentLink};
use crate::message::ActorMsg;
use crate::scheduler::{Scheduler, SchedulerPool};
use crate::settings::ActorSystemSettings;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::{Arc, Weak};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

pub struct ActorSystem<M: ActorMsg> {
    self_ref: Weak<ActorSystem<M>>,
    settings: ActorSystemSettings,
    scheduler: SchedulerPool,
    dispatchers: DashMap<String, Arc<Dispatcher>>,
    actors: DashMap<ActorId, Arc<Mailbox<M>>>,
    actor_creation_locks: DashMap<ActorId, Arc<Mutex<()>>>,
    parent_children: DashMap<ActorId, HashSet<ActorId>>,
}

impl<M: ActorMsg> ActorSystem<M> {
    pub fn new(settings: ActorSystemSettings) -> Result<Arc<Self>, ActorSystemError> {
        settings.validate()?;
        let scheduler = SchedulerPool::new(settings.scheduler_pool_size)?;
        info!(
            actor_throughput = settings.actor_throughput,
            max_actor_init_attempts = settings.max_actor_init_attempts,
            scheduler_pool_size = settings.scheduler_pool_size,
            "Actor system started"
        );
        Ok(Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            settings,
            scheduler,
            dispatchers: DashMap::new(),
            actors: DashMap::new(),
            actor_creation_locks: DashMap::new(),
            parent_children: DashMap::new(),
        }))
    }

    pub fn settings(&self) -> &ActorSystemSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> Scheduler {
        self.scheduler.scheduler()
    }

    pub(crate) fn downgrade(&self) -> Weak<ActorSystem<M>> {
        self.self_ref.clone()
    }

    // --- Dispatchers ---

    pub fn create_dispatcher(&self, name: &str, executor: Runtime) -> Result<(), ActorSystemError> {
        match self.dispatchers.entry(name.to_string()) {
            Entry::Occupied(_) => {
                // Dropping a runtime inside an async context panics.
                executor.shutdown_background();
                Err(ActorSystemError::DispatcherAlreadyRegistered(name.to_string()))
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Dispatcher::new(name, executor)));
                info!(dispatcher = name, "Dispatcher created");
                Ok(())
            }
        }
    }

    /// Shuts the dispatcher's executor down immediately and stops every actor bound to it,
    /// together with their children.
    pub fn destroy_dispatcher(&self, name: &str) -> Result<(), ActorSystemError> {
        let (_, dispatcher) = self
            .dispatchers
            .remove(name)
            .ok_or_else(|| ActorSystemError::DispatcherNotRegistered(name.to_string()))?;
        dispatcher.shutdown_now();

        let bound: Vec<ActorId> = self
            .actors
            .iter()
            .filter(|entry| entry.value().dispatcher_name() == name)
            .map(|entry| entry.key().clone())
            .collect();
        if !bound.is_empty() {
            info!(dispatcher = name, actors = bound.len(), "Stopping actors of destroyed dispatcher");
        }
        for id in &bound {
            self.stop(id);
        }
        Ok(())
    }

    // --- Actors ---

    pub fn get_actor(&self, id: &ActorId) -> Option<ActorRef<M>> {
        self.actors
            .get(id)
            .map(|mailbox| ActorRef::new(mailbox.value().clone()))
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn create_root_actor<C>(&self, dispatcher_id: &str, creator: C) -> Result<ActorRef<M>, ActorSystemError>
    where
        C: ActorCreator<M>,
    {
        self.create_actor(dispatcher_id, creator, None)
    }

    pub fn create_child_actor<C>(
        &self,
        dispatcher_id: &str,
        creator: C,
        parent: &ActorId,
    ) -> Result<ActorRef<M>, ActorSystemError>
    where
        C: ActorCreator<M>,
    {
        self.create_actor(dispatcher_id, creator, Some(parent))
    }

    fn create_actor<C>(
        &self,
        dispatcher_id: &str,
        creator: C,
        parent: Option<&ActorId>,
    ) -> Result<ActorRef<M>, ActorSystemError>
    where
        C: ActorCreator<M>,
    {
        let dispatcher = self
            .dispatchers
            .get(dispatcher_id)
            .map(|dispatcher| dispatcher.handle())
            .ok_or_else(|| {
                warn!(dispatcher = dispatcher_id, "Dispatcher is not registered");
                ActorSystemError::DispatcherNotRegistered(dispatcher_id.to_string())
            })?;

        let actor_id = creator.create_actor_id();
        if let Some(existing) = self.get_actor(&actor_id) {
            debug!(actor_id = %actor_id, "Actor is already registered");
            return Ok(existing);
        }

        let creation_lock = self
            .actor_creation_locks
            .entry(actor_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = creation_lock.lock();
        let result = self.create_actor_locked(dispatcher, creator, actor_id.clone(), parent);
        self.actor_creation_locks.remove(&actor_id);
        drop(guard);
        result
    }

    fn create_actor_locked<C>(
        &self,
        dispatcher: DispatcherHandle,
        creator: C,
        actor_id: ActorId,
        parent: Option<&ActorId>,
    ) -> Result<ActorRef<M>, ActorSystemError>
    where
        C: ActorCreator<M>,
    {
        if let Some(existing) = self.get_actor(&actor_id) {
            debug!(actor_id = %actor_id, "Actor is already registered");
            return Ok(existing);
        }

        let parent_link = match parent {
            Some(parent_id) => {
                let parent_ref = self
                    .get_actor(parent_id)
                    .ok_or_else(|| ActorSystemError::ActorNotRegistered(parent_id.clone()))?;
                Some(ParentLink {
                    id: parent_id.clone(),
                    mailbox: Arc::downgrade(parent_ref.mailbox()),
                })
            }
            None => None,
        };

        debug!(actor_id = %actor_id, dispatcher = dispatcher.name(), "Creating actor");
        let actor = creator
            .create_actor()
            .map_err(|source| ActorSystemError::ActorCreation {
                id: actor_id.clone(),
                source,
            })?;

        let mailbox = Mailbox::new(self, actor_id.clone(), parent_link, actor, dispatcher);
        match self.actors.entry(actor_id.clone()) {
            Entry::Occupied(entry) => {
                debug!(actor_id = %actor_id, "Actor registered concurrently, discarding new instance");
                return Ok(ActorRef::new(entry.get().clone()));
            }
            Entry::Vacant(entry) => {
                entry.insert(mailbox.clone());
            }
        }
        mailbox.init_actor();
        if let Some(parent_id) = parent {
            self.parent_children
                .entry(parent_id.clone())
                .or_default()
                .insert(actor_id);
        }
        Ok(ActorRef::new(mailbox))
    }

    // --- Messaging ---

    pub fn tell(&self, target: &ActorId, msg: M) -> Result<(), ActorSystemError> {
        self.tell_inner(target, msg, false)
    }

    pub fn tell_with_high_priority(&self, target: &ActorId, msg: M) -> Result<(), ActorSystemError> {
        self.tell_inner(target, msg, true)
    }

    fn tell_inner(&self, target: &ActorId, msg: M, high_priority: bool) -> Result<(), ActorSystemError> {
        let mailbox = self
            .actors
            .get(target)
            .map(|mailbox| mailbox.value().clone())
            .ok_or_else(|| ActorSystemError::ActorNotRegistered(target.clone()))?;
        mailbox.enqueue(msg, high_priority);
        Ok(())
    }

    /// Snapshot of the children currently registered under `parent`.
    pub fn children(&self, parent: &ActorId) -> Vec<ActorId> {
        self.filter_children(parent, |_| true)
    }

    pub fn filter_children<P>(&self, parent: &ActorId, predicate: P) -> Vec<ActorId>
    where
        P: Fn(&ActorId) -> bool,
    {
        let snapshot: Vec<ActorId> = self
            .parent_children
            .get(parent)
            .map(|children| children.iter().cloned().collect())
            .unwrap_or_default();
        snapshot.into_iter().filter(|id| predicate(id)).collect()
    }

    // --- Stopping ---

    /// Stops `id` and, depth-first, every actor below it.
    pub fn stop(&self, id: &ActorId) {
        if let Some((_, children)) = self.parent_children.remove(id) {
            for child in &children {
                self.stop(child);
            }
        }
        if let Some((_, mailbox)) = self.actors.remove(id) {
            if let Some(parent_id) = mailbox.parent_id() {
                if let Some(mut siblings) = self.parent_children.get_mut(parent_id) {
                    siblings.remove(id);
                }
            }
            debug!(actor_id = %id, "Stopping actor");
            mailbox.destroy();
        }
    }

    pub fn stop_ref(&self, actor_ref: &ActorRef<M>) {
        self.stop(actor_ref.id());
    }

    /// Stops every dispatcher and the scheduler, then clears the registry.
    ///
    /// Each dispatcher gets `dispatcher_shutdown_timeout_ms` to finish running batches.
    /// Messages still queued anywhere are answered with a stopped-notification.
    pub fn shutdown(&self) {
        info!("Stopping actor system");
        let dispatchers: Vec<Arc<Dispatcher>> = self
            .dispatchers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        self.dispatchers.clear();
        for dispatcher in dispatchers {
            dispatcher.shutdown_gracefully(self.settings.dispatcher_shutdown_timeout());
        }
        self.scheduler.shutdown();

        let mailboxes: Vec<Arc<Mailbox<M>>> = self
            .actors
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        self.actors.clear();
        self.parent_children.clear();
        for mailbox in mailboxes {
            mailbox.terminate();
        }
        info!("Actor system stopped");
    }
}

impl<M: ActorMsg + Clone> ActorSystem<M> {
    pub fn broadcast_to_children(&self, parent: &ActorId, msg: M) {
        self.broadcast_to_children_filtered(parent, |_| true, msg, false);
    }

    pub fn broadcast_to_children_with_priority(&self, parent: &ActorId, msg: M, high_priority: bool) {
        self.broadcast_to_children_filtered(parent, |_| true, msg, high_priority);
    }

    /// Delivers a copy of `msg` to each child accepted by `filter`. Children that stopped
    /// after the snapshot was taken are skipped.
    pub fn broadcast_to_children_filtered<P>(&self, parent: &ActorId, filter: P, msg: M, high_priority: bool)
    where
        P: Fn(&ActorId) -> bool,
    {
        for child in self.filter_children(parent, filter) {
            if let Err(err) = self.tell_inner(&child, msg.clone(), high_priority) {
                warn!(actor_id = %child, error = %err, "Actor is missing for broadcast");
            }
        }
    }
}
