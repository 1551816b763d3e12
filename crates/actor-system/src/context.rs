//! # Actor Context
//!
//! [`ActorCtx`] is what an actor gets in [`Actor::init`](crate::Actor::init): its own id,
//! its parent, and the slice of the registry API an actor needs to cooperate with others.
//! The context holds only weak references, so an actor storing it keeps neither its own
//! mailbox nor the system alive.

use crate::actor::{ActorCreator, ActorRef};
use crate::error::ActorSystemError;
use crate::id::{ActorId, EntityType};
use crate::mailbox::{Mailbox, ParentLink};
use crate::message::ActorMsg;
use crate::scheduler::Scheduler;
use crate::system::ActorSystem;
use std::sync::{Arc, Weak};
use std::time::Duration;

pub struct ActorCtx<M: ActorMsg> {
    self_id: ActorId,
    mailbox: Weak<Mailbox<M>>,
    parent: Option<ParentLink<M>>,
    system: Weak<ActorSystem<M>>,
}

impl<M: ActorMsg> Clone for ActorCtx<M> {
    fn clone(&self) -> Self {
        Self {
            self_id: self.self_id.clone(),
            mailbox: self.mailbox.clone(),
            parent: self.parent.clone(),
            system: self.system.clone(),
        }
    }
}

impl<M: ActorMsg> ActorCtx<M> {
    pub(crate) fn new(
        self_id: ActorId,
        mailbox: Weak<Mailbox<M>>,
        parent: Option<ParentLink<M>>,
        system: Weak<ActorSystem<M>>,
    ) -> Self {
        Self {
            self_id,
            mailbox,
            parent,
            system,
        }
    }

    fn system(&self) -> Result<Arc<ActorSystem<M>>, ActorSystemError> {
        self.system.upgrade().ok_or(ActorSystemError::SystemShutdown)
    }

    pub fn self_id(&self) -> &ActorId {
        &self.self_id
    }

    /// Handle to this actor's own mailbox, for handing out to other actors.
    pub fn self_ref(&self) -> Option<ActorRef<M>> {
        self.mailbox.upgrade().map(ActorRef::new)
    }

    pub fn parent_id(&self) -> Option<&ActorId> {
        self.parent.as_ref().map(|parent| &parent.id)
    }

    pub fn parent_ref(&self) -> Option<ActorRef<M>> {
        self.parent
            .as_ref()
            .and_then(|parent| parent.mailbox.upgrade())
            .map(ActorRef::new)
    }

    pub fn tell(&self, target: &ActorId, msg: M) -> Result<(), ActorSystemError> {
        self.system()?.tell(target, msg)
    }

    pub fn tell_with_high_priority(&self, target: &ActorId, msg: M) -> Result<(), ActorSystemError> {
        self.system()?.tell_with_high_priority(target, msg)
    }

    /// Delivers `msg` to this actor after `delay`, e.g. to implement a timeout.
    pub fn schedule_to_self(&self, msg: M, delay: Duration) {
        if let Some(mailbox) = self.mailbox.upgrade() {
            ActorRef::new(mailbox).tell_with_delay(msg, delay);
        }
    }

    pub fn scheduler(&self) -> Result<Scheduler, ActorSystemError> {
        Ok(self.system()?.scheduler())
    }

    pub fn stop(&self, target: &ActorId) {
        if let Some(system) = self.system.upgrade() {
            system.stop(target);
        }
    }

    /// Returns the registered actor for `actor_id`, creating it as a child of this actor
    /// when it is missing and `create_condition` agrees.
    pub fn get_or_create_child_actor<C, D, F, P>(
        &self,
        actor_id: &ActorId,
        dispatcher: D,
        creator: F,
        create_condition: P,
    ) -> Result<Option<ActorRef<M>>, ActorSystemError>
    where
        C: ActorCreator<M>,
        D: FnOnce() -> String,
        F: FnOnce() -> C,
        P: FnOnce() -> bool,
    {
        let system = self.system()?;
        match system.get_actor(actor_id) {
            Some(actor_ref) => Ok(Some(actor_ref)),
            None if create_condition() => system
                .create_child_actor(&dispatcher(), creator(), &self.self_id)
                .map(Some),
            None => Ok(None),
        }
    }

    pub fn filter_children<P>(&self, predicate: P) -> Vec<ActorId>
    where
        P: Fn(&ActorId) -> bool,
    {
        self.system
            .upgrade()
            .map(|system| system.filter_children(&self.self_id, predicate))
            .unwrap_or_default()
    }
}

impl<M: ActorMsg + Clone> ActorCtx<M> {
    pub fn broadcast_to_children(&self, msg: M) {
        self.broadcast_to_children_with_priority(msg, false);
    }

    pub fn broadcast_to_children_with_priority(&self, msg: M, high_priority: bool) {
        if let Some(system) = self.system.upgrade() {
            system.broadcast_to_children_filtered(&self.self_id, |_| true, msg, high_priority);
        }
    }

    pub fn broadcast_to_children_by_type(&self, msg: M, entity_type: EntityType) {
        self.broadcast_to_children_filtered(msg, |id| id.entity_type() == Some(entity_type));
    }

    pub fn broadcast_to_children_filtered<P>(&self, msg: M, filter: P)
    where
        P: Fn(&ActorId) -> bool,
    {
        if let Some(system) = self.system.upgrade() {
            system.broadcast_to_children_filtered(&self.self_id, filter, msg, false);
        }
    }
}
