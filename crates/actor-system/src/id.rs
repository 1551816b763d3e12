//! # Actor Identity
//!
//! Every mailbox in an [`ActorSystem`](crate::ActorSystem) is addressed by an [`ActorId`].
//! The set of identity kinds is closed:
//!
//! - [`ActorId::Entity`] - one actor per platform entity (a device, a tenant, a rule chain).
//! - [`ActorId::CalculatedField`] - the calculated-field processor derived from an entity.
//! - [`ActorId::Named`] - free-form ids for singletons such as `"app"` or `"housekeeper"`.
//!
//! `Entity` and `CalculatedField` may wrap the *same* [`EntityId`]. They are distinct actors,
//! so equality compares the variant as well as the key, and the calculated-field variant
//! salts its hash so both land in different buckets of the registry map.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Mixed into the hash of [`ActorId::CalculatedField`].
const CALCULATED_FIELD_HASH_SALT: u8 = 1;

/// Kind of platform entity an actor can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Tenant,
    Customer,
    Device,
    DeviceProfile,
    Asset,
    Edge,
    RuleChain,
    RuleNode,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Tenant => "TENANT",
            EntityType::Customer => "CUSTOMER",
            EntityType::Device => "DEVICE",
            EntityType::DeviceProfile => "DEVICE_PROFILE",
            EntityType::Asset => "ASSET",
            EntityType::Edge => "EDGE",
            EntityType::RuleChain => "RULE_CHAIN",
            EntityType::RuleNode => "RULE_NODE",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a platform entity: its type plus its UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub entity_type: EntityType,
    pub id: Uuid,
}

impl EntityId {
    pub fn new(entity_type: EntityType, id: Uuid) -> Self {
        Self { entity_type, id }
    }

    /// A fresh random id of the given type.
    pub fn random(entity_type: EntityType) -> Self {
        Self::new(entity_type, Uuid::new_v4())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.entity_type, self.id)
    }
}

/// Identity of a single actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorId {
    Entity(EntityId),
    CalculatedField(EntityId),
    Named(String),
}

impl ActorId {
    pub fn entity(id: EntityId) -> Self {
        ActorId::Entity(id)
    }

    pub fn calculated_field(id: EntityId) -> Self {
        ActorId::CalculatedField(id)
    }

    pub fn named(name: impl Into<String>) -> Self {
        ActorId::Named(name.into())
    }

    /// The entity type behind this id, if it is entity-scoped.
    pub fn entity_type(&self) -> Option<EntityType> {
        match self {
            ActorId::Entity(id) | ActorId::CalculatedField(id) => Some(id.entity_type),
            ActorId::Named(_) => None,
        }
    }

    pub fn entity_id(&self) -> Option<&EntityId> {
        match self {
            ActorId::Entity(id) | ActorId::CalculatedField(id) => Some(id),
            ActorId::Named(_) => None,
        }
    }
}

impl Hash for ActorId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ActorId::Entity(id) => id.hash(state),
            ActorId::CalculatedField(id) => {
                id.hash(state);
                state.write_u8(CALCULATED_FIELD_HASH_SALT);
            }
            ActorId::Named(name) => name.hash(state),
        }
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorId::Entity(id) => write!(f, "{id}"),
            ActorId::CalculatedField(id) => write!(f, "CF|{id}"),
            ActorId::Named(name) => f.write_str(name),
        }
    }
}

impl From<EntityId> for ActorId {
    fn from(id: EntityId) -> Self {
        ActorId::Entity(id)
    }
}

impl From<&str> for ActorId {
    fn from(name: &str) -> Self {
        ActorId::Named(name.to_string())
    }
}

impl From<String> for ActorId {
    fn from(name: String) -> Self {
        ActorId::Named(name)
    }
}
