//! The persistent entity system holding all level data.
//!
//! [`EntitySystem`] maps entity keys to entities using an `im::HashMap`, so
//! every "mutation" returns a new system that shares structure with the old
//! one. Old systems are never modified, which lets the undo history and UI
//! subscribers keep references to past states for free.
//!
//! Iteration order is unspecified.

use std::fmt;
use std::sync::Arc;

use im::HashMap;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityKey};

/// Immutable mapping from [`EntityKey`] to [`Entity`].
///
/// `Clone` is O(1). Entities are stored behind `Arc` so that handing out
/// an entity to several systems never deep-copies its attributes.
#[derive(Clone, Default, PartialEq)]
pub struct EntitySystem {
    entities: HashMap<EntityKey, Arc<Entity>>,
}

impl EntitySystem {
    /// An empty system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entity.
    pub fn get(&self, key: &str) -> Option<&Entity> {
        self.entities.get(key).map(Arc::as_ref)
    }

    /// `true` if `key` names an entity.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entities.contains_key(key)
    }

    /// A new system with `key` mapped to `entity` (created or replaced).
    #[must_use]
    pub fn set(&self, key: impl Into<EntityKey>, entity: Entity) -> Self {
        Self {
            entities: self.entities.update(key.into(), Arc::new(entity)),
        }
    }

    /// A new system without `key`. Returns a clone of `self` when the key is
    /// absent.
    #[must_use]
    pub fn remove(&self, key: &str) -> Self {
        if !self.entities.contains_key(key) {
            return self.clone();
        }
        Self {
            entities: self.entities.without(key),
        }
    }

    /// `true` if the system has no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Iterate over `(key, entity)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, &Entity)> {
        self.entities.iter().map(|(k, v)| (k, v.as_ref()))
    }

    /// Iterate over entity keys in unspecified order.
    pub fn keys(&self) -> impl Iterator<Item = &EntityKey> {
        self.entities.keys()
    }

    /// Entity keys sorted lexicographically.
    pub fn sorted_keys(&self) -> Vec<EntityKey> {
        let mut keys: Vec<EntityKey> = self.entities.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// The key of the first entity matching `predicate`.
    pub fn find_key<P>(&self, mut predicate: P) -> Option<&EntityKey>
    where
        P: FnMut(&Entity) -> bool,
    {
        self.entities
            .iter()
            .find(|(_, entity)| predicate(entity))
            .map(|(key, _)| key)
    }

    /// `true` if both systems are the same instance (not just equal).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.entities.ptr_eq(&other.entities)
    }
}

impl fmt::Debug for EntitySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = self.sorted_keys();
        keys.truncate(16);
        f.debug_struct("EntitySystem")
            .field("len", &self.len())
            .field("keys", &keys)
            .finish()
    }
}

impl FromIterator<(EntityKey, Entity)> for EntitySystem {
    fn from_iter<I: IntoIterator<Item = (EntityKey, Entity)>>(iter: I) -> Self {
        Self {
            entities: iter
                .into_iter()
                .map(|(key, entity)| (key, Arc::new(entity)))
                .collect(),
        }
    }
}

impl Extend<(EntityKey, Entity)> for EntitySystem {
    fn extend<I: IntoIterator<Item = (EntityKey, Entity)>>(&mut self, iter: I) {
        for (key, entity) in iter {
            self.entities.insert(key, Arc::new(entity));
        }
    }
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

impl Serialize for EntitySystem {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        // Sorted for stable output.
        let keys = self.sorted_keys();
        let mut map = serializer.serialize_map(Some(keys.len()))?;
        for key in &keys {
            if let Some(entity) = self.get(key) {
                map.serialize_entry(key, entity)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EntitySystem {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entities = std::collections::BTreeMap::<EntityKey, Entity>::deserialize(deserializer)?;
        Ok(entities.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
