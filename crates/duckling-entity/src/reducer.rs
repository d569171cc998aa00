//! Actions and the reducer for the entity system.
//!
//! Every edit to level data is an [`EntityAction`]. The [`EntitySystemReducer`]
//! applies actions to an [`EntitySystem`] without mutating it, and
//! [`merge_entity_action`] tells the undo history when two consecutive entity
//! updates are small enough to share one undo step.
//!
//! The reducer accepts any action type implementing [`AsEntityAction`], so an
//! application can wrap entity actions in its own action enum. Actions that
//! are not entity actions leave the system unchanged.
//!
//! # Example
//!
//! ```
//! use duckling_entity::prelude::*;
//! use duckling_state::prelude::*;
//! use serde_json::json;
//!
//! let mut store: UndoRedoStore<EntityAction, _> = UndoRedoStore::new(EntitySystemReducer)
//!     .with_auto_merge(merge_entity_action::<EntityAction>);
//!
//! let entity = Entity::new().with_attribute("position", json!({"x": 0, "y": 0}));
//! store.dispatch(EntityAction::update_entity("crate", entity.clone()));
//! store.dispatch(EntityAction::update_entity(
//!     "crate",
//!     entity.with_attribute("position", json!({"x": 4, "y": 0})),
//! ));
//!
//! // Both updates changed one scalar, so they share one undo step.
//! assert_eq!(store.undo_depth(), 1);
//! store.undo();
//! assert!(store.current_state().is_empty());
//! ```

use tracing::{debug, trace, warn};

use duckling_state::action::{Action, MergeKey, Reducer};
use duckling_state::diff::ChangeType;

use crate::entity::{classify_entities, Entity, EntityKey};
use crate::system::EntitySystem;

// ---------------------------------------------------------------------------
// EntityActionKind
// ---------------------------------------------------------------------------

/// What an entity action does.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityActionKind {
    /// Set the entity stored under `key`, creating it if absent.
    UpdateEntity {
        /// Target entity.
        key: EntityKey,
        /// The full new value of the entity.
        entity: Entity,
    },
    /// Set several entities as one step, in order.
    UpdateEntities {
        /// `(key, entity)` pairs.
        entities: Vec<(EntityKey, Entity)>,
    },
    /// Replace the whole system, e.g. after a map load.
    ReplaceSystem {
        /// The new system.
        system: EntitySystem,
    },
    /// Delete an entity. No-op if absent.
    DeleteEntity {
        /// Entity to delete.
        key: EntityKey,
    },
    /// Move an entity to a new key, overwriting whatever was there. No-op if
    /// `old_key` is absent.
    RenameEntity {
        /// Current key.
        old_key: EntityKey,
        /// Key after the rename.
        new_key: EntityKey,
    },
}

impl EntityActionKind {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            EntityActionKind::UpdateEntity { .. } => "EntitySystem.UpdateEntity",
            EntityActionKind::UpdateEntities { .. } => "EntitySystem.UpdateEntities",
            EntityActionKind::ReplaceSystem { .. } => "EntitySystem.ReplaceSystem",
            EntityActionKind::DeleteEntity { .. } => "EntitySystem.DeleteEntity",
            EntityActionKind::RenameEntity { .. } => "EntitySystem.RenameEntity",
        }
    }
}

// ---------------------------------------------------------------------------
// EntityAction
// ---------------------------------------------------------------------------

/// An entity action plus its optional merge key.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityAction {
    /// The edit.
    pub kind: EntityActionKind,
    /// Groups this action with neighbours carrying the same key.
    pub merge_key: Option<MergeKey>,
}

impl EntityAction {
    /// Wrap `kind` without a merge key.
    pub fn new(kind: EntityActionKind) -> Self {
        Self {
            kind,
            merge_key: None,
        }
    }

    /// Create or replace one entity.
    pub fn update_entity(key: impl Into<EntityKey>, entity: Entity) -> Self {
        Self::new(EntityActionKind::UpdateEntity {
            key: key.into(),
            entity,
        })
    }

    /// Create or replace several entities at once.
    pub fn update_entities<K, I>(entities: I) -> Self
    where
        K: Into<EntityKey>,
        I: IntoIterator<Item = (K, Entity)>,
    {
        Self::new(EntityActionKind::UpdateEntities {
            entities: entities.into_iter().map(|(k, e)| (k.into(), e)).collect(),
        })
    }

    /// Replace the whole system.
    pub fn replace_system(system: EntitySystem) -> Self {
        Self::new(EntityActionKind::ReplaceSystem { system })
    }

    /// Delete one entity.
    pub fn delete_entity(key: impl Into<EntityKey>) -> Self {
        Self::new(EntityActionKind::DeleteEntity { key: key.into() })
    }

    /// Rename one entity.
    pub fn rename_entity(old_key: impl Into<EntityKey>, new_key: impl Into<EntityKey>) -> Self {
        Self::new(EntityActionKind::RenameEntity {
            old_key: old_key.into(),
            new_key: new_key.into(),
        })
    }

    /// Attach a merge key.
    #[must_use]
    pub fn with_merge_key(mut self, merge_key: MergeKey) -> Self {
        self.merge_key = Some(merge_key);
        self
    }

    /// Attach a merge key if one is given.
    #[must_use]
    pub fn with_optional_merge_key(mut self, merge_key: Option<MergeKey>) -> Self {
        self.merge_key = merge_key;
        self
    }
}

impl Action for EntityAction {
    fn merge_key(&self) -> Option<MergeKey> {
        self.merge_key
    }

    fn name(&self) -> &'static str {
        self.kind.name()
    }
}

// ---------------------------------------------------------------------------
// AsEntityAction
// ---------------------------------------------------------------------------

/// Access to the entity part of an application action.
///
/// Return `None` for actions that do not touch the entity system; the
/// reducer passes them through unchanged.
pub trait AsEntityAction {
    /// The entity edit carried by this action, if any.
    fn as_entity_action(&self) -> Option<&EntityActionKind>;
}

impl AsEntityAction for EntityAction {
    fn as_entity_action(&self) -> Option<&EntityActionKind> {
        Some(&self.kind)
    }
}

impl AsEntityAction for EntityActionKind {
    fn as_entity_action(&self) -> Option<&EntityActionKind> {
        Some(self)
    }
}

// ---------------------------------------------------------------------------
// EntitySystemReducer
// ---------------------------------------------------------------------------

/// Reducer over [`EntitySystem`]. Starts from an empty system.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntitySystemReducer;

impl<A: AsEntityAction> Reducer<A> for EntitySystemReducer {
    type State = EntitySystem;

    fn initial_state(&self) -> EntitySystem {
        EntitySystem::new()
    }

    fn reduce(&self, state: EntitySystem, action: &A) -> EntitySystem {
        match action.as_entity_action() {
            Some(kind) => reduce_entity_system(state, kind),
            None => state,
        }
    }
}

/// Apply one entity edit.
pub fn reduce_entity_system(system: EntitySystem, action: &EntityActionKind) -> EntitySystem {
    trace!(action = action.name(), "reducing entity system");
    match action {
        EntityActionKind::UpdateEntity { key, entity } => system.set(key.clone(), entity.clone()),
        EntityActionKind::UpdateEntities { entities } => entities
            .iter()
            .fold(system, |system, (key, entity)| {
                system.set(key.clone(), entity.clone())
            }),
        EntityActionKind::ReplaceSystem { system: replacement } => replacement.clone(),
        EntityActionKind::DeleteEntity { key } => system.remove(key),
        EntityActionKind::RenameEntity { old_key, new_key } => {
            rename_entity(system, old_key, new_key)
        }
    }
}

fn rename_entity(system: EntitySystem, old_key: &str, new_key: &str) -> EntitySystem {
    if old_key == new_key {
        return system;
    }
    let Some(entity) = system.get(old_key).cloned() else {
        warn!(old_key, new_key, "rename ignored: entity does not exist");
        return system;
    };
    if system.contains_key(new_key) {
        debug!(old_key, new_key, "rename overwrites existing entity");
    }
    system.remove(old_key).set(new_key, entity)
}

// ---------------------------------------------------------------------------
// Merge predicate
// ---------------------------------------------------------------------------

/// `true` if `action` may merge into the history entry ending with
/// `previous`.
///
/// Both must be single-entity updates to the same key, and the two entity
/// values may differ by at most one primitive. This keeps typing into an
/// attribute field from producing one undo step per keystroke.
pub fn merge_entity_action<A: AsEntityAction>(action: &A, previous: &A) -> bool {
    let (
        Some(EntityActionKind::UpdateEntity { key, entity }),
        Some(EntityActionKind::UpdateEntity {
            key: previous_key,
            entity: previous_entity,
        }),
    ) = (action.as_entity_action(), previous.as_entity_action())
    else {
        return false;
    };

    if key != previous_key {
        return false;
    }

    matches!(
        classify_entities(entity, previous_entity),
        ChangeType::Equal | ChangeType::PrimitiveChange
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
