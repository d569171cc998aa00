//! Convenience facade over an entity store.
//!
//! [`EntitySystemService`] owns an [`EntityStore`] and turns editor intents
//! ("add this entity", "rename that one") into dispatched [`EntityAction`]s.
//! Every edit goes through the store, so everything done here is undoable.

use tracing::debug;

use duckling_state::action::MergeKey;
use duckling_state::store::{SubscriptionId, UndoRedoConfig, UndoRedoStore};

use crate::entity::{AttributeDefaults, Entity, EntityKey};
use crate::reducer::{merge_entity_action, EntityAction, EntitySystemReducer};
use crate::system::EntitySystem;
use crate::EntityError;

/// The undo/redo store specialised to entity actions.
pub type EntityStore = UndoRedoStore<EntityAction, EntitySystemReducer>;

/// Build an entity store that auto-merges single-field edits.
pub fn entity_store(config: UndoRedoConfig) -> EntityStore {
    UndoRedoStore::new(EntitySystemReducer)
        .with_auto_merge(merge_entity_action::<EntityAction>)
        .with_config(config)
}

/// Editor-facing access to the entity system held by a store.
pub struct EntitySystemService {
    store: EntityStore,
    next_key: u64,
}

impl std::fmt::Debug for EntitySystemService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitySystemService")
            .field("store", &self.store)
            .field("next_key", &self.next_key)
            .finish()
    }
}

impl Default for EntitySystemService {
    fn default() -> Self {
        Self::new(entity_store(UndoRedoConfig::default()))
    }
}

impl EntitySystemService {
    /// Wrap an existing store.
    pub fn new(store: EntityStore) -> Self {
        Self { store, next_key: 0 }
    }

    /// The current entity system.
    pub fn entity_system(&self) -> &EntitySystem {
        self.store.current_state()
    }

    /// Look up one entity in the current system.
    pub fn get_entity(&self, key: &str) -> Option<&Entity> {
        self.entity_system().get(key)
    }

    /// Key of the first entity equal to `entity`.
    pub fn key_of(&self, entity: &Entity) -> Option<&EntityKey> {
        self.entity_system().find_key(|candidate| candidate == entity)
    }

    /// Create or replace an entity.
    pub fn update_entity(
        &mut self,
        key: impl Into<EntityKey>,
        entity: Entity,
        merge_key: Option<MergeKey>,
    ) {
        self.store
            .dispatch(EntityAction::update_entity(key, entity).with_optional_merge_key(merge_key));
    }

    /// Add `entity` under a freshly generated key and return that key.
    pub fn add_new_entity(&mut self, entity: Entity, merge_key: Option<MergeKey>) -> EntityKey {
        let key = self.next_entity_key();
        self.update_entity(key.clone(), entity, merge_key);
        key
    }

    /// Delete an entity.
    pub fn delete_entity(&mut self, key: impl Into<EntityKey>, merge_key: Option<MergeKey>) {
        self.store
            .dispatch(EntityAction::delete_entity(key).with_optional_merge_key(merge_key));
    }

    /// Rename an entity.
    pub fn rename_entity(
        &mut self,
        old_key: impl Into<EntityKey>,
        new_key: impl Into<EntityKey>,
        merge_key: Option<MergeKey>,
    ) {
        self.store.dispatch(
            EntityAction::rename_entity(old_key, new_key).with_optional_merge_key(merge_key),
        );
    }

    /// Replace the whole system as an undoable step.
    pub fn replace_system(&mut self, system: EntitySystem) {
        self.store.dispatch(EntityAction::replace_system(system));
    }

    /// Replace the whole system and forget history, as after opening a map.
    pub fn load_system(&mut self, system: EntitySystem) {
        debug!(entities = system.len(), "loading entity system");
        self.replace_system(system);
        self.store.clear_history();
        self.next_key = 0;
    }

    /// Add an attribute with its registry default to an existing entity.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::UnknownEntity`] if `key` does not exist and
    /// [`EntityError::UnknownAttribute`] if the registry has no default for
    /// `attribute`.
    pub fn add_attribute(
        &mut self,
        key: &str,
        attribute: &str,
        defaults: &dyn AttributeDefaults,
        merge_key: Option<MergeKey>,
    ) -> Result<(), EntityError> {
        let entity = self.existing(key)?;
        let value = defaults
            .default_attribute(attribute)
            .ok_or_else(|| EntityError::UnknownAttribute {
                attribute: attribute.to_owned(),
            })?;
        let updated = entity.with_attribute(attribute, value);
        self.update_entity(key, updated, merge_key);
        Ok(())
    }

    /// Remove an attribute from an existing entity.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::UnknownEntity`] if `key` does not exist.
    pub fn remove_attribute(
        &mut self,
        key: &str,
        attribute: &str,
        merge_key: Option<MergeKey>,
    ) -> Result<(), EntityError> {
        let entity = self.existing(key)?;
        if !entity.has(attribute) {
            return Ok(());
        }
        let updated = entity.without_attribute(attribute);
        self.update_entity(key, updated, merge_key);
        Ok(())
    }

    /// Undo the last step.
    pub fn undo(&mut self) {
        self.store.undo();
    }

    /// Redo the last undone step.
    pub fn redo(&mut self) {
        self.store.redo();
    }

    /// Receive the entity system after every dispatch.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&EntitySystem) + 'static,
    {
        self.store.subscribe(callback)
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Mutably borrow the underlying store.
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    /// Consume the service and return its store.
    pub fn into_store(self) -> EntityStore {
        self.store
    }

    fn existing(&self, key: &str) -> Result<Entity, EntityError> {
        self.get_entity(key)
            .cloned()
            .ok_or_else(|| EntityError::UnknownEntity {
                key: key.to_owned(),
            })
    }

    /// Next numeric key not already used by the current system.
    fn next_entity_key(&mut self) -> EntityKey {
        loop {
            let candidate = self.next_key.to_string();
            self.next_key += 1;
            if !self.entity_system().contains_key(&candidate) {
                return candidate;
            }
        }
    }
}
