//! Duckling Entity -- the level's entity system and its reducer.
//!
//! Level data is an [`EntitySystem`](system::EntitySystem): a persistent map
//! from entity key to [`Entity`](entity::Entity), where each entity is a bag
//! of JSON attributes. Systems are never mutated in place. Every edit returns
//! a new system that shares unchanged entities with the old one, which keeps
//! undo history cheap.
//!
//! # Quick Start
//!
//! ```
//! use duckling_entity::prelude::*;
//! use serde_json::json;
//!
//! let mut service = EntitySystemService::default();
//! let key = service.add_new_entity(
//!     Entity::new().with_attribute("position", json!({"x": 16, "y": 32})),
//!     None,
//! );
//! service.rename_entity(key, "player", None);
//!
//! assert!(service.get_entity("player").is_some());
//! service.undo();
//! assert!(service.get_entity("player").is_none());
//! ```

#![deny(unsafe_code)]

pub mod entity;
pub mod reducer;
pub mod service;
pub mod system;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by entity operations.
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    /// A JSON value that should have been an entity was not an object.
    #[error("expected an entity object, found {found}")]
    NotAnObject {
        found: &'static str,
    },

    /// The entity key is not present in the current system.
    #[error("entity '{key}' does not exist")]
    UnknownEntity {
        key: String,
    },

    /// No default is registered for this attribute kind.
    #[error("attribute '{attribute}' has no registered default")]
    UnknownAttribute {
        attribute: String,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::entity::{
        classify_entities, Attribute, AttributeDefaults, AttributeKey, Entity, EntityKey,
    };
    pub use crate::reducer::{
        merge_entity_action, reduce_entity_system, AsEntityAction, EntityAction,
        EntityActionKind, EntitySystemReducer,
    };
    pub use crate::service::{entity_store, EntityStore, EntitySystemService};
    pub use crate::system::EntitySystem;
    pub use crate::EntityError;
}

pub use entity::Entity;
pub use reducer::{EntityAction, EntitySystemReducer};
pub use system::EntitySystem;
