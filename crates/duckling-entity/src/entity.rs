//! Entities and their attributes.
//!
//! An [`Entity`] is a bag of attributes keyed by [`AttributeKey`]. Attribute
//! values are plain JSON; their schema belongs to whoever registered the
//! attribute kind. An entity with no attributes is valid and is not the same
//! thing as a missing entity.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use duckling_state::diff::{classify_maps, ChangeType};

use crate::EntityError;

/// Names a category of attached data (e.g. `"position"`, `"collision"`).
pub type AttributeKey = String;

/// Names one entity within an [`EntitySystem`](crate::system::EntitySystem).
pub type EntityKey = String;

/// The data for one attribute on one entity.
pub type Attribute = Value;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A mapping from attribute key to attribute value.
///
/// Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity {
    attributes: Map<String, Value>,
}

impl Entity {
    /// An entity with no attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an entity from a JSON value, which must be an object.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::NotAnObject`] for any other JSON type.
    pub fn from_value(value: Value) -> Result<Self, EntityError> {
        match value {
            Value::Object(attributes) => Ok(Self { attributes }),
            other => Err(EntityError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }

    /// The entity as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.attributes.clone())
    }

    /// Look up one attribute.
    pub fn get(&self, key: &str) -> Option<&Attribute> {
        self.attributes.get(key)
    }

    /// `true` if the attribute is present.
    pub fn has(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Insert or replace an attribute in place, returning the previous value.
    pub fn insert(&mut self, key: impl Into<AttributeKey>, value: Attribute) -> Option<Attribute> {
        self.attributes.insert(key.into(), value)
    }

    /// Remove an attribute in place, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Attribute> {
        self.attributes.remove(key)
    }

    /// A copy of this entity with `key` set to `value`.
    pub fn with_attribute(&self, key: impl Into<AttributeKey>, value: Attribute) -> Self {
        let mut next = self.clone();
        next.insert(key, value);
        next
    }

    /// A copy of this entity without `key`.
    pub fn without_attribute(&self, key: &str) -> Self {
        let mut next = self.clone();
        next.remove(key);
        next
    }

    /// Iterate over `(attribute key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&AttributeKey, &Attribute)> {
        self.attributes.iter()
    }

    /// Attribute keys present on this entity.
    pub fn attribute_keys(&self) -> impl Iterator<Item = &AttributeKey> {
        self.attributes.keys()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// `true` if the entity has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Borrow the underlying attribute map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

impl FromIterator<(AttributeKey, Attribute)> for Entity {
    fn from_iter<I: IntoIterator<Item = (AttributeKey, Attribute)>>(iter: I) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}

impl TryFrom<Value> for Entity {
    type Error = EntityError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Entity::from_value(value)
    }
}

impl From<Entity> for Value {
    fn from(entity: Entity) -> Self {
        Value::Object(entity.attributes)
    }
}

/// Classify the change between two entities as if both were JSON objects.
pub fn classify_entities(before: &Entity, after: &Entity) -> ChangeType {
    classify_maps(&before.attributes, &after.attributes)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// AttributeDefaults
// ---------------------------------------------------------------------------

/// Source of default values for newly added attributes.
///
/// Implemented by the attribute registry that owns the attribute schemas.
/// Returns `None` for unknown attribute kinds.
pub trait AttributeDefaults {
    /// Default value for a fresh attribute of kind `key`.
    fn default_attribute(&self, key: &str) -> Option<Attribute>;
}

impl<F> AttributeDefaults for F
where
    F: Fn(&str) -> Option<Attribute>,
{
    fn default_attribute(&self, key: &str) -> Option<Attribute> {
        self(key)
    }
}
