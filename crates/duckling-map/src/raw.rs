//! The on-disk map document.
//!
//! Map files are stored attribute-major: each attribute kind ("system") lists
//! the entities that carry it. Field names match the files written by the
//! editor, so a document survives a load/save cycle byte-for-byte apart from
//! entity ordering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use duckling_entity::entity::{Attribute, AttributeKey, EntityKey};

use crate::MapError;

/// Default map width for freshly created maps.
pub const DEFAULT_MAP_WIDTH: u64 = 1200;
/// Default map height for freshly created maps.
pub const DEFAULT_MAP_HEIGHT: u64 = 800;
/// Default grid size for freshly created maps.
pub const DEFAULT_GRID_SIZE: u64 = 16;

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// Reference to a project asset used by the map.
///
/// The asset type (`"TexturePNG"`, `"FontTTF"`, ...) is owned by the asset
/// loader and carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "type")]
    pub asset_type: String,
    pub key: String,
}

impl Asset {
    /// An asset reference of `asset_type` named `key`.
    pub fn new(asset_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            asset_type: asset_type.into(),
            key: key.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Width and height of a map in world units.
///
/// Stored as JSON numbers so integers stay integers through a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub x: Number,
    pub y: Number,
}

impl Dimension {
    /// A dimension of `x` by `y`.
    pub fn new(x: impl Into<Number>, y: impl Into<Number>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self::new(DEFAULT_MAP_WIDTH, DEFAULT_MAP_HEIGHT)
    }
}

/// All values of one attribute kind, keyed by entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSystem {
    pub components: BTreeMap<EntityKey, Attribute>,
}

/// A map file as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMapFile {
    pub key: String,
    #[serde(default)]
    pub entities: Vec<EntityKey>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub systems: BTreeMap<AttributeKey, RawSystem>,
    pub version: String,
    #[serde(rename = "gridSize", default = "zero")]
    pub grid_size: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<Dimension>,
}

impl RawMapFile {
    /// A new, empty map document.
    pub fn empty(version: impl Into<String>) -> Self {
        Self {
            key: String::new(),
            entities: Vec::new(),
            assets: Vec::new(),
            systems: BTreeMap::new(),
            version: version.into(),
            grid_size: Number::from(DEFAULT_GRID_SIZE),
            dimension: Some(Dimension::default()),
        }
    }

    /// Decode a document from an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Malformed`] if the value does not have the shape of
    /// a map file.
    pub fn from_value(value: Value) -> Result<Self, MapError> {
        serde_json::from_value(value).map_err(MapError::Malformed)
    }

    /// Decode a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Malformed`] for invalid JSON or an unexpected shape.
    pub fn from_json_str(text: &str) -> Result<Self, MapError> {
        serde_json::from_str(text).map_err(MapError::Malformed)
    }

    /// Encode the document as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Malformed`] if an attribute cannot be encoded.
    pub fn to_json_string_pretty(&self) -> Result<String, MapError> {
        serde_json::to_string_pretty(self).map_err(MapError::Malformed)
    }

    /// The grid size as a float, whatever its JSON form.
    pub fn grid_size_f64(&self) -> Option<f64> {
        self.grid_size.as_f64()
    }

    /// Number of attribute values across all systems.
    pub fn component_count(&self) -> usize {
        self.systems.values().map(|system| system.components.len()).sum()
    }
}

fn zero() -> Number {
    Number::from(0u64)
}
