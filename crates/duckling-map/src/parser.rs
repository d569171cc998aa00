//! Conversion between raw map documents and entity systems.
//!
//! Loading pivots the attribute-major document into entities; saving pivots
//! entities back into per-attribute component tables. Both directions pass
//! the document through the [`MapLifecycle`] hooks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::debug;

use duckling_entity::entity::{Entity, EntityKey};
use duckling_entity::system::EntitySystem;

use crate::lifecycle::MapLifecycle;
use crate::raw::{Asset, Dimension, RawMapFile, RawSystem};
use crate::MapError;

// ---------------------------------------------------------------------------
// ParsedMap
// ---------------------------------------------------------------------------

/// A loaded map, ready to feed into an entity store.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMap {
    pub key: String,
    pub version: String,
    pub entity_system: EntitySystem,
    /// Grid size exactly as the document wrote it.
    pub grid_size: Number,
    /// Asset references carried through from the document.
    pub assets: Vec<Asset>,
    pub dimension: Option<Dimension>,
}

impl Default for ParsedMap {
    fn default() -> Self {
        Self {
            key: String::new(),
            version: String::new(),
            entity_system: EntitySystem::new(),
            grid_size: Number::from(0u64),
            assets: Vec::new(),
            dimension: None,
        }
    }
}

/// Version information of the project a map is saved into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub project_version: String,
}

impl VersionInfo {
    /// Version info for a project at `project_version`.
    pub fn new(project_version: impl Into<String>) -> Self {
        Self {
            project_version: project_version.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// RequiredAssets
// ---------------------------------------------------------------------------

/// Computes the assets an entity system needs at save time.
///
/// Without one, [`MapParser`] saves the asset list carried by the
/// [`ParsedMap`].
pub trait RequiredAssets {
    /// Every asset referenced by `system`.
    fn assets_for_entity_system(&self, system: &EntitySystem) -> Vec<Asset>;
}

impl<F> RequiredAssets for F
where
    F: Fn(&EntitySystem) -> Vec<Asset>,
{
    fn assets_for_entity_system(&self, system: &EntitySystem) -> Vec<Asset> {
        self(system)
    }
}

// ---------------------------------------------------------------------------
// MapParser
// ---------------------------------------------------------------------------

/// Loads and saves maps through a set of lifecycle hooks.
#[derive(Default)]
pub struct MapParser {
    lifecycle: MapLifecycle,
    required_assets: Option<Box<dyn RequiredAssets + Send + Sync>>,
}

impl std::fmt::Debug for MapParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapParser")
            .field("lifecycle", &self.lifecycle)
            .field("required_assets", &self.required_assets.is_some())
            .finish()
    }
}

impl MapParser {
    /// A parser with no hooks and no asset collaborator.
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser running the given hooks.
    pub fn with_lifecycle(lifecycle: MapLifecycle) -> Self {
        Self {
            lifecycle,
            required_assets: None,
        }
    }

    /// Compute the saved asset list with `required_assets`.
    #[must_use]
    pub fn with_required_assets<R>(mut self, required_assets: R) -> Self
    where
        R: RequiredAssets + Send + Sync + 'static,
    {
        self.required_assets = Some(Box::new(required_assets));
        self
    }

    /// The hooks this parser runs.
    pub fn lifecycle(&self) -> &MapLifecycle {
        &self.lifecycle
    }

    /// Mutable access to the hooks, for registering more.
    pub fn lifecycle_mut(&mut self) -> &mut MapLifecycle {
        &mut self.lifecycle
    }

    /// Turn a raw document into a [`ParsedMap`].
    ///
    /// Every key in `entities` becomes an entity, even with no attributes.
    /// Keys that appear only in a component table are created on demand.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::PostLoadHook`] if a post-load hook fails.
    pub async fn raw_to_parsed(&self, raw: RawMapFile) -> Result<ParsedMap, MapError> {
        let raw = self.lifecycle.execute_post_load(raw).await?;

        let mut entities: BTreeMap<EntityKey, Entity> = raw
            .entities
            .iter()
            .map(|key| (key.clone(), Entity::new()))
            .collect();
        for (attribute_key, system) in raw.systems {
            for (entity_key, attribute) in system.components {
                entities
                    .entry(entity_key)
                    .or_default()
                    .insert(attribute_key.clone(), attribute);
            }
        }

        let entity_system: EntitySystem = entities.into_iter().collect();
        debug!(
            map = %raw.key,
            entities = entity_system.len(),
            assets = raw.assets.len(),
            "map loaded"
        );

        Ok(ParsedMap {
            key: raw.key,
            version: raw.version,
            entity_system,
            grid_size: raw.grid_size,
            assets: raw.assets,
            dimension: raw.dimension,
        })
    }

    /// Turn a [`ParsedMap`] back into a raw document stamped with the
    /// project version.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::PreSaveHook`] if a pre-save hook fails.
    pub async fn parsed_to_raw(
        &self,
        parsed: &ParsedMap,
        version_info: &VersionInfo,
    ) -> Result<RawMapFile, MapError> {
        let mut systems: BTreeMap<String, RawSystem> = BTreeMap::new();
        let mut entities = Vec::with_capacity(parsed.entity_system.len());

        for key in parsed.entity_system.sorted_keys() {
            if let Some(entity) = parsed.entity_system.get(&key) {
                for (attribute_key, attribute) in entity.iter() {
                    systems
                        .entry(attribute_key.clone())
                        .or_default()
                        .components
                        .insert(key.clone(), attribute.clone());
                }
            }
            entities.push(key);
        }

        let assets = match &self.required_assets {
            Some(required) => {
                let mut assets = required.assets_for_entity_system(&parsed.entity_system);
                assets.sort();
                assets.dedup();
                assets
            }
            None => parsed.assets.clone(),
        };

        let raw = RawMapFile {
            key: parsed.key.clone(),
            entities,
            assets,
            systems,
            version: version_info.project_version.clone(),
            grid_size: parsed.grid_size.clone(),
            dimension: parsed.dimension.clone(),
        };
        debug!(
            map = %raw.key,
            entities = raw.entities.len(),
            components = raw.component_count(),
            "map prepared for save"
        );

        self.lifecycle.execute_pre_save(raw).await
    }

    /// Decode a JSON value and load it.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Malformed`] for a value that is not a map
    /// document, or a hook error from [`MapParser::raw_to_parsed`].
    pub async fn parse_value(&self, value: Value) -> Result<ParsedMap, MapError> {
        let raw = RawMapFile::from_value(value)?;
        self.raw_to_parsed(raw).await
    }

    /// Load a brand new map for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::PostLoadHook`] if a post-load hook fails.
    pub async fn empty_map(&self, version: &str) -> Result<ParsedMap, MapError> {
        self.raw_to_parsed(RawMapFile::empty(version)).await
    }
}
