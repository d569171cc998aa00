//! Duckling Map -- loading and saving level documents.
//!
//! A map file stores entities attribute-major ([`RawMapFile`](raw::RawMapFile)).
//! [`MapParser`](parser::MapParser) pivots it into an
//! [`EntitySystem`](duckling_entity::EntitySystem) on load and back on save,
//! running the registered [`MapLifecycle`](lifecycle::MapLifecycle) hooks on
//! the way.
//!
//! # Quick Start
//!
//! ```
//! use duckling_map::prelude::*;
//! use serde_json::json;
//!
//! let mut parser = MapParser::new();
//! parser.lifecycle_mut().add_post_load_hook(|mut map: RawMapFile| async move {
//!     if map.grid_size.as_u64() == Some(0) {
//!         map.grid_size = 8.into();
//!     }
//!     anyhow::Ok(map)
//! });
//!
//! let document = json!({
//!     "key": "level1",
//!     "entities": ["door"],
//!     "assets": [],
//!     "systems": {"position": {"components": {"door": {"x": 3, "y": 4}}}},
//!     "version": "1.0",
//!     "gridSize": 0
//! });
//! let parsed = pollster::block_on(parser.parse_value(document)).unwrap();
//! assert_eq!(parsed.grid_size.as_u64(), Some(8));
//! assert!(parsed.entity_system.get("door").unwrap().has("position"));
//! ```

#![deny(unsafe_code)]

pub mod lifecycle;
pub mod parser;
pub mod raw;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while loading or saving maps.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// A post-load hook rejected the document.
    #[error("post-load hook #{index} failed: {source}")]
    PostLoadHook {
        index: usize,
        source: anyhow::Error,
    },

    /// A pre-save hook rejected the document.
    #[error("pre-save hook #{index} failed: {source}")]
    PreSaveHook {
        index: usize,
        source: anyhow::Error,
    },

    /// The JSON does not have the shape of a map document.
    #[error("malformed map document: {0}")]
    Malformed(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::lifecycle::{HookFuture, MapHook, MapLifecycle};
    pub use crate::parser::{MapParser, ParsedMap, RequiredAssets, VersionInfo};
    pub use crate::raw::{Asset, Dimension, RawMapFile, RawSystem};
    pub use crate::MapError;
}
