//! Duckling State -- structural diffing and undo/redo over reducers.
//!
//! This crate holds the editor's history machinery. It knows nothing about
//! entities or maps: any reducer can be wrapped in an [`UndoRedoStore`] and any
//! JSON values can be compared with [`classify`].
//!
//! # Quick Start
//!
//! ```
//! use duckling_state::prelude::*;
//! use serde_json::json;
//!
//! #[derive(Debug, Clone)]
//! struct SetValue(serde_json::Value);
//!
//! impl Action for SetValue {
//!     fn merge_key(&self) -> Option<MergeKey> {
//!         None
//!     }
//! }
//!
//! let reducer = FnReducer::new(json!(null), |_state: serde_json::Value, action: &SetValue| action.0.clone());
//! let mut store: UndoRedoStore<SetValue, _> = UndoRedoStore::new(reducer)
//!     .with_auto_merge(|next: &SetValue, prev: &SetValue| classify(&next.0, &prev.0).is_mergeable());
//!
//! store.dispatch(SetValue(json!({"x": 1, "y": 0})));
//! store.dispatch(SetValue(json!({"x": 2, "y": 0})));
//! store.dispatch(SetValue(json!({"x": 3, "y": 0})));
//! assert_eq!(store.undo_depth(), 1);
//!
//! store.undo();
//! assert_eq!(store.current_state(), &json!(null));
//! ```

#![deny(unsafe_code)]

pub mod action;
pub mod diff;
pub mod store;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::action::{Action, FnReducer, MergeKey, Reducer};
    pub use crate::diff::{classify, classify_maps, classify_optional, ChangeType};
    pub use crate::store::{
        AutoMerger, HistoryEntry, SubscriptionId, UndoRedoAction, UndoRedoConfig, UndoRedoStore,
    };
}

pub use diff::{classify, ChangeType};
pub use store::UndoRedoStore;
