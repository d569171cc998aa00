//! Structural change classification between two JSON values.
//!
//! [`classify`] compares a value before and after an edit and reports how big
//! the edit was. The undo history uses the result to decide whether two
//! consecutive edits may collapse into one undo step: repeatedly changing a
//! single scalar field (typing into a numeric box) is a [`ChangeType::PrimitiveChange`]
//! and merges, while touching several fields or reshaping a nested structure
//! is a [`ChangeType::ComplexChange`] and does not.
//!
//! Arrays are treated as objects keyed by their indices. A key that is absent
//! on one side is modelled as `None`, which differs from an explicit `null`.
//!
//! # Example
//!
//! ```
//! use duckling_state::diff::{classify, ChangeType};
//! use serde_json::json;
//!
//! assert_eq!(classify(&json!({"foo": 3, "bar": 2}), &json!({"foo": 3, "bar": 4})), ChangeType::PrimitiveChange);
//! assert_eq!(classify(&json!({"foo": 5, "bar": 4}), &json!({"foo": 3, "bar": 2})), ChangeType::ComplexChange);
//! ```

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// ChangeType
// ---------------------------------------------------------------------------

/// How much two values differ.
///
/// Variants are ordered by severity, so `max` picks the more severe one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    /// The two values are deeply equivalent.
    Equal,
    /// Exactly one primitive somewhere in the structure changed, was added,
    /// or was removed.
    PrimitiveChange,
    /// Anything larger than a single primitive change.
    ComplexChange,
}

impl ChangeType {
    /// `true` for [`Equal`](Self::Equal) and [`PrimitiveChange`](Self::PrimitiveChange).
    pub fn is_mergeable(self) -> bool {
        self != ChangeType::ComplexChange
    }
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Classify the change that turns `before` into `after`.
pub fn classify(before: &Value, after: &Value) -> ChangeType {
    classify_optional(Some(before), Some(after))
}

/// Classify two values where either side may be missing entirely.
///
/// `None` stands for an absent key and is a primitive for classification
/// purposes: `None` vs `Some(3)` is a primitive change, `None` vs an object is
/// a complex one.
pub fn classify_optional(before: Option<&Value>, after: Option<&Value>) -> ChangeType {
    match (Node::of(before), Node::of(after)) {
        (None, None) => {
            if primitive_eq(before, after) {
                ChangeType::Equal
            } else {
                ChangeType::PrimitiveChange
            }
        }
        (Some(left), Some(right)) => classify_nodes(&left, &right),
        _ => ChangeType::ComplexChange,
    }
}

/// Classify two JSON objects without wrapping them in a [`Value`].
///
/// Used by callers that keep attribute maps in their own containers.
pub fn classify_maps(before: &Map<String, Value>, after: &Map<String, Value>) -> ChangeType {
    classify_nodes(&Node::Object(before), &Node::Object(after))
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// A value that has child keys.
enum Node<'a> {
    Object(&'a Map<String, Value>),
    Array(&'a [Value]),
}

impl<'a> Node<'a> {
    fn of(value: Option<&'a Value>) -> Option<Self> {
        match value? {
            Value::Object(map) => Some(Node::Object(map)),
            Value::Array(items) => Some(Node::Array(items)),
            _ => None,
        }
    }

    fn keys(&self) -> Vec<Cow<'a, str>> {
        match self {
            Node::Object(map) => map.keys().map(|k| Cow::Borrowed(k.as_str())).collect(),
            Node::Array(items) => (0..items.len()).map(|i| Cow::Owned(i.to_string())).collect(),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        match self {
            Node::Object(map) => map.get(key),
            Node::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

fn classify_nodes(before: &Node<'_>, after: &Node<'_>) -> ChangeType {
    // Keys of `before` compared against `after`, then keys that only exist in
    // `after`. A primitive change on each side is two differing keys.
    let left = scan_keys(before, after, false);
    if left == ChangeType::ComplexChange {
        return ChangeType::ComplexChange;
    }
    let right = scan_keys(after, before, true);

    match (left, right) {
        (ChangeType::ComplexChange, _) | (_, ChangeType::ComplexChange) => {
            ChangeType::ComplexChange
        }
        (ChangeType::PrimitiveChange, ChangeType::PrimitiveChange) => ChangeType::ComplexChange,
        (ChangeType::PrimitiveChange, _) | (_, ChangeType::PrimitiveChange) => {
            ChangeType::PrimitiveChange
        }
        (ChangeType::Equal, ChangeType::Equal) => ChangeType::Equal,
    }
}

fn scan_keys(primary: &Node<'_>, other: &Node<'_>, skip_shared: bool) -> ChangeType {
    let mut differing = 0usize;
    for key in primary.keys() {
        if skip_shared && other.contains(&key) {
            continue;
        }
        match classify_optional(primary.get(&key), other.get(&key)) {
            ChangeType::Equal => {}
            ChangeType::PrimitiveChange => {
                differing += 1;
                if differing > 1 {
                    return ChangeType::ComplexChange;
                }
            }
            ChangeType::ComplexChange => return ChangeType::ComplexChange,
        }
    }

    if differing == 0 {
        ChangeType::Equal
    } else {
        ChangeType::PrimitiveChange
    }
}

/// Equality for non-container values. Numbers compare by value so that `1`
/// and `1.0` are the same number.
fn primitive_eq(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            if x == y {
                return true;
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
