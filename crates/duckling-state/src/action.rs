//! Actions, merge keys, and the reducer contract.
//!
//! An action is a typed description of one edit. The [`Reducer`] turns a
//! state and an action into the next state; the
//! [`UndoRedoStore`](crate::store::UndoRedoStore) logs actions and replays
//! them through the reducer to move through history.

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MergeKey
// ---------------------------------------------------------------------------

/// Token that groups consecutive actions into a single undo step.
///
/// A tool that emits many actions for one user gesture (dragging an entity,
/// creating and positioning it) tags all of them with the same key. Two
/// consecutive actions merge only if both carry a key and the keys are equal.
///
/// Keys are never zero. A zero raw value means "no key", so
/// [`MergeKey::new`] returns `None` for it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergeKey(NonZeroU64);

/// Fresh keys start high so they never collide with small caller-chosen ones.
static NEXT_FRESH_KEY: AtomicU64 = AtomicU64::new(1 << 32);

impl MergeKey {
    /// A caller-chosen key, or `None` for `0`.
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// A key distinct from every other key returned by this function in the
    /// current process. Use one per gesture.
    pub fn fresh() -> Self {
        let raw = NEXT_FRESH_KEY.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    /// Raw `u64` representation.
    pub fn to_raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for MergeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MergeKey({})", self.0)
    }
}

impl From<NonZeroU64> for MergeKey {
    fn from(raw: NonZeroU64) -> Self {
        Self(raw)
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// An action the undo/redo store can record.
pub trait Action: Clone {
    /// The merge key attached to this action, if any.
    fn merge_key(&self) -> Option<MergeKey>;

    /// Short name used in log events.
    fn name(&self) -> &'static str {
        "action"
    }
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

/// A pure state transition function.
///
/// `reduce` must be deterministic: the store recomputes the current state by
/// folding `reduce` over its history, and the result has to match the state
/// that was produced when the actions were first dispatched. Actions the
/// reducer does not understand must return the state unchanged.
pub trait Reducer<A> {
    /// The state this reducer manages.
    type State: Clone;

    /// State before any action has been applied.
    fn initial_state(&self) -> Self::State;

    /// Apply `action` to `state`.
    fn reduce(&self, state: Self::State, action: &A) -> Self::State;
}

/// Closure-backed reducer, handy for tests and small compositions.
pub struct FnReducer<S, F> {
    initial: S,
    reduce: F,
}

impl<S, F> FnReducer<S, F> {
    /// Build a reducer from an initial state and a transition closure.
    pub fn new(initial: S, reduce: F) -> Self {
        Self { initial, reduce }
    }
}

impl<S, F> fmt::Debug for FnReducer<S, F>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnReducer")
            .field("initial", &self.initial)
            .finish_non_exhaustive()
    }
}

impl<A, S, F> Reducer<A> for FnReducer<S, F>
where
    S: Clone,
    F: Fn(S, &A) -> S,
{
    type State = S;

    fn initial_state(&self) -> S {
        self.initial.clone()
    }

    fn reduce(&self, state: S, action: &A) -> S {
        (self.reduce)(state, action)
    }
}
