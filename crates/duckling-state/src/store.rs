//! Undo/redo store built on top of an arbitrary reducer.
//!
//! [`UndoRedoStore`] keeps two action logs around the current state:
//!
//! ```text
//! dispatch(a1) dispatch(a2) dispatch(a3) undo()
//! ┌───────────────────────────────────────────────┐
//! │ base:    s0                                   │
//! │ past:    [ [a1], [a2] ]                       │
//! │ current: reduce(reduce(s0, a1), a2)           │
//! │ future:  [ [a3] ]                             │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Each history entry is a group of one or more actions that undo and redo
//! together. A dispatched action joins the most recent group instead of
//! starting a new one when its merge key matches the previous action's key,
//! or, when neither carries a key, when the auto-merge predicate accepts the
//! pair. An undo or redo closes the most recent group.
//!
//! The current state is always the reducer folded over every action in
//! `past`, starting from `base`. Snapshots are never stored per entry; undo
//! recomputes the state by replay.
//!
//! # Example
//!
//! ```
//! use duckling_state::action::{Action, FnReducer, MergeKey};
//! use duckling_state::store::UndoRedoStore;
//!
//! #[derive(Debug, Clone)]
//! struct Set(i64);
//!
//! impl Action for Set {
//!     fn merge_key(&self) -> Option<MergeKey> {
//!         None
//!     }
//! }
//!
//! let reducer = FnReducer::new(0i64, |_state: i64, action: &Set| action.0);
//! let mut store: UndoRedoStore<Set, _> = UndoRedoStore::new(reducer);
//! store.dispatch(Set(1));
//! store.dispatch(Set(2));
//! store.undo();
//! assert_eq!(*store.current_state(), 1);
//! store.redo();
//! assert_eq!(*store.current_state(), 2);
//! ```

use std::fmt;

use tracing::debug;

use crate::action::{Action, MergeKey, Reducer};

// ---------------------------------------------------------------------------
// UndoRedoAction
// ---------------------------------------------------------------------------

/// Everything the store accepts: history control or a domain action.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoRedoAction<A> {
    /// Step back one history entry. No-op when there is nothing to undo.
    Undo,
    /// Re-apply the most recently undone entry. No-op when there is nothing
    /// to redo.
    Redo,
    /// Forget all history. The current state becomes the new base.
    ClearHistory,
    /// A domain action passed to the reducer.
    Apply(A),
}

impl<A> From<A> for UndoRedoAction<A> {
    fn from(action: A) -> Self {
        UndoRedoAction::Apply(action)
    }
}

// ---------------------------------------------------------------------------
// UndoRedoConfig
// ---------------------------------------------------------------------------

/// Configuration for the undo/redo store.
#[derive(Debug, Clone)]
pub struct UndoRedoConfig {
    /// Maximum number of entries kept in the undo log. When exceeded, the
    /// oldest entry is folded into the base state and can no longer be
    /// undone.
    pub max_history: usize,
}

impl Default for UndoRedoConfig {
    /// Defaults to 100 undo steps.
    fn default() -> Self {
        Self { max_history: 100 }
    }
}

impl UndoRedoConfig {
    /// Keep every entry (for tests and short-lived sessions).
    pub fn unlimited() -> Self {
        Self {
            max_history: usize::MAX,
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryEntry
// ---------------------------------------------------------------------------

/// One undo step: the actions that were merged together, in dispatch order.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry<A> {
    actions: Vec<A>,
}

impl<A> HistoryEntry<A> {
    fn new(action: A) -> Self {
        Self {
            actions: vec![action],
        }
    }

    /// The actions in this entry, oldest first. Never empty.
    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    /// The most recently merged action.
    pub fn last(&self) -> Option<&A> {
        self.actions.last()
    }
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// Handle returned by [`UndoRedoStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Callback deciding whether `action` may merge into the entry ending with
/// `previous`. Only consulted when neither action carries a merge key.
pub type AutoMerger<A> = Box<dyn Fn(&A, &A) -> bool>;

type Subscriber<S> = Box<dyn FnMut(&S)>;

// ---------------------------------------------------------------------------
// UndoRedoStore
// ---------------------------------------------------------------------------

/// State container with undo/redo over an injected reducer.
///
/// # Invariants
///
/// 1. `current_state()` equals the reducer folded over every action in the
///    undo log, starting from the base state.
/// 2. The redo log is cleared whenever a domain action is dispatched.
/// 3. Merging only ever extends the most recent entry, and only if the
///    previous dispatch was a domain action.
/// 4. `undo_depth() <= config.max_history`.
pub struct UndoRedoStore<A, R: Reducer<A>> {
    reducer: R,
    auto_merge: Option<AutoMerger<A>>,
    config: UndoRedoConfig,
    base: R::State,
    current: R::State,
    past: Vec<HistoryEntry<A>>,
    future: Vec<HistoryEntry<A>>,
    /// Whether the next domain action may merge into `past.last()`.
    merge_open: bool,
    subscribers: Vec<(SubscriptionId, Subscriber<R::State>)>,
    next_subscription: u64,
}

impl<A, R> fmt::Debug for UndoRedoStore<A, R>
where
    R: Reducer<A>,
    R::State: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoRedoStore")
            .field("current", &self.current)
            .field("undo_depth", &self.past.len())
            .field("redo_depth", &self.future.len())
            .field("subscribers", &self.subscribers.len())
            .field("config", &self.config)
            .finish()
    }
}

impl<A: Action, R: Reducer<A>> UndoRedoStore<A, R> {
    /// Create a store whose state starts at `reducer.initial_state()`.
    pub fn new(reducer: R) -> Self {
        let initial = reducer.initial_state();
        Self {
            reducer,
            auto_merge: None,
            config: UndoRedoConfig::default(),
            base: initial.clone(),
            current: initial,
            past: Vec::new(),
            future: Vec::new(),
            merge_open: false,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Install the predicate used to merge actions that carry no merge key.
    pub fn with_auto_merge<F>(mut self, auto_merge: F) -> Self
    where
        F: Fn(&A, &A) -> bool + 'static,
    {
        self.auto_merge = Some(Box::new(auto_merge));
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: UndoRedoConfig) -> Self {
        self.config = config;
        self.enforce_depth();
        self
    }

    // ====================================================================
    // Dispatch
    // ====================================================================

    /// Dispatch a domain action or a history control action, then notify
    /// subscribers.
    pub fn dispatch(&mut self, action: impl Into<UndoRedoAction<A>>) {
        match action.into() {
            UndoRedoAction::Undo => self.apply_undo(),
            UndoRedoAction::Redo => self.apply_redo(),
            UndoRedoAction::ClearHistory => self.apply_clear(),
            UndoRedoAction::Apply(action) => self.apply_action(action),
        }
        self.notify();
    }

    /// Shorthand for `dispatch(UndoRedoAction::Undo)`.
    pub fn undo(&mut self) {
        self.dispatch(UndoRedoAction::Undo);
    }

    /// Shorthand for `dispatch(UndoRedoAction::Redo)`.
    pub fn redo(&mut self) {
        self.dispatch(UndoRedoAction::Redo);
    }

    /// Shorthand for `dispatch(UndoRedoAction::ClearHistory)`.
    pub fn clear_history(&mut self) {
        self.dispatch(UndoRedoAction::ClearHistory);
    }

    fn apply_action(&mut self, action: A) {
        let merged = self.should_merge(&action);
        let name = action.name();

        let state = self.current.clone();
        self.current = self.reducer.reduce(state, &action);

        match self.past.last_mut() {
            Some(entry) if merged => entry.actions.push(action),
            _ => self.past.push(HistoryEntry::new(action)),
        }
        self.future.clear();
        self.merge_open = true;
        self.enforce_depth();

        debug!(
            action = name,
            merged,
            undo_depth = self.past.len(),
            "dispatched action"
        );
    }

    fn apply_undo(&mut self) {
        self.merge_open = false;
        let Some(entry) = self.past.pop() else {
            debug!("undo ignored: history is empty");
            return;
        };
        self.future.push(entry);
        self.current = self.replay();
        debug!(
            undo_depth = self.past.len(),
            redo_depth = self.future.len(),
            "undo"
        );
    }

    fn apply_redo(&mut self) {
        self.merge_open = false;
        let Some(entry) = self.future.pop() else {
            debug!("redo ignored: nothing to redo");
            return;
        };
        let state = self.current.clone();
        self.current = entry
            .actions
            .iter()
            .fold(state, |state, action| self.reducer.reduce(state, action));
        self.past.push(entry);
        debug!(
            undo_depth = self.past.len(),
            redo_depth = self.future.len(),
            "redo"
        );
    }

    fn apply_clear(&mut self) {
        self.merge_open = false;
        self.past.clear();
        self.future.clear();
        self.base = self.current.clone();
        debug!("history cleared");
    }

    fn should_merge(&self, action: &A) -> bool {
        if !self.merge_open {
            return false;
        }
        let Some(previous) = self.past.last().and_then(HistoryEntry::last) else {
            return false;
        };
        match (action.merge_key(), previous.merge_key()) {
            (Some(key), Some(previous_key)) => key == previous_key,
            (None, None) => self
                .auto_merge
                .as_ref()
                .is_some_and(|auto_merge| auto_merge(action, previous)),
            _ => false,
        }
    }

    /// Fold every logged action over the base state.
    fn replay(&self) -> R::State {
        self.past
            .iter()
            .flat_map(|entry| entry.actions.iter())
            .fold(self.base.clone(), |state, action| {
                self.reducer.reduce(state, action)
            })
    }

    fn enforce_depth(&mut self) {
        let max = self.config.max_history;
        if self.past.len() <= max {
            return;
        }
        let excess = self.past.len() - max;
        let evicted: Vec<HistoryEntry<A>> = self.past.drain(..excess).collect();
        let base = self.base.clone();
        self.base = evicted
            .iter()
            .flat_map(|entry| entry.actions.iter())
            .fold(base, |state, action| self.reducer.reduce(state, action));
        if self.past.is_empty() {
            self.merge_open = false;
        }
        debug!(evicted = excess, "history depth limit reached");
    }

    // ====================================================================
    // Queries
    // ====================================================================

    /// The current state.
    pub fn current_state(&self) -> &R::State {
        &self.current
    }

    /// The state undo would eventually return to once history is exhausted.
    pub fn base_state(&self) -> &R::State {
        &self.base
    }

    /// The undo log, oldest first.
    pub fn past(&self) -> &[HistoryEntry<A>] {
        &self.past
    }

    /// The redo log. The next entry to redo is last.
    pub fn future(&self) -> &[HistoryEntry<A>] {
        &self.future
    }

    /// `true` if [`undo`](Self::undo) would change the state.
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// `true` if [`redo`](Self::redo) would change the state.
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of entries that can be undone.
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    /// Number of entries that can be redone.
    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    /// The merge key of the most recently logged action.
    pub fn last_merge_key(&self) -> Option<MergeKey> {
        self.past
            .last()
            .and_then(HistoryEntry::last)
            .and_then(|action| action.merge_key())
    }

    /// The active configuration.
    pub fn config(&self) -> &UndoRedoConfig {
        &self.config
    }

    // ====================================================================
    // Subscriptions
    // ====================================================================

    /// Register a callback that receives the current state after every
    /// dispatch.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&R::State) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber. Returns `false` if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&self.current);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
