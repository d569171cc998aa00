//! Integration tests for the undo/redo store.
//!
//! The test reducer replaces the whole state with the payload of each action,
//! so the current state always reveals which action was applied last.

use duckling_state::prelude::*;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Test action and reducer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    Replace { state: Value, merge_key: Option<MergeKey> },
    Unrelated,
}

impl Action for TestAction {
    fn merge_key(&self) -> Option<MergeKey> {
        match self {
            TestAction::Replace { merge_key, .. } => *merge_key,
            TestAction::Unrelated => None,
        }
    }

    fn name(&self) -> &'static str {
        "Test.Action"
    }
}

fn test_action(state: Value) -> TestAction {
    TestAction::Replace {
        state,
        merge_key: None,
    }
}

fn keyed(state: Value, key: u64) -> TestAction {
    TestAction::Replace {
        state,
        merge_key: MergeKey::new(key),
    }
}

fn test_reduce(state: Value, action: &TestAction) -> Value {
    match action {
        TestAction::Replace { state, .. } => state.clone(),
        TestAction::Unrelated => state,
    }
}

type TestReducer = FnReducer<Value, fn(Value, &TestAction) -> Value>;
type TestStore = UndoRedoStore<TestAction, TestReducer>;

fn reducer() -> TestReducer {
    FnReducer::new(
        json!({"isDefaultState": true}),
        test_reduce as fn(Value, &TestAction) -> Value,
    )
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn new_store() -> TestStore {
    init_tracing();
    UndoRedoStore::new(reducer())
}

fn update(store: &TestStore) -> Value {
    store.current_state()["update"].clone()
}

fn is_default(store: &TestStore) -> bool {
    store.current_state()["isDefaultState"] == json!(true)
}

// ---------------------------------------------------------------------------
// current state
// ---------------------------------------------------------------------------

#[test]
fn new_store_has_default_state() {
    let store = new_store();
    assert!(is_default(&store));
    assert!(!store.can_undo());
    assert!(!store.can_redo());
}

#[test]
fn current_state_follows_dispatch() {
    let mut store = new_store();
    store.dispatch(test_action(json!({"isNewState": true})));
    assert_eq!(store.current_state()["isNewState"], json!(true));
}

#[test]
fn unrelated_actions_pass_through_reducer() {
    let mut store = new_store();
    store.dispatch(test_action(json!({"update": 1})));
    store.dispatch(TestAction::Unrelated);
    assert_eq!(update(&store), json!(1));
}

// ---------------------------------------------------------------------------
// undo
// ---------------------------------------------------------------------------

#[test]
fn undo_on_empty_history_keeps_initial_state() {
    let mut store = new_store();
    store.undo();
    assert!(is_default(&store));
}

#[test]
fn undo_returns_to_initial_state() {
    let mut store = new_store();
    store.dispatch(test_action(json!({"isNewState": true})));
    store.undo();
    assert!(is_default(&store));
}

#[test]
fn repeated_undo_walks_back() {
    let mut store = new_store();
    for i in 1..=4 {
        store.dispatch(test_action(json!({ "update": i })));
    }
    store.undo();
    store.undo();
    assert_eq!(update(&store), json!(2));

    store.redo();
    assert_eq!(update(&store), json!(3));
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

#[test]
fn clear_removes_undo_stack() {
    let mut store = new_store();
    store.dispatch(test_action(json!({"update": 1})));
    store.dispatch(test_action(json!({"update": 2})));

    store.clear_history();
    store.undo();

    assert_eq!(update(&store), json!(2));
}

#[test]
fn clear_removes_redo_stack() {
    let mut store = new_store();
    store.dispatch(test_action(json!({"update": 1})));
    store.dispatch(test_action(json!({"update": 2})));

    store.undo();
    store.dispatch(UndoRedoAction::ClearHistory);
    store.redo();

    assert_eq!(update(&store), json!(1));
    assert_eq!(store.undo_depth(), 0);
    assert_eq!(store.redo_depth(), 0);
}

// ---------------------------------------------------------------------------
// redo
// ---------------------------------------------------------------------------

#[test]
fn redo_on_initial_state_is_noop() {
    let mut store = new_store();
    store.redo();
    assert!(is_default(&store));
}

#[test]
fn redo_without_undo_is_noop() {
    let mut store = new_store();
    store.dispatch(test_action(json!({"update": 1})));
    store.redo();
    assert_eq!(update(&store), json!(1));
}

#[test]
fn redo_single_undo() {
    let mut store = new_store();
    store.dispatch(test_action(json!({"update": 1})));
    store.undo();
    store.redo();
    assert_eq!(update(&store), json!(1));
}

#[test]
fn redo_multiple_undos() {
    let mut store = new_store();
    for i in 1..=3 {
        store.dispatch(test_action(json!({ "update": i })));
    }
    store.undo();
    store.undo();
    store.undo();
    store.redo();
    store.redo();
    assert_eq!(update(&store), json!(2));
}

// ---------------------------------------------------------------------------
// merge keys
// ---------------------------------------------------------------------------

#[test]
fn unique_merge_keys_do_not_merge() {
    let mut store = new_store();
    store.dispatch(keyed(json!({"update": 1}), 1));
    store.dispatch(keyed(json!({"update": 2}), 2));
    store.undo();
    assert_eq!(update(&store), json!(1));
}

#[test]
fn identical_merge_keys_merge() {
    let mut store = new_store();
    store.dispatch(keyed(json!({"update": 1}), 1));
    store.dispatch(keyed(json!({"update": 2}), 2));
    store.dispatch(keyed(json!({"update": 3}), 2));
    store.dispatch(keyed(json!({"update": 4}), 3));

    store.undo();
    store.undo();

    assert_eq!(update(&store), json!(1));
}

#[test]
fn merged_pair_undoes_to_state_before_both() {
    let mut store = new_store();
    store.dispatch(keyed(json!({"update": 1}), 5));
    store.dispatch(keyed(json!({"update": 2}), 5));
    store.undo();
    assert!(is_default(&store));
}

#[test]
fn zero_merge_key_never_merges() {
    let mut store = new_store();
    store.dispatch(keyed(json!({"update": 1}), 0));
    store.dispatch(keyed(json!({"update": 2}), 0));
    assert_eq!(store.undo_depth(), 2);
    store.undo();
    assert_eq!(update(&store), json!(1));
}

#[test]
fn redo_replays_merged_entry() {
    let mut store = new_store();
    store.dispatch(keyed(json!({"update": 1}), 1));
    store.dispatch(keyed(json!({"update": 2}), 2));
    store.dispatch(keyed(json!({"update": 3}), 2));
    store.dispatch(keyed(json!({"update": 4}), 3));

    store.undo();
    store.undo();
    store.redo();

    assert_eq!(update(&store), json!(3));
}

#[test]
fn merge_key_ignored_after_redo() {
    let mut store = new_store();
    store.dispatch(keyed(json!({"update": 1}), 1));
    store.dispatch(keyed(json!({"update": 2}), 2));
    store.dispatch(keyed(json!({"update": 3}), 2));

    store.undo();
    store.redo();

    store.dispatch(keyed(json!({"update": 4}), 2));
    store.undo();

    assert_eq!(update(&store), json!(3));
}

#[test]
fn fresh_merge_keys_group_a_gesture() {
    let mut store = new_store();
    store.dispatch(test_action(json!({"update": 0})));
    let gesture = MergeKey::fresh();
    for i in 1..=10 {
        store.dispatch(TestAction::Replace {
            state: json!({ "update": i }),
            merge_key: Some(gesture),
        });
    }
    assert_eq!(store.undo_depth(), 2);
    assert_eq!(store.last_merge_key(), Some(gesture));
    store.undo();
    assert_eq!(update(&store), json!(0));
}

// ---------------------------------------------------------------------------
// auto merge
// ---------------------------------------------------------------------------

fn auto_merge_store() -> TestStore {
    fn same_update(action: &TestAction, previous: &TestAction) -> bool {
        match (action, previous) {
            (TestAction::Replace { state: a, .. }, TestAction::Replace { state: b, .. }) => {
                !a["update"].is_null() && a["update"] == b["update"]
            }
            _ => false,
        }
    }
    UndoRedoStore::new(reducer()).with_auto_merge(same_update)
}

#[test]
fn auto_merge_respected_without_merge_keys() {
    let mut store = auto_merge_store();
    store.dispatch(test_action(json!({"update": 1})));
    store.dispatch(test_action(json!({"update": 2})));
    store.dispatch(test_action(json!({"update": 2})));
    store.undo();
    assert_eq!(update(&store), json!(1));
}

#[test]
fn auto_merge_ignored_when_previous_has_merge_key() {
    let mut store = auto_merge_store();
    store.dispatch(test_action(json!({"update": 1})));
    store.dispatch(keyed(json!({"update": 2}), 1));
    store.dispatch(test_action(json!({"update": 2})));
    store.undo();
    assert_eq!(update(&store), json!(2));
}

#[test]
fn auto_merge_ignored_when_action_has_merge_key() {
    let mut store = auto_merge_store();
    store.dispatch(test_action(json!({"update": 1})));
    store.dispatch(test_action(json!({"update": 2})));
    store.dispatch(keyed(json!({"update": 2}), 1));
    store.undo();
    assert_eq!(update(&store), json!(2));
}

#[test]
fn equal_merge_keys_override_auto_merge() {
    let mut store = auto_merge_store();
    store.dispatch(test_action(json!({"update": 1})));
    store.dispatch(keyed(json!({"update": 2}), 1));
    store.dispatch(keyed(json!({"update": 3}), 1));
    store.undo();
    assert_eq!(update(&store), json!(1));
}

#[test]
fn auto_merge_chains_a_string_of_updates() {
    let mut store = auto_merge_store();
    store.dispatch(test_action(json!({"update": 1})));
    for _ in 0..4 {
        store.dispatch(test_action(json!({"update": 2})));
    }
    store.undo();
    assert_eq!(update(&store), json!(1));
}

#[test]
fn auto_merge_with_classifier() {
    let mut store: UndoRedoStore<TestAction, _> =
        UndoRedoStore::new(reducer()).with_auto_merge(|a: &TestAction, b: &TestAction| {
            match (a, b) {
                (TestAction::Replace { state: a, .. }, TestAction::Replace { state: b, .. }) => {
                    classify(a, b).is_mergeable()
                }
                _ => false,
            }
        });
    store.dispatch(test_action(json!({"x": 0, "y": 0})));
    store.dispatch(test_action(json!({"x": 1, "y": 0})));
    store.dispatch(test_action(json!({"x": 2, "y": 0})));
    store.dispatch(test_action(json!({"x": 3, "y": 5})));
    assert_eq!(store.undo_depth(), 2);

    store.undo();
    assert_eq!(store.current_state(), &json!({"x": 2, "y": 0}));
    store.undo();
    assert!(is_default(&store));
}
