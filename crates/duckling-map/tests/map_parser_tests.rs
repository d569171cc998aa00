//! Integration tests for loading and saving map documents.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use duckling_entity::prelude::*;
use duckling_map::prelude::*;
use serde_json::{json, Value};

const MAP_VERSION: &str = "1.0";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn version_info() -> VersionInfo {
    VersionInfo::new(MAP_VERSION)
}

fn empty_map() -> RawMapFile {
    RawMapFile::from_value(json!({
        "key": "",
        "entities": [],
        "assets": [],
        "systems": {},
        "version": MAP_VERSION,
        "gridSize": 0
    }))
    .unwrap()
}

fn basic_map_json() -> Value {
    json!({
        "key": "aBasicMap",
        "entities": ["ea", "eb", "ec"],
        "assets": [],
        "systems": {
            "sa": {"components": {"ea": {"foo": "barea"}, "eb": {"foo": "bareb"}}},
            "sb": {"components": {"eb": {"isSpecial": true}}}
        },
        "version": MAP_VERSION,
        "gridSize": 16
    })
}

fn basic_map() -> RawMapFile {
    RawMapFile::from_value(basic_map_json()).unwrap()
}

fn entity(value: Value) -> Entity {
    Entity::from_value(value).unwrap()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn empty_map_becomes_empty_system() {
    init_tracing();
    let parser = MapParser::new();
    let parsed = pollster::block_on(parser.raw_to_parsed(empty_map())).unwrap();
    assert!(parsed.entity_system.is_empty());
}

#[test]
fn basic_map_loads_entities() {
    let parser = MapParser::new();
    let parsed = pollster::block_on(parser.raw_to_parsed(basic_map())).unwrap();
    let system = &parsed.entity_system;

    assert_eq!(system.get("ec"), Some(&Entity::new()));
    assert_eq!(system.get("ea"), Some(&entity(json!({"sa": {"foo": "barea"}}))));
    assert_eq!(
        system.get("eb"),
        Some(&entity(json!({"sa": {"foo": "bareb"}, "sb": {"isSpecial": true}})))
    );
    assert_eq!(parsed.key, "aBasicMap");
    assert_eq!(parsed.grid_size.as_u64(), Some(16));
}

#[test]
fn entity_only_in_a_system_is_created() {
    let mut raw = empty_map();
    raw.systems.insert(
        "sa".into(),
        RawSystem {
            components: [("ea".to_string(), json!({"foo": "barea"}))].into_iter().collect(),
        },
    );
    let parsed = pollster::block_on(MapParser::new().raw_to_parsed(raw)).unwrap();
    assert_eq!(
        parsed.entity_system.get("ea"),
        Some(&entity(json!({"sa": {"foo": "barea"}})))
    );
}

#[test]
fn malformed_components_surface_as_error() {
    let mut document = basic_map_json();
    document["systems"]["sa"]["components"] = json!("not an object");
    let result = pollster::block_on(MapParser::new().parse_value(document));
    assert!(matches!(result, Err(MapError::Malformed(_))));
}

// ---------------------------------------------------------------------------
// Saving
// ---------------------------------------------------------------------------

#[test]
fn empty_system_becomes_empty_map() {
    let parser = MapParser::new();
    let raw = pollster::block_on(parser.parsed_to_raw(&ParsedMap::default(), &version_info())).unwrap();
    assert_eq!(raw, empty_map());
}

#[test]
fn load_then_save_preserves_document() {
    let parser = MapParser::new();
    let parsed = pollster::block_on(parser.raw_to_parsed(basic_map())).unwrap();
    let mut raw = pollster::block_on(parser.parsed_to_raw(&parsed, &version_info())).unwrap();
    raw.entities.sort();
    assert_eq!(raw, basic_map());
    assert_eq!(serde_json::to_value(&raw).unwrap(), basic_map_json());
}

#[test]
fn load_then_save_preserves_dimension_and_number_forms() {
    let mut document = basic_map_json();
    document["dimension"] = json!({"x": 1200, "y": 800});
    document["gridSize"] = json!(12.5);
    document["assets"] = json!([{"type": "Spritesheet", "key": "heroes"}]);

    let parser = MapParser::new();
    let parsed = pollster::block_on(parser.parse_value(document.clone())).unwrap();
    let mut raw = pollster::block_on(parser.parsed_to_raw(&parsed, &version_info())).unwrap();
    raw.entities.sort();

    let saved = serde_json::to_value(&raw).unwrap();
    assert_eq!(saved, document);
    assert_eq!(
        serde_json::to_string(&saved["dimension"]).unwrap(),
        r#"{"x":1200,"y":800}"#
    );
}

#[test]
fn dimension_and_assets_pass_through() {
    let mut raw = RawMapFile::empty(MAP_VERSION);
    raw.key = "withAssets".into();
    raw.assets.push(Asset::new("FontTTF", "fonts/main"));

    let parser = MapParser::new();
    let parsed = pollster::block_on(parser.raw_to_parsed(raw.clone())).unwrap();
    assert_eq!(parsed.dimension, Some(Dimension::new(1200, 800)));

    let saved = pollster::block_on(parser.parsed_to_raw(&parsed, &version_info())).unwrap();
    assert_eq!(saved, raw);
}

#[test]
fn edited_system_saves_sorted_entities() {
    let mut service = EntitySystemService::default();
    let parser = MapParser::new();
    let parsed = pollster::block_on(parser.raw_to_parsed(basic_map())).unwrap();
    service.load_system(parsed.entity_system.clone());

    service.rename_entity("ea", "zz", None);
    service.delete_entity("ec", None);

    let edited = ParsedMap {
        entity_system: service.entity_system().clone(),
        ..parsed
    };
    let raw = pollster::block_on(parser.parsed_to_raw(&edited, &version_info())).unwrap();
    assert_eq!(raw.entities, vec!["eb".to_string(), "zz".to_string()]);
    assert_eq!(raw.systems["sa"].components["zz"], json!({"foo": "barea"}));
}

// ---------------------------------------------------------------------------
// Lifecycle hooks
// ---------------------------------------------------------------------------

#[test]
fn post_load_hook_runs_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut parser = MapParser::new();
    parser.lifecycle_mut().add_post_load_hook(move |map: RawMapFile| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { anyhow::Ok(map) }
    });

    pollster::block_on(parser.raw_to_parsed(empty_map())).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn pre_save_hook_runs_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut lifecycle = MapLifecycle::new();
    lifecycle.add_pre_save_hook(move |map: RawMapFile| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { anyhow::Ok(map) }
    });
    let parser = MapParser::with_lifecycle(lifecycle);

    pollster::block_on(parser.parsed_to_raw(&ParsedMap::default(), &version_info())).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn post_load_hook_rewrites_before_pivot() {
    let mut parser = MapParser::new();
    parser.lifecycle_mut().add_post_load_hook(|mut map: RawMapFile| async move {
        // Migration: rename attribute kind "sa" to "position".
        if let Some(system) = map.systems.remove("sa") {
            map.systems.insert("position".into(), system);
        }
        anyhow::Ok(map)
    });

    let parsed = pollster::block_on(parser.raw_to_parsed(basic_map())).unwrap();
    let ea = parsed.entity_system.get("ea").unwrap();
    assert!(ea.has("position"));
    assert!(!ea.has("sa"));
}

#[test]
fn failing_hook_aborts_load() {
    let mut parser = MapParser::new();
    parser
        .lifecycle_mut()
        .add_post_load_hook(|_map: RawMapFile| async move {
            Err::<RawMapFile, _>(anyhow::anyhow!("unsupported map version"))
        });

    let err = pollster::block_on(parser.raw_to_parsed(basic_map())).unwrap_err();
    match err {
        MapError::PostLoadHook { index, source } => {
            assert_eq!(index, 0);
            assert_eq!(source.to_string(), "unsupported map version");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_map_runs_post_load_hooks() {
    let mut parser = MapParser::new();
    parser.lifecycle_mut().add_post_load_hook(|mut map: RawMapFile| async move {
        map.key = "untitled".into();
        anyhow::Ok(map)
    });

    let parsed = pollster::block_on(parser.empty_map(MAP_VERSION)).unwrap();
    assert_eq!(parsed.key, "untitled");
    assert_eq!(parsed.grid_size.as_u64(), Some(16));
    assert!(parsed.entity_system.is_empty());
}
