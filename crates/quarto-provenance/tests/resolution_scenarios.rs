/*
 * resolution_scenarios.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end resolution over pools and registries loaded from JSON, the
 * way they arrive from the parser.
 */

use quarto_provenance::*;
use serde_json::json;

fn load(files: serde_json::Value, pool: serde_json::Value) -> (FileRegistry, ProvenancePool) {
    (
        FileRegistry::from_json(&files).unwrap(),
        ProvenancePool::from_json(&pool).unwrap(),
    )
}

#[test]
fn direct_record_maps_into_its_file() {
    let (registry, pool) = load(
        json!([{"id": 0, "path": "doc", "content": "hello world"}]),
        json!([{"r": [0, 5], "t": 0, "d": 0}]),
    );
    let mut resolver = Resolver::new(&pool, &registry);

    let text = resolver.resolve_text(SourceId(0)).unwrap();
    assert_eq!(text.value(), "hello");
    assert_eq!(
        text.map(2),
        Some(MappedOffset {
            file_id: FileId(0),
            offset: 2
        })
    );
}

#[test]
fn substring_offsets_add_to_the_parent_start() {
    let content = "x".repeat(40);
    let (registry, pool) = load(
        json!([{"id": 0, "path": "doc", "content": content}]),
        json!([
            {"r": [10, 30], "t": 0, "d": 0},
            {"r": [2, 5], "t": 1, "d": 0}
        ]),
    );
    let mut resolver = Resolver::new(&pool, &registry);

    let location = resolver.resolve_location(SourceId(1)).unwrap();
    assert_eq!(
        location,
        ResolvedLocation {
            file_id: FileId(0),
            start: 12,
            end: 15
        }
    );
}

#[test]
fn concatenation_maps_each_piece_back() {
    let (registry, pool) = load(
        json!([{"id": 0, "path": "doc", "content": "alpha ... more text ..beta"}]),
        json!([
            {"r": [0, 5], "t": 0, "d": 0},
            {"r": [22, 26], "t": 0, "d": 0},
            {"r": [0, 9], "t": 2, "d": [[0, 0, 5], [1, 5, 4]]}
        ]),
    );
    let mut resolver = Resolver::new(&pool, &registry);

    let text = resolver.resolve_text(SourceId(2)).unwrap();
    assert_eq!(text.value(), "alphabeta");
    assert_eq!(text.map(5).unwrap().offset, 22);
    assert_eq!(text.map(6).unwrap().offset, 23);
}

#[test]
fn missing_content_fails_when_the_registry_is_built() {
    let err = FileRegistry::from_json(&json!([{"id": 0, "path": "doc"}])).unwrap_err();
    assert_eq!(
        err,
        ProvenanceError::MissingContent {
            file_id: FileId(0),
            path: "doc".to_string()
        }
    );
    assert_eq!(err.category(), ErrorCategory::Registry);
}

#[test]
fn wrong_payload_shape_reaches_the_handler() {
    let (registry, pool) = load(
        json!([{"id": 0, "path": "doc", "content": "hello world"}]),
        json!([{"r": [0, 5], "t": 0, "d": "doc"}]),
    );

    let handler = CollectingHandler::new();
    let mut resolver = Resolver::new(&pool, &registry).with_handler(&handler);
    let text = resolver.resolve_text(SourceId(0)).unwrap();
    assert_eq!(*text, MappedText::empty());

    let errors = handler.take_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].id(), Some(SourceId(0)));
    assert!(errors[0].to_string().contains("file id integer, got a string"));

    let mut strict = Resolver::new(&pool, &registry);
    assert!(strict.resolve_text(SourceId(0)).is_err());
}

#[test]
fn multi_file_document_with_sparse_ids() {
    let (registry, pool) = load(
        json!([
            {"id": 0, "path": "index.qmd", "content": "---\ntitle: Hi\n---\n\n{{< include _part.qmd >}}\n"},
            {"id": 7, "path": "_part.qmd", "content": "## Included\n\nBody text.\n"}
        ]),
        json!([
            {"r": [0, 24], "t": 0, "d": 7},
            {"r": [13, 23], "t": 1, "d": 0},
            {"r": [11, 13], "t": 0, "d": 0}
        ]),
    );
    let mut resolver = Resolver::new(&pool, &registry);

    assert_eq!(
        resolver.source_location(SourceId(1)).unwrap().to_string(),
        "_part.qmd:3:1"
    );
    assert_eq!(resolver.resolve_text(SourceId(2)).unwrap().value(), "Hi");
    assert_eq!(
        resolver.source_location(SourceId(2)).unwrap().to_string(),
        "index.qmd:2:8"
    );
}

#[test]
fn pool_survives_a_json_roundtrip() {
    let mut registry = FileRegistry::new();
    let file = registry.add_file("doc.qmd", "one two three");

    let mut pool = ProvenancePool::new();
    let one = pool.push_direct(file, 0, 3).unwrap();
    let three = pool.push_direct(file, 8, 13).unwrap();
    let joined = pool.push_concat(&[(three, 5), (one, 3)]).unwrap();
    let tail = pool.push_substring(joined, 4, 8).unwrap();

    let reloaded = ProvenancePool::from_json(&pool.to_json()).unwrap();
    let mut original = Resolver::new(&pool, &registry);
    let mut roundtripped = Resolver::new(&reloaded, &registry);
    assert_eq!(
        original.resolve_text(tail).unwrap(),
        roundtripped.resolve_text(tail).unwrap()
    );
    assert_eq!(roundtripped.resolve_text(tail).unwrap().value(), "eone");
}
