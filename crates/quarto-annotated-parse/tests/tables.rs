/*
 * tables.rs
 * Copyright (c) 2025 Posit, PBC
 */

use quarto_annotated_parse::*;
use quarto_provenance::{FileId, ProvenancePool, SourceId};
use serde_json::{Value, json};

const TABLE: &str = "| a | b |\n|---|---|\n| 1 | 2 |\n\n: Totals {#tbl-totals}\n";

fn span(pool: &mut ProvenancePool, needle: &str) -> usize {
    let start = TABLE.find(needle).expect("needle in fixture");
    pool.push_direct(FileId(0), start, start + needle.len())
        .unwrap()
        .0
}

fn empty_attr() -> Value {
    json!(["", [], []])
}

fn no_attr_source() -> Value {
    json!({"id": null, "classes": [], "kvs": []})
}

/// A cell holding one word, with its content and side table entry
fn cell(pool: &mut ProvenancePool, padded: &str) -> (Value, Value) {
    let word = padded.trim();
    let cell = span(pool, padded);
    let plain = pool.push_substring(SourceId(cell), 1, 1 + word.len()).unwrap().0;
    let content = json!([
        empty_attr(),
        {"t": "AlignDefault"},
        1,
        1,
        [{"t": "Plain", "s": plain, "c": [{"t": "Str", "c": word, "s": plain}]}]
    ]);
    let source = json!({"s": cell, "attrS": no_attr_source()});
    (content, source)
}

fn table_block() -> (Value, ProvenancePool) {
    let mut pool = ProvenancePool::new();
    let table_start = 0;
    let table_end = TABLE.find("}").unwrap() + 1;
    let table = pool.push_direct(FileId(0), table_start, table_end).unwrap().0;

    let head_row = span(&mut pool, "| a | b |");
    let (a, a_source) = cell(&mut pool, " a ");
    let (b, b_source) = cell(&mut pool, " b ");
    let body_row = span(&mut pool, "| 1 | 2 |");
    let (one, one_source) = cell(&mut pool, " 1 ");
    let (two, two_source) = cell(&mut pool, " 2 ");

    let caption = span(&mut pool, ": Totals");
    let totals = pool.push_substring(SourceId(caption), 2, 8).unwrap().0;
    let table_id = span(&mut pool, "tbl-totals");

    let block = json!({
        "t": "Table",
        "s": table,
        "attrS": {"id": table_id, "classes": [], "kvs": []},
        "captionS": caption,
        "headS": {
            "s": head_row,
            "attrS": no_attr_source(),
            "rowsS": [{"s": head_row, "attrS": no_attr_source(), "cellsS": [a_source, b_source]}]
        },
        "bodiesS": [{
            "s": body_row,
            "attrS": no_attr_source(),
            "headS": [],
            "bodyS": [{"s": body_row, "attrS": no_attr_source(), "cellsS": [one_source, two_source]}]
        }],
        "footS": {"s": null, "attrS": no_attr_source(), "rowsS": []},
        "c": [
            ["tbl-totals", [], []],
            [null, [{"t": "Plain", "s": totals, "c": [{"t": "Str", "c": "Totals", "s": totals}]}]],
            [
                [{"t": "AlignDefault"}, {"t": "ColWidthDefault"}],
                [{"t": "AlignDefault"}, {"t": "ColWidthDefault"}]
            ],
            [empty_attr(), [[empty_attr(), [a, b]]]],
            [[empty_attr(), 0, [], [[empty_attr(), [one, two]]]]],
            [empty_attr(), []]
        ]
    });
    (block, pool)
}

fn annotate_table(block: &Value, pool: &ProvenancePool) -> AnnotatedNode {
    let mut registry = quarto_provenance::FileRegistry::new();
    registry.add_file("table.qmd", TABLE);
    let mut resolver = quarto_provenance::Resolver::new(pool, &registry);
    annotate_block(block, &mut resolver).unwrap()
}

#[test]
fn test_table_parts() {
    let (block, pool) = table_block();
    let table = annotate_table(&block, &pool);

    let kinds: Vec<&str> = table.components.iter().map(|c| c.kind.as_str()).collect();
    assert_eq!(
        kinds,
        vec!["attr-id", "Caption", "TableHead", "TableBody", "TableFoot"]
    );
    assert_eq!(table.components[0].text(), "tbl-totals");
    assert_eq!(table.components[1].text(), ": Totals");
    assert_eq!(table.components[1].components[0].text(), "Totals");
}

#[test]
fn test_navigate_table() {
    let (block, pool) = table_block();
    let table = annotate_table(&block, &pool);
    let view = navigate_table(&table).unwrap();

    assert_eq!(view.attr.len(), 1);
    assert_eq!(view.head_rows.len(), 1);
    assert_eq!(view.head_rows[0].text(), "| a | b |");
    assert_eq!(view.bodies.len(), 1);
    assert!(view.bodies[0].head_rows.is_empty());
    assert_eq!(view.bodies[0].body_rows.len(), 1);
    assert!(view.foot_rows.is_empty());
    assert_eq!(view.flatten(), table.components);

    let cells: Vec<&str> = view.bodies[0].body_rows[0]
        .components
        .iter()
        .map(AnnotatedNode::text)
        .collect();
    assert_eq!(cells, vec![" 1 ", " 2 "]);
    let words: Vec<&str> = view.head_rows[0].find_all("Str").map(AnnotatedNode::text).collect();
    assert_eq!(words, vec!["a", "b"]);
}

#[test]
fn test_foot_without_provenance_is_unresolved() {
    let (block, pool) = table_block();
    let table = annotate_table(&block, &pool);
    let foot = table.components.last().unwrap();
    assert_eq!(foot.kind, "TableFoot");
    assert!(foot.is_unresolved());
    assert_eq!((foot.start, foot.end), (0, 0));
}

#[test]
fn test_side_table_length_mismatch() {
    let (mut block, pool) = table_block();
    block["headS"]["rowsS"] = json!([]);
    let mut registry = quarto_provenance::FileRegistry::new();
    registry.add_file("table.qmd", TABLE);
    let mut resolver = quarto_provenance::Resolver::new(&pool, &registry);
    assert!(matches!(
        annotate_block(&block, &mut resolver),
        Err(AnnotationError::MalformedNode { .. })
    ));
}

#[test]
fn test_missing_side_table() {
    let (mut block, pool) = table_block();
    block.as_object_mut().unwrap().remove("bodiesS");
    let mut registry = quarto_provenance::FileRegistry::new();
    registry.add_file("table.qmd", TABLE);
    let mut resolver = quarto_provenance::Resolver::new(&pool, &registry);
    assert_eq!(
        annotate_block(&block, &mut resolver).unwrap_err(),
        AnnotationError::MissingField {
            kind: "Table".to_string(),
            field: "bodiesS"
        }
    );
}
