/*
 * convert/table.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tables
//!
//! A table's content array cannot carry provenance for its head, bodies,
//! foot, rows and cells, so these arrive in parallel side tables (`headS`,
//! `bodiesS`, `footS`, each with nested `rowsS`/`cellsS`). The converter
//! walks content and side table together and produces one node per part:
//!
//! ```text
//! Table
//! ├── attr-* leaves
//! ├── Caption      (short inlines, then long blocks)
//! ├── TableHead    (attr-* leaves, Row*)
//! ├── TableBody*   (attr-* leaves, head Row*, body Row*)
//! └── TableFoot    (attr-* leaves, Row*)
//!
//! Row  = attr-* leaves, Cell*
//! Cell = attr-* leaves, blocks
//! ```

use super::attr::attr_leaves;
use super::block::annotate_blocks;
use super::inline::annotate_inlines;
use super::{array, content, make_node, source_id, strip_provenance, tuple};
use crate::error::{AnnotationError, Result};
use crate::node::AnnotatedNode;
use quarto_provenance::Resolver;
use serde_json::{Map, Value};

/// Components of a `Table` block.
pub(crate) fn annotate_table(
    obj: &Map<String, Value>,
    resolver: &mut Resolver<'_>,
) -> Result<Vec<AnnotatedNode>> {
    let c = tuple(content(obj, "Table")?, "Table", 6)?;
    let mut components = attr_leaves(&c[0], obj.get("attrS"), "Table", resolver)?;

    components.push(annotate_caption(&c[1], obj.get("captionS"), resolver)?);
    components.push(annotate_section(
        "TableHead",
        &c[3],
        side_table(obj, "headS")?,
        resolver,
    )?);

    let bodies = array(&c[4], "Table")?;
    let body_sources = array(side_table(obj, "bodiesS")?, "Table")?;
    if bodies.len() != body_sources.len() {
        return Err(mismatched("TableBody", bodies.len(), body_sources.len()));
    }
    for (body, body_source) in bodies.iter().zip(body_sources) {
        components.push(annotate_body(body, body_source, resolver)?);
    }

    components.push(annotate_section(
        "TableFoot",
        &c[5],
        side_table(obj, "footS")?,
        resolver,
    )?);
    Ok(components)
}

fn annotate_caption(
    caption: &Value,
    caption_source: Option<&Value>,
    resolver: &mut Resolver<'_>,
) -> Result<AnnotatedNode> {
    let parts = tuple(caption, "Caption", 2)?;
    let mut components = Vec::new();
    if !parts[0].is_null() {
        components.extend(annotate_inlines(&parts[0], resolver)?);
    }
    components.extend(annotate_blocks(&parts[1], resolver)?);

    let id = source_id(caption_source, "Caption")?;
    make_node("Caption", strip_provenance(caption), id, components, resolver)
}

/// A table head or foot: `[attr, rows]` with side table `{s, attrS, rowsS}`
fn annotate_section(
    kind: &str,
    section: &Value,
    section_source: &Value,
    resolver: &mut Resolver<'_>,
) -> Result<AnnotatedNode> {
    let parts = tuple(section, kind, 2)?;
    let source = side_object(section_source, kind)?;

    let mut components = attr_leaves(&parts[0], source.get("attrS"), kind, resolver)?;
    components.extend(annotate_rows(&parts[1], source.get("rowsS"), kind, resolver)?);

    let id = source_id(source.get("s"), kind)?;
    make_node(kind, strip_provenance(section), id, components, resolver)
}

/// `[attr, row_head_columns, head_rows, body_rows]` with side table
/// `{s, attrS, headS, bodyS}`
fn annotate_body(
    body: &Value,
    body_source: &Value,
    resolver: &mut Resolver<'_>,
) -> Result<AnnotatedNode> {
    let parts = tuple(body, "TableBody", 4)?;
    let source = side_object(body_source, "TableBody")?;

    let mut components = attr_leaves(&parts[0], source.get("attrS"), "TableBody", resolver)?;
    components.extend(annotate_rows(&parts[2], source.get("headS"), "TableBody", resolver)?);
    components.extend(annotate_rows(&parts[3], source.get("bodyS"), "TableBody", resolver)?);

    let id = source_id(source.get("s"), "TableBody")?;
    make_node("TableBody", strip_provenance(body), id, components, resolver)
}

fn annotate_rows(
    rows: &Value,
    row_sources: Option<&Value>,
    kind: &str,
    resolver: &mut Resolver<'_>,
) -> Result<Vec<AnnotatedNode>> {
    let rows = array(rows, kind)?;
    let row_sources = match row_sources {
        Some(value) => array(value, kind)?,
        None => &[],
    };
    if rows.len() != row_sources.len() {
        return Err(mismatched("Row", rows.len(), row_sources.len()));
    }

    let mut nodes = Vec::with_capacity(rows.len());
    for (row, row_source) in rows.iter().zip(row_sources) {
        let parts = tuple(row, "Row", 2)?;
        let source = side_object(row_source, "Row")?;

        let mut components = attr_leaves(&parts[0], source.get("attrS"), "Row", resolver)?;
        let cells = array(&parts[1], "Row")?;
        let cell_sources = match source.get("cellsS") {
            Some(value) => array(value, "Row")?,
            None => &[],
        };
        if cells.len() != cell_sources.len() {
            return Err(mismatched("Cell", cells.len(), cell_sources.len()));
        }
        for (cell, cell_source) in cells.iter().zip(cell_sources) {
            components.push(annotate_cell(cell, cell_source, resolver)?);
        }

        let id = source_id(source.get("s"), "Row")?;
        nodes.push(make_node("Row", strip_provenance(row), id, components, resolver)?);
    }
    Ok(nodes)
}

/// `[attr, alignment, row_span, col_span, blocks]` with side table `{s, attrS}`
fn annotate_cell(
    cell: &Value,
    cell_source: &Value,
    resolver: &mut Resolver<'_>,
) -> Result<AnnotatedNode> {
    let parts = tuple(cell, "Cell", 5)?;
    let source = side_object(cell_source, "Cell")?;

    let mut components = attr_leaves(&parts[0], source.get("attrS"), "Cell", resolver)?;
    components.extend(annotate_blocks(&parts[4], resolver)?);

    let id = source_id(source.get("s"), "Cell")?;
    make_node("Cell", strip_provenance(cell), id, components, resolver)
}

fn side_table<'v>(obj: &'v Map<String, Value>, field: &'static str) -> Result<&'v Value> {
    obj.get(field).ok_or_else(|| AnnotationError::MissingField {
        kind: "Table".to_string(),
        field,
    })
}

fn side_object<'v>(value: &'v Value, kind: &str) -> Result<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| AnnotationError::MalformedNode {
            kind: kind.to_string(),
            message: format!("provenance side table must be an object, got {}", value),
        })
}

fn mismatched(kind: &str, content: usize, sources: usize) -> AnnotationError {
    AnnotationError::MalformedNode {
        kind: kind.to_string(),
        message: format!(
            "{} entries in content but {} in the provenance side table",
            content, sources
        ),
    }
}
