/*
 * navigation.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Grouped views over flattened components
//!
//! Lists, definition lists, line blocks, metadata maps and tables keep all
//! of their children in one `components` array. The sizes of the groups
//! survive only in the node's `result`, so each function here walks `result`
//! and `components` together and slices `components` into the groups they
//! came from. Nothing is copied or mutated; every view borrows the node.
//!
//! If `result` does not have the shape the node kind calls for, or the group
//! sizes it gives do not add up to the number of components, the node was
//! not produced by the converters in this crate and the function fails with
//! [`AnnotationError::NavigationMismatch`].

use crate::error::{AnnotationError, Result};
use crate::node::AnnotatedNode;
use serde_json::Value;

/// Items of a `BulletList` or `OrderedList`, each the blocks of one item.
pub fn navigate_list_items(node: &AnnotatedNode) -> Result<Vec<&[AnnotatedNode]>> {
    let items = match node.kind.as_str() {
        "BulletList" => entries(&node.result, node)?,
        "OrderedList" => entries(&fields(&node.result, 2, node)?[1], node)?,
        _ => return Err(wrong_kind(node, "BulletList or OrderedList")),
    };
    let lengths = items
        .iter()
        .map(|item| entries(item, node).map(<[Value]>::len))
        .collect::<Result<Vec<_>>>()?;
    split(&node.components, &lengths, node)
}

/// Lines of a `LineBlock`, each the inlines of one line.
pub fn navigate_line_block(node: &AnnotatedNode) -> Result<Vec<&[AnnotatedNode]>> {
    if node.kind != "LineBlock" {
        return Err(wrong_kind(node, "LineBlock"));
    }
    let lengths = entries(&node.result, node)?
        .iter()
        .map(|line| entries(line, node).map(<[Value]>::len))
        .collect::<Result<Vec<_>>>()?;
    split(&node.components, &lengths, node)
}

/// Inverse of [`navigate_list_items`] and [`navigate_line_block`].
pub fn flatten_groups(groups: &[&[AnnotatedNode]]) -> Vec<AnnotatedNode> {
    groups.iter().flat_map(|group| group.iter().cloned()).collect()
}

/// One term of a definition list with its definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionItem<'a> {
    pub term: &'a [AnnotatedNode],
    pub definitions: Vec<&'a [AnnotatedNode]>,
}

impl DefinitionItem<'_> {
    pub fn len(&self) -> usize {
        self.term.len() + self.definitions.iter().map(|d| d.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Items of a `DefinitionList`.
pub fn navigate_definition_list(node: &AnnotatedNode) -> Result<Vec<DefinitionItem<'_>>> {
    if node.kind != "DefinitionList" {
        return Err(wrong_kind(node, "DefinitionList"));
    }

    let mut rest = node.components.as_slice();
    let mut items = Vec::new();
    for item in entries(&node.result, node)? {
        let item = fields(item, 2, node)?;
        let term = take(&mut rest, entries(&item[0], node)?.len(), node)?;
        let mut definitions = Vec::new();
        for definition in entries(&item[1], node)? {
            definitions.push(take(&mut rest, entries(definition, node)?.len(), node)?);
        }
        items.push(DefinitionItem { term, definitions });
    }
    finish(rest, node)?;
    Ok(items)
}

/// Inverse of [`navigate_definition_list`].
pub fn flatten_definition_list(items: &[DefinitionItem<'_>]) -> Vec<AnnotatedNode> {
    let mut components = Vec::new();
    for item in items {
        components.extend_from_slice(item.term);
        for definition in &item.definitions {
            components.extend_from_slice(definition);
        }
    }
    components
}

/// One entry of a metadata map. `key` is `None` when the key had no
/// provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaEntry<'a> {
    pub key: Option<&'a AnnotatedNode>,
    pub value: &'a AnnotatedNode,
}

impl MetaEntry<'_> {
    /// The key as written, from the entry's key leaf.
    pub fn key_name(&self) -> Option<&str> {
        self.key.and_then(|key| key.result.as_str())
    }
}

/// Entries of a `MetaMap` or of the document's top-level `Meta`.
pub fn navigate_meta_map(node: &AnnotatedNode) -> Result<Vec<MetaEntry<'_>>> {
    if node.kind != "MetaMap" && node.kind != "Meta" {
        return Err(wrong_kind(node, "MetaMap or Meta"));
    }

    let mut rest = node.components.as_slice();
    let mut map_entries = Vec::new();
    for _ in entries(&node.result, node)? {
        let key = match rest.first() {
            Some(first) if first.kind == "key" => {
                rest = &rest[1..];
                Some(first)
            }
            _ => None,
        };
        let value = take(&mut rest, 1, node)?;
        map_entries.push(MetaEntry {
            key,
            value: &value[0],
        });
    }
    finish(rest, node)?;
    Ok(map_entries)
}

/// Inverse of [`navigate_meta_map`].
pub fn flatten_meta_map(map_entries: &[MetaEntry<'_>]) -> Vec<AnnotatedNode> {
    let mut components = Vec::new();
    for entry in map_entries {
        components.extend(entry.key.cloned());
        components.push(entry.value.clone());
    }
    components
}

/// One body of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBodyView<'a> {
    pub node: &'a AnnotatedNode,
    pub attr: &'a [AnnotatedNode],
    pub head_rows: &'a [AnnotatedNode],
    pub body_rows: &'a [AnnotatedNode],
}

/// A table's parts, each row a `Row` node whose components are its
/// attribute leaves and `Cell` nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView<'a> {
    pub attr: &'a [AnnotatedNode],
    pub caption: &'a AnnotatedNode,
    pub head: &'a AnnotatedNode,
    pub head_attr: &'a [AnnotatedNode],
    pub head_rows: &'a [AnnotatedNode],
    pub bodies: Vec<TableBodyView<'a>>,
    pub foot: &'a AnnotatedNode,
    pub foot_attr: &'a [AnnotatedNode],
    pub foot_rows: &'a [AnnotatedNode],
}

impl TableView<'_> {
    /// Inverse of [`navigate_table`]: the table node's components.
    pub fn flatten(&self) -> Vec<AnnotatedNode> {
        let mut components = self.attr.to_vec();
        components.push(self.caption.clone());
        components.push(self.head.clone());
        components.extend(self.bodies.iter().map(|body| body.node.clone()));
        components.push(self.foot.clone());
        components
    }
}

/// The parts of a `Table`.
pub fn navigate_table(node: &AnnotatedNode) -> Result<TableView<'_>> {
    if node.kind != "Table" {
        return Err(wrong_kind(node, "Table"));
    }
    let table = fields(&node.result, 6, node)?;
    let body_count = entries(&table[4], node)?.len();

    let mut rest = node.components.as_slice();
    let attr_count = leading_attr_count(rest);
    let attr = take(&mut rest, attr_count, node)?;
    let caption = expect_part(&mut rest, "Caption", node)?;
    let head = expect_part(&mut rest, "TableHead", node)?;
    let (head_attr, head_rows) = section_rows(head)?;

    let mut bodies = Vec::with_capacity(body_count);
    for _ in 0..body_count {
        let body = expect_part(&mut rest, "TableBody", node)?;
        let parts = fields(&body.result, 4, body)?;
        let head_len = entries(&parts[2], body)?.len();
        let body_len = entries(&parts[3], body)?.len();

        let mut body_rest = body.components.as_slice();
        let attr_count = leading_attr_count(body_rest);
        let attr = take(&mut body_rest, attr_count, body)?;
        let head_rows = take(&mut body_rest, head_len, body)?;
        let body_rows = take(&mut body_rest, body_len, body)?;
        finish(body_rest, body)?;
        bodies.push(TableBodyView {
            node: body,
            attr,
            head_rows,
            body_rows,
        });
    }

    let foot = expect_part(&mut rest, "TableFoot", node)?;
    let (foot_attr, foot_rows) = section_rows(foot)?;
    finish(rest, node)?;

    Ok(TableView {
        attr,
        caption,
        head,
        head_attr,
        head_rows,
        bodies,
        foot,
        foot_attr,
        foot_rows,
    })
}

/// Attribute leaves and rows of a `TableHead` or `TableFoot`
fn section_rows(section: &AnnotatedNode) -> Result<(&[AnnotatedNode], &[AnnotatedNode])> {
    let rows = entries(&fields(&section.result, 2, section)?[1], section)?.len();
    let mut rest = section.components.as_slice();
    let attr_count = leading_attr_count(rest);
    let attr = take(&mut rest, attr_count, section)?;
    let rows = take(&mut rest, rows, section)?;
    finish(rest, section)?;
    Ok((attr, rows))
}

fn expect_part<'a>(
    rest: &mut &'a [AnnotatedNode],
    kind: &str,
    node: &AnnotatedNode,
) -> Result<&'a AnnotatedNode> {
    let part = take(rest, 1, node)?;
    if part[0].kind != kind {
        return Err(mismatch(
            node,
            format!("expected a {} component, found {}", kind, part[0].kind),
        ));
    }
    Ok(&part[0])
}

fn leading_attr_count(components: &[AnnotatedNode]) -> usize {
    components
        .iter()
        .take_while(|c| c.kind.starts_with("attr-"))
        .count()
}

fn split<'a>(
    components: &'a [AnnotatedNode],
    lengths: &[usize],
    node: &AnnotatedNode,
) -> Result<Vec<&'a [AnnotatedNode]>> {
    let mut rest = components;
    let groups = lengths
        .iter()
        .map(|&len| take(&mut rest, len, node))
        .collect::<Result<Vec<_>>>()?;
    finish(rest, node)?;
    Ok(groups)
}

fn take<'a>(
    rest: &mut &'a [AnnotatedNode],
    len: usize,
    node: &AnnotatedNode,
) -> Result<&'a [AnnotatedNode]> {
    if len > rest.len() {
        return Err(mismatch(
            node,
            format!(
                "result needs {} more components but only {} remain",
                len,
                rest.len()
            ),
        ));
    }
    let (group, tail) = rest.split_at(len);
    *rest = tail;
    Ok(group)
}

fn finish(rest: &[AnnotatedNode], node: &AnnotatedNode) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(mismatch(
            node,
            format!("{} components left over after the last group", rest.len()),
        ))
    }
}

fn entries<'v>(value: &'v Value, node: &AnnotatedNode) -> Result<&'v [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| mismatch(node, format!("expected an array in result, got {}", value)))
}

fn fields<'v>(value: &'v Value, arity: usize, node: &AnnotatedNode) -> Result<&'v [Value]> {
    let items = entries(value, node)?;
    if items.len() != arity {
        return Err(mismatch(
            node,
            format!("expected {} fields in result, got {}", arity, items.len()),
        ));
    }
    Ok(items)
}

fn wrong_kind(node: &AnnotatedNode, expected: &str) -> AnnotationError {
    mismatch(node, format!("expected a {} node", expected))
}

fn mismatch(node: &AnnotatedNode, message: String) -> AnnotationError {
    AnnotationError::NavigationMismatch {
        kind: node.kind.clone(),
        message,
    }
}
