/*
 * convert/mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Converters from the Pandoc JSON tree (with provenance ids) to
//! [`AnnotatedNode`] trees.
//!
//! Every node of the input is `{"t": tag, "c": content, "s": id}`, where
//! `s` is an id into the provenance pool. Parts of a node that cannot carry
//! an `s` of their own (attributes, link targets, citation ids, metadata
//! keys) have their ids in side fields such as `attrS` and `targetS`; each
//! present id becomes a small synthetic leaf node.

mod attr;
mod block;
mod inline;
mod meta;
mod table;

pub use block::{annotate_block, annotate_blocks};
pub use inline::{annotate_inline, annotate_inlines};
pub use meta::{annotate_meta, annotate_meta_value};

use crate::error::{AnnotationError, Result};
use crate::node::AnnotatedNode;
use quarto_provenance::{MappedText, Resolver, SourceId};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Fields that carry provenance ids rather than content
const PROVENANCE_FIELDS: &[&str] = &[
    "s",
    "l",
    "attrS",
    "targetS",
    "citationIdS",
    "captionS",
    "headS",
    "bodiesS",
    "footS",
    "key_source",
];

/// A copy of `value` with every provenance field removed.
///
/// This is the `result` stored on annotated nodes: the tree as a consumer
/// that knows nothing about provenance would see it.
pub fn strip_provenance(value: &Value) -> Value {
    match value {
        Value::Object(obj) => Value::Object(
            obj.iter()
                .filter(|(key, _)| !PROVENANCE_FIELDS.contains(&key.as_str()))
                .map(|(key, v)| (key.clone(), strip_provenance(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_provenance).collect()),
        other => other.clone(),
    }
}

/// Where a node sits in its top-level file
pub(crate) struct Span {
    source: Arc<MappedText>,
    start: usize,
    end: usize,
}

impl Span {
    fn unresolved() -> Self {
        Span {
            source: Arc::new(MappedText::empty()),
            start: 0,
            end: 0,
        }
    }
}

/// Resolve a provenance id to its span in the full text of its file.
pub(crate) fn resolve_span(id: SourceId, resolver: &mut Resolver<'_>) -> Result<Span> {
    let location = resolver.resolve_location(id)?;
    if location.is_sentinel() {
        return Ok(Span::unresolved());
    }
    let source = resolver.file_text(location.file_id)?;
    if source.segments().is_empty() {
        return Ok(Span::unresolved());
    }
    Ok(Span {
        source,
        start: location.start,
        end: location.end,
    })
}

/// Smallest span in the first resolved component's file covering every
/// component from that file.
pub(crate) fn span_of(components: &[AnnotatedNode]) -> Span {
    let Some(first) = components.iter().find(|c| !c.is_unresolved()) else {
        return Span::unresolved();
    };
    let same_file = components
        .iter()
        .filter(|c| Arc::ptr_eq(&c.source, &first.source));
    let (start, end) = same_file.fold((first.start, first.end), |(start, end), c| {
        (start.min(c.start), end.max(c.end))
    });
    Span {
        source: first.source.clone(),
        start,
        end,
    }
}

/// Build a node from an optional provenance id. Without one, the node spans
/// its components.
pub(crate) fn make_node(
    kind: &str,
    result: Value,
    id: Option<SourceId>,
    components: Vec<AnnotatedNode>,
    resolver: &mut Resolver<'_>,
) -> Result<AnnotatedNode> {
    let span = match id {
        Some(id) => resolve_span(id, resolver)?,
        None => span_of(&components),
    };
    Ok(AnnotatedNode {
        kind: kind.to_string(),
        result,
        source: span.source,
        start: span.start,
        end: span.end,
        components,
    })
}

/// A synthetic leaf for a node part with its own provenance id.
pub(crate) fn make_leaf(
    kind: &str,
    result: Value,
    id: SourceId,
    resolver: &mut Resolver<'_>,
) -> Result<AnnotatedNode> {
    make_node(kind, result, Some(id), Vec::new(), resolver)
}

/// Read an optional provenance id: missing or `null` is `None`.
pub(crate) fn source_id(value: Option<&Value>, kind: &str) -> Result<Option<SourceId>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(|id| Some(SourceId(id as usize)))
            .ok_or_else(|| AnnotationError::MalformedNode {
                kind: kind.to_string(),
                message: format!("provenance id must be an integer, got {}", v),
            }),
    }
}

/// The object form of a node together with its tag
pub(crate) fn node_object<'v>(
    value: &'v Value,
    category: &'static str,
) -> Result<(&'v Map<String, Value>, &'v str)> {
    let obj = value
        .as_object()
        .ok_or_else(|| AnnotationError::MalformedNode {
            kind: category.to_string(),
            message: format!("expected an object, got {}", value),
        })?;
    let tag = obj
        .get("t")
        .and_then(Value::as_str)
        .ok_or_else(|| AnnotationError::MissingField {
            kind: category.to_string(),
            field: "t",
        })?;
    Ok((obj, tag))
}

/// The `c` field of a node
pub(crate) fn content<'v>(obj: &'v Map<String, Value>, kind: &str) -> Result<&'v Value> {
    obj.get("c").ok_or_else(|| AnnotationError::MissingField {
        kind: kind.to_string(),
        field: "c",
    })
}

/// `value` as an array of exactly `arity` entries
pub(crate) fn tuple<'v>(value: &'v Value, kind: &str, arity: usize) -> Result<&'v [Value]> {
    match value.as_array() {
        Some(items) if items.len() == arity => Ok(items),
        _ => Err(AnnotationError::MalformedNode {
            kind: kind.to_string(),
            message: format!("expected an array of {} elements", arity),
        }),
    }
}

/// `value` as an array of any length
pub(crate) fn array<'v>(value: &'v Value, kind: &str) -> Result<&'v [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| AnnotationError::MalformedNode {
            kind: kind.to_string(),
            message: format!("expected an array, got {}", value),
        })
}
