/*
 * convert/meta.rs
 * Copyright (c) 2025 Posit, PBC
 */

use super::block::annotate_blocks;
use super::inline::annotate_inlines;
use super::{array, content, make_leaf, make_node, node_object, source_id, strip_provenance};
use crate::error::{AnnotationError, Result};
use crate::node::AnnotatedNode;
use quarto_provenance::Resolver;
use serde_json::{Map, Value, json};

/// Annotate one metadata value.
///
/// A `MetaMap` has two components per entry, a `key` leaf followed by the
/// value, and its `result` is the list of `{key, value}` entries in the
/// order they were written.
pub fn annotate_meta_value(value: &Value, resolver: &mut Resolver<'_>) -> Result<AnnotatedNode> {
    let (obj, tag) = node_object(value, "meta value")?;
    let id = source_id(obj.get("s"), tag)?;

    let components = match tag {
        "MetaString" | "MetaBool" => Vec::new(),
        "MetaInlines" => annotate_inlines(content(obj, tag)?, resolver)?,
        "MetaBlocks" => annotate_blocks(content(obj, tag)?, resolver)?,
        "MetaList" => array(content(obj, tag)?, tag)?
            .iter()
            .map(|item| annotate_meta_value(item, resolver))
            .collect::<Result<Vec<_>>>()?,
        "MetaMap" => {
            let mut components = Vec::new();
            for entry in array(content(obj, tag)?, tag)? {
                let entry = entry
                    .as_object()
                    .ok_or_else(|| AnnotationError::MalformedNode {
                        kind: tag.to_string(),
                        message: format!("map entry must be an object, got {}", entry),
                    })?;
                let key = entry.get("key").ok_or_else(|| AnnotationError::MissingField {
                    kind: tag.to_string(),
                    field: "key",
                })?;
                let value = entry.get("value").ok_or_else(|| AnnotationError::MissingField {
                    kind: tag.to_string(),
                    field: "value",
                })?;
                components.extend(annotate_entry(
                    key,
                    entry.get("key_source"),
                    value,
                    resolver,
                )?);
            }
            components
        }
        _ => {
            return Err(AnnotationError::UnknownNodeType {
                category: "meta value",
                tag: tag.to_string(),
            });
        }
    };

    let result = obj.get("c").map_or(Value::Null, strip_provenance);
    make_node(tag, result, id, components, resolver)
}

/// Annotate a document's top-level metadata.
///
/// `meta` is the `{key: value}` object of the document and `key_sources`
/// the `metaTopLevelKeySources` object mapping each key to its provenance
/// id. The object form has lost the order the keys were written in, so
/// entries are put back in source order. The resulting `Meta` node has the
/// same component layout and `result` shape as a `MetaMap`.
pub fn annotate_meta(
    meta: &Map<String, Value>,
    key_sources: Option<&Map<String, Value>>,
    resolver: &mut Resolver<'_>,
) -> Result<AnnotatedNode> {
    let mut entries = Vec::with_capacity(meta.len());
    for (key, value) in meta {
        let key_source = key_sources.and_then(|sources| sources.get(key));
        let pair = annotate_entry(&json!(key), key_source, value, resolver)?;
        entries.push((key, value, pair));
    }
    entries.sort_by_key(|(_, _, pair)| {
        pair.iter()
            .find(|node| !node.is_unresolved())
            .map(|node| node.start)
    });

    let mut result = Vec::with_capacity(entries.len());
    let mut components = Vec::with_capacity(entries.len() * 2);
    for (key, value, pair) in entries {
        result.push(json!({"key": key, "value": strip_provenance(value)}));
        components.extend(pair);
    }

    make_node("Meta", Value::Array(result), None, components, resolver)
}

/// The `key` leaf (when the key has provenance) and the value node of a
/// map entry.
fn annotate_entry(
    key: &Value,
    key_source: Option<&Value>,
    value: &Value,
    resolver: &mut Resolver<'_>,
) -> Result<Vec<AnnotatedNode>> {
    let mut nodes = Vec::with_capacity(2);
    if let Some(id) = source_id(key_source, "key")? {
        nodes.push(make_leaf("key", key.clone(), id, resolver)?);
    }
    nodes.push(annotate_meta_value(value, resolver)?);
    Ok(nodes)
}
