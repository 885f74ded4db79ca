/*
 * convert/attr.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Synthetic leaves for attributes and link targets

use super::{make_leaf, source_id, tuple};
use crate::error::Result;
use crate::node::AnnotatedNode;
use quarto_provenance::Resolver;
use serde_json::{Map, Value};

/// Leaves for the parts of a Pandoc `[id, [classes], [[key, value]]]`
/// attribute that were present in the source.
///
/// `attrS` is `{"id": id|null, "classes": [id|null], "kvs": [[id|null,
/// id|null]]}`; a null id means the source omitted that part and produces no
/// leaf. Leaves come back in source order.
pub(crate) fn attr_leaves(
    attr: &Value,
    attr_source: Option<&Value>,
    kind: &str,
    resolver: &mut Resolver<'_>,
) -> Result<Vec<AnnotatedNode>> {
    let Some(attr_source) = attr_source.and_then(Value::as_object) else {
        return Ok(Vec::new());
    };
    let parts = tuple(attr, kind, 3)?;
    let mut leaves = Vec::new();

    if let Some(id) = source_id(attr_source.get("id"), kind)? {
        leaves.push(make_leaf("attr-id", parts[0].clone(), id, resolver)?);
    }

    let classes = parts[1].as_array().map(Vec::as_slice).unwrap_or_default();
    for (i, class_id) in id_list(attr_source, "classes").iter().enumerate() {
        if let Some(id) = source_id(Some(class_id), kind)? {
            let class = classes.get(i).cloned().unwrap_or(Value::Null);
            leaves.push(make_leaf("attr-class", class, id, resolver)?);
        }
    }

    let pairs = parts[2].as_array().map(Vec::as_slice).unwrap_or_default();
    for (i, kv_ids) in id_list(attr_source, "kvs").iter().enumerate() {
        let ids = tuple(kv_ids, kind, 2)?;
        let pair = pairs.get(i).and_then(Value::as_array);
        let part = |j: usize| {
            pair.and_then(|p| p.get(j))
                .cloned()
                .unwrap_or(Value::Null)
        };
        if let Some(id) = source_id(Some(&ids[0]), kind)? {
            leaves.push(make_leaf("attr-key", part(0), id, resolver)?);
        }
        if let Some(id) = source_id(Some(&ids[1]), kind)? {
            leaves.push(make_leaf("attr-value", part(1), id, resolver)?);
        }
    }

    leaves.sort_by_key(|leaf| leaf.start);
    Ok(leaves)
}

/// Leaves for a link or image target `[url, title]`, from `targetS`
/// (`[url_id|null, title_id|null]`).
pub(crate) fn target_leaves(
    target: &Value,
    target_source: Option<&Value>,
    kind: &str,
    resolver: &mut Resolver<'_>,
) -> Result<Vec<AnnotatedNode>> {
    let Some(target_source) = target_source.filter(|v| !v.is_null()) else {
        return Ok(Vec::new());
    };
    let ids = tuple(target_source, kind, 2)?;
    let parts = tuple(target, kind, 2)?;

    let mut leaves = Vec::new();
    if let Some(id) = source_id(Some(&ids[0]), kind)? {
        leaves.push(make_leaf("target-url", parts[0].clone(), id, resolver)?);
    }
    if let Some(id) = source_id(Some(&ids[1]), kind)? {
        leaves.push(make_leaf("target-title", parts[1].clone(), id, resolver)?);
    }
    Ok(leaves)
}

fn id_list<'v>(attr_source: &'v Map<String, Value>, field: &str) -> &'v [Value] {
    attr_source
        .get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
