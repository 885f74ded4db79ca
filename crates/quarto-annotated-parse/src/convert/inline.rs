/*
 * convert/inline.rs
 * Copyright (c) 2025 Posit, PBC
 */

use super::attr::{attr_leaves, target_leaves};
use super::block::annotate_blocks;
use super::{
    array, content, make_leaf, make_node, node_object, source_id, strip_provenance, tuple,
};
use crate::error::{AnnotationError, Result};
use crate::node::AnnotatedNode;
use quarto_provenance::Resolver;
use serde_json::{Map, Value};

/// Annotate a list of inlines, in order.
pub fn annotate_inlines(value: &Value, resolver: &mut Resolver<'_>) -> Result<Vec<AnnotatedNode>> {
    array(value, "Inlines")?
        .iter()
        .map(|inline| annotate_inline(inline, resolver))
        .collect()
}

/// Annotate one Pandoc inline.
///
/// Components are the inline's children in source order: attribute leaves
/// first, then content, then link/image target leaves.
pub fn annotate_inline(value: &Value, resolver: &mut Resolver<'_>) -> Result<AnnotatedNode> {
    let (obj, tag) = node_object(value, "inline")?;
    let id = source_id(obj.get("s"), tag)?;

    let components = match tag {
        "Str" | "Space" | "SoftBreak" | "LineBreak" | "Math" | "RawInline" => Vec::new(),
        "Emph" | "Strong" | "Underline" | "Strikeout" | "Superscript" | "Subscript"
        | "SmallCaps" => annotate_inlines(content(obj, tag)?, resolver)?,
        "Quoted" => {
            let c = tuple(content(obj, tag)?, tag, 2)?;
            annotate_inlines(&c[1], resolver)?
        }
        "Code" => {
            let c = tuple(content(obj, tag)?, tag, 2)?;
            attr_leaves(&c[0], obj.get("attrS"), tag, resolver)?
        }
        "Span" => {
            let c = tuple(content(obj, tag)?, tag, 2)?;
            let mut components = attr_leaves(&c[0], obj.get("attrS"), tag, resolver)?;
            components.extend(annotate_inlines(&c[1], resolver)?);
            components
        }
        "Link" | "Image" => {
            let c = tuple(content(obj, tag)?, tag, 3)?;
            let mut components = attr_leaves(&c[0], obj.get("attrS"), tag, resolver)?;
            components.extend(annotate_inlines(&c[1], resolver)?);
            components.extend(target_leaves(&c[2], obj.get("targetS"), tag, resolver)?);
            components
        }
        "Note" => annotate_blocks(content(obj, tag)?, resolver)?,
        "Cite" => annotate_cite(obj, resolver)?,
        _ => {
            return Err(AnnotationError::UnknownNodeType {
                category: "inline",
                tag: tag.to_string(),
            });
        }
    };

    let result = obj.get("c").map_or(Value::Null, strip_provenance);
    make_node(tag, result, id, components, resolver)
}

/// Each citation contributes its prefix, its id and its suffix; the cite's
/// own content follows.
fn annotate_cite(
    obj: &Map<String, Value>,
    resolver: &mut Resolver<'_>,
) -> Result<Vec<AnnotatedNode>> {
    let c = tuple(content(obj, "Cite")?, "Cite", 2)?;
    let mut components = Vec::new();

    for citation in array(&c[0], "Cite")? {
        let citation = citation
            .as_object()
            .ok_or_else(|| AnnotationError::MalformedNode {
                kind: "Cite".to_string(),
                message: "citation must be an object".to_string(),
            })?;
        if let Some(prefix) = citation.get("citationPrefix") {
            components.extend(annotate_inlines(prefix, resolver)?);
        }
        if let Some(id) = source_id(citation.get("citationIdS"), "Cite")? {
            let citation_id = citation.get("citationId").cloned().unwrap_or(Value::Null);
            components.push(make_leaf("citation-id", citation_id, id, resolver)?);
        }
        if let Some(suffix) = citation.get("citationSuffix") {
            components.extend(annotate_inlines(suffix, resolver)?);
        }
    }

    components.extend(annotate_inlines(&c[1], resolver)?);
    Ok(components)
}
