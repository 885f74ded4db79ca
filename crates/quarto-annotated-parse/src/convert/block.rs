/*
 * convert/block.rs
 * Copyright (c) 2025 Posit, PBC
 */

use super::attr::attr_leaves;
use super::inline::annotate_inlines;
use super::meta::annotate_meta_value;
use super::table::annotate_table;
use super::{array, content, make_node, node_object, source_id, strip_provenance, tuple};
use crate::error::{AnnotationError, Result};
use crate::node::AnnotatedNode;
use quarto_provenance::Resolver;
use serde_json::Value;

/// Annotate a list of blocks, in order.
pub fn annotate_blocks(value: &Value, resolver: &mut Resolver<'_>) -> Result<Vec<AnnotatedNode>> {
    array(value, "Blocks")?
        .iter()
        .map(|block| annotate_block(block, resolver))
        .collect()
}

/// Annotate one Pandoc block.
///
/// Nested sequences are flattened into `components`: a list's items, a
/// definition list's terms and definitions, and a line block's lines all end
/// up in one array. The functions in [`crate::navigation`] regroup them.
pub fn annotate_block(value: &Value, resolver: &mut Resolver<'_>) -> Result<AnnotatedNode> {
    let (obj, tag) = node_object(value, "block")?;
    let id = source_id(obj.get("s"), tag)?;

    let components = match tag {
        "Para" | "Plain" => annotate_inlines(content(obj, tag)?, resolver)?,
        "HorizontalRule" | "RawBlock" => Vec::new(),
        "Header" => {
            let c = tuple(content(obj, tag)?, tag, 3)?;
            let mut components = attr_leaves(&c[1], obj.get("attrS"), tag, resolver)?;
            components.extend(annotate_inlines(&c[2], resolver)?);
            components
        }
        "CodeBlock" => {
            let c = tuple(content(obj, tag)?, tag, 2)?;
            attr_leaves(&c[0], obj.get("attrS"), tag, resolver)?
        }
        "BlockQuote" => annotate_blocks(content(obj, tag)?, resolver)?,
        "BulletList" => annotate_items(content(obj, tag)?, tag, resolver)?,
        "OrderedList" => {
            let c = tuple(content(obj, tag)?, tag, 2)?;
            annotate_items(&c[1], tag, resolver)?
        }
        "DefinitionList" => {
            let mut components = Vec::new();
            for item in array(content(obj, tag)?, tag)? {
                let item = tuple(item, tag, 2)?;
                components.extend(annotate_inlines(&item[0], resolver)?);
                components.extend(annotate_items(&item[1], tag, resolver)?);
            }
            components
        }
        "LineBlock" => {
            let mut components = Vec::new();
            for line in array(content(obj, tag)?, tag)? {
                components.extend(annotate_inlines(line, resolver)?);
            }
            components
        }
        "Div" => {
            let c = tuple(content(obj, tag)?, tag, 2)?;
            let mut components = attr_leaves(&c[0], obj.get("attrS"), tag, resolver)?;
            components.extend(annotate_blocks(&c[1], resolver)?);
            components
        }
        "Figure" => {
            let c = tuple(content(obj, tag)?, tag, 3)?;
            let mut components = attr_leaves(&c[0], obj.get("attrS"), tag, resolver)?;
            let caption = tuple(&c[1], tag, 2)?;
            if !caption[0].is_null() {
                components.extend(annotate_inlines(&caption[0], resolver)?);
            }
            components.extend(annotate_blocks(&caption[1], resolver)?);
            components.extend(annotate_blocks(&c[2], resolver)?);
            components
        }
        "Table" => annotate_table(obj, resolver)?,
        "BlockMetadata" => vec![annotate_meta_value(content(obj, tag)?, resolver)?],
        "NoteDefinitionPara" => {
            let c = tuple(content(obj, tag)?, tag, 2)?;
            annotate_inlines(&c[1], resolver)?
        }
        "NoteDefinitionFencedBlock" => {
            let c = tuple(content(obj, tag)?, tag, 2)?;
            annotate_blocks(&c[1], resolver)?
        }
        _ => {
            return Err(AnnotationError::UnknownNodeType {
                category: "block",
                tag: tag.to_string(),
            });
        }
    };

    let result = obj.get("c").map_or(Value::Null, strip_provenance);
    make_node(tag, result, id, components, resolver)
}

/// Blocks of every item of a `[[blocks]]` list, flattened
fn annotate_items(
    items: &Value,
    kind: &str,
    resolver: &mut Resolver<'_>,
) -> Result<Vec<AnnotatedNode>> {
    let mut components = Vec::new();
    for item in array(items, kind)? {
        components.extend(annotate_blocks(item, resolver)?);
    }
    Ok(components)
}
