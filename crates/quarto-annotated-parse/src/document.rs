/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Whole documents: the provenance context that travels with a document and
//! the conversion of the document itself.

use crate::convert::{annotate_blocks, annotate_meta, strip_provenance};
use crate::error::{AnnotationError, Result};
use crate::node::AnnotatedNode;
use quarto_provenance::{FileRegistry, MappedText, ProvenancePool, Resolver};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// The `astContext` of a document: its files, its provenance pool and the
/// provenance ids of its top-level metadata keys.
#[derive(Debug, Clone, Default)]
pub struct DocumentContext {
    pub registry: FileRegistry,
    pub pool: ProvenancePool,
    pub meta_key_sources: Map<String, Value>,
}

impl DocumentContext {
    /// Read the context of a document in the
    /// `{"astContext": {"files", "sourceInfoPool", "metaTopLevelKeySources"}}`
    /// form.
    pub fn from_json(document: &Value) -> Result<Self> {
        let context = document
            .get("astContext")
            .ok_or_else(|| AnnotationError::MissingField {
                kind: "Document".to_string(),
                field: "astContext",
            })?;
        let files = context.get("files").ok_or_else(|| AnnotationError::MissingField {
            kind: "astContext".to_string(),
            field: "files",
        })?;
        let registry = FileRegistry::from_json(files)?;
        let pool = match context.get("sourceInfoPool") {
            Some(pool) => ProvenancePool::from_json(pool)?,
            None => ProvenancePool::new(),
        };
        let meta_key_sources = context
            .get("metaTopLevelKeySources")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Ok(DocumentContext {
            registry,
            pool,
            meta_key_sources,
        })
    }

    /// A fail-fast resolver over this context.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.pool, &self.registry)
    }
}

/// Convert a whole document to a `Document` node.
///
/// Components are the top-level `Meta` node (when the document has any
/// metadata) followed by the blocks. The node's source is the full text of
/// the primary file, the first one in the registry, and it spans from the
/// first to the last byte its components cover in that file.
pub fn annotate_document(
    document: &Value,
    key_sources: Option<&Map<String, Value>>,
    resolver: &mut Resolver<'_>,
) -> Result<AnnotatedNode> {
    let blocks = document.get("blocks").ok_or_else(|| AnnotationError::MissingField {
        kind: "Document".to_string(),
        field: "blocks",
    })?;
    let meta = match document.get("meta") {
        None | Some(Value::Null) => None,
        Some(meta) => Some(meta.as_object().ok_or_else(|| AnnotationError::MalformedNode {
            kind: "Document".to_string(),
            message: format!("meta must be an object, got {}", meta),
        })?),
    };

    tracing::debug!(
        blocks = blocks.as_array().map_or(0, Vec::len),
        meta_keys = meta.map_or(0, Map::len),
        "Annotating document"
    );

    let mut components = Vec::new();
    if let Some(meta) = meta.filter(|meta| !meta.is_empty()) {
        components.push(annotate_meta(meta, key_sources, resolver)?);
    }
    components.extend(annotate_blocks(blocks, resolver)?);

    let source = match resolver.registry().iter().next() {
        Some(primary) => resolver.file_text(primary.id())?,
        None => Arc::new(MappedText::empty()),
    };
    let (start, end) = components
        .iter()
        .filter(|node| Arc::ptr_eq(&node.source, &source))
        .fold(None, |span, node| match span {
            None => Some((node.start, node.end)),
            Some((start, end)) => Some((node.start.min(start), node.end.max(end))),
        })
        .unwrap_or((0, 0));

    // Top-level keys are the user's own and may collide with provenance
    // field names, so only the values are stripped.
    let meta_result: Map<String, Value> = meta
        .into_iter()
        .flatten()
        .map(|(key, value)| (key.clone(), strip_provenance(value)))
        .collect();
    let result = json!({
        "meta": meta_result,
        "blocks": strip_provenance(blocks),
    });

    tracing::debug!(
        components = components.len(),
        start,
        end,
        "Annotated document"
    );

    Ok(AnnotatedNode {
        kind: "Document".to_string(),
        result,
        source,
        start,
        end,
        components,
    })
}
