/*
 * node.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The annotated node tree

use quarto_provenance::{FileRegistry, LineColumn, MappedText, SourceLocation, SourceRange};
use serde_json::Value;
use std::sync::Arc;

/// A node of structured data paired with the source text it came from.
///
/// `source` is always the full text of the top-level file the node lives in
/// (shared between all nodes of that file), and `start..end` are offsets
/// into it, so `source.value()[start..end]` is exactly the text the node was
/// built from. A node whose provenance could not be resolved under a
/// tolerant error handler has an empty `source` and `start == end == 0`.
///
/// `result` is the node's plain value with provenance fields removed. For
/// kinds whose children are grouped (lists, definition lists, tables) the
/// grouping survives only in `result`; see [`crate::navigation`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedNode {
    pub kind: String,
    pub result: Value,
    pub source: Arc<MappedText>,
    pub start: usize,
    pub end: usize,
    pub components: Vec<AnnotatedNode>,
}

impl AnnotatedNode {
    /// A childless node covering `start..end` of `source`.
    pub fn leaf(
        kind: impl Into<String>,
        result: Value,
        source: Arc<MappedText>,
        start: usize,
        end: usize,
    ) -> Self {
        AnnotatedNode {
            kind: kind.into(),
            result,
            source,
            start,
            end,
            components: Vec::new(),
        }
    }

    /// The source text of this node.
    pub fn text(&self) -> &str {
        self.source.value().get(self.start..self.end).unwrap_or("")
    }

    /// True if this node's provenance could not be resolved.
    pub fn is_unresolved(&self) -> bool {
        self.source.segments().is_empty()
    }

    /// This node and all of its descendants, in pre-order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Every node of the given kind in this subtree, in pre-order.
    pub fn find_all<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a AnnotatedNode> + 'a {
        self.descendants().filter(move |node| node.kind == kind)
    }

    /// `path:line:column` of the start of this node (1-based).
    pub fn source_location(&self, registry: &FileRegistry) -> Option<SourceLocation> {
        let mapped = self.source.map(self.start)?;
        registry.source_location(mapped.file_id, mapped.offset)
    }

    /// File path and 1-based start and end of this node.
    pub fn source_range(&self, registry: &FileRegistry) -> Option<SourceRange> {
        let (start, end) = self.source.map_range(self.start, self.end)?;
        let file = registry.get(start.file_id)?;
        let info = file.file_info();
        Some(SourceRange {
            file_path: file.path().to_string(),
            start: LineColumn::from_location(info.offset_to_location(start.offset)?),
            end: LineColumn::from_location(info.offset_to_location(end.offset)?),
        })
    }
}

/// Pre-order iterator over a subtree, see [`AnnotatedNode::descendants`]
pub struct Descendants<'a> {
    stack: Vec<&'a AnnotatedNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a AnnotatedNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.components.iter().rev());
        Some(node)
    }
}
