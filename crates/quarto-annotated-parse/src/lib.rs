/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Annotated parse trees for Quarto documents
//!
//! Converts a Pandoc JSON document whose nodes carry provenance ids into a
//! tree of [`AnnotatedNode`]s. Every node pairs its plain value (`result`)
//! with the full text of the file it came from and its byte range in that
//! text, so validators and diagnostics can point at the exact source of any
//! value without knowing how the parser sliced and joined it.
//!
//! ```rust
//! use quarto_annotated_parse::{DocumentContext, annotate_document};
//! use serde_json::json;
//!
//! let document = json!({
//!     "astContext": {
//!         "files": [{"path": "doc.qmd", "content": "Hello world\n"}],
//!         "sourceInfoPool": [
//!             {"r": [0, 11], "t": 0, "d": 0},
//!             {"r": [0, 5], "t": 1, "d": 0},
//!             {"r": [5, 6], "t": 1, "d": 0},
//!             {"r": [6, 11], "t": 1, "d": 0}
//!         ]
//!     },
//!     "blocks": [{"t": "Para", "s": 0, "c": [
//!         {"t": "Str", "c": "Hello", "s": 1},
//!         {"t": "Space", "s": 2},
//!         {"t": "Str", "c": "world", "s": 3}
//!     ]}],
//!     "meta": {}
//! });
//!
//! let context = DocumentContext::from_json(&document).unwrap();
//! let mut resolver = context.resolver();
//! let tree = annotate_document(&document, None, &mut resolver).unwrap();
//!
//! let para = &tree.components[0];
//! assert_eq!(para.text(), "Hello world");
//! assert_eq!(para.components[2].text(), "world");
//! ```

pub mod convert;
pub mod document;
pub mod error;
pub mod navigation;
pub mod node;

pub use convert::{
    annotate_block, annotate_blocks, annotate_inline, annotate_inlines, annotate_meta,
    annotate_meta_value, strip_provenance,
};
pub use document::{DocumentContext, annotate_document};
pub use error::{AnnotationError, Result};
pub use navigation::{
    DefinitionItem, MetaEntry, TableBodyView, TableView, flatten_definition_list, flatten_groups,
    flatten_meta_map, navigate_definition_list, navigate_line_block, navigate_list_items,
    navigate_meta_map, navigate_table,
};
pub use node::{AnnotatedNode, Descendants};
