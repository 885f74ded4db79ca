/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for building and navigating annotated trees.

use quarto_provenance::ProvenanceError;
use thiserror::Error;

/// Errors that can occur while annotating a document tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    /// Resolving a node's provenance failed and the error handler aborted.
    #[error(transparent)]
    Provenance(#[from] ProvenanceError),

    /// A node's `t` tag is not one the converters know. This means the
    /// producer and this crate disagree about the tree's schema.
    #[error("Unknown {category} node type: {tag}")]
    UnknownNodeType { category: &'static str, tag: String },

    #[error("{kind} node is missing required field '{field}'")]
    MissingField { kind: String, field: &'static str },

    /// A node's content does not have the shape its kind requires.
    #[error("Malformed {kind} node: {message}")]
    MalformedNode { kind: String, message: String },

    /// A node's `result` does not line up with its `components`.
    #[error("Cannot navigate {kind} node: {message}")]
    NavigationMismatch { kind: String, message: String },
}

/// Result type for annotation operations.
pub type Result<T> = std::result::Result<T, AnnotationError>;
