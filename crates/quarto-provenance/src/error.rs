/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for provenance resolution.

use crate::types::{FileId, SourceId};
use thiserror::Error;

/// Errors raised while loading or resolving provenance.
///
/// Every variant names the offending pool id when there is one
/// (see [`ProvenanceError::id`]), which is what error handlers receive
/// alongside the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvenanceError {
    /// The id is not an index into the pool.
    #[error("Unknown provenance id {id}: the pool has {pool_len} entries")]
    UnknownId { id: SourceId, pool_len: usize },

    /// The record's variant tag is not Direct (0), Substring (1) or Concatenation (2).
    #[error("Provenance record {id} has unknown variant tag {tag}")]
    UnknownVariant { id: SourceId, tag: String },

    /// The record's range or payload does not have the shape its variant requires.
    #[error("Malformed provenance record {id}: {message}")]
    MalformedRecord { id: SourceId, message: String },

    /// The pool payload as a whole is unusable (for example, not an array).
    #[error("Malformed provenance pool: {message}")]
    MalformedPool { message: String },

    /// A record points at itself or a later record.
    #[error("Provenance record {id} references {referenced}, which is not an earlier entry")]
    ForwardReference { id: SourceId, referenced: SourceId },

    #[error("Provenance record {id} has an invalid range [{start}, {end})")]
    InvalidRange {
        id: SourceId,
        start: usize,
        end: usize,
    },

    #[error("Concatenation record {id} has no pieces")]
    EmptyConcatenation { id: SourceId },

    #[error("Substring record {id} range [{start}, {end}) exceeds its parent's length {parent_len}")]
    SubstringOutOfBounds {
        id: SourceId,
        start: usize,
        end: usize,
        parent_len: usize,
    },

    #[error(
        "Concatenation record {id} takes {length} bytes from piece {piece}, which only has {available}"
    )]
    PieceOutOfBounds {
        id: SourceId,
        piece: SourceId,
        length: usize,
        available: usize,
    },

    #[error("Direct record {id} range [{start}, {end}) is outside file {file_id} (length {file_len})")]
    FileRangeOutOfBounds {
        id: SourceId,
        file_id: FileId,
        start: usize,
        end: usize,
        file_len: usize,
    },

    /// A range boundary falls inside a multi-byte UTF-8 character.
    #[error("Provenance record {id} splits a UTF-8 character at offset {offset}")]
    NotCharBoundary { id: SourceId, offset: usize },

    #[error("Provenance record {id} references unregistered file {file_id}")]
    UnknownFile { id: SourceId, file_id: FileId },

    /// First and last characters of a concatenation come from different files.
    #[error("Concatenation record {id} spans two files: it starts in {first} and ends in {last}")]
    CrossFileConcatenation {
        id: SourceId,
        first: FileId,
        last: FileId,
    },

    #[error("Provenance chain at record {id} is deeper than {max_depth}")]
    ChainTooDeep { id: SourceId, max_depth: usize },

    #[error("File {file_id} is not registered")]
    FileNotRegistered { file_id: FileId },

    #[error("File {file_id} ({path}) was registered without content")]
    MissingContent { file_id: FileId, path: String },

    #[error("File {file_id} is already registered")]
    DuplicateFile { file_id: FileId },

    /// The sentinel id cannot name a real file.
    #[error("File id {file_id} is reserved and cannot be registered")]
    ReservedFileId { file_id: FileId },

    #[error("Malformed file registry payload: {message}")]
    MalformedRegistry { message: String },
}

/// Broad classes of [`ProvenanceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The producer built a pool that cannot be resolved.
    MalformedPool,
    /// A file is missing, duplicated or lacks content.
    Registry,
    /// A concatenation mixes provenance from more than one file.
    CrossFileConcatenation,
}

impl ProvenanceError {
    /// The pool id the error is about, if any.
    pub fn id(&self) -> Option<SourceId> {
        use ProvenanceError::*;
        match self {
            UnknownId { id, .. }
            | UnknownVariant { id, .. }
            | MalformedRecord { id, .. }
            | ForwardReference { id, .. }
            | InvalidRange { id, .. }
            | EmptyConcatenation { id }
            | SubstringOutOfBounds { id, .. }
            | PieceOutOfBounds { id, .. }
            | FileRangeOutOfBounds { id, .. }
            | NotCharBoundary { id, .. }
            | UnknownFile { id, .. }
            | CrossFileConcatenation { id, .. }
            | ChainTooDeep { id, .. } => Some(*id),
            MalformedPool { .. }
            | FileNotRegistered { .. }
            | MissingContent { .. }
            | DuplicateFile { .. }
            | ReservedFileId { .. }
            | MalformedRegistry { .. } => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        use ProvenanceError::*;
        match self {
            CrossFileConcatenation { .. } => ErrorCategory::CrossFileConcatenation,
            UnknownFile { .. }
            | FileNotRegistered { .. }
            | MissingContent { .. }
            | DuplicateFile { .. }
            | ReservedFileId { .. }
            | MalformedRegistry { .. } => ErrorCategory::Registry,
            _ => ErrorCategory::MalformedPool,
        }
    }
}

/// Result type for provenance operations.
pub type Result<T> = std::result::Result<T, ProvenanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_reported_for_record_errors() {
        let err = ProvenanceError::EmptyConcatenation { id: SourceId(4) };
        assert_eq!(err.id(), Some(SourceId(4)));
        assert_eq!(err.to_string(), "Concatenation record 4 has no pieces");

        let err = ProvenanceError::MissingContent {
            file_id: FileId(1),
            path: "doc.qmd".to_string(),
        };
        assert_eq!(err.id(), None);
    }

    #[test]
    fn test_categories() {
        let cross = ProvenanceError::CrossFileConcatenation {
            id: SourceId(2),
            first: FileId(0),
            last: FileId(1),
        };
        assert_eq!(cross.category(), ErrorCategory::CrossFileConcatenation);

        let registry = ProvenanceError::DuplicateFile { file_id: FileId(0) };
        assert_eq!(registry.category(), ErrorCategory::Registry);

        let pool = ProvenanceError::UnknownVariant {
            id: SourceId(0),
            tag: "7".to_string(),
        };
        assert_eq!(pool.category(), ErrorCategory::MalformedPool);
    }
}
