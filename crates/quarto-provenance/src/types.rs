/*
 * types.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Core identifiers and positions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for a registered source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub usize);

impl FileId {
    /// File id carried by sentinel locations when resolution fails in a
    /// tolerant error mode. Never assigned to a registered file.
    pub const INVALID: FileId = FileId(usize::MAX);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            write!(f, "#invalid")
        }
    }
}

/// Index of a record in a [`ProvenancePool`](crate::ProvenancePool)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub usize);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A location in source text (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset from start of source
    pub offset: usize,
    /// Row number (0-indexed)
    pub row: usize,
    /// Column number (0-indexed, in bytes from the start of the row)
    pub column: usize,
}

/// An offset in a derived text mapped back to an original file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MappedOffset {
    pub file_id: FileId,
    /// Byte offset into the file's content
    pub offset: usize,
}

/// The file span a pool record resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedLocation {
    pub file_id: FileId,
    pub start: usize,
    pub end: usize,
}

impl ResolvedLocation {
    /// Location returned when a tolerant error handler recovers from a failure.
    pub const SENTINEL: ResolvedLocation = ResolvedLocation {
        file_id: FileId::INVALID,
        start: 0,
        end: 0,
    };

    pub fn is_sentinel(&self) -> bool {
        !self.file_id.is_valid()
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A position for display in diagnostics (1-based line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

impl LineColumn {
    /// Convert a 0-based [`Location`] into its 1-based display form.
    pub fn from_location(location: Location) -> Self {
        LineColumn {
            line: location.row + 1,
            column: location.column + 1,
        }
    }
}

/// A file position as shown to users: `path:line:column`, 1-based
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file_path: String,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    /// Placeholder used when a tolerant handler recovered from a failed lookup.
    /// Line and column are 0, which no real position can have.
    pub fn unknown() -> Self {
        SourceLocation {
            file_path: "<unknown>".to_string(),
            line: 0,
            column: 0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file_path, self.line, self.column)
    }
}

/// A file span as shown to users, with 1-based start and end positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub file_path: String,
    pub start: LineColumn,
    pub end: LineColumn,
}

impl SourceRange {
    pub fn unknown() -> Self {
        SourceRange {
            file_path: "<unknown>".to_string(),
            start: LineColumn { line: 0, column: 0 },
            end: LineColumn { line: 0, column: 0 },
        }
    }

    /// The start of the range as a [`SourceLocation`].
    pub fn start_location(&self) -> SourceLocation {
        SourceLocation {
            file_path: self.file_path.clone(),
            line: self.start.line,
            column: self.start.column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_file_id() {
        assert!(FileId(0).is_valid());
        assert!(!FileId::INVALID.is_valid());
        assert_eq!(FileId(3).to_string(), "#3");
        assert_eq!(FileId::INVALID.to_string(), "#invalid");
    }

    #[test]
    fn test_sentinel_location() {
        assert!(ResolvedLocation::SENTINEL.is_sentinel());
        assert!(ResolvedLocation::SENTINEL.is_empty());

        let loc = ResolvedLocation {
            file_id: FileId(0),
            start: 12,
            end: 15,
        };
        assert!(!loc.is_sentinel());
        assert_eq!(loc.len(), 3);
    }

    #[test]
    fn test_line_column_is_one_based() {
        let lc = LineColumn::from_location(Location {
            offset: 7,
            row: 1,
            column: 0,
        });
        assert_eq!(lc, LineColumn { line: 2, column: 1 });
    }

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation {
            file_path: "doc.qmd".to_string(),
            line: 3,
            column: 14,
        };
        assert_eq!(loc.to_string(), "doc.qmd:3:14");
        assert!(!loc.is_unknown());
        assert!(SourceLocation::unknown().is_unknown());
    }

    #[test]
    fn test_source_id_serializes_as_integer() {
        let json = serde_json::to_string(&SourceId(42)).unwrap();
        assert_eq!(json, "42");
        let back: SourceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SourceId(42));
    }
}
