/*
 * file_info.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Line index for offset <-> (row, column) lookups

use crate::types::Location;
use serde::{Deserialize, Serialize};

/// Line-break index of a file's content.
///
/// Built once when a file is registered so that offset lookups are
/// O(log n) binary searches and need no further access to the content.
///
/// Convention: a `'\n'` belongs to the row it terminates, rows and columns
/// are 0-based, and columns count bytes from the start of the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInformation {
    /// Byte offsets of each newline character, ascending
    line_breaks: Vec<usize>,

    /// Total length of the file in bytes
    total_length: usize,
}

impl FileInformation {
    /// Index the line breaks of `content`.
    ///
    /// ```
    /// use quarto_provenance::FileInformation;
    ///
    /// let info = FileInformation::new("hello\nworld");
    /// let loc = info.offset_to_location(6).unwrap();
    /// assert_eq!((loc.row, loc.column), (1, 0));
    /// ```
    pub fn new(content: &str) -> Self {
        let line_breaks = memchr::memchr_iter(b'\n', content.as_bytes()).collect();
        FileInformation {
            line_breaks,
            total_length: content.len(),
        }
    }

    /// Convert a byte offset to a [`Location`].
    ///
    /// Returns `None` if the offset is past the end of the file. The offset
    /// one past the last byte is valid (it is where an end-exclusive range
    /// over the whole file stops).
    pub fn offset_to_location(&self, offset: usize) -> Option<Location> {
        if offset > self.total_length {
            return None;
        }

        // Number of newlines strictly before `offset` is the row; the
        // greatest of them (if any) marks where the row starts.
        let row = self.line_breaks.partition_point(|&brk| brk < offset);
        let column = offset - self.row_start(row);

        Some(Location {
            offset,
            row,
            column,
        })
    }

    /// Convert a 0-based row and byte column back to an offset.
    ///
    /// Returns `None` if the row does not exist or the column runs past the
    /// end of the row (the position just before the row's newline, or the end
    /// of the file on the last row, is the largest accepted column).
    pub fn location_to_offset(&self, row: usize, column: usize) -> Option<usize> {
        if row >= self.line_count() {
            return None;
        }
        let start = self.row_start(row);
        let row_end = self
            .line_breaks
            .get(row)
            .copied()
            .unwrap_or(self.total_length);
        let offset = start + column;
        (offset <= row_end).then_some(offset)
    }

    fn row_start(&self, row: usize) -> usize {
        match row {
            0 => 0,
            _ => self.line_breaks[row - 1] + 1,
        }
    }

    /// Byte offsets of every newline in the file
    pub fn line_breaks(&self) -> &[usize] {
        &self.line_breaks
    }

    /// Get the total length of the file in bytes
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Number of rows; a file with n newlines has n + 1 rows
    pub fn line_count(&self) -> usize {
        self.line_breaks.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_col(info: &FileInformation, offset: usize) -> (usize, usize) {
        let loc = info.offset_to_location(offset).unwrap();
        (loc.row, loc.column)
    }

    #[test]
    fn test_empty_file() {
        let info = FileInformation::new("");
        assert_eq!(info.total_length(), 0);
        assert_eq!(info.line_count(), 1);
        assert_eq!(row_col(&info, 0), (0, 0));
        assert!(info.offset_to_location(1).is_none());
    }

    #[test]
    fn test_single_line() {
        let info = FileInformation::new("hello world");
        assert_eq!(info.line_count(), 1);
        assert_eq!(row_col(&info, 0), (0, 0));
        assert_eq!(row_col(&info, 6), (0, 6));
        assert_eq!(row_col(&info, 11), (0, 11));
    }

    #[test]
    fn test_newline_belongs_to_the_row_it_ends() {
        let info = FileInformation::new("line 1\nline 2\nline 3");
        assert_eq!(info.line_breaks(), &[6, 13]);
        assert_eq!(row_col(&info, 6), (0, 6));
        assert_eq!(row_col(&info, 7), (1, 0));
        assert_eq!(row_col(&info, 13), (1, 6));
        assert_eq!(row_col(&info, 14), (2, 0));
        assert_eq!(row_col(&info, 20), (2, 6));
    }

    #[test]
    fn test_consecutive_newlines() {
        let info = FileInformation::new("a\n\n\nb");
        assert_eq!(info.line_count(), 4);
        assert_eq!(row_col(&info, 1), (0, 1));
        assert_eq!(row_col(&info, 2), (1, 0));
        assert_eq!(row_col(&info, 3), (2, 0));
        assert_eq!(row_col(&info, 4), (3, 0));
    }

    #[test]
    fn test_columns_count_bytes() {
        // "café" is 5 bytes; the second row starts at byte 6
        let info = FileInformation::new("café\nwörld");
        assert_eq!(row_col(&info, 5), (0, 5));
        assert_eq!(row_col(&info, 6), (1, 0));
        assert_eq!(row_col(&info, 9), (1, 3));
    }

    #[test]
    fn test_location_to_offset() {
        let info = FileInformation::new("hello\nworld\ntest");
        assert_eq!(info.location_to_offset(0, 0), Some(0));
        assert_eq!(info.location_to_offset(1, 0), Some(6));
        assert_eq!(info.location_to_offset(1, 3), Some(9));
        assert_eq!(info.location_to_offset(2, 4), Some(16));
        assert_eq!(info.location_to_offset(0, 6), None);
        assert_eq!(info.location_to_offset(3, 0), None);
    }

    #[test]
    fn test_offset_location_roundtrip() {
        let content = "first\n\nthird line\nlast";
        let info = FileInformation::new(content);
        for offset in 0..=content.len() {
            let loc = info.offset_to_location(offset).unwrap();
            assert_eq!(info.location_to_offset(loc.row, loc.column), Some(offset));
        }
    }

    #[test]
    fn test_serializes_camel_case() {
        let info = FileInformation::new("a\nb");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json, serde_json::json!({"lineBreaks": [1], "totalLength": 3}));
    }
}
