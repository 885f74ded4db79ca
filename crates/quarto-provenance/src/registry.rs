/*
 * registry.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! File registry: the terminal target of every provenance chain

use crate::error::{ProvenanceError, Result};
use crate::file_info::FileInformation;
use crate::types::{FileId, LineColumn, Location, SourceLocation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A registered file: its path, full content and line index
#[derive(Debug, Clone)]
pub struct FileEntry {
    id: FileId,
    path: String,
    content: String,
    file_info: FileInformation,
}

impl FileEntry {
    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn file_info(&self) -> &FileInformation {
        &self.file_info
    }
}

/// Registry of source files keyed by [`FileId`].
///
/// Content is mandatory and the line index is computed at registration, so
/// a fully built registry answers every lookup without I/O or mutation and
/// can be shared read-only (for example behind an `Arc`) by any number of
/// resolvers. When a document changes, build a new registry rather than
/// editing this one.
#[derive(Debug, Clone, Default)]
pub struct FileRegistry {
    files: Vec<FileEntry>,
    /// Maps FileId.0 -> index in `files`
    index: HashMap<usize, usize>,
}

/// File entry as it arrives from the producer
#[derive(Debug, Deserialize)]
struct FileEntryJson {
    #[serde(default)]
    id: Option<usize>,
    #[serde(alias = "name")]
    path: String,
    #[serde(default)]
    content: Option<String>,
}

/// Line index of one file, as exported to consumers that only do location math
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileIndexJson<'a> {
    path: &'a str,
    line_breaks: &'a [usize],
    total_length: usize,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file under an explicit id.
    ///
    /// Fails immediately if `content` is `None` or the id is taken; the line
    /// index is built here, never lazily.
    pub fn register(
        &mut self,
        id: FileId,
        path: impl Into<String>,
        content: Option<String>,
    ) -> Result<FileId> {
        let path = path.into();
        self.check_free(id)?;
        let content = content.ok_or_else(|| ProvenanceError::MissingContent {
            file_id: id,
            path: path.clone(),
        })?;
        self.insert(id, path, content);
        Ok(id)
    }

    /// Register a file under the id after the highest one in use, or under
    /// the lowest free id once that would reach [`FileId::INVALID`].
    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<String>) -> FileId {
        let next = self
            .files
            .iter()
            .map(|f| f.id.0)
            .max()
            .map_or(Some(0), |max| max.checked_add(1))
            .map(FileId)
            .filter(|id| self.check_free(*id).is_ok());
        let id = next.unwrap_or_else(|| {
            FileId((0..).find(|n| !self.index.contains_key(n)).unwrap_or(0))
        });
        self.insert(id, path.into(), content.into());
        id
    }

    fn check_free(&self, id: FileId) -> Result<()> {
        if !id.is_valid() {
            return Err(ProvenanceError::ReservedFileId { file_id: id });
        }
        if self.index.contains_key(&id.0) {
            return Err(ProvenanceError::DuplicateFile { file_id: id });
        }
        Ok(())
    }

    fn insert(&mut self, id: FileId, path: String, content: String) {
        let file_info = FileInformation::new(&content);
        self.index.insert(id.0, self.files.len());
        self.files.push(FileEntry {
            id,
            path,
            content,
            file_info,
        });
    }

    /// Build a registry from the producer's `[{id, path, content}, ...]` payload.
    ///
    /// `id` defaults to the entry's position and `name` is accepted in place of
    /// `path`. A missing or null `content` fails with
    /// [`ProvenanceError::MissingContent`].
    pub fn from_json(payload: &Value) -> Result<Self> {
        let entries = payload
            .as_array()
            .ok_or_else(|| ProvenanceError::MalformedRegistry {
                message: "expected an array of file entries".to_string(),
            })?;

        let mut registry = FileRegistry::new();
        for (position, entry) in entries.iter().enumerate() {
            let parsed = FileEntryJson::deserialize(entry).map_err(|e| {
                ProvenanceError::MalformedRegistry {
                    message: format!("file entry {}: {}", position, e),
                }
            })?;
            let id = FileId(parsed.id.unwrap_or(position));
            registry.register(id, parsed.path, parsed.content)?;
        }

        tracing::debug!(files = registry.len(), "Loaded file registry");
        Ok(registry)
    }

    /// Export each file's path and line index (no content).
    pub fn to_index_json(&self) -> Value {
        let files: Vec<FileIndexJson<'_>> = self
            .files
            .iter()
            .map(|f| FileIndexJson {
                path: &f.path,
                line_breaks: f.file_info.line_breaks(),
                total_length: f.file_info.total_length(),
            })
            .collect();
        serde_json::to_value(files).unwrap_or(Value::Null)
    }

    pub fn get(&self, id: FileId) -> Option<&FileEntry> {
        self.index.get(&id.0).and_then(|&i| self.files.get(i))
    }

    pub fn path(&self, id: FileId) -> Option<&str> {
        self.get(id).map(FileEntry::path)
    }

    pub fn content(&self, id: FileId) -> Option<&str> {
        self.get(id).map(FileEntry::content)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files in registration order
    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.iter()
    }

    /// 0-based row and byte column of `offset` in a file.
    pub fn offset_to_location(&self, id: FileId, offset: usize) -> Option<Location> {
        self.get(id)?.file_info.offset_to_location(offset)
    }

    /// Inverse of [`offset_to_location`](Self::offset_to_location).
    pub fn location_to_offset(&self, id: FileId, row: usize, column: usize) -> Option<usize> {
        self.get(id)?.file_info.location_to_offset(row, column)
    }

    /// `path:line:column` (1-based) of `offset` in a file.
    pub fn source_location(&self, id: FileId, offset: usize) -> Option<SourceLocation> {
        let entry = self.get(id)?;
        let lc = LineColumn::from_location(entry.file_info.offset_to_location(offset)?);
        Some(SourceLocation {
            file_path: entry.path.clone(),
            line: lc.line,
            column: lc.column,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_and_get() {
        let mut registry = FileRegistry::new();
        let id = registry
            .register(FileId(0), "doc.qmd", Some("# Hello".to_string()))
            .unwrap();

        let file = registry.get(id).unwrap();
        assert_eq!(file.path(), "doc.qmd");
        assert_eq!(file.content(), "# Hello");
        assert_eq!(file.file_info().total_length(), 7);
    }

    #[test]
    fn test_missing_content_fails_at_registration() {
        let mut registry = FileRegistry::new();
        let err = registry
            .register(FileId(0), "doc.qmd", None)
            .unwrap_err();
        assert_eq!(
            err,
            ProvenanceError::MissingContent {
                file_id: FileId(0),
                path: "doc.qmd".to_string()
            }
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let mut registry = FileRegistry::new();
        registry
            .register(FileId(3), "a.qmd", Some("a".to_string()))
            .unwrap();
        let err = registry
            .register(FileId(3), "b.qmd", Some("b".to_string()))
            .unwrap_err();
        assert_eq!(err, ProvenanceError::DuplicateFile { file_id: FileId(3) });
    }

    #[test]
    fn test_invalid_id_is_reserved() {
        let mut registry = FileRegistry::new();
        let err = registry
            .register(FileId::INVALID, "a.qmd", Some("a".to_string()))
            .unwrap_err();
        assert_eq!(
            err,
            ProvenanceError::ReservedFileId {
                file_id: FileId::INVALID
            }
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_add_file_never_hands_out_the_invalid_id() {
        let mut registry = FileRegistry::new();
        registry
            .register(FileId(usize::MAX - 1), "last.qmd", Some("last".to_string()))
            .unwrap();
        let first = registry.add_file("a.qmd", "a");
        let second = registry.add_file("b.qmd", "b");
        assert_eq!(first, FileId(0));
        assert_eq!(second, FileId(1));
        assert_eq!(registry.content(second), Some("b"));
        assert!(registry.get(FileId::INVALID).is_none());
    }

    #[test]
    fn test_sparse_ids() {
        let mut registry = FileRegistry::new();
        registry
            .register(FileId(1000), "main.qmd", Some("main".to_string()))
            .unwrap();
        let next = registry.add_file("_quarto.yml", "title: x");
        assert_eq!(next, FileId(1001));
        assert_eq!(registry.content(FileId(1000)), Some("main"));
        assert_eq!(registry.content(next), Some("title: x"));
        assert!(registry.get(FileId(0)).is_none());
    }

    #[test]
    fn test_from_json() {
        let payload = json!([
            {"id": 0, "path": "doc.qmd", "content": "hello\nworld"},
            {"name": "other.yml", "content": "a: 1"}
        ]);
        let registry = FileRegistry::from_json(&payload).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.path(FileId(1)), Some("other.yml"));

        let loc = registry.offset_to_location(FileId(0), 8).unwrap();
        assert_eq!((loc.row, loc.column), (1, 2));
    }

    #[test]
    fn test_from_json_requires_content() {
        let payload = json!([{"id": 0, "path": "doc.qmd", "content": null}]);
        let err = FileRegistry::from_json(&payload).unwrap_err();
        assert!(matches!(err, ProvenanceError::MissingContent { .. }));
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        let err = FileRegistry::from_json(&json!({"files": []})).unwrap_err();
        assert!(matches!(err, ProvenanceError::MalformedRegistry { .. }));
    }

    #[test]
    fn test_source_location_is_one_based() {
        let mut registry = FileRegistry::new();
        let id = registry.add_file("doc.qmd", "title\nbody text");
        let loc = registry.source_location(id, 8).unwrap();
        assert_eq!(loc.to_string(), "doc.qmd:2:3");
        assert_eq!(registry.location_to_offset(id, 1, 2), Some(8));
    }

    #[test]
    fn test_index_json_has_no_content() {
        let mut registry = FileRegistry::new();
        registry.add_file("doc.qmd", "a\nb");
        assert_eq!(
            registry.to_index_json(),
            json!([{"path": "doc.qmd", "lineBreaks": [1], "totalLength": 3}])
        );
    }
}
