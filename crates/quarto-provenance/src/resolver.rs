/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Resolution of pool ids to texts and file locations

use crate::error::{ProvenanceError, Result};
use crate::handler::{ErrorHandler, FailFast, Recovery};
use crate::mapped_text::MappedText;
use crate::options::ResolverOptions;
use crate::pool::{ProvenancePool, ProvenanceRecord, RecordKind};
use crate::registry::FileRegistry;
use crate::types::{FileId, LineColumn, ResolvedLocation, SourceId, SourceLocation, SourceRange};
use std::collections::HashMap;
use std::sync::Arc;

static FAIL_FAST: FailFast = FailFast;

#[derive(Debug, Clone, Copy)]
struct CachedLocation {
    location: ResolvedLocation,
    /// The record's text is exactly `location`'s bytes of the file, so a
    /// substring of it can be located by offset arithmetic.
    contiguous: bool,
}

/// Walks a [`ProvenancePool`] to answer text and location queries.
///
/// A resolver memoizes every successful answer for the lifetime of the
/// instance. It borrows the pool and registry, which are never mutated, so
/// any number of resolvers can work against the same pair at once; the
/// resolver itself is meant for one unit of work (one conversion pass, one
/// diagnostics request) and is not shared between threads.
///
/// Failures go to the [`ErrorHandler`] once per public call and are never
/// cached. With the default [`FailFast`] handler they come back as `Err`;
/// a tolerant handler turns them into sentinels ([`MappedText::empty`],
/// [`ResolvedLocation::SENTINEL`]).
pub struct Resolver<'a> {
    pool: &'a ProvenancePool,
    registry: &'a FileRegistry,
    handler: &'a dyn ErrorHandler,
    options: ResolverOptions,
    texts: Vec<Option<Arc<MappedText>>>,
    locations: Vec<Option<CachedLocation>>,
    files: HashMap<FileId, Arc<MappedText>>,
    empty: Arc<MappedText>,
}

impl<'a> Resolver<'a> {
    pub fn new(pool: &'a ProvenancePool, registry: &'a FileRegistry) -> Self {
        Resolver {
            pool,
            registry,
            handler: &FAIL_FAST,
            options: ResolverOptions::default(),
            texts: vec![None; pool.len()],
            locations: vec![None; pool.len()],
            files: HashMap::new(),
            empty: Arc::new(MappedText::empty()),
        }
    }

    pub fn with_handler(mut self, handler: &'a dyn ErrorHandler) -> Self {
        self.handler = handler;
        self
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn pool(&self) -> &'a ProvenancePool {
        self.pool
    }

    pub fn registry(&self) -> &'a FileRegistry {
        self.registry
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// The file span `id` covers.
    ///
    /// Direct and Substring chains are resolved by offset arithmetic without
    /// building any text. A concatenation's first and last bytes must come
    /// from the same file, and its span covers every run of that file it was
    /// assembled from, in whatever order the pieces were joined.
    pub fn resolve_location(&mut self, id: SourceId) -> Result<ResolvedLocation> {
        match self.location_at(id, 0) {
            Ok(cached) => Ok(cached.location),
            Err(error) => self.recover(error, ResolvedLocation::SENTINEL),
        }
    }

    /// The text of `id`, with the mapping of each byte back to its file.
    pub fn resolve_text(&mut self, id: SourceId) -> Result<Arc<MappedText>> {
        match self.text_at(id, 0) {
            Ok(text) => Ok(text),
            Err(error) => {
                let empty = self.empty.clone();
                self.recover(error, empty)
            }
        }
    }

    /// The whole content of a registered file.
    pub fn file_text(&mut self, file_id: FileId) -> Result<Arc<MappedText>> {
        match self.file_text_inner(file_id) {
            Ok(text) => Ok(text),
            Err(error) => {
                let empty = self.empty.clone();
                self.recover(error, empty)
            }
        }
    }

    /// `path:line:column` of the start of `id`, for diagnostics.
    pub fn source_location(&mut self, id: SourceId) -> Result<SourceLocation> {
        let location = self.resolve_location(id)?;
        if location.is_sentinel() {
            return Ok(SourceLocation::unknown());
        }
        match self.registry.source_location(location.file_id, location.start) {
            Some(display) => Ok(display),
            None => self.recover(
                ProvenanceError::FileNotRegistered {
                    file_id: location.file_id,
                },
                SourceLocation::unknown(),
            ),
        }
    }

    /// File path plus 1-based start and end positions of `id`.
    pub fn source_range(&mut self, id: SourceId) -> Result<SourceRange> {
        let location = self.resolve_location(id)?;
        if location.is_sentinel() {
            return Ok(SourceRange::unknown());
        }
        let registry = self.registry;
        let range = registry.get(location.file_id).and_then(|file| {
            let start = file.file_info().offset_to_location(location.start)?;
            let end = file.file_info().offset_to_location(location.end)?;
            Some(SourceRange {
                file_path: file.path().to_string(),
                start: LineColumn::from_location(start),
                end: LineColumn::from_location(end),
            })
        });
        match range {
            Some(range) => Ok(range),
            None => self.recover(
                ProvenanceError::FileNotRegistered {
                    file_id: location.file_id,
                },
                SourceRange::unknown(),
            ),
        }
    }

    fn recover<T>(&self, error: ProvenanceError, sentinel: T) -> Result<T> {
        match self.handler.handle(&error) {
            Recovery::Abort => Err(error),
            Recovery::UseSentinel => Ok(sentinel),
        }
    }

    fn check_depth(&self, id: SourceId, depth: usize) -> Result<()> {
        if depth > self.options.max_chain_depth {
            return Err(ProvenanceError::ChainTooDeep {
                id,
                max_depth: self.options.max_chain_depth,
            });
        }
        Ok(())
    }

    fn file_text_inner(&mut self, file_id: FileId) -> Result<Arc<MappedText>> {
        if let Some(text) = self.files.get(&file_id) {
            return Ok(text.clone());
        }
        let registry = self.registry;
        let content = registry
            .content(file_id)
            .ok_or(ProvenanceError::FileNotRegistered { file_id })?;
        let text = MappedText::from_source(file_id, content, 0, content.len())
            .map(Arc::new)
            .ok_or(ProvenanceError::FileNotRegistered { file_id })?;
        self.files.insert(file_id, text.clone());
        Ok(text)
    }

    /// Content of the file a Direct record points to, with the range checked
    fn direct_content(
        &self,
        id: SourceId,
        file_id: FileId,
        start: usize,
        end: usize,
    ) -> Result<&'a str> {
        let registry = self.registry;
        let content = registry
            .content(file_id)
            .ok_or(ProvenanceError::UnknownFile { id, file_id })?;
        if end > content.len() {
            return Err(ProvenanceError::FileRangeOutOfBounds {
                id,
                file_id,
                start,
                end,
                file_len: content.len(),
            });
        }
        check_boundaries(id, content, start, end)?;
        Ok(content)
    }

    fn text_at(&mut self, id: SourceId, depth: usize) -> Result<Arc<MappedText>> {
        self.check_depth(id, depth)?;
        if let Some(Some(text)) = self.texts.get(id.0) {
            return Ok(text.clone());
        }

        let pool = self.pool;
        let record = pool.record(id)?;
        tracing::trace!(id = id.0, "Resolving provenance text");

        let text = match &record.kind {
            RecordKind::Direct { file_id } => {
                let content = self.direct_content(id, *file_id, record.start, record.end)?;
                MappedText::from_source(*file_id, content, record.start, record.end)
                    .ok_or_else(|| boundary_error(id, content, record.start, record.end))?
            }
            RecordKind::Substring { parent } => {
                let parent_text = self.text_at(*parent, depth + 1)?;
                substring_of(id, record, &parent_text)?
            }
            RecordKind::Concatenation { pieces } => {
                if pieces.is_empty() {
                    return Err(ProvenanceError::EmptyConcatenation { id });
                }
                let mut parts = Vec::with_capacity(pieces.len());
                for piece in pieces {
                    let piece_text = self.text_at(piece.source, depth + 1)?;
                    if piece.length > piece_text.len() {
                        return Err(ProvenanceError::PieceOutOfBounds {
                            id,
                            piece: piece.source,
                            length: piece.length,
                            available: piece_text.len(),
                        });
                    }
                    let part = piece_text.substring(0, piece.length).ok_or(
                        ProvenanceError::NotCharBoundary {
                            id,
                            offset: piece.offset_in_result + piece.length,
                        },
                    )?;
                    parts.push(part);
                }
                MappedText::concat(parts)
            }
        };

        let text = Arc::new(text);
        if let Some(slot) = self.texts.get_mut(id.0) {
            *slot = Some(text.clone());
        }
        Ok(text)
    }

    fn location_at(&mut self, id: SourceId, depth: usize) -> Result<CachedLocation> {
        self.check_depth(id, depth)?;
        if let Some(Some(cached)) = self.locations.get(id.0) {
            return Ok(*cached);
        }

        let pool = self.pool;
        let record = pool.record(id)?;
        tracing::trace!(id = id.0, "Resolving provenance location");

        let cached = match &record.kind {
            RecordKind::Direct { file_id } => {
                self.direct_content(id, *file_id, record.start, record.end)?;
                CachedLocation {
                    location: ResolvedLocation {
                        file_id: *file_id,
                        start: record.start,
                        end: record.end,
                    },
                    contiguous: true,
                }
            }
            RecordKind::Substring { parent } => {
                let parent_location = self.location_at(*parent, depth + 1)?;
                if parent_location.contiguous {
                    let parent = parent_location.location;
                    if record.end > parent.len() {
                        return Err(ProvenanceError::SubstringOutOfBounds {
                            id,
                            start: record.start,
                            end: record.end,
                            parent_len: parent.len(),
                        });
                    }
                    let start = parent.start + record.start;
                    let end = parent.start + record.end;
                    let registry = self.registry;
                    if let Some(content) = registry.content(parent.file_id) {
                        check_boundaries(id, content, start, end)?;
                    }
                    CachedLocation {
                        location: ResolvedLocation {
                            file_id: parent.file_id,
                            start,
                            end,
                        },
                        contiguous: true,
                    }
                } else {
                    // The parent is assembled from pieces: go through its text
                    let text = self.text_at(id, depth)?;
                    locate_text(id, &text)?
                }
            }
            RecordKind::Concatenation { .. } => {
                let text = self.text_at(id, depth)?;
                locate_text(id, &text)?
            }
        };

        if let Some(slot) = self.locations.get_mut(id.0) {
            *slot = Some(cached);
        }
        Ok(cached)
    }
}

fn check_boundaries(id: SourceId, content: &str, start: usize, end: usize) -> Result<()> {
    if content.is_char_boundary(start) && content.is_char_boundary(end) {
        Ok(())
    } else {
        Err(boundary_error(id, content, start, end))
    }
}

fn boundary_error(id: SourceId, content: &str, start: usize, end: usize) -> ProvenanceError {
    let offset = if content.is_char_boundary(start) {
        end
    } else {
        start
    };
    ProvenanceError::NotCharBoundary { id, offset }
}

fn substring_of(id: SourceId, record: &ProvenanceRecord, parent: &MappedText) -> Result<MappedText> {
    if record.end > parent.len() {
        return Err(ProvenanceError::SubstringOutOfBounds {
            id,
            start: record.start,
            end: record.end,
            parent_len: parent.len(),
        });
    }
    parent
        .substring(record.start, record.end)
        .ok_or_else(|| boundary_error(id, parent.value(), record.start, record.end))
}

/// Span of an assembled text in its file: from the lowest start to the
/// highest end of the runs it was assembled from, whatever their order in
/// the text.
fn locate_text(id: SourceId, text: &MappedText) -> Result<CachedLocation> {
    let (first, last) =
        text.map_range(0, text.len())
            .ok_or_else(|| ProvenanceError::MalformedRecord {
                id,
                message: "resolved text has no file provenance".to_string(),
            })?;
    if first.file_id != last.file_id {
        return Err(ProvenanceError::CrossFileConcatenation {
            id,
            first: first.file_id,
            last: last.file_id,
        });
    }
    let (start, end) = text
        .segments()
        .iter()
        .filter(|seg| seg.file_id == first.file_id)
        .fold((first.offset, first.offset), |(start, end), seg| {
            (
                start.min(seg.file_offset),
                end.max(seg.file_offset + seg.length),
            )
        });
    Ok(CachedLocation {
        location: ResolvedLocation {
            file_id: first.file_id,
            start,
            end,
        },
        contiguous: text.is_contiguous() && !text.segments().is_empty(),
    })
}
