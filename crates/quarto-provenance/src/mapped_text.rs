/*
 * mapped_text.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Text that remembers where each of its bytes came from

use crate::types::{FileId, MappedOffset};

/// A run of bytes in a [`MappedText`] that maps 1:1 onto a run in one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Start of the run in the text's value
    pub offset: usize,
    pub length: usize,
    pub file_id: FileId,
    /// Start of the run in the file's content
    pub file_offset: usize,
}

impl Segment {
    fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// An immutable string together with the mapping of each byte back to a file.
///
/// However deeply substrings and concatenations were nested to build it, the
/// mapping is kept as a flat list of [`Segment`]s sorted by offset, so
/// [`map`](Self::map) is a binary search. Segments cover the value without
/// gaps. An empty text built from a real location keeps a single zero-length
/// segment as its anchor; [`MappedText::empty`] has none.
///
/// ```
/// use quarto_provenance::{FileId, MappedText};
///
/// let doc = MappedText::from_source(FileId(0), "hello world", 0, 11).unwrap();
/// let world = doc.substring(6, 11).unwrap();
/// assert_eq!(world.value(), "world");
/// assert_eq!(world.map(1).unwrap().offset, 7);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedText {
    value: String,
    segments: Vec<Segment>,
}

impl AsRef<MappedText> for MappedText {
    fn as_ref(&self) -> &MappedText {
        self
    }
}

impl MappedText {
    /// The empty text with no provenance at all. This is also the sentinel
    /// returned by tolerant error handlers.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `content[start..end]` of a file. `None` if the range is out of bounds
    /// or splits a UTF-8 character.
    pub fn from_source(file_id: FileId, content: &str, start: usize, end: usize) -> Option<Self> {
        let value = content.get(start..end)?;
        Some(MappedText {
            value: value.to_string(),
            segments: vec![Segment {
                offset: 0,
                length: value.len(),
                file_id,
                file_offset: start,
            }],
        })
    }

    /// `[start, end)` of this text, keeping the mapping of every byte.
    pub fn substring(&self, start: usize, end: usize) -> Option<Self> {
        let value = self.value.get(start..end)?;

        let mut segments: Vec<Segment> = self
            .segments
            .iter()
            .filter(|seg| seg.offset < end && seg.end() > start)
            .map(|seg| {
                let clip_start = seg.offset.max(start);
                let clip_end = seg.end().min(end);
                Segment {
                    offset: clip_start - start,
                    length: clip_end - clip_start,
                    file_id: seg.file_id,
                    file_offset: seg.file_offset + (clip_start - seg.offset),
                }
            })
            .collect();

        if segments.is_empty() {
            if let Some(anchor) = self.map(start) {
                segments.push(Segment {
                    offset: 0,
                    length: 0,
                    file_id: anchor.file_id,
                    file_offset: anchor.offset,
                });
            }
        }

        Some(MappedText {
            value: value.to_string(),
            segments,
        })
    }

    /// Join texts end to end. Adjacent runs from consecutive file positions
    /// are merged, so concatenating neighbouring slices of a file yields a
    /// contiguous text again.
    pub fn concat<I>(pieces: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<MappedText>,
    {
        let mut value = String::new();
        let mut segments: Vec<Segment> = Vec::new();
        let mut anchor: Option<Segment> = None;

        for piece in pieces {
            let piece = piece.as_ref();
            let shift = value.len();
            value.push_str(&piece.value);

            for seg in &piece.segments {
                if anchor.is_none() {
                    anchor = Some(Segment {
                        offset: 0,
                        length: 0,
                        ..*seg
                    });
                }
                if seg.length == 0 {
                    continue;
                }
                match segments.last_mut() {
                    Some(last)
                        if last.file_id == seg.file_id
                            && last.file_offset + last.length == seg.file_offset =>
                    {
                        last.length += seg.length;
                    }
                    _ => segments.push(Segment {
                        offset: seg.offset + shift,
                        ..*seg
                    }),
                }
            }
        }

        if segments.is_empty() {
            segments.extend(anchor);
        }

        MappedText { value, segments }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Where byte `offset` of the value came from.
    ///
    /// Defined for `0 <= offset <= len`; `len` maps to just past the last
    /// byte. `None` for offsets beyond the end and for texts without
    /// provenance.
    pub fn map(&self, offset: usize) -> Option<MappedOffset> {
        if offset > self.len() {
            return None;
        }
        let index = self.segments.partition_point(|seg| seg.end() <= offset);
        match self.segments.get(index) {
            Some(seg) => Some(MappedOffset {
                file_id: seg.file_id,
                offset: seg.file_offset + (offset - seg.offset),
            }),
            None => self.segments.last().map(|seg| MappedOffset {
                file_id: seg.file_id,
                offset: seg.file_offset + seg.length,
            }),
        }
    }

    /// File positions of the first byte of `[start, end)` and of the position
    /// just past its last byte. Across a concatenation boundary this differs
    /// from `map(end)`, which would land on the next piece.
    pub fn map_range(&self, start: usize, end: usize) -> Option<(MappedOffset, MappedOffset)> {
        if start > end {
            return None;
        }
        let first = self.map(start)?;
        if start == end {
            return Some((first, first));
        }
        let last = self.map(end - 1)?;
        Some((
            first,
            MappedOffset {
                file_id: last.file_id,
                offset: last.offset + 1,
            },
        ))
    }

    /// Files this text draws from, in order of first appearance
    pub fn file_ids(&self) -> Vec<FileId> {
        let mut ids: Vec<FileId> = Vec::new();
        for seg in &self.segments {
            if !ids.contains(&seg.file_id) {
                ids.push(seg.file_id);
            }
        }
        ids
    }

    /// True when the whole text is one unbroken run of a single file.
    pub fn is_contiguous(&self) -> bool {
        self.segments.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "alpha and then some beta";

    fn doc(start: usize, end: usize) -> MappedText {
        MappedText::from_source(FileId(0), DOC, start, end).unwrap()
    }

    #[test]
    fn test_from_source() {
        let text = MappedText::from_source(FileId(0), "hello world", 0, 5).unwrap();
        assert_eq!(text.value(), "hello");
        assert_eq!(
            text.map(2),
            Some(MappedOffset {
                file_id: FileId(0),
                offset: 2
            })
        );
        assert!(MappedText::from_source(FileId(0), "hello", 2, 9).is_none());
        assert!(MappedText::from_source(FileId(0), "é", 0, 1).is_none());
    }

    #[test]
    fn test_map_end_of_text() {
        let text = doc(6, 9);
        assert_eq!(text.map(3).unwrap().offset, 9);
        assert!(text.map(4).is_none());
    }

    #[test]
    fn test_concat_maps_into_each_piece() {
        let text = MappedText::concat([doc(0, 5), doc(20, 24)]);
        assert_eq!(text.value(), "alphabeta");
        assert_eq!(text.map(6).unwrap().offset, 21);
        assert_eq!(text.map(5).unwrap().offset, 20);
        assert_eq!(text.map(4).unwrap().offset, 4);
        assert!(!text.is_contiguous());
    }

    #[test]
    fn test_map_range_across_pieces() {
        let text = MappedText::concat([doc(0, 5), doc(20, 24)]);
        let (start, end) = text.map_range(0, 5).unwrap();
        assert_eq!((start.offset, end.offset), (0, 5));
        let (start, end) = text.map_range(3, 9).unwrap();
        assert_eq!((start.offset, end.offset), (3, 24));
    }

    #[test]
    fn test_adjacent_pieces_merge() {
        let text = MappedText::concat([doc(0, 5), doc(5, 9)]);
        assert_eq!(text.value(), "alpha and");
        assert!(text.is_contiguous());
        assert_eq!(text.segments().len(), 1);
    }

    #[test]
    fn test_substring_of_concat() {
        let text = MappedText::concat([doc(0, 5), doc(20, 24)]);
        let sub = text.substring(3, 7).unwrap();
        assert_eq!(sub.value(), "habe");
        assert_eq!(sub.map(0).unwrap().offset, 3);
        assert_eq!(sub.map(2).unwrap().offset, 20);
        assert_eq!(sub.segments().len(), 2);
    }

    #[test]
    fn test_empty_texts_keep_an_anchor() {
        let empty = doc(7, 7);
        assert!(empty.is_empty());
        assert_eq!(empty.map(0).unwrap().offset, 7);

        let sub = doc(0, 9).substring(4, 4).unwrap();
        assert_eq!(sub.map(0).unwrap().offset, 4);

        let joined = MappedText::concat([doc(3, 3), doc(12, 12)]);
        assert_eq!(joined.map(0).unwrap().offset, 3);
    }

    #[test]
    fn test_sentinel_has_no_mapping() {
        let empty = MappedText::empty();
        assert!(empty.map(0).is_none());
        assert!(empty.file_ids().is_empty());
        assert_eq!(MappedText::concat(Vec::<MappedText>::new()), empty);
    }

    #[test]
    fn test_file_ids() {
        let other = MappedText::from_source(FileId(4), "title: x", 7, 8).unwrap();
        let text = MappedText::concat([&doc(0, 5), &other, &doc(6, 9)]);
        assert_eq!(text.file_ids(), vec![FileId(0), FileId(4)]);
    }

    #[test]
    fn test_substring_respects_char_boundaries() {
        let text = MappedText::from_source(FileId(0), "café au lait", 0, 13).unwrap();
        assert!(text.substring(0, 4).is_none());
        assert_eq!(text.substring(0, 5).unwrap().value(), "café");
    }
}
