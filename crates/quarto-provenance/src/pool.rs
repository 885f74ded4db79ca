/*
 * pool.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The provenance pool: an append-only array of provenance records.
//!
//! The pool arrives from the parser in a compact JSON form:
//!
//! ```json
//! {"r": [start, end], "t": 0, "d": 3}                // Direct: d = file id
//! {"r": [start, end], "t": 1, "d": 7}                // Substring: d = parent id
//! {"r": [0, 9], "t": 2, "d": [[4, 0, 5], [6, 5, 4]]} // Concatenation
//! ```
//!
//! The id of a record is its index in the array. A record may only refer to
//! records with smaller ids, which keeps the reference graph acyclic.

use crate::error::{ProvenanceError, Result};
use crate::types::{FileId, SourceId};
use serde_json::{Value, json};
use std::collections::HashMap;

/// One piece of a concatenation: the first `length` bytes of `source`'s text,
/// placed at `offset_in_result` in the assembled text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConcatPiece {
    pub source: SourceId,
    pub offset_in_result: usize,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// `[start, end)` is a byte range of the file's content
    Direct { file_id: FileId },
    /// `[start, end)` is a byte range of the parent's resolved text
    Substring { parent: SourceId },
    /// Ordered pieces; `[start, end)` is the record's own span, `[0, total)`
    Concatenation { pieces: Vec<ConcatPiece> },
}

/// A pooled provenance record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProvenanceRecord {
    pub start: usize,
    pub end: usize,
    pub kind: RecordKind,
}

impl ProvenanceRecord {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    fn variant_tag(&self) -> u64 {
        match self.kind {
            RecordKind::Direct { .. } => 0,
            RecordKind::Substring { .. } => 1,
            RecordKind::Concatenation { .. } => 2,
        }
    }

    fn to_json(&self) -> Value {
        let data = match &self.kind {
            RecordKind::Direct { file_id } => json!(file_id.0),
            RecordKind::Substring { parent } => json!(parent.0),
            RecordKind::Concatenation { pieces } => Value::Array(
                pieces
                    .iter()
                    .map(|p| json!([p.source.0, p.offset_in_result, p.length]))
                    .collect(),
            ),
        };
        json!({"r": [self.start, self.end], "t": self.variant_tag(), "d": data})
    }
}

#[derive(Debug, Clone)]
enum PoolEntry {
    Record(ProvenanceRecord),
    /// Kept so ids stay aligned; the error is reported when the id is used
    Malformed { raw: Value, error: ProvenanceError },
}

/// Append-only pool of provenance records.
///
/// Loading a pool never fails because of a single bad record: each record is
/// decoded and checked up front, and a record that fails is kept in place
/// with its error. Asking for it later through [`record`](Self::record)
/// returns that error, so it reaches the resolver's error handler only if
/// something actually refers to it.
#[derive(Debug, Clone, Default)]
pub struct ProvenancePool {
    entries: Vec<PoolEntry>,
    interned: HashMap<ProvenanceRecord, SourceId>,
}

impl ProvenancePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a pool from its compact JSON form.
    ///
    /// Only a payload that is not an array at all is rejected here.
    pub fn from_json(pool_json: &Value) -> Result<Self> {
        let items = pool_json
            .as_array()
            .ok_or_else(|| ProvenanceError::MalformedPool {
                message: format!("expected an array of records, got {}", describe(pool_json)),
            })?;

        let mut pool = ProvenancePool::new();
        pool.entries.reserve(items.len());
        let mut malformed = 0;
        for (index, item) in items.iter().enumerate() {
            let id = SourceId(index);
            match decode_record(id, item) {
                Ok(record) => {
                    pool.interned.entry(record.clone()).or_insert(id);
                    pool.entries.push(PoolEntry::Record(record));
                }
                Err(error) => {
                    malformed += 1;
                    pool.entries.push(PoolEntry::Malformed {
                        raw: item.clone(),
                        error,
                    });
                }
            }
        }

        tracing::debug!(
            records = pool.len(),
            malformed,
            "Loaded provenance pool"
        );
        Ok(pool)
    }

    /// Serialize back to the compact JSON form. Malformed records are written
    /// out exactly as they were read.
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.entries
                .iter()
                .map(|entry| match entry {
                    PoolEntry::Record(record) => record.to_json(),
                    PoolEntry::Malformed { raw, .. } => raw.clone(),
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The record stored under `id`, or the reason it cannot be used.
    pub fn record(&self, id: SourceId) -> Result<&ProvenanceRecord> {
        match self.entries.get(id.0) {
            Some(PoolEntry::Record(record)) => Ok(record),
            Some(PoolEntry::Malformed { error, .. }) => Err(error.clone()),
            None => Err(ProvenanceError::UnknownId {
                id,
                pool_len: self.entries.len(),
            }),
        }
    }

    /// Every entry in id order
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (SourceId, std::result::Result<&ProvenanceRecord, &ProvenanceError>)>
    {
        self.entries.iter().enumerate().map(|(i, entry)| {
            let record = match entry {
                PoolEntry::Record(record) => Ok(record),
                PoolEntry::Malformed { error, .. } => Err(error),
            };
            (SourceId(i), record)
        })
    }

    /// Append a record pointing into a file.
    pub fn push_direct(&mut self, file_id: FileId, start: usize, end: usize) -> Result<SourceId> {
        self.push(ProvenanceRecord {
            start,
            end,
            kind: RecordKind::Direct { file_id },
        })
    }

    /// Append a record for `[start, end)` of `parent`'s text.
    pub fn push_substring(&mut self, parent: SourceId, start: usize, end: usize) -> Result<SourceId> {
        self.push(ProvenanceRecord {
            start,
            end,
            kind: RecordKind::Substring { parent },
        })
    }

    /// Append a concatenation of `(piece, length)` pairs; offsets are computed.
    pub fn push_concat(&mut self, pieces: &[(SourceId, usize)]) -> Result<SourceId> {
        let mut offset: usize = 0;
        let mut concat = Vec::with_capacity(pieces.len());
        for &(source, length) in pieces {
            concat.push(ConcatPiece {
                source,
                offset_in_result: offset,
                length,
            });
            offset = offset
                .checked_add(length)
                .ok_or_else(|| ProvenanceError::MalformedRecord {
                    id: SourceId(self.entries.len()),
                    message: format!(
                        "piece {} of length {} overflows the concatenation length",
                        source, length
                    ),
                })?;
        }
        self.push(ProvenanceRecord {
            start: 0,
            end: offset,
            kind: RecordKind::Concatenation { pieces: concat },
        })
    }

    fn push(&mut self, record: ProvenanceRecord) -> Result<SourceId> {
        if let Some(&id) = self.interned.get(&record) {
            return Ok(id);
        }
        let id = SourceId(self.entries.len());
        validate_record(id, &record)?;
        if let RecordKind::Substring { parent } = &record.kind {
            self.record(*parent)?;
        }
        if let RecordKind::Concatenation { pieces } = &record.kind {
            for piece in pieces {
                self.record(piece.source)?;
            }
        }
        self.interned.insert(record.clone(), id);
        self.entries.push(PoolEntry::Record(record));
        Ok(id)
    }
}

/// Short name of a JSON value's type for error messages
fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_u64() => "an integer",
        Value::Number(_) => "a non-integer number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn as_index(id: SourceId, value: &Value, what: &str) -> Result<usize> {
    value
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| ProvenanceError::MalformedRecord {
            id,
            message: format!("{} must be a non-negative integer, got {}", what, describe(value)),
        })
}

fn decode_record(id: SourceId, item: &Value) -> Result<ProvenanceRecord> {
    let malformed = |message: String| ProvenanceError::MalformedRecord { id, message };

    if !item.is_object() {
        return Err(malformed(format!("expected an object, got {}", describe(item))));
    }

    let range = item
        .get("r")
        .ok_or_else(|| malformed("missing range \"r\"".to_string()))?;
    let range = range
        .as_array()
        .ok_or_else(|| malformed(format!("range must be an array, got {}", describe(range))))?;
    // [start, end], or the older [start, srow, scol, end, erow, ecol]
    let (start, end) = match range.len() {
        2 => (
            as_index(id, &range[0], "range start")?,
            as_index(id, &range[1], "range end")?,
        ),
        6 => (
            as_index(id, &range[0], "range start")?,
            as_index(id, &range[3], "range end")?,
        ),
        n => return Err(malformed(format!("range must have 2 or 6 entries, got {}", n))),
    };

    let tag = item
        .get("t")
        .ok_or_else(|| malformed("missing variant tag \"t\"".to_string()))?;
    let data = item
        .get("d")
        .ok_or_else(|| malformed("missing data \"d\"".to_string()))?;

    let kind = match tag.as_u64() {
        Some(0) => {
            let file_id = data.as_u64().ok_or_else(|| {
                malformed(format!(
                    "Direct record data must be a file id integer, got {}",
                    describe(data)
                ))
            })?;
            RecordKind::Direct {
                file_id: FileId(file_id as usize),
            }
        }
        Some(1) => {
            let parent = match data {
                Value::Array(pair) if pair.len() == 2 => as_index(id, &pair[0], "parent id")?,
                Value::Array(pair) => {
                    return Err(malformed(format!(
                        "Substring record data must be a parent id or [parent, offset], got {} entries",
                        pair.len()
                    )));
                }
                other => as_index(id, other, "Substring record parent id")?,
            };
            RecordKind::Substring {
                parent: SourceId(parent),
            }
        }
        Some(2) => {
            let items = data.as_array().ok_or_else(|| {
                malformed(format!(
                    "Concatenation record data must be an array of pieces, got {}",
                    describe(data)
                ))
            })?;
            let pieces = items
                .iter()
                .enumerate()
                .map(|(i, piece)| {
                    let triple = piece.as_array().filter(|t| t.len() == 3).ok_or_else(|| {
                        malformed(format!(
                            "piece {} must be [piece_id, offset_in_result, length]",
                            i
                        ))
                    })?;
                    Ok(ConcatPiece {
                        source: SourceId(as_index(id, &triple[0], "piece id")?),
                        offset_in_result: as_index(id, &triple[1], "piece offset")?,
                        length: as_index(id, &triple[2], "piece length")?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            RecordKind::Concatenation { pieces }
        }
        _ => {
            return Err(ProvenanceError::UnknownVariant {
                id,
                tag: tag.to_string(),
            });
        }
    };

    let record = ProvenanceRecord { start, end, kind };
    validate_record(id, &record)?;
    Ok(record)
}

/// Structural checks that do not need to resolve anything
fn validate_record(id: SourceId, record: &ProvenanceRecord) -> Result<()> {
    if record.start > record.end {
        return Err(ProvenanceError::InvalidRange {
            id,
            start: record.start,
            end: record.end,
        });
    }

    match &record.kind {
        RecordKind::Direct { .. } => {}
        RecordKind::Substring { parent } => {
            if parent.0 >= id.0 {
                return Err(ProvenanceError::ForwardReference {
                    id,
                    referenced: *parent,
                });
            }
        }
        RecordKind::Concatenation { pieces } => {
            if pieces.is_empty() {
                return Err(ProvenanceError::EmptyConcatenation { id });
            }
            let mut expected = 0;
            for piece in pieces {
                if piece.source.0 >= id.0 {
                    return Err(ProvenanceError::ForwardReference {
                        id,
                        referenced: piece.source,
                    });
                }
                if piece.offset_in_result != expected {
                    return Err(ProvenanceError::MalformedRecord {
                        id,
                        message: format!(
                            "piece {} is placed at {} but the preceding pieces end at {}",
                            piece.source, piece.offset_in_result, expected
                        ),
                    });
                }
                expected = expected.checked_add(piece.length).ok_or_else(|| {
                    ProvenanceError::MalformedRecord {
                        id,
                        message: format!(
                            "piece {} of length {} overflows the concatenation length",
                            piece.source, piece.length
                        ),
                    }
                })?;
            }
        }
    }
    Ok(())
}
