/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Provenance tracking for Quarto
//!
//! Text that reaches a validator or a diagnostic has usually been sliced and
//! reassembled several times since it was read from disk. This crate maps any
//! byte of such text back to the file and offset it came from.
//!
//! # Overview
//!
//! - [`FileRegistry`]: source files by [`FileId`], with a precomputed line index
//! - [`ProvenancePool`]: the parser's append-only array of Direct, Substring and
//!   Concatenation records, referenced by [`SourceId`]
//! - [`MappedText`]: a string plus the mapping of each byte back to a file
//! - [`Resolver`]: memoized resolution of pool ids to [`MappedText`]s and
//!   [`ResolvedLocation`]s, reporting failures through an [`ErrorHandler`]
//!
//! # Example
//!
//! ```rust
//! use quarto_provenance::*;
//!
//! let mut registry = FileRegistry::new();
//! let doc = registry.add_file("doc.qmd", "hello world");
//!
//! let mut pool = ProvenancePool::new();
//! let hello = pool.push_direct(doc, 0, 5).unwrap();
//! let world = pool.push_direct(doc, 6, 11).unwrap();
//! let joined = pool.push_concat(&[(world, 5), (hello, 5)]).unwrap();
//!
//! let mut resolver = Resolver::new(&pool, &registry);
//! let text = resolver.resolve_text(joined).unwrap();
//! assert_eq!(text.value(), "worldhello");
//! assert_eq!(text.map(5).unwrap().offset, 0);
//!
//! let location = resolver.resolve_location(joined).unwrap();
//! assert_eq!((location.start, location.end), (0, 11));
//! ```

pub mod error;
pub mod file_info;
pub mod handler;
pub mod mapped_text;
pub mod options;
pub mod pool;
pub mod registry;
pub mod resolver;
pub mod types;

// Re-export main types
pub use error::{ErrorCategory, ProvenanceError, Result};
pub use file_info::FileInformation;
pub use handler::{CollectingHandler, ErrorHandler, FailFast, LogAndRecover, Recovery};
pub use mapped_text::{MappedText, Segment};
pub use options::ResolverOptions;
pub use pool::{ConcatPiece, ProvenancePool, ProvenanceRecord, RecordKind};
pub use registry::{FileEntry, FileRegistry};
pub use resolver::Resolver;
pub use types::{
    FileId, LineColumn, Location, MappedOffset, ResolvedLocation, SourceId, SourceLocation,
    SourceRange,
};
