/*
 * handler.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Pluggable handling of resolution failures

use crate::error::ProvenanceError;
use std::cell::RefCell;

/// What the resolver should do after reporting an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Return the error to the caller
    Abort,
    /// Return an empty text or an invalid location and carry on
    UseSentinel,
}

/// Receives every resolution failure, once per failing query.
pub trait ErrorHandler {
    fn handle(&self, error: &ProvenanceError) -> Recovery;
}

/// Default handler: every error aborts the query.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailFast;

impl ErrorHandler for FailFast {
    fn handle(&self, _error: &ProvenanceError) -> Recovery {
        Recovery::Abort
    }
}

/// Logs each error as a warning and recovers with a sentinel.
///
/// Meant for editor tooling, where one corrupt node should not abort a pass
/// over the whole document.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAndRecover;

impl ErrorHandler for LogAndRecover {
    fn handle(&self, error: &ProvenanceError) -> Recovery {
        tracing::warn!(id = ?error.id(), error = %error, "Provenance resolution failed");
        Recovery::UseSentinel
    }
}

/// Records every error and recovers with a sentinel.
///
/// Drain it after a pass to report all problems at once.
#[derive(Debug, Default)]
pub struct CollectingHandler {
    errors: RefCell<Vec<ProvenanceError>>,
}

impl CollectingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors seen so far, oldest first
    pub fn errors(&self) -> Vec<ProvenanceError> {
        self.errors.borrow().clone()
    }

    pub fn take_errors(&self) -> Vec<ProvenanceError> {
        self.errors.take()
    }

    pub fn len(&self) -> usize {
        self.errors.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.borrow().is_empty()
    }
}

impl ErrorHandler for CollectingHandler {
    fn handle(&self, error: &ProvenanceError) -> Recovery {
        self.errors.borrow_mut().push(error.clone());
        Recovery::UseSentinel
    }
}
