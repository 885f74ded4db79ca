/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Resolver configuration

use serde::Deserialize;

/// Default limit on how many records a single resolution may pass through
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 1024;

/// Options for a [`Resolver`](crate::Resolver).
///
/// Deserializable so that hosts can read it from their own configuration:
///
/// ```
/// use quarto_provenance::ResolverOptions;
///
/// let options: ResolverOptions = serde_json::from_str(r#"{"max_chain_depth": 64}"#).unwrap();
/// assert_eq!(options.max_chain_depth, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Chains deeper than this fail with
    /// [`ChainTooDeep`](crate::ProvenanceError::ChainTooDeep)
    pub max_chain_depth: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        ResolverOptions {
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let options: ResolverOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ResolverOptions::default());
        assert_eq!(options.max_chain_depth, DEFAULT_MAX_CHAIN_DEPTH);
    }
}
