//! The resolution seam.

use std::collections::HashMap;

use crate::{ActionMetadata, ActionRef};

/// Resolves a `uses:` reference to the action's declared interface.
///
/// Implementations are expected to be slow (network, filesystem); callers
/// go through [`crate::ActionCache`] rather than calling this directly.
pub trait ActionResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> ActionMetadata;
}

/// Resolver with no I/O at all: local references are classified as such,
/// everything remote stays unresolved.
#[derive(Debug, Default)]
pub struct OfflineResolver;

impl ActionResolver for OfflineResolver {
    fn resolve(&self, reference: &str) -> ActionMetadata {
        if ActionRef::parse(reference).is_local() {
            ActionMetadata::local(reference)
        } else {
            ActionMetadata::unresolved(reference)
        }
    }
}

/// Fixture-backed resolver for tests and embedders with pre-fetched data.
#[derive(Debug, Default)]
pub struct StaticResolver {
    entries: HashMap<String, ActionMetadata>,
}

impl StaticResolver {
    pub fn new() -> StaticResolver {
        StaticResolver::default()
    }

    /// Register metadata for a reference.
    pub fn insert(&mut self, metadata: ActionMetadata) {
        self.entries.insert(metadata.reference.clone(), metadata);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, metadata: ActionMetadata) -> StaticResolver {
        self.insert(metadata);
        self
    }
}

impl ActionResolver for StaticResolver {
    fn resolve(&self, reference: &str) -> ActionMetadata {
        self.entries
            .get(reference)
            .cloned()
            .unwrap_or_else(|| ActionMetadata::unresolved(reference))
    }
}
