//! Per-document rebuild debouncing.

use std::collections::HashMap;
use std::sync::Mutex;

use tower_lsp::lsp_types::Url;

/// Generation counters keyed by document URL.
///
/// Each edit bumps the document's counter, superseding every pending rebuild
/// for it. A delayed task holding an older generation checks `is_current`
/// after its sleep and exits without publishing.
#[derive(Default)]
pub struct DebounceMap {
    generations: Mutex<HashMap<Url, u64>>,
}

impl DebounceMap {
    /// Start a new generation for `uri` and return it.
    pub fn bump(&self, uri: &Url) -> u64 {
        let mut generations = self.generations.lock().unwrap_or_else(|e| e.into_inner());
        let counter = generations.entry(uri.clone()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Whether `generation` is still the latest for `uri`.
    pub fn is_current(&self, uri: &Url, generation: u64) -> bool {
        let generations = self.generations.lock().unwrap_or_else(|e| e.into_inner());
        generations.get(uri) == Some(&generation)
    }

    /// Drop the counter for a closed document.
    pub fn forget(&self, uri: &Url) {
        let mut generations = self.generations.lock().unwrap_or_else(|e| e.into_inner());
        generations.remove(uri);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri() -> Url {
        Url::parse("file:///workspace/.github/workflows/ci.yml").unwrap()
    }

    #[test]
    fn test_newer_generation_supersedes() {
        let map = DebounceMap::default();
        let first = map.bump(&uri());
        let second = map.bump(&uri());
        assert!(!map.is_current(&uri(), first));
        assert!(map.is_current(&uri(), second));
    }

    #[test]
    fn test_forget_invalidates_pending() {
        let map = DebounceMap::default();
        let generation = map.bump(&uri());
        map.forget(&uri());
        assert!(!map.is_current(&uri(), generation));
    }

    #[test]
    fn test_documents_are_independent() {
        let map = DebounceMap::default();
        let other = Url::parse("file:///workspace/.github/workflows/release.yml").unwrap();
        let generation = map.bump(&uri());
        map.bump(&other);
        assert!(map.is_current(&uri(), generation));
    }
}
