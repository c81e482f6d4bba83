//! TTL cache in front of an [`ActionResolver`].

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::{ActionMetadata, ActionResolver, ActionStatus};

/// Successful lookups rarely change; failures get retried soon.
const SUCCESS_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);
const FAILURE_TTL: Duration = Duration::from_secs(10 * 60);

struct CacheEntry {
    metadata: ActionMetadata,
    expires_at: Instant,
}

/// Caching wrapper around a resolver.
///
/// Interior mutability so one cache can be shared across documents; every
/// accessor takes `&self`.
pub struct ActionCache {
    resolver: Box<dyn ActionResolver>,
    entries: Mutex<HashMap<String, CacheEntry>>,
    success_ttl: Duration,
    failure_ttl: Duration,
}

impl ActionCache {
    pub fn new(resolver: Box<dyn ActionResolver>) -> ActionCache {
        ActionCache::with_ttls(resolver, SUCCESS_TTL, FAILURE_TTL)
    }

    /// Cache with explicit expiries, for tests.
    pub fn with_ttls(
        resolver: Box<dyn ActionResolver>,
        success_ttl: Duration,
        failure_ttl: Duration,
    ) -> ActionCache {
        ActionCache {
            resolver,
            entries: Mutex::new(HashMap::new()),
            success_ttl,
            failure_ttl,
        }
    }

    /// Resolve through the cache.
    pub fn get(&self, reference: &str) -> ActionMetadata {
        let now = Instant::now();
        {
            let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = entries.get(reference) {
                if entry.expires_at > now {
                    return entry.metadata.clone();
                }
            }
        }
        self.refresh(reference, now)
    }

    /// Drop the cached entry so the next [`get`](Self::get) re-resolves.
    pub fn invalidate(&self, reference: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(reference);
    }

    /// Re-resolve every reference and report the ones whose metadata
    /// changed, so the caller can re-validate affected documents.
    pub fn resolve_batch(&self, references: &[String]) -> Vec<String> {
        let now = Instant::now();
        let mut changed = Vec::new();
        for reference in references {
            let previous = {
                let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
                entries.get(reference).map(|e| e.metadata.clone())
            };
            let fresh = self.refresh(reference, now);
            if previous.as_ref() != Some(&fresh) {
                changed.push(reference.clone());
            }
        }
        debug!(total = references.len(), changed = changed.len(), "batch resolve");
        changed
    }

    fn refresh(&self, reference: &str, now: Instant) -> ActionMetadata {
        let metadata = self.resolver.resolve(reference);
        let ttl = match metadata.status {
            ActionStatus::Unresolved => self.failure_ttl,
            ActionStatus::Resolved | ActionStatus::Local => self.success_ttl,
        };
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            reference.to_string(),
            CacheEntry {
                metadata: metadata.clone(),
                expires_at: now + ttl,
            },
        );
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts lookups and serves from a table shared with the test body.
    struct CountingResolver {
        calls: Arc<AtomicUsize>,
        table: Arc<Mutex<HashMap<String, ActionMetadata>>>,
    }

    impl ActionResolver for CountingResolver {
        fn resolve(&self, reference: &str) -> ActionMetadata {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.table
                .lock()
                .unwrap()
                .get(reference)
                .cloned()
                .unwrap_or_else(|| ActionMetadata::unresolved(reference))
        }
    }

    type Fixture = (
        Arc<AtomicUsize>,
        Arc<Mutex<HashMap<String, ActionMetadata>>>,
        Box<CountingResolver>,
    );

    fn counting() -> Fixture {
        let calls = Arc::new(AtomicUsize::new(0));
        let table = Arc::new(Mutex::new(HashMap::new()));
        let resolver = Box::new(CountingResolver {
            calls: calls.clone(),
            table: table.clone(),
        });
        (calls, table, resolver)
    }

    #[test]
    fn test_hit_within_ttl() {
        let (calls, _, resolver) = counting();
        let cache = ActionCache::with_ttls(
            resolver,
            Duration::from_secs(60),
            Duration::from_secs(60),
        );
        cache.get("a/b@v1");
        cache.get("a/b@v1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalidate_forces_refresh() {
        let (calls, _, resolver) = counting();
        let cache = ActionCache::new(resolver);
        cache.get("a/b@v1");
        cache.invalidate("a/b@v1");
        cache.get("a/b@v1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failure_expires_quickly() {
        let (calls, _, resolver) = counting();
        let cache = ActionCache::with_ttls(
            resolver,
            Duration::from_secs(60),
            Duration::from_millis(5),
        );
        cache.get("a/b@v1");
        std::thread::sleep(Duration::from_millis(20));
        cache.get("a/b@v1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_batch_reports_changes() {
        let (_, table, resolver) = counting();
        let cache = ActionCache::new(resolver);
        let refs = vec!["a/b@v1".to_string()];

        // first pass: nothing cached yet, so the entry counts as changed
        assert_eq!(cache.resolve_batch(&refs), refs);
        // second pass: same unresolved answer, nothing changed
        assert!(cache.resolve_batch(&refs).is_empty());

        // the fixture now resolves, so the batch reports the flip
        table.lock().unwrap().insert(
            "a/b@v1".to_string(),
            ActionMetadata::from_action_source("a/b@v1", "outputs:\n  x:\n    description: out\n"),
        );
        assert_eq!(cache.resolve_batch(&refs), refs);
    }
}
