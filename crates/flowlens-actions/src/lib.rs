//! Metadata for actions referenced via `uses:`.
//!
//! Resolution itself lives behind the [`ActionResolver`] trait so hosts can
//! plug in network or filesystem lookups; this crate ships an offline
//! classifier, a fixture-backed resolver for tests, and a TTL cache that
//! keeps successful lookups for two weeks and failures for ten minutes.

mod metadata;
pub use metadata::{ActionMetadata, ActionRef, ActionStatus};

mod resolver;
pub use resolver::{ActionResolver, OfflineResolver, StaticResolver};

mod cache;
pub use cache::ActionCache;
