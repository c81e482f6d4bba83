//! A normalized view of GitHub Actions workflow documents.
//!
//! The raw YAML parse tree is flattened into an arena of [`Element`]s that
//! keep only what the analyses need: keys, scalar text, and byte spans.

mod span;
pub use span::Span;

mod element;
pub use element::{Element, ElementId, ElementTree};

mod normalize;
pub use normalize::parse;
