//! Scanner for dotted context references in workflow text.
//!
//! Finds candidates like `github.event_name` or `steps.build.outputs.version`
//! in free-form field text (`run:` scripts, `if:` conditions, names) and
//! splits them into segments that carry their own source spans. The scanner
//! deliberately knows nothing about `${{ }}` delimiters or the expression
//! language; anything dotted is reported and scope resolution decides what
//! it means.

mod scanner;
pub use scanner::{scan, PathExpression, PathSegment};
