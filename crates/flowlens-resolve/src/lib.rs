//! Scope resolution for workflow expressions.
//!
//! Every dotted reference found in an expression-bearing field is checked
//! against a per-namespace rule: how many segments it needs, and which
//! names are visible at each position from the document's [`Context`].
//! Violations become [`Diagnostic`]s carrying concrete [`Fix`]es; the same
//! candidate machinery drives completion.
//!
//! [`Context`]: flowlens_context::Context

mod diagnostic;
pub use diagnostic::{Diagnostic, DiagnosticKind, Fix, Severity};

mod edit_distance;
pub use edit_distance::levenshtein;

mod rules;
pub use rules::{Candidate, Namespace, Rule};

mod resolver;
pub use resolver::{validate, Resolver};

mod complete;
pub use complete::{complete, Category, CompletionItem};
