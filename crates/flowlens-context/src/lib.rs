//! Symbol indexing for workflow documents.
//!
//! One pass over the normalized element tree collects every referenceable
//! symbol (jobs, steps, inputs, outputs, secrets, env layers, needs edges,
//! shell-assigned outputs) into a [`Context`]. The tree and its context are
//! bundled into an immutable [`Snapshot`] that analyses read without any
//! further locking.

mod context;
pub use context::{ActionUse, Context, Snapshot, Symbol};

mod index;
pub use index::index;

mod shell;
pub use shell::{extract_env_assignments, extract_output_assignments, ShellAssignment};

pub mod builtins;
