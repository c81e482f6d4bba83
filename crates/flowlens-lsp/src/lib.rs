//! Flowlens language server
//!
//! LSP server for GitHub Actions workflow files, providing:
//! - Diagnostics (scope resolution over `${{ ... }}` expressions)
//! - Quick fixes (replace/delete edits carried through diagnostic data)
//! - Completions (context namespaces and their members)

mod debounce;
mod server;

pub use server::run;
