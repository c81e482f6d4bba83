//! Diagnostics and quick fixes.

use ariadne::{Color, Label, Report, ReportKind, Source};
use flowlens_tree::Span;

/// How loud a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    /// A hint-level finding, for things that may exist only at runtime.
    WeakWarning,
    Info,
}

/// The taxonomy of findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Too few segments for the namespace.
    StructuralIncomplete,
    /// Too many segments; the suffix is meaningless.
    StructuralOverflow,
    /// A segment names nothing visible at its position.
    UndefinedReference,
    /// The namespace is valid here but has no members at all.
    EmptyScope,
    /// The namespace may not be used in this field.
    ForbiddenContext,
    /// A `uses:` reference whose metadata could not be fetched.
    UnresolvedAction,
    /// A declaration nothing ever reads.
    UnusedDeclaration,
}

/// A concrete text edit offered alongside a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fix {
    pub label: String,
    pub range: Span,
    pub replacement: String,
}

/// One finding over a source range.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub range: Span,
    pub message: String,
    pub fixes: Vec<Fix>,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        severity: Severity,
        range: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            range,
            message: message.into(),
            fixes: Vec::new(),
        }
    }

    pub fn with_fixes(mut self, fixes: Vec<Fix>) -> Self {
        self.fixes = fixes;
        self
    }

    /// Render this diagnostic with ariadne.
    ///
    /// Returns a string containing the formatted message with source context.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let range = self.range.start as usize..self.range.end as usize;
        let (kind, color) = match self.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning | Severity::WeakWarning => (ReportKind::Warning, Color::Yellow),
            Severity::Info => (ReportKind::Advice, Color::Blue),
        };
        let mut report = Report::build(kind, (filename, range.clone()))
            .with_message(&self.message)
            .with_label(
                Label::new((filename, range))
                    .with_message(&self.message)
                    .with_color(color),
            );
        if let Some(fix) = self.fixes.first() {
            report = report.with_help(fix.label.clone());
        }
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    /// Serialize the fixes for transport through LSP diagnostic data.
    pub fn fixes_to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.fixes
                .iter()
                .map(|fix| {
                    serde_json::json!({
                        "label": fix.label,
                        "start": fix.range.start,
                        "end": fix.range.end,
                        "replacement": fix.replacement,
                    })
                })
                .collect(),
        )
    }
}

/// Recover fixes from LSP diagnostic data.
pub(crate) fn fixes_from_json(data: &serde_json::Value) -> Vec<Fix> {
    let Some(entries) = data.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let label = entry.get("label")?.as_str()?.to_string();
            let start = entry.get("start")?.as_u64()? as u32;
            let end = entry.get("end")?.as_u64()? as u32;
            let replacement = entry.get("replacement")?.as_str()?.to_string();
            Some(Fix {
                label,
                range: Span::new(start, end),
                replacement,
            })
        })
        .collect()
}

impl Fix {
    /// Parse fixes back out of the value produced by
    /// [`Diagnostic::fixes_to_json`].
    pub fn from_json(data: &serde_json::Value) -> Vec<Fix> {
        fixes_from_json(data)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at offset {}", self.message, self.range.start)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_message_and_context() {
        let source = "jobs:\n  build:\n    if: ${{ secrets.TOKEN }}\n";
        let diag = Diagnostic::new(
            DiagnosticKind::ForbiddenContext,
            Severity::Error,
            Span::new(27, 40),
            "Secrets are not valid in `if` statements",
        );
        let rendered =
            String::from_utf8(strip_ansi_escapes::strip(diag.render("ci.yml", source))).unwrap();
        assert!(rendered.contains("Secrets are not valid"));
        assert!(rendered.contains("ci.yml"));
    }

    #[test]
    fn test_fix_json_round_trip() {
        let diag = Diagnostic::new(
            DiagnosticKind::UndefinedReference,
            Severity::Error,
            Span::new(5, 10),
            "Undefined input [x]",
        )
        .with_fixes(vec![Fix {
            label: "Replace with [target]".to_string(),
            range: Span::new(5, 10),
            replacement: "target".to_string(),
        }]);
        let recovered = Fix::from_json(&diag.fixes_to_json());
        assert_eq!(recovered, diag.fixes);
    }
}
