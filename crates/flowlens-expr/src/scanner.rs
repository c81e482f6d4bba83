//! The line-oriented token scanner.

use flowlens_tree::Span;
use tracing::trace;

/// One dot-separated segment of a [`PathExpression`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Segment text, whitespace trimmed.
    pub text: String,
    /// Absolute span of the raw segment.
    pub span: Span,
}

/// A dotted reference found in free text, e.g. `steps.build.outputs.sha`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpression {
    pub segments: Vec<PathSegment>,
    /// Absolute span of the whole reference.
    pub span: Span,
}

impl PathExpression {
    /// Segment text at `index`, empty when out of range.
    pub fn segment_text(&self, index: usize) -> &str {
        self.segments
            .get(index)
            .map(|s| s.text.as_str())
            .unwrap_or("")
    }
}

/// Scan `text` for dotted references. `base` is the absolute byte offset of
/// `text` in the document; all reported spans are absolute.
///
/// The scan is line by line: comment lines (first non-blank char `#`) are
/// skipped entirely. A token starts at an alphanumeric character whose
/// predecessor is not `{` (so the braces of `${{` never glue onto the
/// reference), continues through `[A-Za-z0-9_.-]`, and is kept only when it
/// is longer than one character and contains a dot.
pub fn scan(text: &str, base: u32) -> Vec<PathExpression> {
    let mut found = Vec::new();
    let mut line_start = 0u32;
    for line in text.split('\n') {
        if !line.trim_start().starts_with('#') {
            scan_line(line, base + line_start, &mut found);
        }
        line_start += line.len() as u32 + 1;
    }
    if !found.is_empty() {
        trace!(count = found.len(), "scanned dotted references");
    }
    found
}

fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

fn scan_line(line: &str, base: u32, found: &mut Vec<PathExpression>) {
    let mut token_start: Option<usize> = None;
    let mut prev: char = ' ';
    for (i, c) in line.char_indices() {
        match token_start {
            None => {
                if c.is_alphanumeric() && (prev.is_whitespace() || prev != '{') {
                    token_start = Some(i);
                }
            }
            Some(start) => {
                if !is_token_char(c) {
                    finish_token(&line[start..i], base + start as u32, found);
                    token_start = None;
                }
            }
        }
        prev = c;
    }
    if let Some(start) = token_start {
        finish_token(&line[start..], base + start as u32, found);
    }
}

/// Split a raw token into segments, dropping tokens that cannot be dotted
/// references.
fn finish_token(raw: &str, base: u32, found: &mut Vec<PathExpression>) {
    if raw.len() <= 1 || !raw.contains('.') {
        return;
    }
    let mut segments = Vec::new();
    let mut offset = 0u32;
    for part in raw.split('.') {
        let text = part.trim();
        // empty parts come from dangling or doubled dots like `github.`
        if !text.is_empty() {
            segments.push(PathSegment {
                text: text.to_string(),
                span: Span::new(base + offset, base + offset + part.len() as u32),
            });
        }
        offset += part.len() as u32 + 1;
    }
    if segments.is_empty() {
        return;
    }
    found.push(PathExpression {
        segments,
        span: Span::new(base, base + raw.len() as u32),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(text: &str) -> Vec<Vec<(String, u32, u32)>> {
        scan(text, 0)
            .into_iter()
            .map(|expr| {
                expr.segments
                    .into_iter()
                    .map(|s| (s.text, s.span.start, s.span.end))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_simple_reference() {
        let found = segments("${{ github.event_name }}");
        assert_eq!(
            found,
            vec![vec![
                ("github".to_string(), 4, 10),
                ("event_name".to_string(), 11, 21),
            ]]
        );
    }

    #[test]
    fn test_brace_glued_start_shifts() {
        // a reference glued to the braces cannot start on its first char
        let found = segments("${{github.sha}}");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0][0].0, "ithub");
    }

    #[test]
    fn test_multiple_per_line() {
        let found = segments("echo ${{ github.sha }} ${{ runner.os }}");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0][0].0, "github");
        assert_eq!(found[1][0].0, "runner");
    }

    #[test]
    fn test_undotted_words_ignored() {
        assert!(segments("echo hello world").is_empty());
        assert!(segments("a").is_empty());
    }

    #[test]
    fn test_comment_lines_skipped() {
        let found = segments("  # github.sha is ignored\necho ${{ github.sha }}");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0][0].1, 35);
    }

    #[test]
    fn test_trailing_dot_dropped() {
        let found = segments("x ${{ github. }}");
        assert_eq!(found, vec![vec![("github".to_string(), 6, 12)]]);
    }

    #[test]
    fn test_offsets_with_base() {
        let found = scan("${{ steps.build.outputs.sha }}", 100);
        assert_eq!(found.len(), 1);
        let expr = &found[0];
        assert_eq!(expr.span, Span::new(104, 127));
        assert_eq!(expr.segment_text(0), "steps");
        assert_eq!(expr.segments[3].span, Span::new(124, 127));
        assert_eq!(expr.segment_text(4), "");
    }

    #[test]
    fn test_bare_reference_in_if_text() {
        // if: conditions carry references without any brackets
        let found = segments("steps.build.outcome == 'success'");
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0],
            vec![
                ("steps".to_string(), 0, 5),
                ("build".to_string(), 6, 11),
                ("outcome".to_string(), 12, 19),
            ]
        );
    }

    #[test]
    fn test_version_numbers_are_reported() {
        // scope resolution ignores unknown namespaces, so this is fine
        let found = segments("uses node 20.11.1");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0][0].0, "20");
    }
}
