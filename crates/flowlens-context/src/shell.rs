//! Extraction of `GITHUB_OUTPUT` / `GITHUB_ENV` assignments from scripts.

use std::sync::LazyLock;

use flowlens_tree::Span;
use regex::Regex;

static OUTPUT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"echo\s+"(\w+)=(.*?)"\s*>>\s*"?\$\w*:?\{?GITHUB_OUTPUT\}?"?"#)
        .unwrap_or_else(|e| panic!("invalid output pattern: {e}"))
});

static ENV_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"echo\s+"(\w+)=(.*?)"\s*>>\s*"?\$\w*:?\{?GITHUB_ENV\}?"?"#)
        .unwrap_or_else(|e| panic!("invalid env pattern: {e}"))
});

/// One `echo "name=value" >> "$GITHUB_OUTPUT"` style assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellAssignment {
    pub name: String,
    pub value: String,
    /// Absolute span of the whole assignment line.
    pub span: Span,
}

/// Outputs assigned by a `run:` script. `base` is the absolute offset of
/// `script` in the document.
pub fn extract_output_assignments(script: &str, base: u32) -> Vec<ShellAssignment> {
    extract(script, base, "GITHUB_OUTPUT", &OUTPUT_PATTERN)
}

/// Environment variables assigned by a `run:` script.
pub fn extract_env_assignments(script: &str, base: u32) -> Vec<ShellAssignment> {
    extract(script, base, "GITHUB_ENV", &ENV_PATTERN)
}

fn extract(script: &str, base: u32, marker: &str, pattern: &Regex) -> Vec<ShellAssignment> {
    // cheap reject before the regex runs
    if !script.contains(marker) {
        return Vec::new();
    }
    let mut found = Vec::new();
    let mut line_start = 0u32;
    for line in script.split('\n') {
        // commented-out assignments never run
        let commented = line.trim_start().starts_with('#');
        if !commented && line.contains(marker) {
            for captures in pattern.captures_iter(line) {
                let (Some(whole), Some(name), Some(value)) =
                    (captures.get(0), captures.get(1), captures.get(2))
                else {
                    continue;
                };
                found.push(ShellAssignment {
                    name: name.as_str().to_string(),
                    value: value.as_str().to_string(),
                    span: Span::new(
                        base + line_start + whole.start() as u32,
                        base + line_start + whole.end() as u32,
                    ),
                });
            }
        }
        line_start += line.len() as u32 + 1;
    }
    found
}
