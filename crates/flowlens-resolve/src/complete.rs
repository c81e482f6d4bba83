//! Completion inside `${{ ... }}` expressions.

use flowlens_actions::ActionCache;
use flowlens_context::{builtins, Snapshot};
use tracing::trace;

use crate::rules::Site;
use crate::{levenshtein, Namespace};

/// What a completion entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// A top-level context namespace.
    Namespace,
    /// A member of a namespace: an input, a secret, a step id, an output.
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub label: String,
    pub detail: Option<String>,
    pub category: Category,
}

/// Compute completions at `offset`.
///
/// Yields nothing when the cursor is outside an unclosed `${{` and outside
/// an `if:` field, when a typed segment fails validation, or when the
/// cursor sits under `runs-on:`/`os:`.
pub fn complete(
    snapshot: &Snapshot,
    offset: u32,
    actions: Option<&ActionCache>,
) -> Vec<CompletionItem> {
    let tree = &snapshot.tree;
    let Some(element) = tree.element_at_offset(offset) else {
        return Vec::new();
    };
    let Some(text) = element.text.as_deref() else {
        return Vec::new();
    };
    if offset < element.span.start || offset > element.span.end {
        return Vec::new();
    }
    let rel = (offset - element.span.start) as usize;
    if !text.is_char_boundary(rel) {
        return Vec::new();
    }

    let mut site = Site::new(snapshot, element.id, offset);
    if let Some(actions) = actions {
        site = site.with_actions(actions);
    }
    if site.in_runner_selection() {
        return Vec::new();
    }

    let before_cursor = &text[..rel];
    let bracket_start = before_cursor.rfind("${{");
    let in_brackets = match bracket_start {
        Some(start) => before_cursor.rfind("}}").is_none_or(|close| close <= start),
        None => false,
    };
    if !in_brackets && !site.in_if_field() {
        return Vec::new();
    }

    let token_start = token_start(before_cursor);
    let token = &before_cursor[token_start..];
    let (typed, partial): (Vec<&str>, &str) = match token.rsplit_once('.') {
        None => (Vec::new(), token),
        Some((path, partial)) => (path.split('.').collect(), partial),
    };
    trace!(?typed, partial, "completion request");

    if typed.is_empty() {
        return namespace_roots(&site, partial);
    }

    let Some(namespace) = Namespace::parse(typed[0]) else {
        return Vec::new();
    };
    let segments: Vec<String> = typed.iter().map(|s| s.to_string()).collect();

    // every already-typed segment must resolve before the next one is
    // offered
    for index in 1..segments.len() {
        match namespace.candidates(&segments, index, &site) {
            None => continue,
            Some(candidates) => {
                if !candidates.iter().any(|c| c.name == segments[index]) {
                    return Vec::new();
                }
            }
        }
    }

    let Some(candidates) = namespace.candidates(&segments, segments.len(), &site) else {
        return Vec::new();
    };
    let mut items: Vec<(usize, usize, usize, CompletionItem)> = candidates
        .into_iter()
        .enumerate()
        .map(|(order, c)| {
            let (tier, distance) = score(&c.name, partial);
            (
                tier,
                distance,
                order,
                CompletionItem {
                    label: c.name,
                    detail: c.detail,
                    category: Category::Member,
                },
            )
        })
        .collect();
    items.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));
    items.into_iter().map(|(_, _, _, item)| item).collect()
}

/// Walk back over reference characters to the start of the token under the
/// cursor.
fn token_start(text: &str) -> usize {
    let mut start = text.len();
    for (i, c) in text.char_indices().rev() {
        if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
            start = i;
        } else {
            break;
        }
    }
    start
}

/// Prefix matches first, then contains, then everything else by edit
/// distance.
fn score(name: &str, partial: &str) -> (usize, usize) {
    if partial.is_empty() {
        return (0, 0);
    }
    let name_lower = name.to_lowercase();
    let partial_lower = partial.to_lowercase();
    if name_lower.starts_with(&partial_lower) {
        (0, 0)
    } else if name_lower.contains(&partial_lower) {
        (1, 0)
    } else {
        (2, levenshtein(&name_lower, &partial_lower))
    }
}

/// The filtered set of top-level namespaces.
fn namespace_roots(site: &Site, partial: &str) -> Vec<CompletionItem> {
    let ctx = &site.snapshot.context;
    let mut items: Vec<(usize, usize, usize, CompletionItem)> = Vec::new();
    for (order, (name, detail)) in builtins::NAMESPACE_ROOTS.iter().enumerate() {
        let offered = match *name {
            // only meaningful inside trigger output values
            "jobs" => site.in_trigger_outputs_value(),
            "needs" => site
                .job()
                .is_some_and(|job| ctx.needs_of(job).next().is_some()),
            "inputs" => !ctx.inputs.is_empty(),
            "secrets" => !ctx.secrets.is_empty(),
            "steps" => Namespace::Steps
                .candidates(&["steps".to_string()], 1, site)
                .is_some_and(|c| !c.is_empty()),
            _ => true,
        };
        if !offered {
            continue;
        }
        let (tier, distance) = score(name, partial);
        items.push((
            tier,
            distance,
            order,
            CompletionItem {
                label: name.to_string(),
                detail: Some(detail.to_string()),
                category: Category::Namespace,
            },
        ));
    }
    items.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));
    items.into_iter().map(|(_, _, _, item)| item).collect()
}
