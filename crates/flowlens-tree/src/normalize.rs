//! Tree-sitter YAML to element arena.
//!
//! Walks the raw parse tree and keeps only mapping entries, sequence items,
//! and scalar leaves. ERROR and missing nodes are skipped so malformed
//! documents still yield a partial tree.

use tracing::debug;
use tree_sitter::Node;

use crate::{ElementId, ElementTree, Span};

/// Normalize a YAML source into an [`ElementTree`].
///
/// Only the first document of a YAML stream is considered. Returns `None`
/// when tree-sitter produces no parse tree at all; parse errors inside the
/// tree never fail the pass.
pub fn parse(source: &str) -> Option<ElementTree> {
    let language = tree_sitter::Language::new(tree_sitter_yaml::LANGUAGE);
    let mut parser = tree_sitter::Parser::new();
    parser.set_language(&language).ok()?;
    let ts_tree = parser.parse(source, None)?;

    let mut tree = ElementTree::new(Span::new(0, source.len() as u32));
    let root = ts_tree.root_node();
    let mut cursor = root.walk();
    let document = root.children(&mut cursor).find(|n| n.kind() == "document");
    if let Some(document) = document {
        let root_id = tree.root();
        visit(&mut tree, root_id, document, source);
    } else {
        debug!("no YAML document found");
    }
    Some(tree)
}

fn node_span(node: Node) -> Span {
    Span::new(node.start_byte() as u32, node.end_byte() as u32)
}

fn visit(tree: &mut ElementTree, parent: ElementId, node: Node, source: &str) {
    if node.is_error() || node.is_missing() {
        return;
    }
    match node.kind() {
        "document" | "block_node" | "flow_node" | "block_mapping" | "flow_mapping"
        | "block_sequence" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                visit(tree, parent, child, source);
            }
        }

        "block_mapping_pair" | "flow_pair" => {
            let key = node.child_by_field_name("key");
            let (key_text, key_span) = match key {
                Some(key) => (scalar_content(key, source).0, Some(node_span(key))),
                None => (None, None),
            };
            let id = tree.add_child(parent, key_text, key_span, None, node_span(node));
            if let Some(value) = node.child_by_field_name("value") {
                visit(tree, id, value, source);
            }
        }

        "block_sequence_item" => {
            let id = tree.add_child(parent, None, None, None, node_span(node));
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                visit(tree, id, child, source);
            }
        }

        // flow sequence items have no wrapper node of their own
        "flow_sequence" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                let id = tree.add_child(parent, None, None, None, node_span(child));
                visit(tree, id, child, source);
            }
        }

        "plain_scalar" | "double_quote_scalar" | "single_quote_scalar" | "block_scalar" => {
            let (text, span) = scalar_content(node, source);
            if let Some(text) = text {
                let span = span.unwrap_or_else(|| node_span(node));
                tree.add_child(parent, None, None, Some(text), span);
            }
        }

        "comment" => {}

        other => {
            debug!(kind = other, "skipping unhandled node kind");
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                visit(tree, parent, child, source);
            }
        }
    }
}

/// Extract scalar text and the span of its content.
///
/// Single and double quoted scalars lose their surrounding quotes and the
/// span shrinks accordingly. Block scalars keep their raw text, indicator
/// line included.
fn scalar_content(node: Node, source: &str) -> (Option<String>, Option<Span>) {
    let node = unwrap_scalar(node);
    let Ok(raw) = node.utf8_text(source.as_bytes()) else {
        return (None, None);
    };
    let span = node_span(node);
    match node.kind() {
        "double_quote_scalar" | "single_quote_scalar" => {
            let quote = if node.kind() == "double_quote_scalar" {
                '"'
            } else {
                '\''
            };
            if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
                let inner = &raw[1..raw.len() - 1];
                (
                    Some(inner.to_string()),
                    Some(Span::new(span.start + 1, span.end - 1)),
                )
            } else {
                (Some(raw.to_string()), Some(span))
            }
        }
        _ => (Some(raw.to_string()), Some(span)),
    }
}

/// Descend through the wrapper nodes around a scalar.
fn unwrap_scalar(node: Node) -> Node {
    match node.kind() {
        "block_node" | "flow_node" | "plain_scalar" => match node.named_child(0) {
            Some(child) if child.kind() != "anchor" && child.kind() != "tag" => {
                unwrap_scalar(child)
            }
            _ => node,
        },
        _ => node,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKFLOW: &str = "\
name: ci
on:
  push:
    branches: [main, dev]
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - id: checkout
        uses: \"actions/checkout@v4\"
      - name: test
        run: |
          echo hello
";

    #[test]
    fn test_basic_structure() {
        let tree = parse(WORKFLOW).unwrap();
        let jobs = tree.child_with_key(tree.root(), "jobs").unwrap();
        let build = tree.child_with_key(jobs.id, "build").unwrap();
        assert_eq!(tree.child_text(build.id, "runs-on"), Some("ubuntu-latest"));

        let steps = tree.child_with_key(build.id, "steps").unwrap();
        let items: Vec<_> = tree.children(steps.id).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(tree.child_text(items[0].id, "id"), Some("checkout"));
    }

    #[test]
    fn test_quotes_stripped_and_span_shrunk() {
        let tree = parse(WORKFLOW).unwrap();
        let uses = tree.find_all_with_key(tree.root(), "uses");
        assert_eq!(uses.len(), 1);
        let value = tree.children(uses[0].id).next().unwrap();
        assert_eq!(value.text.as_deref(), Some("actions/checkout@v4"));
        assert_eq!(value.span.slice(WORKFLOW), "actions/checkout@v4");
    }

    #[test]
    fn test_flow_sequence_items() {
        let tree = parse(WORKFLOW).unwrap();
        let branches = tree.find_all_with_key(tree.root(), "branches");
        let items: Vec<_> = tree.children(branches[0].id).collect();
        assert_eq!(items.len(), 2);
        let first = tree.children(items[0].id).next().unwrap();
        assert_eq!(first.text.as_deref(), Some("main"));
    }

    #[test]
    fn test_block_scalar_kept_raw() {
        let tree = parse(WORKFLOW).unwrap();
        let run = tree.find_all_with_key(tree.root(), "run");
        let value = tree.children(run[0].id).next().unwrap();
        assert!(value.text.as_deref().unwrap().contains("echo hello"));
    }

    #[test]
    fn test_malformed_input_yields_partial_tree() {
        let tree = parse("jobs:\n  build:\n    runs-on: [unclosed\n").unwrap();
        assert!(tree.child_with_key(tree.root(), "jobs").is_some());
    }

    #[test]
    fn test_empty_input() {
        let tree = parse("").unwrap();
        assert!(tree.is_empty());
    }
}
