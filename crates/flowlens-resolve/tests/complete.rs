//! Completion behavior over inline fixtures.

use flowlens_context::Snapshot;
use flowlens_resolve::{complete, Category};

fn labels(source: &str, cursor_after: &str) -> Vec<String> {
    let snapshot = Snapshot::build(source).expect("parse");
    let offset = source.find(cursor_after).expect("cursor marker") + cursor_after.len();
    complete(&snapshot, offset as u32, None)
        .into_iter()
        .map(|item| item.label)
        .collect()
}

const WORKFLOW: &str = "\
on:
  workflow_dispatch:
    inputs:
      target:
        description: where to deploy
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - id: rev
        run: echo \"sha=1\" >> $GITHUB_OUTPUT
      - run: echo ${{ steps.rev.outputs.sha }} and ${{ }}
";

#[test]
fn empty_brackets_offer_filtered_roots() {
    let found = labels(WORKFLOW, "and ${{ ");
    assert!(found.contains(&"github".to_string()), "{found:?}");
    assert!(found.contains(&"inputs".to_string()));
    assert!(found.contains(&"env".to_string()));
    assert!(found.contains(&"steps".to_string()));
    // no secrets are declared, no needs list exists, and jobs only
    // resolves inside trigger output values
    assert!(!found.contains(&"secrets".to_string()));
    assert!(!found.contains(&"needs".to_string()));
    assert!(!found.contains(&"jobs".to_string()));
}

#[test]
fn roots_carry_namespace_category() {
    let snapshot = Snapshot::build(WORKFLOW).expect("parse");
    let offset = WORKFLOW.find("and ${{ ").unwrap() + "and ${{ ".len();
    let items = complete(&snapshot, offset as u32, None);
    assert!(!items.is_empty());
    assert!(items.iter().all(|i| i.category == Category::Namespace));
}

#[test]
fn segment_completion_lists_earlier_step_ids() {
    let found = labels(WORKFLOW, "echo ${{ steps.");
    assert_eq!(found, vec!["rev".to_string()]);
}

#[test]
fn prefix_matches_sort_first() {
    let source = "\
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - run: echo ${{ github.ev }}
";
    let found = labels(source, "${{ github.ev");
    assert_eq!(found[0], "event");
    assert_eq!(found[1], "event_name");
    assert_eq!(found[2], "event_path");
}

#[test]
fn invalid_prefix_segment_offers_nothing() {
    let source = "\
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - run: echo ${{ steps.nope.outputs.x }}
";
    let found = labels(source, "${{ steps.nope.");
    assert!(found.is_empty(), "{found:?}");
}

#[test]
fn no_completion_outside_brackets() {
    let source = "\
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - run: echo github.ev
";
    let found = labels(source, "echo github.ev");
    assert!(found.is_empty(), "{found:?}");
}

#[test]
fn if_fields_complete_without_brackets() {
    let source = "\
jobs:
  build:
    runs-on: ubuntu-latest
    if: github.ref
    steps:
      - run: echo ok
";
    let found = labels(source, "if: github.");
    assert!(found.contains(&"ref".to_string()), "{found:?}");
    assert!(found.contains(&"ref_name".to_string()));
}

#[test]
fn nothing_under_runner_selection() {
    let source = "\
jobs:
  build:
    runs-on: ${{ github.ref }}
    steps:
      - run: echo ok
";
    let found = labels(source, "runs-on: ${{ github.");
    assert!(found.is_empty(), "{found:?}");
}
