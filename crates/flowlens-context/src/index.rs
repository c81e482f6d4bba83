//! The indexing walk.

use flowlens_tree::{Element, ElementTree, Span};
use tracing::trace;

use crate::{
    extract_env_assignments, extract_output_assignments, ActionUse, Context, Symbol,
};

/// Collect every referenceable symbol of `tree` into a [`Context`].
pub fn index(tree: &ElementTree) -> Context {
    let mut ctx = Context::default();
    let root = tree.root();

    collect_inputs(tree, &mut ctx);

    if let Some(on) = tree.child_with_key(root, "on") {
        for secrets in tree.find_all_with_key(on.id, "secrets") {
            for child in tree.children(secrets.id) {
                push_keyed(&mut ctx.secrets, tree, child, None);
            }
        }
    }

    if let Some(env) = tree.child_with_key(root, "env") {
        for child in tree.children(env.id) {
            push_keyed(&mut ctx.envs, tree, child, None);
        }
    }

    if let Some(jobs) = tree.child_with_key(root, "jobs") {
        for job in tree.children(jobs.id) {
            if job.key.is_none() {
                continue;
            }
            index_job(tree, job, &mut ctx);
        }
    }

    trace!(
        jobs = ctx.jobs.len(),
        steps = ctx.steps.len(),
        envs = ctx.envs.len(),
        "indexed document"
    );
    ctx
}

/// Input blocks live under `on:` (workflow_dispatch, workflow_call) or at
/// the document root for action files. Duplicate names keep their first
/// declaration, description included.
fn collect_inputs(tree: &ElementTree, ctx: &mut Context) {
    let root = tree.root();
    let mut blocks = Vec::new();
    if let Some(on) = tree.child_with_key(root, "on") {
        blocks.extend(tree.find_all_with_key(on.id, "inputs"));
    }
    if let Some(inputs) = tree.child_with_key(root, "inputs") {
        blocks.push(inputs);
    }
    for block in blocks {
        for child in tree.children(block.id) {
            let Some(name) = child.key.as_deref() else {
                continue;
            };
            if ctx.inputs.iter().any(|i| i.name == name) {
                continue;
            }
            ctx.inputs.push(Symbol {
                name: name.to_string(),
                value: tree.child_text(child.id, "description").map(str::to_string),
                element: child.id,
                span: child.key_span.unwrap_or(child.span),
                owner: None,
            });
        }
    }
}

fn index_job(tree: &ElementTree, job: &Element, ctx: &mut Context) {
    ctx.jobs.push(Symbol {
        name: job.key.clone().unwrap_or_default(),
        value: tree.child_text(job.id, "name").map(str::to_string),
        element: job.id,
        span: job.key_span.unwrap_or(job.span),
        owner: None,
    });

    if let Some(env) = tree.child_with_key(job.id, "env") {
        for child in tree.children(env.id) {
            push_keyed(&mut ctx.envs, tree, child, Some(job.id));
        }
    }

    if let Some(needs) = tree.child_with_key(job.id, "needs") {
        for (name, span) in scalar_values(tree, needs) {
            ctx.needs.push(Symbol {
                name,
                value: None,
                element: needs.id,
                span,
                owner: Some(job.id),
            });
        }
    }

    if let Some(outputs) = tree.child_with_key(job.id, "outputs") {
        for child in tree.children(outputs.id) {
            push_keyed(&mut ctx.outputs, tree, child, Some(job.id));
        }
    }

    // reusable workflow call
    push_uses(tree, job, ctx);

    if let Some(steps) = tree.child_with_key(job.id, "steps") {
        for step in tree.children(steps.id) {
            index_step(tree, job, step, ctx);
        }
    }
}

fn index_step(tree: &ElementTree, job: &Element, step: &Element, ctx: &mut Context) {
    if let Some(id_entry) = tree.child_with_key(step.id, "id") {
        if let Some(value) = tree.children(id_entry.id).find(|c| c.text.is_some()) {
            ctx.steps.push(Symbol {
                name: value.text.clone().unwrap_or_default(),
                value: tree.child_text(step.id, "name").map(str::to_string),
                element: step.id,
                span: value.span,
                owner: Some(job.id),
            });
        }
    }

    if let Some(env) = tree.child_with_key(step.id, "env") {
        for child in tree.children(env.id) {
            push_keyed(&mut ctx.envs, tree, child, Some(step.id));
        }
    }

    push_uses(tree, step, ctx);

    if let Some(run) = tree.child_with_key(step.id, "run") {
        if let Some(script) = tree.children(run.id).find(|c| c.text.is_some()) {
            let text = script.text.as_deref().unwrap_or_default();
            let base = script.span.start;
            for assignment in extract_output_assignments(text, base) {
                ctx.run_outputs.push(Symbol {
                    name: assignment.name,
                    value: Some(assignment.value),
                    element: script.id,
                    span: assignment.span,
                    owner: Some(step.id),
                });
            }
            for assignment in extract_env_assignments(text, base) {
                ctx.run_envs.push(Symbol {
                    name: assignment.name,
                    value: Some(assignment.value),
                    element: script.id,
                    span: assignment.span,
                    owner: Some(step.id),
                });
            }
        }
    }
}

fn push_uses(tree: &ElementTree, owner: &Element, ctx: &mut Context) {
    let Some(uses) = tree.child_with_key(owner.id, "uses") else {
        return;
    };
    let Some(value) = tree.children(uses.id).find(|c| c.text.is_some()) else {
        return;
    };
    ctx.actions_used.push(ActionUse {
        reference: value.text.clone().unwrap_or_default(),
        element: value.id,
        span: value.span,
        owner: owner.id,
    });
}

/// A keyed entry of an `env:`, `outputs:`, or `secrets:` block.
fn push_keyed(table: &mut Vec<Symbol>, tree: &ElementTree, child: &Element, owner: Option<flowlens_tree::ElementId>) {
    let Some(name) = child.key.as_deref() else {
        return;
    };
    table.push(Symbol {
        name: name.to_string(),
        value: tree.children(child.id).find_map(|c| c.text.clone()),
        element: child.id,
        span: child.key_span.unwrap_or(child.span),
        owner,
    });
}

/// Scalar values of an entry that may hold either a single scalar or a
/// sequence, as `needs:` does.
fn scalar_values(tree: &ElementTree, entry: &Element) -> Vec<(String, Span)> {
    let mut values = Vec::new();
    for child in tree.children(entry.id) {
        if let Some(text) = child.text.as_deref() {
            values.push((text.to_string(), child.span));
        } else {
            for inner in tree.children(child.id) {
                if let Some(text) = inner.text.as_deref() {
                    values.push((text.to_string(), inner.span));
                }
            }
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKFLOW: &str = "\
name: ci
on:
  workflow_dispatch:
    inputs:
      target:
        description: deploy target
env:
  GLOBAL: one
jobs:
  build:
    runs-on: ubuntu-latest
    env:
      JOB_VAR: two
    outputs:
      sha: ${{ steps.rev.outputs.sha }}
    steps:
      - id: rev
        run: echo \"sha=$(git rev-parse HEAD)\" >> $GITHUB_OUTPUT
  deploy:
    needs: [build]
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
        env:
          STEP_VAR: three
";

    fn context() -> (flowlens_tree::ElementTree, Context) {
        let tree = flowlens_tree::parse(WORKFLOW).unwrap();
        let ctx = index(&tree);
        (tree, ctx)
    }

    #[test]
    fn test_jobs_and_needs() {
        let (_, ctx) = context();
        let names: Vec<_> = ctx.jobs.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, ["build", "deploy"]);

        assert_eq!(ctx.needs.len(), 1);
        assert_eq!(ctx.needs[0].name, "build");
        assert_eq!(ctx.needs[0].owner, Some(ctx.jobs[1].element));
    }

    #[test]
    fn test_inputs_with_description() {
        let (_, ctx) = context();
        assert_eq!(ctx.inputs.len(), 1);
        assert_eq!(ctx.inputs[0].name, "target");
        assert_eq!(ctx.inputs[0].value.as_deref(), Some("deploy target"));
    }

    #[test]
    fn test_env_layers_carry_owners() {
        let (_, ctx) = context();
        let by_name = |n: &str| ctx.envs.iter().find(|e| e.name == n).unwrap();
        assert!(by_name("GLOBAL").owner.is_none());
        assert_eq!(by_name("JOB_VAR").owner, Some(ctx.jobs[0].element));
        let step_var = by_name("STEP_VAR");
        assert!(step_var.owner.is_some());
        assert_ne!(step_var.owner, Some(ctx.jobs[1].element));
    }

    #[test]
    fn test_job_outputs_and_run_outputs() {
        let (_, ctx) = context();
        assert_eq!(ctx.outputs.len(), 1);
        assert_eq!(ctx.outputs[0].name, "sha");
        assert_eq!(ctx.outputs[0].owner, Some(ctx.jobs[0].element));

        assert_eq!(ctx.run_outputs.len(), 1);
        assert_eq!(ctx.run_outputs[0].name, "sha");
        assert_eq!(ctx.steps.len(), 1);
        assert_eq!(ctx.run_outputs[0].owner, Some(ctx.steps[0].element));
    }

    #[test]
    fn test_uses_collected() {
        let (_, ctx) = context();
        assert_eq!(ctx.actions_used.len(), 1);
        assert_eq!(ctx.actions_used[0].reference, "actions/checkout@v4");
    }

    #[test]
    fn test_positional_visibility() {
        let (_, ctx) = context();
        let deploy = ctx.jobs[1].clone();
        let earlier: Vec<_> = ctx
            .jobs_before(deploy.span)
            .map(|j| j.name.as_str())
            .collect();
        assert_eq!(earlier, ["build"]);
    }

    #[test]
    fn test_first_input_declaration_wins() {
        let source = "\
on:
  workflow_call:
    inputs:
      target:
        description: first
  workflow_dispatch:
    inputs:
      target:
        description: second
";
        let tree = flowlens_tree::parse(source).unwrap();
        let ctx = index(&tree);
        assert_eq!(ctx.inputs.len(), 1);
        assert_eq!(ctx.inputs[0].value.as_deref(), Some("first"));
    }
}
