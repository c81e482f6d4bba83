//! The per-document symbol tables.

use flowlens_tree::{ElementId, ElementTree, Span};

/// A referenceable name collected from the document.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    /// Scalar value or description, when the declaration has one.
    pub value: Option<String>,
    /// The declaring element.
    pub element: ElementId,
    /// Absolute span of the declared name.
    pub span: Span,
    /// Enclosing job or step element, when the symbol is scoped to one.
    pub owner: Option<ElementId>,
}

/// A `uses:` reference to an action or reusable workflow.
#[derive(Debug, Clone)]
pub struct ActionUse {
    pub reference: String,
    /// The scalar value element holding the reference.
    pub element: ElementId,
    pub span: Span,
    /// The step (or job, for reusable workflows) using it.
    pub owner: ElementId,
}

/// Everything the document declares, in document order.
///
/// Tables are `Vec`s rather than maps so positional visibility (steps before
/// the current one, jobs declared earlier) stays a simple filter.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Jobs under the top-level `jobs:` block.
    pub jobs: Vec<Symbol>,
    /// Steps carrying an `id:`, owner = enclosing job.
    pub steps: Vec<Symbol>,
    /// Declared workflow or action inputs.
    pub inputs: Vec<Symbol>,
    /// Job outputs, owner = declaring job.
    pub outputs: Vec<Symbol>,
    /// Secrets declared under `on:`.
    pub secrets: Vec<Symbol>,
    /// `env:` entries at any level; owner = root, job, or step scope.
    pub envs: Vec<Symbol>,
    /// `needs:` references, name = referenced job id, owner = declaring job.
    pub needs: Vec<Symbol>,
    /// Environment variables assigned in `run:` scripts, owner = step.
    pub run_envs: Vec<Symbol>,
    /// Outputs assigned in `run:` scripts, owner = step.
    pub run_outputs: Vec<Symbol>,
    /// Every `uses:` reference in the document.
    pub actions_used: Vec<ActionUse>,
}

impl Context {
    /// Job ids declared strictly before `before` in document order.
    pub fn jobs_before(&self, before: Span) -> impl Iterator<Item = &Symbol> {
        self.jobs.iter().filter(move |j| j.span.start < before.start)
    }

    /// The job element declaring `id`.
    pub fn job(&self, id: &str) -> Option<&Symbol> {
        self.jobs.iter().find(|j| j.name == id)
    }

    /// Steps of `job`, optionally only those starting before `before`.
    pub fn steps_of(&self, job: ElementId, before: Option<Span>) -> impl Iterator<Item = &Symbol> {
        self.steps.iter().filter(move |s| {
            s.owner == Some(job)
                && before.is_none_or(|b| {
                    // the declaring step must lie fully before the reference
                    s.span.start < b.start
                })
        })
    }

    /// Needs entries declared by `job`.
    pub fn needs_of(&self, job: ElementId) -> impl Iterator<Item = &Symbol> {
        self.needs.iter().filter(move |n| n.owner == Some(job))
    }

    /// Outputs declared by `job`.
    pub fn outputs_of(&self, job: ElementId) -> impl Iterator<Item = &Symbol> {
        self.outputs.iter().filter(move |o| o.owner == Some(job))
    }

    /// Jobs declaring at least one output.
    pub fn jobs_with_outputs(&self) -> impl Iterator<Item = &Symbol> {
        self.jobs
            .iter()
            .filter(|j| self.outputs.iter().any(|o| o.owner == Some(j.element)))
    }

    /// Shell-assigned outputs of the step declaring `step_element`.
    pub fn run_outputs_of(&self, step_element: ElementId) -> impl Iterator<Item = &Symbol> {
        self.run_outputs
            .iter()
            .filter(move |o| o.owner == Some(step_element))
    }

    /// The `uses:` reference of a step, if any.
    pub fn action_of(&self, step_element: ElementId) -> Option<&ActionUse> {
        self.actions_used
            .iter()
            .find(|a| a.owner == step_element)
    }
}

/// An immutable parse of one document version.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tree: ElementTree,
    pub context: Context,
}

impl Snapshot {
    /// Parse and index `source`. Returns `None` only when the YAML grammar
    /// itself fails to load.
    pub fn build(source: &str) -> Option<Snapshot> {
        let tree = flowlens_tree::parse(source)?;
        let context = crate::index(&tree);
        Some(Snapshot { tree, context })
    }
}
