//! Per-namespace arity and visibility rules.

use flowlens_actions::{ActionCache, ActionStatus};
use flowlens_context::{builtins, Snapshot, Symbol};
use flowlens_tree::ElementId;

/// Segment-count bounds for a namespace. `max == None` means open-ended,
/// as for `github.event.*` payload access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub min: usize,
    pub max: Option<usize>,
}

/// A name visible at one position of a dotted reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub detail: Option<String>,
}

impl Candidate {
    fn new(name: impl Into<String>, detail: Option<String>) -> Candidate {
        Candidate {
            name: name.into(),
            detail,
        }
    }

    fn from_table(table: &[(&str, &str)]) -> Vec<Candidate> {
        table
            .iter()
            .map(|(name, detail)| Candidate::new(*name, Some(detail.to_string())))
            .collect()
    }

    fn from_symbols<'a>(symbols: impl Iterator<Item = &'a Symbol>) -> Vec<Candidate> {
        symbols
            .map(|s| Candidate::new(s.name.clone(), s.value.clone()))
            .collect()
    }
}

/// Where in the document a reference (or a completion request) sits.
#[derive(Clone, Copy)]
pub struct Site<'a> {
    pub snapshot: &'a Snapshot,
    /// The element whose text holds the reference.
    pub scope: ElementId,
    /// Absolute offset of the reference.
    pub offset: u32,
    /// Metadata source for `uses:` steps; `None` disables action outputs.
    pub actions: Option<&'a ActionCache>,
}

impl<'a> Site<'a> {
    pub fn new(snapshot: &'a Snapshot, scope: ElementId, offset: u32) -> Site<'a> {
        Site {
            snapshot,
            scope,
            offset,
            actions: None,
        }
    }

    pub fn with_actions(mut self, actions: &'a ActionCache) -> Site<'a> {
        self.actions = Some(actions);
        self
    }

    /// The enclosing job element.
    pub fn job(&self) -> Option<ElementId> {
        self.snapshot
            .tree
            .element_under_parent(self.scope, "jobs")
            .map(|e| e.id)
    }

    /// The enclosing step element.
    pub fn step(&self) -> Option<ElementId> {
        self.snapshot
            .tree
            .element_under_parent(self.scope, "steps")
            .map(|e| e.id)
    }

    /// Whether the reference sits inside an `if:` field.
    pub fn in_if_field(&self) -> bool {
        self.snapshot.tree.parent_with_key(self.scope, "if").is_some()
    }

    /// Whether the reference sits inside an `outputs:` block.
    pub fn in_outputs_block(&self) -> bool {
        self.snapshot
            .tree
            .parent_with_key(self.scope, "outputs")
            .is_some()
    }

    /// Whether the reference sits in a trigger output value, the only place
    /// the `jobs` namespace resolves.
    pub fn in_trigger_outputs_value(&self) -> bool {
        self.in_outputs_block()
            && self.snapshot.tree.parent_with_key(self.scope, "on").is_some()
    }

    /// Whether the reference sits under a `runs-on:` or `os:` entry.
    pub fn in_runner_selection(&self) -> bool {
        self.snapshot
            .tree
            .parent_with_key(self.scope, "runs-on")
            .is_some()
            || self.snapshot.tree.parent_with_key(self.scope, "os").is_some()
    }
}

/// The closed set of validated namespaces. Anything else (`vars`, `matrix`,
/// version numbers in prose) is left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Inputs,
    Secrets,
    Env,
    Github,
    Runner,
    Steps,
    Jobs,
    Needs,
}

impl Namespace {
    pub fn parse(text: &str) -> Option<Namespace> {
        match text {
            "inputs" => Some(Namespace::Inputs),
            "secrets" => Some(Namespace::Secrets),
            "env" => Some(Namespace::Env),
            "github" => Some(Namespace::Github),
            "runner" => Some(Namespace::Runner),
            "steps" => Some(Namespace::Steps),
            "jobs" => Some(Namespace::Jobs),
            "needs" => Some(Namespace::Needs),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Inputs => "inputs",
            Namespace::Secrets => "secrets",
            Namespace::Env => "env",
            Namespace::Github => "github",
            Namespace::Runner => "runner",
            Namespace::Steps => "steps",
            Namespace::Jobs => "jobs",
            Namespace::Needs => "needs",
        }
    }

    /// Segment bounds, given the segments as typed. `steps.<id>.conclusion`
    /// and `steps.<id>.outcome` are complete at three segments; the
    /// `outputs` forms need four.
    pub fn rule(&self, segments: &[String]) -> Rule {
        match self {
            Namespace::Inputs | Namespace::Secrets | Namespace::Runner => Rule {
                min: 2,
                max: Some(2),
            },
            Namespace::Env | Namespace::Github => Rule { min: 2, max: None },
            Namespace::Steps => {
                let result_field = segments
                    .get(2)
                    .is_some_and(|s| s == "conclusion" || s == "outcome");
                if result_field {
                    Rule {
                        min: 3,
                        max: Some(3),
                    }
                } else {
                    Rule {
                        min: 4,
                        max: Some(4),
                    }
                }
            }
            Namespace::Jobs | Namespace::Needs => Rule {
                min: 4,
                max: Some(4),
            },
        }
    }

    /// Names visible at segment `index` (1-based past the namespace),
    /// given the segments typed so far.
    ///
    /// `None` means the position is not validated at all, as for the
    /// payload fields under `github.event`. `Some(vec![])` means the
    /// position is validated and nothing can ever match.
    pub fn candidates(
        &self,
        segments: &[String],
        index: usize,
        site: &Site,
    ) -> Option<Vec<Candidate>> {
        let ctx = &site.snapshot.context;
        match (self, index) {
            (Namespace::Inputs, 1) => Some(Candidate::from_symbols(ctx.inputs.iter())),
            (Namespace::Secrets, 1) => Some(Candidate::from_symbols(ctx.secrets.iter())),
            (Namespace::Runner, 1) => Some(Candidate::from_table(builtins::RUNNER_CONTEXT)),
            (Namespace::Github, 1) => Some(Candidate::from_table(builtins::GITHUB_CONTEXT)),
            (Namespace::Github, _) => None,
            (Namespace::Env, 1) => Some(self.env_candidates(site)),
            (Namespace::Env, _) => None,

            (Namespace::Steps, 1) => Some(Candidate::from_symbols(self.visible_steps(site))),
            (Namespace::Steps, 2) => {
                let mut fields = vec![Candidate::new(
                    "outputs",
                    Some("Outputs the step assigned or its action declared".to_string()),
                )];
                fields.extend(Candidate::from_table(builtins::STEP_RESULT_FIELDS));
                Some(fields)
            }
            (Namespace::Steps, 3) => {
                let job = site.job();
                let step = ctx
                    .steps
                    .iter()
                    .find(|s| s.name == segments[1] && s.owner == job)?;
                Some(self.step_outputs(site, step.element))
            }

            (Namespace::Jobs, 1) => {
                if site.in_trigger_outputs_value() {
                    Some(Candidate::from_symbols(ctx.jobs_with_outputs()))
                } else {
                    Some(Vec::new())
                }
            }
            (Namespace::Jobs, 2) | (Namespace::Needs, 2) => Some(vec![Candidate::new(
                "outputs",
                Some("Outputs of the referenced job".to_string()),
            )]),
            (Namespace::Jobs, 3) | (Namespace::Needs, 3) => {
                let job = ctx.job(&segments[1])?;
                Some(Candidate::from_symbols(ctx.outputs_of(job.element)))
            }

            (Namespace::Needs, 1) => {
                let job = site.job()?;
                Some(Candidate::from_symbols(ctx.needs_of(job)))
            }

            _ => None,
        }
    }

    /// Union of every env layer visible at the site: assignments from
    /// earlier `run:` scripts of the same job, the step env, the job env,
    /// the workflow env, and the variables every runner sets.
    fn env_candidates(&self, site: &Site) -> Vec<Candidate> {
        let ctx = &site.snapshot.context;
        let tree = &site.snapshot.tree;
        let step = site.step();
        let job = site.job();
        let mut result = Vec::new();

        let step_start = step
            .map(|s| tree.get(s).span.start)
            .unwrap_or(site.offset);
        for env in &ctx.run_envs {
            let Some(owner) = env.owner else { continue };
            // GITHUB_ENV is per job; assignments never cross job boundaries
            let owner_job = tree.element_under_parent(owner, "jobs").map(|e| e.id);
            if owner_job != job {
                continue;
            }
            let owner_span = tree.get(owner).span;
            if owner_span.start < step_start {
                result.push(Candidate::new(env.name.clone(), env.value.clone()));
            }
        }
        for env in &ctx.envs {
            let visible = match env.owner {
                None => true,
                Some(owner) => Some(owner) == step || Some(owner) == job,
            };
            if visible {
                result.push(Candidate::new(env.name.clone(), env.value.clone()));
            }
        }
        result.extend(Candidate::from_table(builtins::DEFAULT_ENVS));
        result
    }

    /// Steps of the current job with an `id`. Inside the job's `outputs:`
    /// block every step is visible; elsewhere only steps declared before
    /// the current one.
    fn visible_steps<'a>(&self, site: &Site<'a>) -> impl Iterator<Item = &'a Symbol> {
        let job = site.job();
        let tree = &site.snapshot.tree;
        let all = site.in_outputs_block();
        let current_step = site.step();
        let limit = current_step
            .map(|s| tree.get(s).span.start)
            .unwrap_or(site.offset);
        site.snapshot.context.steps.iter().filter(move |s| {
            s.owner == job
                && Some(s.element) != current_step
                && (all || s.span.start < limit)
        })
    }

    /// Outputs a step provides: shell assignments in its `run:` script plus
    /// the declared outputs of the action it `uses:`.
    fn step_outputs(&self, site: &Site, step_element: ElementId) -> Vec<Candidate> {
        let ctx = &site.snapshot.context;
        let mut result = Candidate::from_symbols(ctx.run_outputs_of(step_element));
        if let (Some(actions), Some(uses)) = (site.actions, ctx.action_of(step_element)) {
            let metadata = actions.get(&uses.reference);
            if metadata.status == ActionStatus::Resolved {
                for (name, description) in &metadata.outputs {
                    result.push(Candidate::new(
                        name.clone(),
                        Some(description.clone()).filter(|d| !d.is_empty()),
                    ));
                }
            }
        }
        result
    }
}
