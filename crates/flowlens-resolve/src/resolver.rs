//! Whole-document validation.

use flowlens_actions::{ActionCache, ActionStatus};
use flowlens_context::Snapshot;
use flowlens_expr::PathExpression;
use flowlens_tree::{ElementId, Span};
use tracing::trace;

use crate::{Candidate, Diagnostic, DiagnosticKind, Fix, Namespace, Severity};
use crate::rules::Site;

/// Fields whose text is scanned for dotted references.
const EXPRESSION_FIELDS: &[&str] = &["if", "run", "id", "name", "with", "env", "outputs"];

/// Validates one [`Snapshot`].
pub struct Resolver<'a> {
    snapshot: &'a Snapshot,
    actions: Option<&'a ActionCache>,
}

/// Validate a snapshot, with action metadata when a cache is supplied.
pub fn validate(snapshot: &Snapshot, actions: Option<&ActionCache>) -> Vec<Diagnostic> {
    let mut resolver = Resolver::new(snapshot);
    if let Some(actions) = actions {
        resolver = resolver.with_actions(actions);
    }
    resolver.validate()
}

impl<'a> Resolver<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Resolver<'a> {
        Resolver {
            snapshot,
            actions: None,
        }
    }

    pub fn with_actions(mut self, actions: &'a ActionCache) -> Resolver<'a> {
        self.actions = Some(actions);
        self
    }

    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let expressions = self.collect_expressions();
        trace!(count = expressions.len(), "collected references");

        for (scope, expression) in &expressions {
            self.check_expression(*scope, expression, &mut diagnostics);
        }
        self.check_needs_lists(&expressions, &mut diagnostics);
        self.check_unused_outputs(&expressions, &mut diagnostics);
        self.check_actions(&mut diagnostics);

        diagnostics.sort_by_key(|d| (d.range.start, d.range.end));
        diagnostics
    }

    /// Every dotted reference in an expression-bearing field, with the leaf
    /// element holding it.
    fn collect_expressions(&self) -> Vec<(ElementId, PathExpression)> {
        let tree = &self.snapshot.tree;
        let mut found = Vec::new();
        for element in tree.iter() {
            let Some(text) = element.text.as_deref() else {
                continue;
            };
            let bearing = EXPRESSION_FIELDS
                .iter()
                .any(|field| tree.parent_with_key(element.id, field).is_some());
            if !bearing {
                continue;
            }
            for expression in flowlens_expr::scan(text, element.span.start) {
                found.push((element.id, expression));
            }
        }
        found
    }

    fn check_expression(
        &self,
        scope: ElementId,
        expression: &PathExpression,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let Some(namespace) = Namespace::parse(expression.segment_text(0)) else {
            return;
        };
        let mut site = Site::new(self.snapshot, scope, expression.span.start);
        if let Some(actions) = self.actions {
            site = site.with_actions(actions);
        }

        let segments: Vec<String> = expression
            .segments
            .iter()
            .map(|s| s.text.clone())
            .collect();
        let statement = segments.join(".");

        if namespace == Namespace::Secrets && site.in_if_field() {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::ForbiddenContext,
                    Severity::Error,
                    expression.span,
                    format!("Remove [{statement}] - Secrets are not valid in `if` statements"),
                )
                .with_fixes(vec![Fix {
                    label: format!("Remove [{statement}]"),
                    range: expression.span,
                    replacement: String::new(),
                }]),
            );
            return;
        }

        let rule = namespace.rule(&segments);
        let count = segments.len();

        if count < rule.min {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::StructuralIncomplete,
                Severity::Error,
                expression.span,
                format!("Incomplete statement [{statement}]"),
            ));
            return;
        }

        if let Some(max) = rule.max {
            if count > max {
                // the suffix starts at the dot before the first extra segment
                let range = Span::new(expression.segments[max].span.start - 1, expression.span.end);
                let suffix = format!(".{}", segments[max..].join("."));
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::StructuralOverflow,
                        Severity::Error,
                        range,
                        format!("Remove invalid suffix [{suffix}]"),
                    )
                    .with_fixes(vec![Fix {
                        label: format!("Remove invalid suffix [{suffix}]"),
                        range,
                        replacement: String::new(),
                    }]),
                );
                return;
            }
        }

        for index in 1..count {
            let Some(candidates) = namespace.candidates(&segments, index, &site) else {
                continue;
            };
            let segment = &expression.segments[index];
            if candidates.is_empty() {
                let range = Span::new(segment.span.start - 1, segment.span.end);
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::EmptyScope,
                        Severity::Error,
                        range,
                        format!("Delete invalid [{}]", segment.text),
                    )
                    .with_fixes(vec![Fix {
                        label: format!("Delete invalid [{}]", segment.text),
                        range,
                        replacement: String::new(),
                    }]),
                );
                return;
            }
            if candidates.iter().any(|c| c.name == segment.text) {
                continue;
            }

            // fixed connector segments get a delete, everything else a
            // ranked replace
            let connector = index == 2
                && matches!(
                    namespace,
                    Namespace::Steps | Namespace::Jobs | Namespace::Needs
                );
            let diagnostic = if connector {
                let range = Span::new(segment.span.start - 1, segment.span.end);
                let mut fixes = vec![Fix {
                    label: format!("Remove invalid [{}]", segment.text),
                    range,
                    replacement: String::new(),
                }];
                fixes.extend(replace_fixes(&candidates, &segment.text, segment.span, ""));
                Diagnostic::new(
                    DiagnosticKind::UndefinedReference,
                    Severity::Error,
                    range,
                    format!("Remove invalid [{}]", segment.text),
                )
                .with_fixes(fixes)
            } else if namespace == Namespace::Secrets {
                // secrets can arrive at runtime, so this is only a hint
                Diagnostic::new(
                    DiagnosticKind::UndefinedReference,
                    Severity::WeakWarning,
                    segment.span,
                    format!("Undefined secret [{}] - it may be provided at runtime", segment.text),
                )
                .with_fixes(replace_fixes(
                    &candidates,
                    &segment.text,
                    segment.span,
                    " - if it is not provided at runtime",
                ))
            } else {
                Diagnostic::new(
                    DiagnosticKind::UndefinedReference,
                    Severity::Error,
                    segment.span,
                    format!("Undefined reference [{}]", segment.text),
                )
                .with_fixes(replace_fixes(&candidates, &segment.text, segment.span, ""))
            };
            diagnostics.push(diagnostic);
            return;
        }
    }

    /// `needs:` lists may only name jobs declared earlier, and every
    /// declared need should be read somewhere in the job.
    fn check_needs_lists(
        &self,
        expressions: &[(ElementId, PathExpression)],
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let ctx = &self.snapshot.context;
        let tree = &self.snapshot.tree;
        for need in &ctx.needs {
            let Some(owner) = need.owner else { continue };
            let owner_span = tree.get(owner).span;
            let earlier_jobs: Vec<Candidate> = ctx
                .jobs
                .iter()
                .filter(|j| j.element != owner && j.span.start < owner_span.start)
                .map(|j| Candidate {
                    name: j.name.clone(),
                    detail: j.value.clone(),
                })
                .collect();

            if !earlier_jobs.iter().any(|j| j.name == need.name) {
                let mut fixes = vec![Fix {
                    label: format!("Remove invalid jobId [{}]", need.name),
                    range: need.span,
                    replacement: String::new(),
                }];
                fixes.extend(replace_fixes(&earlier_jobs, &need.name, need.span, ""));
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::UndefinedReference,
                        Severity::Error,
                        need.span,
                        format!(
                            "Remove invalid jobId [{}] - this jobId doesn't match any previous job",
                            need.name
                        ),
                    )
                    .with_fixes(fixes),
                );
                continue;
            }

            let used = expressions.iter().any(|(scope, e)| {
                e.segment_text(0) == "needs"
                    && e.segment_text(1) == need.name
                    && tree.is_ancestor(owner, *scope)
            });
            if !used {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::UnusedDeclaration,
                        Severity::WeakWarning,
                        need.span,
                        format!("Unused [{}]", need.name),
                    )
                    .with_fixes(vec![Fix {
                        label: format!("Remove unused [{}]", need.name),
                        range: need.span,
                        replacement: String::new(),
                    }]),
                );
            }
        }
    }

    /// Job outputs nothing reads through `needs.<job>.outputs.<key>` or
    /// `jobs.<job>.outputs.<key>`.
    fn check_unused_outputs(
        &self,
        expressions: &[(ElementId, PathExpression)],
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let ctx = &self.snapshot.context;
        for output in &ctx.outputs {
            let Some(owner) = output.owner else { continue };
            let Some(job) = ctx.jobs.iter().find(|j| j.element == owner) else {
                continue;
            };
            let used = expressions.iter().any(|(_, e)| {
                let root = e.segment_text(0);
                (root == "needs" || root == "jobs")
                    && e.segment_text(1) == job.name
                    && e.segment_text(2) == "outputs"
                    && e.segment_text(3) == output.name
            });
            if !used {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnusedDeclaration,
                    Severity::WeakWarning,
                    output.span,
                    format!("Unused [{}]", output.name),
                ));
            }
        }
    }

    /// `uses:` references and their `with:` blocks.
    fn check_actions(&self, diagnostics: &mut Vec<Diagnostic>) {
        let Some(actions) = self.actions else { return };
        let ctx = &self.snapshot.context;
        let tree = &self.snapshot.tree;
        for used in &ctx.actions_used {
            let metadata = actions.get(&used.reference);
            match metadata.status {
                ActionStatus::Unresolved => {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UnresolvedAction,
                        Severity::WeakWarning,
                        used.span,
                        format!("Unresolved action [{}]", used.reference),
                    ));
                }
                ActionStatus::Resolved => {
                    let Some(with) = tree.child_with_key(used.owner, "with") else {
                        continue;
                    };
                    for entry in tree.children(with.id) {
                        let Some(key) = entry.key.as_deref() else { continue };
                        if metadata.inputs.contains_key(key) {
                            continue;
                        }
                        let range = entry.key_span.unwrap_or(entry.span);
                        diagnostics.push(
                            Diagnostic::new(
                                DiagnosticKind::UndefinedReference,
                                Severity::Error,
                                range,
                                format!("Delete invalid input [{key}]"),
                            )
                            .with_fixes(vec![Fix {
                                label: format!("Delete invalid input [{key}]"),
                                range: entry.span,
                                replacement: String::new(),
                            }]),
                        );
                    }
                }
                ActionStatus::Local => {}
            }
        }
    }
}

/// Replacement fixes ranked by edit distance, declaration order breaking
/// ties.
fn replace_fixes(
    candidates: &[Candidate],
    typed: &str,
    range: Span,
    label_suffix: &str,
) -> Vec<Fix> {
    let mut ranked: Vec<(usize, usize, &Candidate)> = candidates
        .iter()
        .enumerate()
        .map(|(order, c)| (crate::levenshtein(&c.name, typed), order, c))
        .collect();
    ranked.sort_by_key(|(distance, order, _)| (*distance, *order));
    ranked
        .into_iter()
        .map(|(_, _, c)| Fix {
            label: format!("Replace with [{}]{label_suffix}", c.name),
            range,
            replacement: c.name.clone(),
        })
        .collect()
}
