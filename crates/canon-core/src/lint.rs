use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::ast::Ast;
use crate::config::CanonConfig;
use crate::diagnostics::{Diagnostic, Location, Quickfix, QuickfixKind, Report, Severity, Stage};
use crate::edit::TextEdit;
use crate::rules::{self, Offense, RuleContext};
use crate::source::SourceSpan;

pub const DEFERRED_NOTE: &str = "correction deferred: overlaps another correction";

#[derive(Debug, Clone, Copy, Default)]
pub struct LintOptions {
    /// Attach quickfixes to diagnostics.
    pub autocorrect: bool,
}

/// Runs every enabled rule on every node of `ast`, parents before children.
///
/// Edits are admitted in visit order; an edit that would overlap one already admitted
/// is dropped from its diagnostic (the diagnostic itself stays), so the quickfixes of
/// one report can always be applied together.
pub fn lint_ast(ast: &Ast, config: &CanonConfig, options: LintOptions) -> Report {
    let rules = rules::registry(config);
    let cx = RuleContext { ast };

    let mut offenses: Vec<Offense> = Vec::new();
    for node in ast.preorder() {
        for rule in &rules {
            rule.check(&cx, node, &mut offenses);
        }
    }

    let mut admitted: Vec<SourceSpan> = Vec::new();
    let diagnostics = offenses
        .into_iter()
        .map(|offense| to_diagnostic(ast, offense, options, &mut admitted))
        .collect();
    Report::ok().with_diagnostics(diagnostics)
}

fn to_diagnostic(
    ast: &Ast,
    offense: Offense,
    options: LintOptions,
    admitted: &mut Vec<SourceSpan>,
) -> Diagnostic {
    let mut notes: Vec<String> = offense.note.into_iter().collect();
    let mut quickfix = None;
    if let (true, Some(edit)) = (options.autocorrect, offense.edit) {
        let span = edit.span();
        if admitted.iter().any(|a| a.overlaps(span)) {
            debug!(
                rule = offense.rule,
                start = span.start,
                end = span.end,
                "correction deferred"
            );
            notes.push(DEFERRED_NOTE.to_string());
        } else {
            admitted.push(span);
            quickfix = Some(Quickfix {
                kind: QuickfixKind::TextEdit,
                edits: vec![edit],
                note: None,
            });
        }
    }

    let mut data = BTreeMap::new();
    data.insert(
        "anchor".to_string(),
        Value::String(ast.buffer().slice(offense.anchor).to_string()),
    );

    Diagnostic {
        code: offense.rule.to_string(),
        severity: Severity::Warning,
        stage: Stage::Lint,
        message: offense.message,
        loc: Some(Location::from_source(ast.buffer(), offense.anchor)),
        notes,
        data,
        quickfix,
    }
}

/// All quickfix edits of a report, in offset order.
pub fn collect_edits(report: &Report) -> Vec<TextEdit> {
    let mut edits: Vec<TextEdit> = report
        .diagnostics
        .iter()
        .filter_map(|d| d.quickfix.as_ref())
        .flat_map(|q| q.edits.iter().cloned())
        .collect();
    edits.sort_by_key(|e| (e.start, e.end));
    edits
}
