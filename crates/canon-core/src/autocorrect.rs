use std::fmt::Display;

use tracing::debug;

use crate::ast::Ast;
use crate::config::CanonConfig;
use crate::edit::apply_edits;
use crate::lint::{collect_edits, lint_ast, LintOptions};

/// Upper bound on read-lint-apply rounds for one buffer.
pub const MAX_PASSES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corrected {
    pub text: String,
    pub passes: usize,
    pub applied: usize,
}

#[derive(Debug, Clone)]
pub struct AutocorrectError {
    pub pass: usize,
    pub message: String,
}

impl std::fmt::Display for AutocorrectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "autocorrect pass {}: {}", self.pass, self.message)
    }
}

impl std::error::Error for AutocorrectError {}

/// Repeats read, lint and apply until a pass produces no edit or [`MAX_PASSES`] is
/// reached. Deferred corrections (nested literals, overlapping edits) land on later
/// passes.
pub fn autocorrect<E: Display>(
    source: &str,
    config: &CanonConfig,
    mut read: impl FnMut(&str) -> Result<Ast, E>,
) -> Result<Corrected, AutocorrectError> {
    let mut text = source.to_string();
    let mut applied = 0usize;
    let mut passes = 0usize;

    while passes < MAX_PASSES {
        passes += 1;
        let ast = read(&text).map_err(|err| AutocorrectError {
            pass: passes,
            message: format!("read failed: {err}"),
        })?;
        let report = lint_ast(&ast, config, LintOptions { autocorrect: true });
        let edits = collect_edits(&report);
        if edits.is_empty() {
            break;
        }
        debug!(pass = passes, edits = edits.len(), "applying corrections");
        text = apply_edits(&text, &edits).map_err(|err| AutocorrectError {
            pass: passes,
            message: err.to_string(),
        })?;
        applied += edits.len();
    }

    Ok(Corrected {
        text,
        passes,
        applied,
    })
}
