#![allow(dead_code)]

use canon_core::autocorrect::{autocorrect, Corrected};
use canon_core::config::CanonConfig;
use canon_core::diagnostics::{Diagnostic, Location, Report};
use canon_core::lint::{lint_ast, LintOptions};
use canon_core::rules::RULES;
use canon_reader::read_source;
use serde_json::{json, Map, Value};

/// A configuration with every rule disabled except `rule`, which gets `settings`.
pub fn only(rule: &str, settings: Value) -> CanonConfig {
    let mut doc = Map::new();
    for (name, _) in RULES {
        doc.insert(name.to_string(), json!({ "Enabled": false }));
    }
    let mut section = settings.as_object().cloned().unwrap_or_default();
    section.insert("Enabled".to_string(), Value::Bool(true));
    doc.insert(rule.to_string(), Value::Object(section));
    CanonConfig::from_value(&Value::Object(doc)).expect("test config")
}

pub fn lint(text: &str, config: &CanonConfig) -> Report {
    let ast = read_source(text).unwrap_or_else(|err| panic!("read {text:?}: {err}"));
    lint_ast(&ast, config, LintOptions { autocorrect: true })
}

pub fn fix(text: &str, config: &CanonConfig) -> Corrected {
    autocorrect(text, config, read_source).unwrap_or_else(|err| panic!("autocorrect: {err}"))
}

pub fn correct(text: &str, config: &CanonConfig) -> String {
    fix(text, config).text
}

/// The source text a diagnostic points at.
pub fn highlighted<'a>(text: &'a str, d: &Diagnostic) -> &'a str {
    let Some(Location::Text { span, .. }) = &d.loc else {
        panic!("diagnostic without a text location: {d:?}");
    };
    let start = span.start.offset.expect("start offset") as usize;
    let end = span.end.offset.expect("end offset") as usize;
    &text[start..end]
}

/// Exactly one offense, pointing at `highlight`, carrying `message`.
pub fn expect_offense(text: &str, config: &CanonConfig, highlight: &str, message: &str) {
    let report = lint(text, config);
    assert_eq!(
        report.diagnostics.len(),
        1,
        "expected one offense in {text:?}, got {:#?}",
        report.diagnostics
    );
    let d = &report.diagnostics[0];
    assert_eq!(highlighted(text, d), highlight);
    assert_eq!(d.message, message);
}

pub fn expect_no_offenses(text: &str, config: &CanonConfig) {
    let report = lint(text, config);
    assert!(
        report.diagnostics.is_empty(),
        "expected no offenses in {text:?}, got {:#?}",
        report.diagnostics
    );
    assert!(report.ok);
}

pub fn expect_correction(text: &str, config: &CanonConfig, expected: &str) {
    assert_eq!(correct(text, config), expected, "correcting {text:?}");
}
