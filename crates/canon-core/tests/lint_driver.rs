mod common;

use canon_core::ast::Ast;
use canon_core::autocorrect::{autocorrect, MAX_PASSES};
use canon_core::config::CanonConfig;
use canon_core::lint::{lint_ast, LintOptions, DEFERRED_NOTE};
use canon_reader::read_source;
use serde_json::json;

use common::{fix, lint};

fn defaults() -> CanonConfig {
    CanonConfig::default()
}

fn config(v: serde_json::Value) -> CanonConfig {
    CanonConfig::from_value(&v).expect("config")
}

#[test]
fn overlapping_corrections_are_deferred_to_the_next_pass() {
    let cfg = defaults();
    let src = "name = 1\nage = 2\n{name: name, age: age}\n";
    let report = lint(src, &cfg);
    let codes: Vec<&str> = report.diagnostics.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(
        codes,
        vec![
            "Canon/SortHash",
            "Canon/KeywordShorthand",
            "Canon/KeywordShorthand"
        ]
    );
    assert!(report.diagnostics[0].quickfix.is_some());
    for d in &report.diagnostics[1..] {
        assert!(d.quickfix.is_none());
        assert_eq!(d.notes, vec![DEFERRED_NOTE.to_string()]);
    }

    let fixed = fix(src, &cfg);
    assert_eq!(fixed.text, "name = 1\nage = 2\n{age:, name:}\n");
    assert_eq!(fixed.applied, 3);
    assert_eq!(fixed.passes, 3);
}

#[test]
fn keyword_tail_is_corrected_once_when_two_rules_report_it() {
    let cfg = config(json!({
        "Canon/SortKeywords": { "Methods": ["attribute"] },
    }));
    let src = "attribute :name, zebra: true, alpha: false\n";
    let report = lint(src, &cfg);
    assert_eq!(report.diagnostics.len(), 2);
    let keywords = report
        .diagnostics
        .iter()
        .find(|d| d.code == "Canon/SortKeywords")
        .expect("SortKeywords diagnostic");
    let hash = report
        .diagnostics
        .iter()
        .find(|d| d.code == "Canon/SortHash")
        .expect("SortHash diagnostic");
    assert!(keywords.quickfix.is_some());
    assert!(hash.quickfix.is_none());
    assert!(hash.notes.contains(&DEFERRED_NOTE.to_string()));

    let fixed = fix(src, &cfg);
    assert_eq!(fixed.text, "attribute :name, alpha: false, zebra: true\n");
    assert_eq!(fixed.passes, 2);
    assert_eq!(fixed.applied, 1);
}

#[test]
fn quickfixes_are_only_attached_when_correcting() {
    let ast = read_source("{b: 1, a: 2}\n").expect("read");
    let report = lint_ast(&ast, &defaults(), LintOptions::default());
    assert_eq!(report.diagnostics.len(), 1);
    assert!(!report.ok);
    assert!(report.diagnostics[0].quickfix.is_none());
    assert!(report.diagnostics[0].notes.is_empty());
}

#[test]
fn report_json_shape() {
    let report = lint("x = {b: 1, a: 2}\n", &defaults());
    let v = serde_json::to_value(&report).expect("serialize report");
    assert_eq!(v["schema_version"], "canon.report@0.1.0");
    assert_eq!(v["ok"], false);

    let d = &v["diagnostics"][0];
    assert_eq!(d["code"], "Canon/SortHash");
    assert_eq!(d["severity"], "warning");
    assert_eq!(d["stage"], "lint");
    assert_eq!(d["data"]["anchor"], "{b: 1, a: 2}");
    assert_eq!(d["loc"]["kind"], "text");
    assert_eq!(d["loc"]["span"]["start"]["line"], 1);
    assert_eq!(d["loc"]["span"]["start"]["col"], 5);
    assert_eq!(d["loc"]["snippet"], "x = {b: 1, a: 2}");
    assert_eq!(d["quickfix"]["kind"], "text_edit");
    assert_eq!(d["quickfix"]["edits"][0]["replacement"], "a: 2, b: 1");
    assert!(d.get("notes").is_none());
}

#[test]
fn clean_source_takes_one_pass() {
    let cfg = defaults();
    let src = "def foo(alpha:, zebra:)\n  {a: 1, b: 2}\nend\n";
    let fixed = fix(src, &cfg);
    assert_eq!(fixed.text, src);
    assert_eq!(fixed.passes, 1);
    assert_eq!(fixed.applied, 0);
    assert!(lint(src, &cfg).ok);
}

#[test]
fn correcting_twice_changes_nothing() {
    let cfg = config(json!({
        "Canon/SortMethodArguments": { "Methods": ["attr_reader"] },
    }));
    let src = "class Widget\n  attr_reader :zebra, :alpha\n\n  def build(zebra:, alpha:)\n    opts = {\n      zebra: zebra,\n      alpha: alpha,\n    }\n  end\nend\n";
    let once = fix(src, &cfg);
    assert_eq!(
        once.text,
        "class Widget\n  attr_reader :alpha, :zebra\n\n  def build(alpha:, zebra:)\n    opts = {\n      alpha:,\n      zebra:,\n    }\n  end\nend\n"
    );
    let twice = fix(&once.text, &cfg);
    assert_eq!(twice.text, once.text);
    assert_eq!(twice.applied, 0);
    assert!(lint(&once.text, &cfg).ok);
}

#[test]
fn correction_is_a_permutation_of_the_entries() {
    let cfg = defaults();
    let src = "x = {delta: 4, alpha: [1, 2], charlie: foo(3), bravo: 'b'}\n";
    let fixed = fix(src, &cfg).text;
    assert_eq!(
        fixed,
        "x = {alpha: [1, 2], bravo: 'b', charlie: foo(3), delta: 4}\n"
    );
    let mut before: Vec<char> = src.chars().collect();
    let mut after: Vec<char> = fixed.chars().collect();
    before.sort_unstable();
    after.sort_unstable();
    assert_eq!(before, after);
}

#[test]
fn reader_failure_stops_autocorrect() {
    let err = autocorrect("{b: 1, a: 2}\n", &defaults(), |_: &str| {
        Err::<Ast, _>("boom")
    })
    .expect_err("reader always fails");
    assert_eq!(err.pass, 1);
    assert_eq!(err.message, "read failed: boom");
    assert_eq!(err.to_string(), "autocorrect pass 1: read failed: boom");
}

#[test]
fn pass_limit_bounds_the_loop() {
    // the reader hands back the same unsorted source no matter what was applied
    let fixed = autocorrect("{b: 1, a: 2}\n", &defaults(), |_: &str| {
        read_source("{b: 1, a: 2}\n")
    })
    .expect("autocorrect");
    assert_eq!(fixed.passes, MAX_PASSES);
    assert_eq!(fixed.applied, MAX_PASSES);
}
