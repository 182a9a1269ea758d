mod common;

use canon_core::config::CanonConfig;
use canon_core::rules::RULES;
use serde_json::json;

use common::{expect_correction, expect_no_offenses, expect_offense, lint, only};

fn config() -> CanonConfig {
    only("Canon/KeywordShorthand", json!({}))
}

fn message(name: &str) -> String {
    format!("Use Ruby 3 keyword shorthand `{name}:` instead of `{name}: {name}`.")
}

#[test]
fn redundant_keyword_value_is_abbreviated() {
    let cfg = config();
    let src = "name = 'x'\nfoo(name: name)\n";
    expect_offense(src, &cfg, "name: name", &message("name"));
    expect_correction(src, &cfg, "name = 'x'\nfoo(name:)\n");
}

#[test]
fn listed_description_matches_the_emitted_message() {
    let (_, description) = RULES
        .iter()
        .find(|(rule, _)| *rule == "Canon/KeywordShorthand")
        .expect("KeywordShorthand is listed");
    let report = lint("name = 1\nfoo(name: name)\n", &config());
    assert_eq!(report.diagnostics[0].message, *description);
    assert_eq!(
        lint("label = 1\nfoo(label: label)\n", &config()).diagnostics[0].message,
        message("label")
    );
}

#[test]
fn hash_literal_pairs_are_abbreviated() {
    let cfg = config();
    let src = "name = 1\nage = 2\n{name: name, age: age}\n";
    let report = lint(src, &cfg);
    assert_eq!(report.diagnostics.len(), 2);
    assert_eq!(report.diagnostics[0].message, message("name"));
    assert_eq!(report.diagnostics[1].message, message("age"));
    assert!(report.diagnostics.iter().all(|d| d.quickfix.is_some()));
    expect_correction(src, &cfg, "name = 1\nage = 2\n{name:, age:}\n");
}

#[test]
fn method_parameters_count_as_locals() {
    expect_correction(
        "def build(name)\n  bar(name: name)\nend\n",
        &config(),
        "def build(name)\n  bar(name:)\nend\n",
    );
}

#[test]
fn pairs_that_are_not_redundant_are_accepted() {
    let cfg = config();
    expect_no_offenses("name = 1\nfoo(name:)\n", &cfg);
    expect_no_offenses("other = 1\nfoo(name: other)\n", &cfg);
    expect_no_offenses("name = 1\nfoo('name' => name)\n", &cfg);
    expect_no_offenses("name = 1\nfoo(:name => name)\n", &cfg);
    expect_no_offenses("foo(name: @name)\n", &cfg);
    // not a local variable, so `name` is a method call
    expect_no_offenses("foo(name: name)\n", &cfg);
}

#[test]
fn trailing_modifier_keeps_the_value() {
    let cfg = config();
    expect_no_offenses("name = 1\nfoo(name: name) if ok\n", &cfg);
    expect_no_offenses("name = 1\nfoo(name: name) unless ok\n", &cfg);
}

#[test]
fn block_after_the_call_keeps_the_value() {
    let cfg = config();
    expect_no_offenses("name = 1\nfoo(name: name) do\n  bar\nend\n", &cfg);
    expect_no_offenses("name = 1\nfoo(name: name) { bar }\n", &cfg);
}

#[test]
fn comment_on_the_line_keeps_the_value() {
    expect_no_offenses("name = 1\nfoo(name: name) # keep\n", &config());
}

#[test]
fn only_the_last_pair_of_a_sole_argument_is_protected() {
    let cfg = config();
    expect_correction(
        "name = 1\nfoo(name: name, age: 1) if ok\n",
        &cfg,
        "name = 1\nfoo(name:, age: 1) if ok\n",
    );
    expect_correction(
        "name = 1\nfoo(1, name: name) if ok\n",
        &cfg,
        "name = 1\nfoo(1, name:) if ok\n",
    );
    expect_correction(
        "name = 1\nobj.foo(name: name) if ok\n",
        &cfg,
        "name = 1\nobj.foo(name:) if ok\n",
    );
}
