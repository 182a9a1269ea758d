mod common;

use canon_core::config::CanonConfig;
use serde_json::json;

use common::{expect_correction, expect_no_offenses, expect_offense, only};

const MSG: &str = "Sort symbol arguments alphabetically.";

fn config() -> CanonConfig {
    only(
        "Canon/SortMethodArguments",
        json!({ "Methods": ["attr_reader", "delegate"] }),
    )
}

#[test]
fn unsorted_symbols_are_reported_at_the_selector() {
    let cfg = config();
    expect_offense("attr_reader :zebra, :alpha\n", &cfg, "attr_reader", MSG);
    expect_correction("attr_reader :zebra, :alpha\n", &cfg, "attr_reader :alpha, :zebra\n");
}

#[test]
fn sorted_single_and_foreign_calls_are_accepted() {
    let cfg = config();
    expect_no_offenses("attr_reader :alpha, :zebra\n", &cfg);
    expect_no_offenses("attr_reader :name\n", &cfg);
    expect_no_offenses("other_method :zebra, :alpha\n", &cfg);
    expect_no_offenses("obj.attr_reader :zebra, :alpha\n", &cfg);
}

#[test]
fn splats_and_duplicates_disqualify_the_call() {
    let cfg = config();
    expect_no_offenses("attr_reader :zebra, *names, :alpha\n", &cfg);
    expect_no_offenses("attr_reader :zebra, :alpha, :zebra\n", &cfg);
}

#[test]
fn multi_line_arguments_align_to_the_first_symbol() {
    let cfg = config();
    let src = "attr_reader :zebra,\n            :alpha\n";
    expect_offense(src, &cfg, "attr_reader", MSG);
    expect_correction(src, &cfg, "attr_reader :alpha,\n            :zebra\n");
}

#[test]
fn trailing_keyword_arguments_stay_in_place() {
    let cfg = config();
    let src = "delegate :zebra, :alpha, to: :target\n";
    expect_offense(src, &cfg, "delegate", MSG);
    expect_correction(src, &cfg, "delegate :alpha, :zebra, to: :target\n");
}

#[test]
fn three_or_more_arguments() {
    expect_correction(
        "attr_reader :charlie, :alpha, :bravo\n",
        &config(),
        "attr_reader :alpha, :bravo, :charlie\n",
    );
}

#[test]
fn interleaved_arguments_keep_their_slots() {
    expect_correction(
        "delegate :bravo, other, :alpha, to: :target\n",
        &config(),
        "delegate :alpha, other, :bravo, to: :target\n",
    );
    expect_correction(
        "delegate :charlie, 'x',\n         :alpha, :bravo\n",
        &config(),
        "delegate :alpha, 'x',\n         :bravo, :charlie\n",
    );
}

#[test]
fn parenthesized_call() {
    expect_correction(
        "private(:zebra, :alpha)\n",
        &only(
            "Canon/SortMethodArguments",
            json!({ "Methods": ["private"] }),
        ),
        "private(:alpha, :zebra)\n",
    );
}

#[test]
fn empty_allow_list_means_no_call_is_checked() {
    let cfg = only("Canon/SortMethodArguments", json!({ "Methods": [] }));
    expect_no_offenses("attr_reader :zebra, :alpha\n", &cfg);
}
