//! Rule drivers. Each rule looks at one visited node, asks the guards whether the
//! construct is eligible, and reports an [`Offense`] with an optional edit.

mod keyword_shorthand;
mod sort_hash;
mod sort_keywords;
mod sort_method_arguments;
mod sort_method_definition;

use tracing::debug;

use crate::ast::{Ast, NodeId};
use crate::config::CanonConfig;
use crate::edit::TextEdit;
use crate::entry::EntrySequence;
use crate::guard;
use crate::order::{is_identity, OrderingPolicy};
use crate::rewrite;
use crate::source::SourceSpan;

pub use keyword_shorthand::KeywordShorthand;
pub use sort_hash::SortHash;
pub use sort_keywords::SortKeywords;
pub use sort_method_arguments::SortMethodArguments;
pub use sort_method_definition::SortMethodDefinition;

pub const SORT_HASH: &str = "Canon/SortHash";
pub const SORT_KEYWORDS: &str = "Canon/SortKeywords";
pub const SORT_METHOD_ARGUMENTS: &str = "Canon/SortMethodArguments";
pub const SORT_METHOD_DEFINITION: &str = "Canon/SortMethodDefinition";
pub const KEYWORD_SHORTHAND: &str = "Canon/KeywordShorthand";

/// Every rule name with a one-line description, in registry order.
pub const RULES: &[(&str, &str)] = &[
    (SORT_HASH, sort_hash::MSG),
    (SORT_KEYWORDS, sort_keywords::MSG),
    (SORT_METHOD_ARGUMENTS, sort_method_arguments::MSG),
    (SORT_METHOD_DEFINITION, sort_method_definition::MSG),
    (KEYWORD_SHORTHAND, keyword_shorthand::MSG),
];

pub struct RuleContext<'a> {
    pub ast: &'a Ast,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offense {
    pub rule: &'static str,
    pub message: String,
    pub anchor: SourceSpan,
    pub edit: Option<TextEdit>,
    /// Why `edit` is absent, when the offense is real but not safely correctable.
    pub note: Option<String>,
}

pub trait Rule {
    fn name(&self) -> &'static str;

    fn check(&self, cx: &RuleContext<'_>, node: NodeId, out: &mut Vec<Offense>);
}

/// The enabled rules, in a fixed order.
pub fn registry(config: &CanonConfig) -> Vec<Box<dyn Rule>> {
    let mut rules: Vec<Box<dyn Rule>> = Vec::new();
    let hash = config.rule(SORT_HASH);
    if hash.enabled {
        rules.push(Box::new(SortHash::new(hash)));
    }
    let keywords = config.rule(SORT_KEYWORDS);
    if keywords.enabled {
        rules.push(Box::new(SortKeywords::new(keywords)));
    }
    let arguments = config.rule(SORT_METHOD_ARGUMENTS);
    if arguments.enabled {
        rules.push(Box::new(SortMethodArguments::new(arguments)));
    }
    if config.rule(SORT_METHOD_DEFINITION).enabled {
        rules.push(Box::new(SortMethodDefinition));
    }
    if config.rule(KEYWORD_SHORTHAND).enabled {
        rules.push(Box::new(KeywordShorthand));
    }
    rules
}

/// Shared tail of the four ordering rules: compare against canonical order and, when
/// it differs, report at `anchor` with the rewrite as the edit.
fn reorder_offense(
    cx: &RuleContext<'_>,
    rule: &'static str,
    message: &str,
    anchor: SourceSpan,
    seq: &EntrySequence<'_>,
    policy: OrderingPolicy,
) -> Option<Offense> {
    let order = policy.canonical_order(&seq.entries);
    if is_identity(&order) {
        return None;
    }
    debug!(
        rule,
        start = anchor.start,
        end = anchor.end,
        entries = seq.len(),
        "unsorted sequence"
    );
    let (edit, note) = if guard::has_loose_comment(cx.ast, seq) {
        (
            None,
            Some("not corrected: a comment between entries would be displaced".to_string()),
        )
    } else {
        (Some(rewrite::rewrite(cx.ast.buffer(), seq, &order)), None)
    };
    Some(Offense {
        rule,
        message: message.to_string(),
        anchor,
        edit,
        note,
    })
}
