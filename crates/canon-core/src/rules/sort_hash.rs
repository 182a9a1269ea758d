use crate::ast::{NodeId, NodeKind};
use crate::config::RuleConfig;
use crate::guard;
use crate::order::OrderingPolicy;

use super::{reorder_offense, Offense, Rule, RuleContext, SORT_HASH};

pub(super) const MSG: &str = "Sort hash keys alphabetically.";

/// Sorted associative literals, braced or brace-less.
///
/// ```ruby
/// {b: 1, a: 2}   # bad
/// {a: 2, b: 1}   # good
/// ```
///
/// A literal inside an enclosing literal that is itself out of order is left for the
/// next pass, so the two rewrites never overlap. When the enclosing literal cannot be
/// corrected because of a loose comment, the nested literal is reported on its own.
pub struct SortHash {
    cfg: RuleConfig,
}

impl SortHash {
    pub fn new(cfg: RuleConfig) -> Self {
        Self { cfg }
    }

    fn policy(&self) -> OrderingPolicy {
        OrderingPolicy {
            shorthands_first: self.cfg.shorthands_first,
        }
    }
}

impl Rule for SortHash {
    fn name(&self) -> &'static str {
        SORT_HASH
    }

    fn check(&self, cx: &RuleContext<'_>, node: NodeId, out: &mut Vec<Offense>) {
        if !matches!(cx.ast.kind(node), NodeKind::AssocLiteral { .. }) {
            return;
        }
        let excluded = &self.cfg.exclude_methods;
        let Some(seq) = guard::eligible_assoc_literal(cx.ast, node, excluded) else {
            return;
        };
        if guard::has_unsorted_ancestor_literal(cx.ast, node, excluded, self.policy()) {
            return;
        }
        out.extend(reorder_offense(
            cx,
            SORT_HASH,
            MSG,
            cx.ast.span(node),
            &seq,
            self.policy(),
        ));
    }
}
