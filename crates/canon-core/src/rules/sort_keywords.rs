use crate::ast::{NodeId, NodeKind};
use crate::config::RuleConfig;
use crate::guard;
use crate::order::OrderingPolicy;

use super::{reorder_offense, Offense, Rule, RuleContext, SORT_KEYWORDS};

pub(super) const MSG: &str = "Sort keyword arguments alphabetically.";

/// Sorted trailing keyword arguments of allow-listed DSL calls
/// (`attribute :name, alpha: false, zebra: true`). Calls with a receiver and
/// calls outside `Methods` are never touched.
pub struct SortKeywords {
    cfg: RuleConfig,
}

impl SortKeywords {
    pub fn new(cfg: RuleConfig) -> Self {
        Self { cfg }
    }
}

impl Rule for SortKeywords {
    fn name(&self) -> &'static str {
        SORT_KEYWORDS
    }

    fn check(&self, cx: &RuleContext<'_>, node: NodeId, out: &mut Vec<Offense>) {
        if !matches!(cx.ast.kind(node), NodeKind::Call { .. }) {
            return;
        }
        let Some(seq) = guard::keyword_argument_sequence(cx.ast, node, &self.cfg.methods) else {
            return;
        };
        let policy = OrderingPolicy {
            shorthands_first: self.cfg.shorthands_first,
        };
        out.extend(reorder_offense(
            cx,
            SORT_KEYWORDS,
            MSG,
            cx.ast.span(node),
            &seq,
            policy,
        ));
    }
}
