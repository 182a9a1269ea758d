use crate::ast::{NodeId, NodeKind};
use crate::config::RuleConfig;
use crate::guard;
use crate::order::OrderingPolicy;

use super::{reorder_offense, Offense, Rule, RuleContext, SORT_METHOD_ARGUMENTS};

pub(super) const MSG: &str = "Sort symbol arguments alphabetically.";

/// Sorted symbol arguments of allow-listed calls such as `attr_reader` or
/// `delegate`. Other arguments keep their positions.
pub struct SortMethodArguments {
    cfg: RuleConfig,
}

impl SortMethodArguments {
    pub fn new(cfg: RuleConfig) -> Self {
        Self { cfg }
    }
}

impl Rule for SortMethodArguments {
    fn name(&self) -> &'static str {
        SORT_METHOD_ARGUMENTS
    }

    fn check(&self, cx: &RuleContext<'_>, node: NodeId, out: &mut Vec<Offense>) {
        let NodeKind::Call { selector, .. } = cx.ast.kind(node) else {
            return;
        };
        let Some(seq) = guard::symbol_argument_sequence(cx.ast, node, &self.cfg.methods) else {
            return;
        };
        out.extend(reorder_offense(
            cx,
            SORT_METHOD_ARGUMENTS,
            MSG,
            *selector,
            &seq,
            OrderingPolicy::alphabetical(),
        ));
    }
}
