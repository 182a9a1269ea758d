use crate::ast::{NodeId, NodeKind};
use crate::guard;
use crate::order::OrderingPolicy;

use super::{reorder_offense, Offense, Rule, RuleContext, SORT_METHOD_DEFINITION};

pub(super) const MSG: &str = "Sort keyword arguments alphabetically.";

/// Sorted keyword parameters in `def` and `def self.` signatures. Only signatures
/// whose keyword parameters sit on one line are checked.
pub struct SortMethodDefinition;

impl Rule for SortMethodDefinition {
    fn name(&self) -> &'static str {
        SORT_METHOD_DEFINITION
    }

    fn check(&self, cx: &RuleContext<'_>, node: NodeId, out: &mut Vec<Offense>) {
        let NodeKind::Definition { keyword, .. } = cx.ast.kind(node) else {
            return;
        };
        let Some(seq) = guard::keyword_parameter_sequence(cx.ast, node) else {
            return;
        };
        out.extend(reorder_offense(
            cx,
            SORT_METHOD_DEFINITION,
            MSG,
            *keyword,
            &seq,
            OrderingPolicy::alphabetical(),
        ));
    }
}
