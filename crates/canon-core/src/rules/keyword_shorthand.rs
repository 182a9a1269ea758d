use tracing::debug;

use crate::ast::{Ast, ConditionalKeyword, NodeId, NodeKind};
use crate::edit::TextEdit;
use crate::entry::is_shorthand_text;

use super::{Offense, Rule, RuleContext, KEYWORD_SHORTHAND};

/// Written for a local called `name`; [`message`] substitutes the real one.
pub(super) const MSG: &str = "Use Ruby 3 keyword shorthand `name:` instead of `name: name`.";

fn message(name: &str) -> String {
    MSG.replace("name", name)
}

/// Abbreviates `name: name` to `name:` when the value is a local variable of the same
/// name.
///
/// Skipped when a comment shares the pair's line, and for the last pair of the sole
/// argument of a receiver-less call that is followed by a trailing modifier
/// (`foo(name: name) if ok`) or a block (`foo(name: name) do ... end`).
pub struct KeywordShorthand;

impl Rule for KeywordShorthand {
    fn name(&self) -> &'static str {
        KEYWORD_SHORTHAND
    }

    fn check(&self, cx: &RuleContext<'_>, node: NodeId, out: &mut Vec<Offense>) {
        let ast = cx.ast;
        let Some(name) = redundant_pair_name(ast, node) else {
            return;
        };
        let span = ast.span(node);
        if ast.comment_on_line(ast.buffer().first_line(span)) {
            return;
        }
        if let Some(call) = trailing_sole_argument_call(ast, node) {
            if precedes_modifier(ast, call) || precedes_block(ast, call) {
                return;
            }
        }
        debug!(
            rule = KEYWORD_SHORTHAND,
            name,
            start = span.start,
            "redundant keyword value"
        );
        out.push(Offense {
            rule: KEYWORD_SHORTHAND,
            message: message(name),
            anchor: span,
            edit: Some(TextEdit::replace(span, format!("{name}:"))),
            note: None,
        });
    }
}

/// The key name of a `key: key` pair whose value is a local variable.
fn redundant_pair_name(ast: &Ast, pair: NodeId) -> Option<&str> {
    let NodeKind::Pair {
        key,
        value: Some(value),
        colon: true,
    } = ast.kind(pair)
    else {
        return None;
    };
    let name = ast.symbol_name(*key)?;
    match ast.kind(*value) {
        NodeKind::LocalVariable { name: var } if var == name => {}
        _ => return None,
    }
    if is_shorthand_text(ast.source(pair).trim()) {
        return None;
    }
    Some(name)
}

/// The receiver-less call whose only argument is the literal ending in `pair`.
fn trailing_sole_argument_call(ast: &Ast, pair: NodeId) -> Option<NodeId> {
    let literal = ast.parent(pair)?;
    let NodeKind::AssocLiteral { elements, .. } = ast.kind(literal) else {
        return None;
    };
    if elements.last() != Some(&pair) {
        return None;
    }
    let call = ast.parent(literal)?;
    match ast.kind(call) {
        NodeKind::Call {
            receiver: None,
            args,
            ..
        } if args.as_slice() == [literal] => Some(call),
        _ => None,
    }
}

fn precedes_modifier(ast: &Ast, call: NodeId) -> bool {
    let Some(parent) = ast.parent(call) else {
        return false;
    };
    matches!(
        ast.kind(parent),
        NodeKind::Conditional { keyword, modifier: true, .. } if *keyword != ConditionalKeyword::Elsif
    )
}

fn precedes_block(ast: &Ast, call: NodeId) -> bool {
    let Some(parent) = ast.parent(call) else {
        return false;
    };
    matches!(ast.kind(parent), NodeKind::Block { call: c, .. } if *c == call)
}
