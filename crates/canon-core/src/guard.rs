//! Eligibility checks. A construct that fails any of them is skipped silently; that
//! is an intentional exclusion, never an error.

use std::collections::BTreeSet;

use crate::ast::{Ast, NodeId, NodeKind, ParamKind};
use crate::entry::{Entry, EntrySequence};
use crate::order::{is_identity, OrderingPolicy};

/// The pairs of an associative literal, if the literal can be reordered at all:
/// two or more entries, every key a symbol literal, no double splat, no duplicate key.
pub fn assoc_literal_sequence(ast: &Ast, literal: NodeId) -> Option<EntrySequence<'_>> {
    let NodeKind::AssocLiteral { braces, elements } = ast.kind(literal) else {
        return None;
    };
    if elements.len() < 2 {
        return None;
    }
    let entries = elements
        .iter()
        .map(|&id| Entry::pair(ast, id))
        .collect::<Option<Vec<_>>>()?;
    let seq = EntrySequence {
        entries,
        container: ast.span(literal),
        braces: *braces,
        interleaved: false,
    };
    if seq.has_duplicate_keys() {
        return None;
    }
    Some(seq)
}

/// The call whose argument list holds `literal`, looking through enclosing pairs and
/// literals (`enum(status: { ... })` belongs to `enum`).
pub fn enclosing_call(ast: &Ast, literal: NodeId) -> Option<NodeId> {
    let mut cur = literal;
    for ancestor in ast.ancestors(literal) {
        match ast.kind(ancestor) {
            NodeKind::Pair { .. } | NodeKind::AssocLiteral { .. } => cur = ancestor,
            NodeKind::Call { args, .. } if args.contains(&cur) => return Some(ancestor),
            _ => return None,
        }
    }
    None
}

pub fn callee_excluded(ast: &Ast, literal: NodeId, excluded: &BTreeSet<String>) -> bool {
    if excluded.is_empty() {
        return false;
    }
    match enclosing_call(ast, literal).map(|call| ast.kind(call)) {
        Some(NodeKind::Call { method, .. }) => excluded.contains(method),
        _ => false,
    }
}

/// Literal sequence that passes every check short of nesting.
pub fn eligible_assoc_literal<'a>(
    ast: &'a Ast,
    literal: NodeId,
    excluded: &BTreeSet<String>,
) -> Option<EntrySequence<'a>> {
    let seq = assoc_literal_sequence(ast, literal)?;
    if callee_excluded(ast, literal, excluded) {
        return None;
    }
    Some(seq)
}

/// An enclosing literal is itself eligible, out of order and correctable, so its
/// rewrite already covers this one. An ancestor held back by a loose comment carries
/// no edit and does not shadow its nested literals.
pub fn has_unsorted_ancestor_literal(
    ast: &Ast,
    literal: NodeId,
    excluded: &BTreeSet<String>,
    policy: OrderingPolicy,
) -> bool {
    ast.ancestors(literal)
        .filter(|&id| matches!(ast.kind(id), NodeKind::AssocLiteral { .. }))
        .filter_map(|id| eligible_assoc_literal(ast, id, excluded))
        .any(|seq| {
            !is_identity(&policy.canonical_order(&seq.entries)) && !has_loose_comment(ast, &seq)
        })
}

/// A call without an explicit receiver whose name is on the allow-list.
pub fn is_listed_call(ast: &Ast, call: NodeId, methods: &BTreeSet<String>) -> bool {
    match ast.kind(call) {
        NodeKind::Call {
            receiver: None,
            method,
            ..
        } => methods.contains(method),
        _ => false,
    }
}

/// The trailing keyword tail of a listed call.
pub fn keyword_argument_sequence<'a>(
    ast: &'a Ast,
    call: NodeId,
    methods: &BTreeSet<String>,
) -> Option<EntrySequence<'a>> {
    if !is_listed_call(ast, call, methods) {
        return None;
    }
    let NodeKind::Call { args, .. } = ast.kind(call) else {
        return None;
    };
    let tail = *args.last()?;
    let mut seq = assoc_literal_sequence(ast, tail)?;
    seq.container = seq.range();
    seq.braces = None;
    Some(seq)
}

/// The symbol-literal arguments of a listed call. Splat arguments disqualify the call.
pub fn symbol_argument_sequence<'a>(
    ast: &'a Ast,
    call: NodeId,
    methods: &BTreeSet<String>,
) -> Option<EntrySequence<'a>> {
    if !is_listed_call(ast, call, methods) {
        return None;
    }
    let NodeKind::Call { args, .. } = ast.kind(call) else {
        return None;
    };
    if args
        .iter()
        .any(|&a| matches!(ast.kind(a), NodeKind::Splat { .. }))
    {
        return None;
    }
    let mut seq = EntrySequence::from_siblings(args, ast.span(call), None, |id| {
        Entry::symbol_argument(ast, id)
    });
    if seq.len() < 2 || seq.has_duplicate_keys() {
        return None;
    }
    seq.container = seq.range();
    Some(seq)
}

/// Keyword parameters of a definition written on one line, without a keyword rest.
pub fn keyword_parameter_sequence(ast: &Ast, def: NodeId) -> Option<EntrySequence<'_>> {
    let NodeKind::Definition { params, .. } = ast.kind(def) else {
        return None;
    };
    if params.iter().any(|&p| {
        matches!(
            ast.kind(p),
            NodeKind::Parameter {
                kind: ParamKind::KeywordRest,
                ..
            }
        )
    }) {
        return None;
    }
    let mut seq = EntrySequence::from_siblings(params, ast.span(def), None, |id| {
        Entry::keyword_parameter(ast, id)
    });
    if seq.len() < 2 || seq.has_duplicate_keys() {
        return None;
    }
    seq.container = seq.range();
    if !ast.buffer().is_single_line(seq.container) {
        return None;
    }
    Some(seq)
}

/// A comment inside the container that no entry owns would be dropped or detached
/// by a rewrite.
pub fn has_loose_comment(ast: &Ast, seq: &EntrySequence<'_>) -> bool {
    ast.comments().iter().any(|c| {
        seq.container.contains(*c) && !seq.entries.iter().any(|e| e.span.contains(*c))
    })
}
