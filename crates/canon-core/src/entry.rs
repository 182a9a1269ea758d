//! Entries: the reorderable elements of a construct, and the key each one sorts by.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{Ast, Delimiters, NodeId, NodeKind};
use crate::source::SourceSpan;

static SHORTHAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A\w+:\z").expect("shorthand pattern is valid"));

/// True when an entry's own text is the abbreviated `key:` form with no value.
pub fn is_shorthand_text(text: &str) -> bool {
    SHORTHAND_RE.is_match(text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Pair,
    SymbolArgument,
    KeywordParameter,
}

/// A view over one pair, symbol argument or keyword parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<'a> {
    pub node: NodeId,
    pub kind: EntryKind,
    pub key: &'a str,
    pub text: &'a str,
    pub span: SourceSpan,
    pub shorthand: bool,
    pub line: usize,
}

impl<'a> Entry<'a> {
    fn new(ast: &'a Ast, node: NodeId, kind: EntryKind, key: &'a str) -> Self {
        let span = ast.span(node);
        let text = ast.source(node);
        Entry {
            node,
            kind,
            key,
            text,
            span,
            shorthand: is_shorthand_text(text),
            line: ast.buffer().first_line(span),
        }
    }

    /// A pair keyed by a symbol literal. Computed, string and other keys yield `None`.
    pub fn pair(ast: &'a Ast, node: NodeId) -> Option<Self> {
        let NodeKind::Pair { key, .. } = ast.kind(node) else {
            return None;
        };
        let name = ast.symbol_name(*key)?;
        Some(Entry::new(ast, node, EntryKind::Pair, name))
    }

    pub fn symbol_argument(ast: &'a Ast, node: NodeId) -> Option<Self> {
        let name = ast.symbol_name(node)?;
        Some(Entry::new(ast, node, EntryKind::SymbolArgument, name))
    }

    /// A required or optional keyword parameter; other parameter kinds yield `None`.
    pub fn keyword_parameter(ast: &'a Ast, node: NodeId) -> Option<Self> {
        match ast.kind(node) {
            NodeKind::Parameter {
                kind,
                name: Some(name),
                ..
            } if kind.is_keyword() => Some(Entry::new(
                ast,
                node,
                EntryKind::KeywordParameter,
                name.as_str(),
            )),
            _ => None,
        }
    }
}

/// Sibling entries evaluated together, plus the span that decides their layout.
#[derive(Debug, Clone)]
pub struct EntrySequence<'a> {
    pub entries: Vec<Entry<'a>>,
    pub container: SourceSpan,
    /// Explicit brackets around the container, when it has them.
    pub braces: Option<Delimiters>,
    /// A non-participating sibling sits between two entries.
    pub interleaved: bool,
}

impl<'a> EntrySequence<'a> {
    /// Builds a sequence from a container's children, keeping the ones `extract`
    /// accepts and noting whether any other child falls between them.
    pub fn from_siblings(
        siblings: &[NodeId],
        container: SourceSpan,
        braces: Option<Delimiters>,
        mut extract: impl FnMut(NodeId) -> Option<Entry<'a>>,
    ) -> Self {
        let mut entries = Vec::new();
        let mut gap = false;
        let mut interleaved = false;
        for &id in siblings {
            match extract(id) {
                Some(entry) => {
                    if gap {
                        interleaved = true;
                    }
                    entries.push(entry);
                }
                None if !entries.is_empty() => gap = true,
                None => {}
            }
        }
        EntrySequence {
            entries,
            container,
            braces,
            interleaved,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// From the first entry's start to the last entry's end.
    pub fn range(&self) -> SourceSpan {
        match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) => first.span.join(last.span),
            _ => self.container,
        }
    }

    pub fn has_duplicate_keys(&self) -> bool {
        let mut seen = std::collections::BTreeSet::new();
        self.entries.iter().any(|e| !seen.insert(e.key))
    }
}
