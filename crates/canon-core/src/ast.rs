//! The narrow node view the engine reads.
//!
//! A front end adapts its own syntax tree into this arena at the boundary. Only the
//! constructs the rules inspect get a dedicated [`NodeKind`]; everything else is
//! [`NodeKind::Opaque`] with its children preserved so that parent links and
//! ancestor queries stay accurate.

use crate::source::{SourceBuffer, SourceSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Opening and closing delimiter tokens of a bracketed construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub open: SourceSpan,
    pub close: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Required,
    Optional,
    Rest,
    Keyword,
    OptionalKeyword,
    KeywordRest,
    Block,
}

impl ParamKind {
    pub fn is_keyword(self) -> bool {
        matches!(self, ParamKind::Keyword | ParamKind::OptionalKeyword)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalKeyword {
    If,
    Unless,
    Elsif,
    While,
    Until,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Program {
        body: Vec<NodeId>,
    },
    /// `{ a: 1 }`, or a brace-less keyword tail when `braces` is `None`.
    AssocLiteral {
        braces: Option<Delimiters>,
        elements: Vec<NodeId>,
    },
    Pair {
        key: NodeId,
        /// `None` for the abbreviated `key:` form.
        value: Option<NodeId>,
        /// `key: value` rather than `key => value`.
        colon: bool,
    },
    Symbol {
        name: String,
    },
    Str {
        value: String,
    },
    LocalVariable {
        name: String,
    },
    Splat {
        value: NodeId,
    },
    DoubleSplat {
        value: NodeId,
    },
    Call {
        receiver: Option<NodeId>,
        method: String,
        selector: SourceSpan,
        args: Vec<NodeId>,
    },
    Block {
        call: NodeId,
        params: Vec<NodeId>,
        body: Vec<NodeId>,
    },
    Definition {
        keyword: SourceSpan,
        name: String,
        singleton: Option<NodeId>,
        params: Vec<NodeId>,
        body: Vec<NodeId>,
    },
    Parameter {
        kind: ParamKind,
        name: Option<String>,
        default: Option<NodeId>,
    },
    Conditional {
        keyword: ConditionalKeyword,
        keyword_span: SourceSpan,
        /// Trailing form (`body if cond`), which has no `end` terminator.
        modifier: bool,
        condition: NodeId,
        body: Vec<NodeId>,
        else_body: Vec<NodeId>,
    },
    Assignment {
        name: String,
        value: NodeId,
    },
    Opaque {
        children: Vec<NodeId>,
    },
}

impl NodeKind {
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Program { body } => body.clone(),
            NodeKind::AssocLiteral { elements, .. } => elements.clone(),
            NodeKind::Pair { key, value, .. } => std::iter::once(*key).chain(*value).collect(),
            NodeKind::Symbol { .. } | NodeKind::Str { .. } | NodeKind::LocalVariable { .. } => {
                Vec::new()
            }
            NodeKind::Splat { value } | NodeKind::DoubleSplat { value } => vec![*value],
            NodeKind::Call { receiver, args, .. } => {
                receiver.iter().chain(args.iter()).copied().collect()
            }
            NodeKind::Block { call, params, body } => std::iter::once(*call)
                .chain(params.iter().copied())
                .chain(body.iter().copied())
                .collect(),
            NodeKind::Definition {
                singleton,
                params,
                body,
                ..
            } => singleton
                .iter()
                .chain(params.iter())
                .chain(body.iter())
                .copied()
                .collect(),
            NodeKind::Parameter { default, .. } => default.iter().copied().collect(),
            NodeKind::Conditional {
                condition,
                body,
                else_body,
                ..
            } => std::iter::once(*condition)
                .chain(body.iter().copied())
                .chain(else_body.iter().copied())
                .collect(),
            NodeKind::Assignment { value, .. } => vec![*value],
            NodeKind::Opaque { children } => children.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: SourceSpan,
    pub parent: Option<NodeId>,
}

/// One parsed file: the node arena, its root, the comment spans and the buffer.
#[derive(Debug, Clone)]
pub struct Ast {
    buffer: SourceBuffer,
    nodes: Vec<Node>,
    root: NodeId,
    comments: Vec<SourceSpan>,
}

impl Ast {
    pub fn buffer(&self) -> &SourceBuffer {
        &self.buffer
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn comments(&self) -> &[SourceSpan] {
        &self.comments
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn span(&self, id: NodeId) -> SourceSpan {
        self.node(id).span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Raw source text of a node.
    pub fn source(&self, id: NodeId) -> &str {
        self.buffer.slice(self.span(id))
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            ast: self,
            next: self.parent(id),
        }
    }

    /// Node ids in pre-order, parents before children, siblings in source order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children = self.kind(id).children();
            children.sort_by_key(|c| self.span(*c).start);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    pub fn comment_on_line(&self, line: usize) -> bool {
        self.comments
            .iter()
            .any(|c| self.buffer.line_of(c.start) == line)
    }

    pub fn symbol_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Symbol { name } => Some(name.as_str()),
            _ => None,
        }
    }
}

pub struct Ancestors<'a> {
    ast: &'a Ast,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.ast.parent(id);
        Some(id)
    }
}

/// Bottom-up arena construction. Pushing a node adopts every child it names, so a
/// front end that builds children first ends up with consistent parent links.
#[derive(Debug)]
pub struct AstBuilder {
    buffer: SourceBuffer,
    nodes: Vec<Node>,
    comments: Vec<SourceSpan>,
}

impl AstBuilder {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            buffer: SourceBuffer::new(text),
            nodes: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn buffer(&self) -> &SourceBuffer {
        &self.buffer
    }

    pub fn push(&mut self, kind: NodeKind, span: SourceSpan) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in kind.children() {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
        });
        id
    }

    pub fn span(&self, id: NodeId) -> SourceSpan {
        self.nodes[id.index()].span
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn comment(&mut self, span: SourceSpan) {
        self.comments.push(span);
    }

    pub fn finish(self, root: NodeId) -> Ast {
        Ast {
            buffer: self.buffer,
            nodes: self.nodes,
            root,
            comments: self.comments,
        }
    }
}
