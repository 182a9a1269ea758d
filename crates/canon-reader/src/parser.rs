//! Hand-written recursive descent over the token stream, building the
//! `canon-core` node view bottom-up.

use std::collections::BTreeSet;

use canon_core::ast::{
    Ast, AstBuilder, ConditionalKeyword, Delimiters, NodeId, NodeKind, ParamKind,
};
use canon_core::source::SourceSpan;

use crate::token::{Keyword, Token, TokenKind};
use crate::ReadError;

type PResult<T> = Result<T, ReadError>;

/// Local variable names visible in one lexical scope. `def`, `class` and `module`
/// bodies open a hard scope that hides everything outside; blocks see through.
struct Scope {
    locals: BTreeSet<String>,
    hard: bool,
}

enum Argument {
    Positional(NodeId),
    /// A pair or double splat, collected into the brace-less keyword tail.
    Element(NodeId),
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    builder: AstBuilder,
    scopes: Vec<Scope>,
    /// Inside an unparenthesized argument list, where `do` belongs to the command.
    in_command_args: bool,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, builder: AstBuilder) -> Self {
        Self {
            tokens,
            pos: 0,
            builder,
            scopes: vec![Scope {
                locals: BTreeSet::new(),
                hard: true,
            }],
            in_command_args: false,
        }
    }

    pub fn comment(&mut self, span: SourceSpan) {
        self.builder.comment(span);
    }

    pub fn parse_program(mut self) -> PResult<Ast> {
        let body = self.parse_statements(|_| false)?;
        if !self.at_eof() {
            return Err(self.unexpected());
        }
        let len = self.builder.buffer().len();
        let root = self.push(NodeKind::Program { body }, SourceSpan::new(0, len));
        Ok(self.builder.finish(root))
    }

    // -----------------------------------------------------------------------
    // Token helpers
    // -----------------------------------------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_nth(&self, n: usize) -> &Token {
        let i = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[i]
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn check_kw(&self, kw: Keyword) -> bool {
        matches!(self.peek(), TokenKind::Keyword(k) if *k == kw)
    }

    fn eat(&mut self, kind: &TokenKind) -> Option<Token> {
        self.check(kind).then(|| self.advance())
    }

    fn eat_kw(&mut self, kw: Keyword) -> Option<Token> {
        self.check_kw(kw).then(|| self.advance())
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> PResult<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        Err(self.error_here(format!("expected {what}, found {}", self.describe_current())))
    }

    fn expect_kw(&mut self, kw: Keyword) -> PResult<Token> {
        if self.check_kw(kw) {
            return Ok(self.advance());
        }
        Err(self.error_here(format!(
            "expected `{}`, found {}",
            kw.as_str(),
            self.describe_current()
        )))
    }

    /// The current token continues the line of the previous one.
    fn same_line(&self) -> bool {
        !self.current().newline_before
    }

    fn describe_current(&self) -> String {
        let tok = self.current();
        match tok.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("`{}`", self.builder.buffer().slice(tok.span)),
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ReadError {
        ReadError::at(self.builder.buffer(), self.current().span.start, message)
    }

    fn unexpected(&self) -> ReadError {
        self.error_here(format!("unexpected {}", self.describe_current()))
    }

    fn unexpected_token(&self, tok: &Token) -> ReadError {
        ReadError::at(
            self.builder.buffer(),
            tok.span.start,
            format!("unexpected `{}`", self.builder.buffer().slice(tok.span)),
        )
    }

    // -----------------------------------------------------------------------
    // Arena and scope helpers
    // -----------------------------------------------------------------------

    fn push(&mut self, kind: NodeKind, span: SourceSpan) -> NodeId {
        self.builder.push(kind, span)
    }

    fn leaf(&mut self, span: SourceSpan) -> NodeId {
        self.push(NodeKind::Opaque { children: Vec::new() }, span)
    }

    fn span(&self, id: NodeId) -> SourceSpan {
        self.builder.span(id)
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.locals.insert(name.to_string());
        }
    }

    fn is_local(&self, name: &str) -> bool {
        for scope in self.scopes.iter().rev() {
            if scope.locals.contains(name) {
                return true;
            }
            if scope.hard {
                break;
            }
        }
        false
    }

    fn with_scope<T>(
        &mut self,
        hard: bool,
        f: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        self.scopes.push(Scope {
            locals: BTreeSet::new(),
            hard,
        });
        let out = f(self);
        self.scopes.pop();
        out
    }

    fn with_command_args<T>(
        &mut self,
        inside: bool,
        f: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        let saved = std::mem::replace(&mut self.in_command_args, inside);
        let out = f(self);
        self.in_command_args = saved;
        out
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    fn parse_statements(&mut self, stop: fn(&TokenKind) -> bool) -> PResult<Vec<NodeId>> {
        let mut body = Vec::new();
        loop {
            while self.eat(&TokenKind::Semicolon).is_some() {}
            if self.at_eof() || stop(self.peek()) {
                break;
            }
            body.push(self.parse_statement()?);
            if self.at_eof() || stop(self.peek()) || self.check(&TokenKind::Semicolon) {
                continue;
            }
            if self.same_line() {
                return Err(self.unexpected());
            }
        }
        Ok(body)
    }

    /// One statement, wrapped by any trailing `if`/`unless`/`while`/`until` modifiers.
    fn parse_statement(&mut self) -> PResult<NodeId> {
        let mut stmt = self.parse_expression_statement()?;
        while self.same_line() {
            let keyword = match self.peek() {
                TokenKind::Keyword(Keyword::If) => ConditionalKeyword::If,
                TokenKind::Keyword(Keyword::Unless) => ConditionalKeyword::Unless,
                TokenKind::Keyword(Keyword::While) => ConditionalKeyword::While,
                TokenKind::Keyword(Keyword::Until) => ConditionalKeyword::Until,
                _ => break,
            };
            let kw = self.advance();
            let condition = self.parse_expr()?;
            let span = self.span(stmt).join(self.span(condition));
            stmt = self.push(
                NodeKind::Conditional {
                    keyword,
                    keyword_span: kw.span,
                    modifier: true,
                    condition,
                    body: vec![stmt],
                    else_body: Vec::new(),
                },
                span,
            );
        }
        Ok(stmt)
    }

    fn parse_expression_statement(&mut self) -> PResult<NodeId> {
        let next = &self.peek_nth(1).kind;
        let assigns = matches!(next, TokenKind::Assign | TokenKind::OpAssign(_));
        match self.peek().clone() {
            TokenKind::Ident(name) if assigns => {
                let target = self.advance();
                self.advance();
                self.declare(&name);
                let value = self.parse_statement_value()?;
                let span = target.span.join(self.span(value));
                Ok(self.push(NodeKind::Assignment { name, value }, span))
            }
            TokenKind::IVar(_) | TokenKind::Const(_) if assigns => {
                let target = self.advance();
                self.advance();
                let value = self.parse_statement_value()?;
                let span = target.span.join(self.span(value));
                Ok(self.push(
                    NodeKind::Opaque {
                        children: vec![value],
                    },
                    span,
                ))
            }
            _ => self.parse_expr(),
        }
    }

    /// Right-hand side of an assignment, which may itself be an assignment.
    fn parse_statement_value(&mut self) -> PResult<NodeId> {
        self.parse_expression_statement()
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    /// Binary operators are read loosely: one precedence level, left-associative.
    fn parse_expr(&mut self) -> PResult<NodeId> {
        let mut lhs = self.parse_unary()?;
        loop {
            let tok = self.current();
            let binary = match &tok.kind {
                TokenKind::Op(op) => {
                    !tok.newline_before && !matches!(op.as_str(), "!" | "~" | "->")
                }
                TokenKind::Star | TokenKind::DoubleStar => !tok.newline_before,
                TokenKind::Keyword(Keyword::And | Keyword::Or) => true,
                _ => false,
            };
            if !binary {
                break;
            }
            self.advance();
            let rhs = self.parse_unary()?;
            let span = self.span(lhs).join(self.span(rhs));
            lhs = self.push(
                NodeKind::Opaque {
                    children: vec![lhs, rhs],
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<NodeId> {
        let prefix = match self.peek() {
            TokenKind::Op(op) => matches!(op.as_str(), "!" | "-" | "+" | "~"),
            TokenKind::Keyword(Keyword::Not) => true,
            _ => false,
        };
        if !prefix {
            return self.parse_postfix();
        }
        let tok = self.advance();
        let operand = self.parse_unary()?;
        let span = tok.span.join(self.span(operand));
        Ok(self.push(
            NodeKind::Opaque {
                children: vec![operand],
            },
            span,
        ))
    }

    fn parse_postfix(&mut self) -> PResult<NodeId> {
        let mut node = self.parse_primary()?;
        loop {
            let tok = self.current().clone();
            match tok.kind {
                TokenKind::Dot | TokenKind::SafeNav => {
                    self.advance();
                    let (method, selector) = self.parse_method_name()?;
                    node = self.parse_call_rest(Some(node), method, selector)?;
                }
                TokenKind::ColonColon => {
                    self.advance();
                    let name = self.advance();
                    if !matches!(name.kind, TokenKind::Const(_) | TokenKind::Ident(_)) {
                        return Err(self.unexpected_token(&name));
                    }
                    let span = self.span(node).join(name.span);
                    node = self.push(
                        NodeKind::Opaque {
                            children: vec![node],
                        },
                        span,
                    );
                }
                TokenKind::LBracket if !tok.space_before => {
                    self.advance();
                    let mut children = vec![node];
                    children.extend(self.with_command_args(false, |p| {
                        p.parse_call_args(Some(TokenKind::RBracket))
                    })?);
                    let close = self.expect(&TokenKind::RBracket, "`]`")?;
                    let span = self.span(node).join(close.span);
                    node = self.push(NodeKind::Opaque { children }, span);
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_method_name(&mut self) -> PResult<(String, SourceSpan)> {
        let tok = self.advance();
        let name = match &tok.kind {
            TokenKind::Ident(name) | TokenKind::Const(name) => name.clone(),
            TokenKind::Keyword(kw) => kw.as_str().to_string(),
            _ => return Err(self.unexpected_token(&tok)),
        };
        Ok((name, tok.span))
    }

    fn parse_primary(&mut self) -> PResult<NodeId> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Ident(name) => {
                self.advance();
                let tight_paren = self.check(&TokenKind::LParen) && !self.current().space_before;
                if self.is_local(&name) && !tight_paren {
                    return Ok(self.push(NodeKind::LocalVariable { name }, tok.span));
                }
                self.parse_call_rest(None, name, tok.span)
            }
            TokenKind::Const(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) && !self.current().space_before {
                    return self.parse_call_rest(None, name, tok.span);
                }
                Ok(self.leaf(tok.span))
            }
            TokenKind::IVar(_)
            | TokenKind::Number(_)
            | TokenKind::Keyword(
                Keyword::Nil | Keyword::True | Keyword::False | Keyword::SelfValue,
            ) => {
                self.advance();
                Ok(self.leaf(tok.span))
            }
            TokenKind::Str(value) => {
                self.advance();
                Ok(self.push(NodeKind::Str { value }, tok.span))
            }
            TokenKind::Symbol(name) => {
                self.advance();
                Ok(self.push(NodeKind::Symbol { name }, tok.span))
            }
            TokenKind::Keyword(Keyword::Def) => self.parse_def(),
            TokenKind::Keyword(Keyword::If | Keyword::Unless) => self.parse_if(),
            TokenKind::Keyword(Keyword::While | Keyword::Until) => self.parse_loop(),
            TokenKind::Keyword(Keyword::Class | Keyword::Module) => self.parse_namespace(),
            TokenKind::Keyword(Keyword::Return | Keyword::Yield) => self.parse_jump(),
            TokenKind::LBracket => {
                self.advance();
                let children = self.with_command_args(false, |p| {
                    p.parse_call_args(Some(TokenKind::RBracket))
                })?;
                let close = self.expect(&TokenKind::RBracket, "`]`")?;
                Ok(self.push(NodeKind::Opaque { children }, tok.span.join(close.span)))
            }
            TokenKind::LBrace => self.parse_hash(),
            TokenKind::LParen => {
                self.advance();
                let inner = self.with_command_args(false, |p| p.parse_statement())?;
                let close = self.expect(&TokenKind::RParen, "`)`")?;
                Ok(self.push(
                    NodeKind::Opaque {
                        children: vec![inner],
                    },
                    tok.span.join(close.span),
                ))
            }
            TokenKind::Label(_) => Err(self.error_here(
                "a `key:` label is only supported in an argument list or hash literal",
            )),
            _ => Err(self.unexpected()),
        }
    }

    // -----------------------------------------------------------------------
    // Calls, arguments and blocks
    // -----------------------------------------------------------------------

    /// Arguments, then an optional block, after a method name has been read.
    fn parse_call_rest(
        &mut self,
        receiver: Option<NodeId>,
        method: String,
        selector: SourceSpan,
    ) -> PResult<NodeId> {
        let start = receiver.map_or(selector.start, |r| self.span(r).start);
        let mut end = selector.end;
        let mut args = Vec::new();
        if self.check(&TokenKind::LParen) && !self.current().space_before {
            self.advance();
            args = self.with_command_args(false, |p| p.parse_call_args(Some(TokenKind::RParen)))?;
            end = self.expect(&TokenKind::RParen, "`)`")?.span.end;
        } else if self.starts_command_arg() {
            args = self.with_command_args(true, |p| p.parse_call_args(None))?;
            if let Some(last) = args.last() {
                end = self.span(*last).end;
            }
        }
        let call = self.push(
            NodeKind::Call {
                receiver,
                method,
                selector,
                args,
            },
            SourceSpan::new(start, end),
        );
        self.parse_block(call)
    }

    /// Whether the current token opens an unparenthesized argument list.
    fn starts_command_arg(&self) -> bool {
        let tok = self.current();
        if tok.newline_before || !tok.space_before {
            return false;
        }
        let next_tight = !self.peek_nth(1).space_before;
        match &tok.kind {
            TokenKind::Ident(_)
            | TokenKind::Const(_)
            | TokenKind::IVar(_)
            | TokenKind::Label(_)
            | TokenKind::Symbol(_)
            | TokenKind::Str(_)
            | TokenKind::Number(_)
            | TokenKind::LBracket
            | TokenKind::LParen => true,
            TokenKind::Keyword(kw) => matches!(
                kw,
                Keyword::Nil | Keyword::True | Keyword::False | Keyword::SelfValue | Keyword::Not
            ),
            TokenKind::Star | TokenKind::DoubleStar | TokenKind::Amp => next_tight,
            TokenKind::Op(op) => matches!(op.as_str(), "!" | "-") && next_tight,
            _ => false,
        }
    }

    /// Comma-separated arguments. Trailing pairs and double splats are grouped into a
    /// brace-less [`NodeKind::AssocLiteral`] spanning first to last element.
    fn parse_call_args(&mut self, closer: Option<TokenKind>) -> PResult<Vec<NodeId>> {
        let mut args = Vec::new();
        let mut tail = Vec::new();
        if closer.as_ref().is_some_and(|c| self.check(c)) {
            return Ok(args);
        }
        loop {
            match self.parse_argument()? {
                Argument::Element(el) => tail.push(el),
                Argument::Positional(arg) => {
                    self.flush_tail(&mut tail, &mut args);
                    args.push(arg);
                }
            }
            if self.eat(&TokenKind::Comma).is_none() {
                break;
            }
            if closer.as_ref().is_some_and(|c| self.check(c)) {
                break;
            }
        }
        self.flush_tail(&mut tail, &mut args);
        Ok(args)
    }

    fn flush_tail(&mut self, tail: &mut Vec<NodeId>, args: &mut Vec<NodeId>) {
        let span = match (tail.first(), tail.last()) {
            (Some(first), Some(last)) => self.span(*first).join(self.span(*last)),
            _ => return,
        };
        let elements = std::mem::take(tail);
        args.push(self.push(
            NodeKind::AssocLiteral {
                braces: None,
                elements,
            },
            span,
        ));
    }

    fn parse_argument(&mut self) -> PResult<Argument> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Star => {
                self.advance();
                let value = self.parse_expr()?;
                let span = tok.span.join(self.span(value));
                Ok(Argument::Positional(
                    self.push(NodeKind::Splat { value }, span),
                ))
            }
            TokenKind::DoubleStar => Ok(Argument::Element(self.parse_double_splat()?)),
            TokenKind::Amp => {
                self.advance();
                let value = self.parse_expr()?;
                let span = tok.span.join(self.span(value));
                Ok(Argument::Positional(self.push(
                    NodeKind::Opaque {
                        children: vec![value],
                    },
                    span,
                )))
            }
            TokenKind::Label(_) => Ok(Argument::Element(self.parse_label_pair()?)),
            _ => {
                let key = self.parse_expr()?;
                if self.check(&TokenKind::Arrow) {
                    return Ok(Argument::Element(self.parse_arrow_pair(key)?));
                }
                Ok(Argument::Positional(key))
            }
        }
    }

    fn parse_block(&mut self, call: NodeId) -> PResult<NodeId> {
        let tok = self.current();
        if tok.newline_before {
            return Ok(call);
        }
        let braced = match tok.kind {
            TokenKind::Keyword(Keyword::Do) if !self.in_command_args => false,
            TokenKind::LBrace => true,
            _ => return Ok(call),
        };
        self.advance();
        let (params, body, close) = self.with_scope(false, |p| {
            p.with_command_args(false, |p| {
                let params = if p.eat(&TokenKind::Pipe).is_some() {
                    let params = p.parse_param_list(Some(TokenKind::Pipe))?;
                    p.expect(&TokenKind::Pipe, "`|`")?;
                    params
                } else {
                    Vec::new()
                };
                let (body, close) = if braced {
                    let body = p.parse_statements(|k| matches!(k, TokenKind::RBrace))?;
                    (body, p.expect(&TokenKind::RBrace, "`}`")?)
                } else {
                    let body = p.parse_statements(is_end)?;
                    (body, p.expect_kw(Keyword::End)?)
                };
                Ok((params, body, close))
            })
        })?;
        let span = self.span(call).join(close.span);
        Ok(self.push(NodeKind::Block { call, params, body }, span))
    }

    // -----------------------------------------------------------------------
    // Hash literals and pairs
    // -----------------------------------------------------------------------

    fn parse_hash(&mut self) -> PResult<NodeId> {
        let open = self.advance();
        let elements = self.with_command_args(false, |p| {
            let mut elements = Vec::new();
            while !p.check(&TokenKind::RBrace) {
                let element = match p.peek().clone() {
                    TokenKind::Label(_) => p.parse_label_pair()?,
                    TokenKind::DoubleStar => p.parse_double_splat()?,
                    _ => {
                        let key = p.parse_expr()?;
                        if !p.check(&TokenKind::Arrow) {
                            return Err(p.error_here(format!(
                                "expected `=>` in hash literal, found {}",
                                p.describe_current()
                            )));
                        }
                        p.parse_arrow_pair(key)?
                    }
                };
                elements.push(element);
                if p.eat(&TokenKind::Comma).is_none() {
                    break;
                }
            }
            Ok(elements)
        })?;
        let close = self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(self.push(
            NodeKind::AssocLiteral {
                braces: Some(Delimiters {
                    open: open.span,
                    close: close.span,
                }),
                elements,
            },
            open.span.join(close.span),
        ))
    }

    /// `key: value`, or the abbreviated `key:` when nothing follows on the line.
    fn parse_label_pair(&mut self) -> PResult<NodeId> {
        let tok = self.advance();
        let name = match &tok.kind {
            TokenKind::Label(name) => name.clone(),
            _ => return Err(self.unexpected_token(&tok)),
        };
        let key_span = SourceSpan::new(tok.span.start, tok.span.end - 1);
        let key = self.push(NodeKind::Symbol { name }, key_span);
        let value = if self.label_value_omitted() {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let end = value.map_or(tok.span.end, |v| self.span(v).end);
        Ok(self.push(
            NodeKind::Pair {
                key,
                value,
                colon: true,
            },
            SourceSpan::new(tok.span.start, end),
        ))
    }

    fn parse_arrow_pair(&mut self, key: NodeId) -> PResult<NodeId> {
        self.expect(&TokenKind::Arrow, "`=>`")?;
        let value = self.parse_expr()?;
        let span = self.span(key).join(self.span(value));
        Ok(self.push(
            NodeKind::Pair {
                key,
                value: Some(value),
                colon: false,
            },
            span,
        ))
    }

    fn parse_double_splat(&mut self) -> PResult<NodeId> {
        let tok = self.advance();
        let value = self.parse_expr()?;
        let span = tok.span.join(self.span(value));
        Ok(self.push(NodeKind::DoubleSplat { value }, span))
    }

    fn label_value_omitted(&self) -> bool {
        let tok = self.current();
        tok.newline_before
            || matches!(
                tok.kind,
                TokenKind::Comma
                    | TokenKind::RParen
                    | TokenKind::RBrace
                    | TokenKind::RBracket
                    | TokenKind::Pipe
                    | TokenKind::Semicolon
                    | TokenKind::Eof
                    | TokenKind::Keyword(
                        Keyword::If
                            | Keyword::Unless
                            | Keyword::While
                            | Keyword::Until
                            | Keyword::Do
                            | Keyword::Then
                            | Keyword::End
                            | Keyword::And
                            | Keyword::Or
                    )
            )
    }

    // -----------------------------------------------------------------------
    // Definitions and parameters
    // -----------------------------------------------------------------------

    fn parse_def(&mut self) -> PResult<NodeId> {
        let kw = self.advance();
        let mut singleton = None;
        if self.check_kw(Keyword::SelfValue) && self.peek_nth(1).kind == TokenKind::Dot {
            let receiver = self.advance();
            singleton = Some(self.leaf(receiver.span));
            self.advance();
        }
        let name_tok = self.advance();
        let mut name = match &name_tok.kind {
            TokenKind::Ident(name) | TokenKind::Const(name) | TokenKind::Op(name) => name.clone(),
            TokenKind::Keyword(k) => k.as_str().to_string(),
            _ => return Err(self.unexpected_token(&name_tok)),
        };
        // setter: `def name=(value)`
        if self.check(&TokenKind::Assign)
            && !self.current().space_before
            && self.peek_nth(1).kind == TokenKind::LParen
        {
            self.advance();
            name.push('=');
        }

        self.with_scope(true, |p| {
            let params = if p.check(&TokenKind::LParen) {
                p.advance();
                let params =
                    p.with_command_args(false, |p| p.parse_param_list(Some(TokenKind::RParen)))?;
                p.expect(&TokenKind::RParen, "`)`")?;
                params
            } else if p.same_line() && starts_param(p.peek()) {
                p.parse_param_list(None)?
            } else {
                Vec::new()
            };

            // endless form: `def name(args) = expr`
            if p.eat(&TokenKind::Assign).is_some() {
                let stmt = p.parse_statement()?;
                let span = kw.span.join(p.span(stmt));
                return Ok(p.push(
                    NodeKind::Definition {
                        keyword: kw.span,
                        name,
                        singleton,
                        params,
                        body: vec![stmt],
                    },
                    span,
                ));
            }

            let body = p.with_command_args(false, |p| p.parse_statements(is_end))?;
            let end = p.expect_kw(Keyword::End)?;
            Ok(p.push(
                NodeKind::Definition {
                    keyword: kw.span,
                    name,
                    singleton,
                    params,
                    body,
                },
                kw.span.join(end.span),
            ))
        })
    }

    fn parse_param_list(&mut self, closer: Option<TokenKind>) -> PResult<Vec<NodeId>> {
        let mut params = Vec::new();
        if closer.as_ref().is_some_and(|c| self.check(c)) {
            return Ok(params);
        }
        loop {
            params.push(self.parse_param()?);
            if self.eat(&TokenKind::Comma).is_none() {
                break;
            }
        }
        Ok(params)
    }

    fn parse_param(&mut self) -> PResult<NodeId> {
        let tok = self.advance();
        let mut end = tok.span.end;
        let (kind, name, default) = match tok.kind.clone() {
            TokenKind::Ident(name) => {
                if self.eat(&TokenKind::Assign).is_some() {
                    let default = self.parse_expr()?;
                    end = self.span(default).end;
                    (ParamKind::Optional, Some(name), Some(default))
                } else {
                    (ParamKind::Required, Some(name), None)
                }
            }
            TokenKind::Label(name) => {
                if self.label_value_omitted() {
                    (ParamKind::Keyword, Some(name), None)
                } else {
                    let default = self.parse_expr()?;
                    end = self.span(default).end;
                    (ParamKind::OptionalKeyword, Some(name), Some(default))
                }
            }
            TokenKind::Star | TokenKind::DoubleStar | TokenKind::Amp => {
                let kind = match tok.kind {
                    TokenKind::Star => ParamKind::Rest,
                    TokenKind::DoubleStar => ParamKind::KeywordRest,
                    _ => ParamKind::Block,
                };
                let next = self.current().clone();
                let name = match next.kind {
                    TokenKind::Ident(name) if !next.space_before => Some(name),
                    // `**nil`
                    TokenKind::Keyword(Keyword::Nil) if !next.space_before => None,
                    _ => {
                        return Ok(self.push(
                            NodeKind::Parameter {
                                kind,
                                name: None,
                                default: None,
                            },
                            tok.span,
                        ))
                    }
                };
                self.advance();
                end = next.span.end;
                (kind, name, None)
            }
            _ => return Err(self.unexpected_token(&tok)),
        };
        if let Some(name) = &name {
            self.declare(name);
        }
        Ok(self.push(
            NodeKind::Parameter {
                kind,
                name,
                default,
            },
            SourceSpan::new(tok.span.start, end),
        ))
    }

    // -----------------------------------------------------------------------
    // Control flow and namespaces
    // -----------------------------------------------------------------------

    /// Block-form `if`/`unless`; an `elsif` chain nests as the else branch.
    fn parse_if(&mut self) -> PResult<NodeId> {
        let kw = self.advance();
        let keyword = match kw.kind {
            TokenKind::Keyword(Keyword::Unless) => ConditionalKeyword::Unless,
            TokenKind::Keyword(Keyword::Elsif) => ConditionalKeyword::Elsif,
            _ => ConditionalKeyword::If,
        };
        let condition = self.parse_expr()?;
        self.eat_kw(Keyword::Then);
        let body = self.with_command_args(false, |p| p.parse_statements(is_clause_end))?;

        let mut else_body = Vec::new();
        let end = if self.check_kw(Keyword::Elsif) {
            let nested = self.parse_if()?;
            else_body.push(nested);
            self.span(nested).end
        } else {
            if self.eat_kw(Keyword::Else).is_some() {
                else_body = self.with_command_args(false, |p| p.parse_statements(is_end))?;
            }
            self.expect_kw(Keyword::End)?.span.end
        };
        Ok(self.push(
            NodeKind::Conditional {
                keyword,
                keyword_span: kw.span,
                modifier: false,
                condition,
                body,
                else_body,
            },
            SourceSpan::new(kw.span.start, end),
        ))
    }

    fn parse_loop(&mut self) -> PResult<NodeId> {
        let kw = self.advance();
        let keyword = match kw.kind {
            TokenKind::Keyword(Keyword::Until) => ConditionalKeyword::Until,
            _ => ConditionalKeyword::While,
        };
        let condition = self.with_command_args(true, |p| p.parse_expr())?;
        self.eat_kw(Keyword::Do);
        let body = self.with_command_args(false, |p| p.parse_statements(is_end))?;
        let end = self.expect_kw(Keyword::End)?;
        Ok(self.push(
            NodeKind::Conditional {
                keyword,
                keyword_span: kw.span,
                modifier: false,
                condition,
                body,
                else_body: Vec::new(),
            },
            kw.span.join(end.span),
        ))
    }

    /// `class Name [< Super] ... end` and `module Name ... end`.
    fn parse_namespace(&mut self) -> PResult<NodeId> {
        let kw = self.advance();
        let mut children = vec![self.parse_postfix()?];
        if matches!(kw.kind, TokenKind::Keyword(Keyword::Class))
            && matches!(self.peek(), TokenKind::Op(op) if op == "<")
        {
            self.advance();
            children.push(self.parse_expr()?);
        }
        let body = self.with_scope(true, |p| {
            p.with_command_args(false, |p| p.parse_statements(is_end))
        })?;
        children.extend(body);
        let end = self.expect_kw(Keyword::End)?;
        Ok(self.push(NodeKind::Opaque { children }, kw.span.join(end.span)))
    }

    /// `return` and `yield`, with optional arguments.
    fn parse_jump(&mut self) -> PResult<NodeId> {
        let kw = self.advance();
        let mut end = kw.span.end;
        let mut children = Vec::new();
        if self.check(&TokenKind::LParen) && !self.current().space_before {
            self.advance();
            children =
                self.with_command_args(false, |p| p.parse_call_args(Some(TokenKind::RParen)))?;
            end = self.expect(&TokenKind::RParen, "`)`")?.span.end;
        } else if self.starts_command_arg() {
            children = self.with_command_args(true, |p| p.parse_call_args(None))?;
            if let Some(last) = children.last() {
                end = self.span(*last).end;
            }
        }
        Ok(self.push(
            NodeKind::Opaque { children },
            SourceSpan::new(kw.span.start, end),
        ))
    }
}

fn is_end(kind: &TokenKind) -> bool {
    matches!(kind, TokenKind::Keyword(Keyword::End))
}

fn is_clause_end(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Keyword(Keyword::End | Keyword::Else | Keyword::Elsif)
    )
}

fn starts_param(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident(_)
            | TokenKind::Label(_)
            | TokenKind::Star
            | TokenKind::DoubleStar
            | TokenKind::Amp
    )
}
