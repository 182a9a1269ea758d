//! Reference front end: reads a subset of Ruby into the `canon-core` node view.
//!
//! Supported: statements separated by newlines or `;`, `#` comments, local
//! assignment, literals (numbers, strings, symbols, arrays, hashes), method calls
//! with or without parentheses and receivers, keyword tails, splats, blocks,
//! `def`/`def self.`, `class`/`module`, block and modifier conditionals, and loosely
//! read binary operators. Anything else is a [`ReadError`].

mod lexer;
mod parser;
pub mod token;

use canon_core::ast::{Ast, AstBuilder};
use canon_core::diagnostics::Position;
use canon_core::source::SourceBuffer;
use tracing::debug;

pub use lexer::{Lexed, Lexer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadError {
    pub message: String,
    pub position: Position,
}

impl ReadError {
    pub(crate) fn at(buffer: &SourceBuffer, offset: usize, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: buffer.position(offset),
        }
    }
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.position.line, self.position.col, self.message
        )
    }
}

impl std::error::Error for ReadError {}

/// Reads `text` into an [`Ast`] with comments and parent links filled in.
pub fn read_source(text: &str) -> Result<Ast, ReadError> {
    let builder = AstBuilder::new(text);
    let lexed = Lexer::tokenize(builder.buffer())?;
    let comments = lexed.comments.len();
    let mut parser = parser::Parser::new(lexed.tokens, builder);
    for span in lexed.comments {
        parser.comment(span);
    }
    let ast = parser.parse_program()?;
    debug!(nodes = ast.len(), comments, bytes = text.len(), "read source");
    Ok(ast)
}
