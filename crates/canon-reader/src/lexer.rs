//! Converts Ruby source text into tokens, recording comment spans on the side.

use canon_core::source::{SourceBuffer, SourceSpan};

use crate::token::{Keyword, Token, TokenKind};
use crate::ReadError;

/// Multi-byte operators first so the longest spelling wins.
const PUNCT: &[&str] = &[
    "**=", "&&=", "||=", "<<=", ">>=", "<=>", "===", "...", "**", "&&", "||", "&.", "==", "!=",
    "=~", "!~", "<=", ">=", "<<", ">>", "=>", "+=", "-=", "*=", "/=", "%=", "|=", "&=", "^=",
    "->", "..", "(", ")", "[", "]", "{", "}", ",", ";", ".", "|", "*", "&", "=", "!", "<", ">",
    "+", "-", "/", "%", "^", "~",
];

pub struct Lexed {
    pub tokens: Vec<Token>,
    pub comments: Vec<SourceSpan>,
}

pub struct Lexer<'a> {
    buffer: &'a SourceBuffer,
    src: &'a [u8],
    pos: usize,
    space_before: bool,
    newline_before: bool,
    comments: Vec<SourceSpan>,
}

impl<'a> Lexer<'a> {
    pub fn new(buffer: &'a SourceBuffer) -> Self {
        Self {
            buffer,
            src: buffer.text().as_bytes(),
            pos: 0,
            space_before: true,
            newline_before: true,
            comments: Vec::new(),
        }
    }

    /// Tokenizes the whole buffer; the last token is always [`TokenKind::Eof`].
    pub fn tokenize(buffer: &SourceBuffer) -> Result<Lexed, ReadError> {
        let mut lexer = Lexer::new(buffer);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(Lexed {
            tokens,
            comments: lexer.comments,
        })
    }

    fn next_token(&mut self) -> Result<Token, ReadError> {
        self.skip_trivia();
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return Ok(self.make(TokenKind::Eof, start));
        };

        let kind = match ch {
            b'a'..=b'z' | b'_' | 0x80..=0xff => self.lex_word(false),
            b'A'..=b'Z' => self.lex_word(true),
            b'0'..=b'9' => self.lex_number(),
            b'@' => self.lex_ivar()?,
            b'\'' | b'"' => TokenKind::Str(self.lex_string(ch)?),
            b':' => self.lex_colon()?,
            b'?' => return Err(self.error(start, "the ternary operator is not supported")),
            _ => self.lex_punct()?,
        };
        Ok(self.make(kind, start))
    }

    fn make(&mut self, kind: TokenKind, start: usize) -> Token {
        let tok = Token {
            kind,
            span: SourceSpan::new(start, self.pos),
            space_before: self.space_before,
            newline_before: self.newline_before,
        };
        self.space_before = false;
        self.newline_before = false;
        tok
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                b' ' | b'\t' | b'\r' => {
                    self.pos += 1;
                    self.space_before = true;
                }
                b'\n' => {
                    self.pos += 1;
                    self.space_before = true;
                    self.newline_before = true;
                }
                b'\\' if self.peek_at(1) == Some(b'\n') => {
                    self.pos += 2;
                    self.space_before = true;
                }
                b'#' => {
                    let start = self.pos;
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.pos += 1;
                    }
                    self.comments.push(SourceSpan::new(start, self.pos));
                    self.space_before = true;
                }
                _ => break,
            }
        }
    }

    fn lex_word(&mut self, capital: bool) -> TokenKind {
        let start = self.pos;
        self.eat_ident_bytes();
        if matches!(self.peek(), Some(b'?' | b'!')) && self.peek_at(1) != Some(b'=') {
            self.pos += 1;
        }
        let word = self.text(start, self.pos).to_string();

        // `name:` but not `Name::Const`
        if self.peek() == Some(b':') && self.peek_at(1) != Some(b':') {
            self.pos += 1;
            return TokenKind::Label(word);
        }
        if capital {
            return TokenKind::Const(word);
        }
        match Keyword::from_ident(&word) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident(word),
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        self.eat_digits();
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            self.eat_digits();
        }
        TokenKind::Number(self.text(start, self.pos).to_string())
    }

    fn lex_ivar(&mut self) -> Result<TokenKind, ReadError> {
        let start = self.pos;
        while self.peek() == Some(b'@') {
            self.pos += 1;
        }
        let name_start = self.pos;
        self.eat_ident_bytes();
        if self.pos == name_start {
            return Err(self.error(start, "expected a variable name after `@`"));
        }
        Ok(TokenKind::IVar(self.text(start, self.pos).to_string()))
    }

    /// Returns the raw contents between the quotes. Escapes and interpolation are
    /// skipped over, not evaluated.
    fn lex_string(&mut self, quote: u8) -> Result<String, ReadError> {
        let start = self.pos;
        self.pos += 1;
        let content_start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error(start, "unterminated string literal")),
                Some(b'\\') => self.pos = (self.pos + 2).min(self.src.len()),
                Some(c) if c == quote => break,
                Some(b'#') if quote == b'"' && self.peek_at(1) == Some(b'{') => {
                    self.pos += 2;
                    let mut depth = 1usize;
                    while depth > 0 {
                        match self.peek() {
                            None => return Err(self.error(start, "unterminated interpolation")),
                            Some(b'{') => depth += 1,
                            Some(b'}') => depth -= 1,
                            Some(_) => {}
                        }
                        self.pos += 1;
                    }
                }
                Some(_) => self.pos += 1,
            }
        }
        let value = self.text(content_start, self.pos).to_string();
        self.pos += 1;
        Ok(value)
    }

    fn lex_colon(&mut self) -> Result<TokenKind, ReadError> {
        let start = self.pos;
        match self.peek_at(1) {
            Some(b':') => {
                self.pos += 2;
                Ok(TokenKind::ColonColon)
            }
            Some(b'"' | b'\'') => {
                self.pos += 1;
                let quote = self.src[self.pos];
                Ok(TokenKind::Symbol(self.lex_string(quote)?))
            }
            Some(c) if is_ident_byte(c) && !c.is_ascii_digit() => {
                self.pos += 1;
                let name_start = self.pos;
                self.eat_ident_bytes();
                if matches!(self.peek(), Some(b'?' | b'!')) {
                    self.pos += 1;
                }
                Ok(TokenKind::Symbol(self.text(name_start, self.pos).to_string()))
            }
            _ => Err(self.error(start, "unsupported use of `:`")),
        }
    }

    fn lex_punct(&mut self) -> Result<TokenKind, ReadError> {
        let start = self.pos;
        let rest = &self.src[self.pos..];
        let Some(p) = PUNCT.iter().find(|p| rest.starts_with(p.as_bytes())) else {
            let ch = self.buffer.text()[start..].chars().next().unwrap_or('?');
            return Err(self.error(start, format!("unexpected character `{ch}`")));
        };
        self.pos += p.len();
        Ok(punct_kind(p))
    }

    fn eat_ident_bytes(&mut self) {
        while self.peek().is_some_and(is_ident_byte) {
            self.pos += 1;
        }
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == b'_') {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.src.get(self.pos + n).copied()
    }

    fn text(&self, start: usize, end: usize) -> &str {
        &self.buffer.text()[start..end]
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> ReadError {
        ReadError::at(self.buffer, offset, message)
    }
}

fn is_ident_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c >= 0x80
}

fn punct_kind(p: &str) -> TokenKind {
    match p {
        "(" => TokenKind::LParen,
        ")" => TokenKind::RParen,
        "[" => TokenKind::LBracket,
        "]" => TokenKind::RBracket,
        "{" => TokenKind::LBrace,
        "}" => TokenKind::RBrace,
        "," => TokenKind::Comma,
        ";" => TokenKind::Semicolon,
        "." => TokenKind::Dot,
        "&." => TokenKind::SafeNav,
        "|" => TokenKind::Pipe,
        "*" => TokenKind::Star,
        "**" => TokenKind::DoubleStar,
        "&" => TokenKind::Amp,
        "=" => TokenKind::Assign,
        "=>" => TokenKind::Arrow,
        "==" | "!=" | "<=" | ">=" | "===" => TokenKind::Op(p.to_string()),
        _ if p.len() > 1 && p.ends_with('=') => TokenKind::OpAssign(p.to_string()),
        _ => TokenKind::Op(p.to_string()),
    }
}
