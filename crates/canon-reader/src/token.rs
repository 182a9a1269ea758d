use canon_core::source::SourceSpan;

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: SourceSpan,
    /// Whitespace (or a line break) separates this token from the previous one.
    pub space_before: bool,
    /// A line break separates this token from the previous one.
    pub newline_before: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Lower-case identifier or method name, including a trailing `?`/`!`.
    Ident(String),
    /// Capitalized name.
    Const(String),
    /// `@name` or `@@name`.
    IVar(String),
    /// `name:` written as a hash label or keyword parameter.
    Label(String),
    /// `:name` or `:"name"`.
    Symbol(String),
    Str(String),
    Number(String),
    Keyword(Keyword),

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Dot,
    /// `&.`
    SafeNav,
    /// `::`
    ColonColon,
    Pipe,
    Star,
    DoubleStar,
    Amp,
    /// `=`
    Assign,
    /// `+=`, `||=`, ...
    OpAssign(String),
    /// `=>`
    Arrow,
    /// Any other operator, kept as text.
    Op(String),

    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    And,
    Class,
    Def,
    Do,
    Else,
    Elsif,
    End,
    False,
    If,
    Module,
    Nil,
    Not,
    Or,
    Return,
    SelfValue,
    Then,
    True,
    Unless,
    Until,
    While,
    Yield,
}

impl Keyword {
    pub fn from_ident(s: &str) -> Option<Self> {
        Some(match s {
            "and" => Keyword::And,
            "class" => Keyword::Class,
            "def" => Keyword::Def,
            "do" => Keyword::Do,
            "else" => Keyword::Else,
            "elsif" => Keyword::Elsif,
            "end" => Keyword::End,
            "false" => Keyword::False,
            "if" => Keyword::If,
            "module" => Keyword::Module,
            "nil" => Keyword::Nil,
            "not" => Keyword::Not,
            "or" => Keyword::Or,
            "return" => Keyword::Return,
            "self" => Keyword::SelfValue,
            "then" => Keyword::Then,
            "true" => Keyword::True,
            "unless" => Keyword::Unless,
            "until" => Keyword::Until,
            "while" => Keyword::While,
            "yield" => Keyword::Yield,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::And => "and",
            Keyword::Class => "class",
            Keyword::Def => "def",
            Keyword::Do => "do",
            Keyword::Else => "else",
            Keyword::Elsif => "elsif",
            Keyword::End => "end",
            Keyword::False => "false",
            Keyword::If => "if",
            Keyword::Module => "module",
            Keyword::Nil => "nil",
            Keyword::Not => "not",
            Keyword::Or => "or",
            Keyword::Return => "return",
            Keyword::SelfValue => "self",
            Keyword::Then => "then",
            Keyword::True => "true",
            Keyword::Unless => "unless",
            Keyword::Until => "until",
            Keyword::While => "while",
            Keyword::Yield => "yield",
        }
    }
}
