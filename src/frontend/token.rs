//! Token definitions for Go source

use crate::utils::Span;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(span: Span) -> Self {
        Self { kind: TokenKind::Eof, span }
    }
}

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ============ Keywords ============
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,

    // ============ Identifiers and Literals ============
    /// Identifier (also `true`, `false`, `nil`, which Go predeclares)
    Ident(String),
    /// Integer literal, kept as written
    IntLit(String),
    /// Floating-point literal, kept as written
    FloatLit(String),
    /// Imaginary literal, kept as written
    ImagLit(String),
    /// Rune literal
    CharLit(char),
    /// Interpreted or raw string literal (unquoted)
    StringLit(String),

    // ============ Operators ============
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// &
    And,
    /// |
    Or,
    /// ^
    Caret,
    /// <<
    Shl,
    /// >>
    Shr,
    /// &^
    AndNot,
    /// &&
    AndAnd,
    /// ||
    OrOr,
    /// <-
    Arrow,
    /// ++
    Inc,
    /// --
    Dec,
    /// ==
    EqEq,
    /// !=
    Ne,
    /// <
    Lt,
    /// <=
    Le,
    /// >
    Gt,
    /// >=
    Ge,
    /// !
    Not,
    /// ~
    Tilde,
    /// =
    Eq,
    /// :=
    Define,
    /// op= (any compound assignment)
    AssignOp,
    /// ...
    Ellipsis,
    /// .
    Dot,

    // ============ Delimiters ============
    /// (
    LParen,
    /// )
    RParen,
    /// {
    LBrace,
    /// }
    RBrace,
    /// [
    LBracket,
    /// ]
    RBracket,
    /// ,
    Comma,
    /// :
    Colon,
    /// ; (written or inserted at a newline)
    Semicolon,

    // ============ Special ============
    /// End of file
    Eof,
    /// Unknown/invalid character
    Unknown(char),
}

impl TokenKind {
    /// Try to convert an identifier to a keyword
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "break" => Some(TokenKind::Break),
            "case" => Some(TokenKind::Case),
            "chan" => Some(TokenKind::Chan),
            "const" => Some(TokenKind::Const),
            "continue" => Some(TokenKind::Continue),
            "default" => Some(TokenKind::Default),
            "defer" => Some(TokenKind::Defer),
            "else" => Some(TokenKind::Else),
            "fallthrough" => Some(TokenKind::Fallthrough),
            "for" => Some(TokenKind::For),
            "func" => Some(TokenKind::Func),
            "go" => Some(TokenKind::Go),
            "goto" => Some(TokenKind::Goto),
            "if" => Some(TokenKind::If),
            "import" => Some(TokenKind::Import),
            "interface" => Some(TokenKind::Interface),
            "map" => Some(TokenKind::Map),
            "package" => Some(TokenKind::Package),
            "range" => Some(TokenKind::Range),
            "return" => Some(TokenKind::Return),
            "select" => Some(TokenKind::Select),
            "struct" => Some(TokenKind::Struct),
            "switch" => Some(TokenKind::Switch),
            "type" => Some(TokenKind::Type),
            "var" => Some(TokenKind::Var),
            _ => None,
        }
    }

    /// Whether a newline after this token ends the statement
    pub fn ends_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Ident(_)
                | TokenKind::IntLit(_)
                | TokenKind::FloatLit(_)
                | TokenKind::ImagLit(_)
                | TokenKind::CharLit(_)
                | TokenKind::StringLit(_)
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
                | TokenKind::Inc
                | TokenKind::Dec
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }

    /// Get the precedence of a binary operator (Go has five levels)
    /// Returns None if not a binary operator
    pub fn binary_precedence(&self) -> Option<u8> {
        match self {
            TokenKind::OrOr => Some(1),
            TokenKind::AndAnd => Some(2),
            TokenKind::EqEq
            | TokenKind::Ne
            | TokenKind::Lt
            | TokenKind::Le
            | TokenKind::Gt
            | TokenKind::Ge => Some(3),
            TokenKind::Plus | TokenKind::Minus | TokenKind::Or | TokenKind::Caret => Some(4),
            TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::Shl
            | TokenKind::Shr
            | TokenKind::And
            | TokenKind::AndNot => Some(5),
            _ => None,
        }
    }
}
