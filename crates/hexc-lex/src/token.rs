//! The token vocabulary produced by the [`crate::Lexer`].

use hexc_util::{Span, Symbol};

/// A lexical token. Variants that carry data (`LInt32`, `LDouble`, `LStr`,
/// `Id`) own their payload directly rather than indirecting through a
/// separate "literal value" table.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Invalid,
    End,

    Comma,
    Semicolon,
    Colon,

    Let,
    If,
    Else,
    Fn,

    Eq,
    Plus,
    Minus,
    Mult,
    Slash,
    CmpLt,

    POpen,
    PClose,
    BrOpen,
    BrClose,
    RArrow,

    LInt32(i32),
    LDouble(f64),
    LStr(Symbol),
    Id(Symbol),
}

impl TokenKind {
    /// Text shown in "expected X, found Y" diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Invalid => "<invalid>".to_string(),
            TokenKind::End => "<end of input>".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Let => "'let'".to_string(),
            TokenKind::If => "'if'".to_string(),
            TokenKind::Else => "'else'".to_string(),
            TokenKind::Fn => "'fn'".to_string(),
            TokenKind::Eq => "'='".to_string(),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Mult => "'*'".to_string(),
            TokenKind::Slash => "'/'".to_string(),
            TokenKind::CmpLt => "'<'".to_string(),
            TokenKind::POpen => "'('".to_string(),
            TokenKind::PClose => "')'".to_string(),
            TokenKind::BrOpen => "'{'".to_string(),
            TokenKind::BrClose => "'}'".to_string(),
            TokenKind::RArrow => "'->'".to_string(),
            TokenKind::LInt32(v) => format!("integer literal '{v}'"),
            TokenKind::LDouble(v) => format!("double literal '{v}'"),
            TokenKind::LStr(_) => "string literal".to_string(),
            TokenKind::Id(name) => format!("identifier '{name}'"),
        }
    }
}

/// A token plus the source location it started at.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn is_end(&self) -> bool {
        matches!(self.kind, TokenKind::End)
    }
}
