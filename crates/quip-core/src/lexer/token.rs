//! Token types for the Quip lexer

use logos::Logos;

/// The kind of token produced by the lexer
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r]+")]
pub enum TokenKind {
    // ========== Keywords ==========
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("new")]
    New,
    #[token("say")]
    Say,
    #[token("echo")]
    Echo,
    #[token("and")]
    And,
    #[token("or")]
    Or,

    // ========== Literals ==========
    /// Number literal: integer, decimal, or exponent form. One numeric
    /// type; the payload is recovered by parsing the lexeme as f64.
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    /// Double-quoted string literal. The token's lexeme is the unescaped
    /// content, not the raw source slice.
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    // ========== Identifiers ==========
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    // ========== Operators ==========
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[token("=")]
    Eq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,

    #[token("!")]
    Not,

    // ========== Delimiters ==========
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    #[token(".")]
    Dot,
    #[token("..")]
    DotDot,

    // ========== Comments ==========
    /// Line comment: // ...
    #[regex(r"//[^\n]*")]
    LineComment,

    // ========== Special ==========
    #[token("\n")]
    Newline,

    /// End of file (added by lexer, not matched by logos)
    Eof,

    /// Lexer error - invalid character
    Error,
}

impl TokenKind {
    /// Returns true if this token is a keyword
    #[must_use]
    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::If
                | Self::Else
                | Self::For
                | Self::In
                | Self::New
                | Self::Say
                | Self::Echo
                | Self::And
                | Self::Or
        )
    }

    /// Returns true if this token is a literal
    #[must_use]
    pub const fn is_literal(self) -> bool {
        matches!(self, Self::Number | Self::Str)
    }

    /// Returns true if this token should typically be skipped
    #[must_use]
    pub const fn is_trivia(self) -> bool {
        matches!(self, Self::LineComment | Self::Newline)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::If => write!(f, "if"),
            Self::Else => write!(f, "else"),
            Self::For => write!(f, "for"),
            Self::In => write!(f, "in"),
            Self::New => write!(f, "new"),
            Self::Say => write!(f, "say"),
            Self::Echo => write!(f, "echo"),
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::Number => write!(f, "number"),
            Self::Str => write!(f, "string"),
            Self::Ident => write!(f, "identifier"),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Star => write!(f, "*"),
            Self::Slash => write!(f, "/"),
            Self::Percent => write!(f, "%"),
            Self::Eq => write!(f, "="),
            Self::EqEq => write!(f, "=="),
            Self::NotEq => write!(f, "!="),
            Self::Lt => write!(f, "<"),
            Self::Gt => write!(f, ">"),
            Self::LtEq => write!(f, "<="),
            Self::GtEq => write!(f, ">="),
            Self::Not => write!(f, "!"),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::LBrace => write!(f, "{{"),
            Self::RBrace => write!(f, "}}"),
            Self::LBracket => write!(f, "["),
            Self::RBracket => write!(f, "]"),
            Self::Comma => write!(f, ","),
            Self::Semicolon => write!(f, ";"),
            Self::Dot => write!(f, "."),
            Self::DotDot => write!(f, ".."),
            Self::LineComment => write!(f, "// comment"),
            Self::Newline => write!(f, "newline"),
            Self::Eof => write!(f, "end of file"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_classification() {
        assert!(TokenKind::If.is_keyword());
        assert!(TokenKind::Say.is_keyword());
        assert!(TokenKind::And.is_keyword());
        assert!(!TokenKind::Ident.is_keyword());
        assert!(!TokenKind::Plus.is_keyword());
    }

    #[test]
    fn literal_classification() {
        assert!(TokenKind::Number.is_literal());
        assert!(TokenKind::Str.is_literal());
        assert!(!TokenKind::Ident.is_literal());
    }

    #[test]
    fn trivia_classification() {
        assert!(TokenKind::Newline.is_trivia());
        assert!(TokenKind::LineComment.is_trivia());
        assert!(!TokenKind::Semicolon.is_trivia());
    }

    #[test]
    fn display_names() {
        assert_eq!(TokenKind::DotDot.to_string(), "..");
        assert_eq!(TokenKind::Number.to_string(), "number");
        assert_eq!(TokenKind::Eof.to_string(), "end of file");
    }
}
