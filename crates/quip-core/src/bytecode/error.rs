//! Compiler error types

use crate::lexer::{LexError, Span, TokenKind};
use thiserror::Error;

/// A compilation error with location information
///
/// Compilation fails on the first error; there is no recovery, so a
/// failed compile never yields a partial program.
#[derive(Debug, Clone)]
pub struct CompileError {
    /// The kind of error
    pub kind: CompileErrorKind,
    /// Source location where the error occurred
    pub span: Span,
    /// Optional hint for fixing the error
    pub hint: Option<String>,
}

impl CompileError {
    /// Create a new compile error
    #[must_use]
    pub fn new(kind: CompileErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            hint: None,
        }
    }

    /// Add a hint to this error
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.kind, self.span)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

/// The kind of compile error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileErrorKind {
    #[error("unexpected token: found {found}, expected {expected}")]
    UnexpectedToken {
        found: TokenKind,
        expected: ExpectedToken,
    },

    #[error("unexpected end of file")]
    UnexpectedEof,

    #[error("expected expression")]
    ExpectedExpression,

    #[error("expected statement")]
    ExpectedStatement,

    #[error("expected identifier")]
    ExpectedIdentifier,

    #[error("subscript must be a number or string literal")]
    ExpectedLiteralIndex,

    #[error("invalid number literal: {0}")]
    InvalidNumber(String),

    #[error("{0}")]
    Lex(LexError),

    #[error("internal compiler error: {0}")]
    Internal(String),
}

/// What token was expected
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedToken {
    /// A specific token kind
    Token(TokenKind),
    /// One of several possible tokens
    OneOf(Vec<TokenKind>),
    /// A description of what was expected
    Description(String),
}

impl std::fmt::Display for ExpectedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpectedToken::Token(kind) => write!(f, "{kind}"),
            ExpectedToken::OneOf(kinds) => {
                let names: Vec<String> = kinds.iter().map(|k| format!("{k}")).collect();
                write!(f, "one of: {}", names.join(", "))
            }
            ExpectedToken::Description(desc) => write!(f, "{desc}"),
        }
    }
}

/// Result type for compilation operations
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_span() {
        let err = CompileError::new(CompileErrorKind::ExpectedExpression, Span::new(4, 5));
        assert_eq!(err.to_string(), "expected expression at 4..5");
    }

    #[test]
    fn error_display_includes_hint() {
        let err = CompileError::new(
            CompileErrorKind::UnexpectedToken {
                found: TokenKind::Eq,
                expected: ExpectedToken::Token(TokenKind::DotDot),
            },
            Span::new(10, 11),
        )
        .with_hint("ranges are written a..b");
        let rendered = err.to_string();
        assert!(rendered.contains("found ="));
        assert!(rendered.contains("hint: ranges are written a..b"));
    }

    #[test]
    fn expected_one_of_lists_alternatives() {
        let expected = ExpectedToken::OneOf(vec![TokenKind::RParen, TokenKind::Comma]);
        assert_eq!(expected.to_string(), "one of: ), ,");
    }
}
