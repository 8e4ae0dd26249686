//! Lexer for the Quip scripting language
//!
//! The lexer converts source code into a stream of tokens, handling:
//! - Keywords, identifiers, and operators
//! - Numeric literals (integer, decimal, exponent)
//! - String literals with escape sequences
//! - Line comments and source location tracking

#![allow(clippy::cast_possible_truncation)] // We intentionally use u32 for spans; files > 4GB are unsupported

mod span;
mod token;

pub use span::{LineIndex, Location, Span};
pub use token::TokenKind;

use logos::Logos;
use thiserror::Error;

/// A token with its kind, span, and source text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The span in the source code
    pub span: Span,
    /// The source text of the token. For string literals this is the
    /// unescaped content, without the surrounding quotes.
    pub lexeme: String,
}

impl Token {
    /// Create a new token
    #[must_use]
    pub fn new(kind: TokenKind, span: Span, lexeme: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            lexeme: lexeme.into(),
        }
    }
}

/// Lexer error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character")]
    UnexpectedChar,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid escape sequence: \\{0}")]
    InvalidEscape(char),
}

/// A lexer error with location information
#[derive(Debug, Clone)]
pub struct SpannedError {
    pub error: LexError,
    pub span: Span,
}

impl SpannedError {
    #[must_use]
    pub fn new(error: LexError, span: Span) -> Self {
        Self { error, span }
    }
}

impl std::fmt::Display for SpannedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.error, self.span)
    }
}

impl std::error::Error for SpannedError {}

/// The Quip lexer
pub struct Lexer<'source> {
    source: &'source str,
    /// Current position in the source (byte offset)
    position: usize,
    /// Collected errors during lexing
    errors: Vec<SpannedError>,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given source code
    #[must_use]
    pub fn new(source: &'source str) -> Self {
        Self {
            source,
            position: 0,
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire source, returning all tokens and any errors
    #[must_use]
    pub fn tokenize(source: &str) -> (Vec<Token>, Vec<SpannedError>) {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.collect_all();
        (tokens, lexer.errors)
    }

    /// Collect all tokens from the source
    pub fn collect_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Option<Token> {
        if self.position >= self.source.len() {
            return Some(Token::new(
                TokenKind::Eof,
                Span::new(self.position as u32, self.position as u32),
                "",
            ));
        }

        let remaining = &self.source[self.position..];
        let mut logos_lexer = TokenKind::lexer(remaining);

        match logos_lexer.next() {
            Some(Ok(kind)) => {
                let span_range = logos_lexer.span();
                // span_range is relative to remaining slice, accounting for skipped whitespace
                let start = self.position + span_range.start;
                let end = self.position + span_range.end;
                self.position = end;
                let span = Span::new(start as u32, end as u32);

                if kind == TokenKind::Str {
                    // Strip the quotes and process escape sequences
                    let raw = &self.source[start + 1..end - 1];
                    let content = self.unescape(raw, start + 1);
                    return Some(Token::new(kind, span, content));
                }

                Some(Token::new(kind, span, logos_lexer.slice()))
            }
            Some(Err(())) => {
                let span_range = logos_lexer.span();
                let start = self.position + span_range.start;

                // A stray double quote means a string that never closed;
                // consume through the end of the line so later code still lexes.
                if self.source[start..].starts_with('"') {
                    let tail = &self.source[start..];
                    let end = start + tail.find('\n').unwrap_or(tail.len());
                    self.position = end;
                    self.errors.push(SpannedError::new(
                        LexError::UnterminatedString,
                        Span::new(start as u32, end as u32),
                    ));
                    return Some(Token::new(
                        TokenKind::Error,
                        Span::new(start as u32, end as u32),
                        &self.source[start..end],
                    ));
                }

                // Error recovery: skip the invalid character
                let invalid_char = self.source[start..].chars().next()?;
                let end = start + invalid_char.len_utf8();
                self.position = end;

                self.errors.push(SpannedError::new(
                    LexError::UnexpectedChar,
                    Span::new(start as u32, end as u32),
                ));

                Some(Token::new(
                    TokenKind::Error,
                    Span::new(start as u32, end as u32),
                    &self.source[start..end],
                ))
            }
            None => Some(Token::new(
                TokenKind::Eof,
                Span::new(self.position as u32, self.position as u32),
                "",
            )),
        }
    }

    /// Process escape sequences in a string literal body. `offset` is the
    /// byte position of the body within the source, used for error spans.
    fn unescape(&mut self, raw: &str, offset: usize) -> String {
        let mut content = String::with_capacity(raw.len());
        let mut chars = raw.char_indices();
        while let Some((i, c)) = chars.next() {
            if c != '\\' {
                content.push(c);
                continue;
            }
            let Some((_, escaped)) = chars.next() else {
                // The token pattern pairs every backslash with a character,
                // so a trailing backslash never reaches here.
                break;
            };
            let replacement = match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '\\' => '\\',
                '"' => '"',
                '0' => '\0',
                _ => {
                    self.errors.push(SpannedError::new(
                        LexError::InvalidEscape(escaped),
                        Span::new(
                            (offset + i) as u32,
                            (offset + i + 1 + escaped.len_utf8()) as u32,
                        ),
                    ));
                    escaped
                }
            };
            content.push(replacement);
        }
        content
    }

    /// Check if any errors occurred
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token()?;
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}
