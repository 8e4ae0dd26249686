//! Single-pass compiler for the Quip scripting language
//!
//! This module translates a token stream directly into bytecode in one
//! pass, with no intermediate syntax tree. Operator precedence is handled
//! by a recursive-descent ladder; control flow is wired up with forward
//! and backward jump patching through [`ProgramBuilder`] handles.
//!
//! Compilation performs no semantic analysis. Variables are resolved
//! dynamically by the virtual machine, so an undefined variable is a
//! runtime error, not a compile error.

// Table indices are usize internally but i32 in instruction operands.
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use super::error::{CompileError, CompileErrorKind, CompileResult, ExpectedToken};
use super::opcode::OpCode;
use super::program::{Literal, Program, ProgramBuilder};
use crate::lexer::{Lexer, Span, Token, TokenKind};

/// The Quip compiler
pub struct Compiler {
    /// All tokens from the source
    tokens: Vec<Token>,
    /// Current position in the token stream
    position: usize,
    /// Program under construction
    builder: ProgramBuilder,
}

impl Compiler {
    /// Create a compiler over an explicit token stream
    ///
    /// An end-of-file token is appended if the stream lacks one, so token
    /// vectors built by hand behave the same as lexer output.
    #[must_use]
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map_or(0, |t| t.span.end);
            tokens.push(Token::new(TokenKind::Eof, Span::new(end, end), ""));
        }
        Self {
            tokens,
            position: 0,
            builder: ProgramBuilder::new(),
        }
    }

    /// Compile source code into a program
    ///
    /// # Errors
    ///
    /// Returns the first lex or compile error encountered. Compilation
    /// never yields a partial program.
    pub fn compile(source: &str) -> CompileResult<Program> {
        let (tokens, lex_errors) = Lexer::tokenize(source);
        if let Some(first) = lex_errors.into_iter().next() {
            return Err(CompileError::new(
                CompileErrorKind::Lex(first.error),
                first.span,
            ));
        }
        Compiler::new(tokens).finish()
    }

    /// Run compilation to completion, producing the final program
    ///
    /// # Errors
    ///
    /// Returns the first compile error encountered.
    pub fn finish(mut self) -> CompileResult<Program> {
        self.skip_trivia();
        while !self.is_eof() {
            self.statement()?;
        }
        self.builder.emit(OpCode::Return);
        self.builder.finish().map_err(|err| {
            CompileError::new(
                CompileErrorKind::Internal(err.to_string()),
                Span::default(),
            )
        })
    }

    // ==================== Token Management ====================

    /// Get the current token
    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or_else(|| {
            self.tokens
                .last()
                .expect("token stream should have at least EOF")
        })
    }

    /// Get the current token kind
    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Check if we're at end of file
    fn is_eof(&self) -> bool {
        self.current_kind() == TokenKind::Eof
    }

    /// Advance to the next token, skipping trivia
    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        self.position += 1;
        self.skip_trivia();
        token
    }

    /// Skip trivia tokens (comments, newlines)
    fn skip_trivia(&mut self) {
        while self.position < self.tokens.len() && self.current().kind.is_trivia() {
            self.position += 1;
        }
    }

    /// Check if the current token matches a kind
    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    /// Consume a token if it matches, returning it
    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Expect and consume a specific token, or error
    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(CompileError::new(
                CompileErrorKind::UnexpectedToken {
                    found: self.current_kind(),
                    expected: ExpectedToken::Token(kind),
                },
                self.current().span,
            ))
        }
    }

    /// Expect an identifier token, returning it
    fn expect_ident(&mut self) -> CompileResult<Token> {
        if self.check(TokenKind::Ident) {
            Ok(self.advance())
        } else {
            Err(CompileError::new(
                CompileErrorKind::ExpectedIdentifier,
                self.current().span,
            ))
        }
    }

    /// Peek at the kind of the next non-trivia token
    fn peek_kind(&self) -> Option<TokenKind> {
        let mut pos = self.position + 1;
        while pos < self.tokens.len() {
            let token = &self.tokens[pos];
            if !token.kind.is_trivia() {
                return Some(token.kind);
            }
            pos += 1;
        }
        None
    }

    // ==================== Statements ====================

    fn statement(&mut self) -> CompileResult<()> {
        match self.current_kind() {
            TokenKind::Say => self.output_statement(OpCode::Say),
            TokenKind::Echo => self.output_statement(OpCode::Echo),
            TokenKind::If => self.if_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Ident if self.peek_kind() == Some(TokenKind::Eq) => self.assignment(),
            TokenKind::Else => Err(CompileError::new(
                CompileErrorKind::ExpectedStatement,
                self.current().span,
            )
            .with_hint("'else' must follow an if block")),
            TokenKind::RBrace => Err(CompileError::new(
                CompileErrorKind::ExpectedStatement,
                self.current().span,
            )),
            _ => self.expression_statement(),
        }
    }

    /// `say expr` / `echo expr`: evaluate and write to an output channel
    fn output_statement(&mut self, op: OpCode) -> CompileResult<()> {
        self.advance();
        self.expression()?;
        self.builder.emit(op);
        self.end_of_statement();
        Ok(())
    }

    /// `ident = expr`: evaluate and store into the environment
    fn assignment(&mut self) -> CompileResult<()> {
        let name = self.expect_ident()?;
        self.expect(TokenKind::Eq)?;
        self.expression()?;
        let index = self.builder.add_name(&name.lexeme);
        self.builder.emit_a(OpCode::SetVar, index as i32);
        self.end_of_statement();
        Ok(())
    }

    /// Evaluate an expression for effect and discard the result
    fn expression_statement(&mut self) -> CompileResult<()> {
        self.expression()?;
        self.builder.emit(OpCode::Pop);
        self.end_of_statement();
        Ok(())
    }

    /// `if (cond) { } [else { }]`
    ///
    /// The conditional jump skips the then-branch; an unconditional jump
    /// after the then-branch skips the else-branch. Both are emitted with
    /// placeholder targets and patched once their destinations are known.
    fn if_statement(&mut self) -> CompileResult<()> {
        self.advance();
        self.expect(TokenKind::LParen)?;
        self.expression()?;
        self.expect(TokenKind::RParen)?;

        let else_jump = self.builder.emit_jump(OpCode::JumpIfFalse);
        self.block()?;
        let end_jump = self.builder.emit_jump(OpCode::Jump);
        self.builder.resolve_here(else_jump);

        if self.eat(TokenKind::Else).is_some() {
            if self.check(TokenKind::If) {
                self.if_statement()?;
            } else {
                self.block()?;
            }
        }
        self.builder.resolve_here(end_jump);
        Ok(())
    }

    /// `for ident in a..b { }`
    ///
    /// The counter starts at the lower bound. The upper bound is evaluated
    /// once and kept on the value stack for the whole loop; each iteration
    /// duplicates it for the `counter < bound` test and the exit path pops
    /// it. The counter variable stays in the environment after the loop.
    fn for_statement(&mut self) -> CompileResult<()> {
        self.advance();
        let variable = self.expect_ident()?;
        let index = self.builder.add_name(&variable.lexeme);
        self.expect(TokenKind::In)?;

        self.expression()?;
        self.builder.emit_a(OpCode::SetVar, index as i32);
        self.expect(TokenKind::DotDot)
            .map_err(|err| err.with_hint("ranges are written a..b"))?;
        self.expression()?;

        let loop_top = self.builder.next_index();
        self.builder.emit(OpCode::Dup);
        self.builder.emit_a(OpCode::PushVar, index as i32);
        self.builder.emit(OpCode::Gt);
        let exit_jump = self.builder.emit_jump(OpCode::JumpIfFalse);

        self.block()?;

        self.builder.emit_a(OpCode::PushVar, index as i32);
        let one = self.builder.add_constant(Literal::Number(1.0));
        self.builder.emit_a(OpCode::PushConstant, one as i32);
        self.builder.emit(OpCode::Add);
        self.builder.emit_a(OpCode::SetVar, index as i32);

        let back_jump = self.builder.emit_jump(OpCode::Jump);
        self.builder.resolve(back_jump, loop_top);
        self.builder.resolve_here(exit_jump);
        self.builder.emit(OpCode::Pop);
        Ok(())
    }

    /// A braced statement block
    fn block(&mut self) -> CompileResult<()> {
        self.expect(TokenKind::LBrace)?;
        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            self.statement()?;
        }
        self.expect(TokenKind::RBrace)?;
        Ok(())
    }

    /// Consume an optional statement terminator
    fn end_of_statement(&mut self) {
        while self.eat(TokenKind::Semicolon).is_some() {}
    }

    // ==================== Expressions ====================

    /// Precedence (low to high): or, and, equality, relational, additive,
    /// multiplicative, unary, postfix, primary
    fn expression(&mut self) -> CompileResult<()> {
        self.logical_or()
    }

    /// `a or b`: short-circuit triad
    ///
    /// Emits `BOOL_BEGIN <left already on stack> OR_EVAL <right> BOOL_END`.
    /// `OR_EVAL` jumps to the matching `BOOL_END` when the left operand
    /// already decides the result, so the right operand is never evaluated.
    fn logical_or(&mut self) -> CompileResult<()> {
        self.logical_and()?;
        while self.eat(TokenKind::Or).is_some() {
            self.builder.emit(OpCode::BoolBegin);
            let short_circuit = self.builder.emit_jump(OpCode::OrEval);
            self.logical_and()?;
            let end = self.builder.emit(OpCode::BoolEnd);
            self.builder.resolve(short_circuit, end);
        }
        Ok(())
    }

    /// `a and b`: short-circuit triad, symmetric to `or`
    fn logical_and(&mut self) -> CompileResult<()> {
        self.equality()?;
        while self.eat(TokenKind::And).is_some() {
            self.builder.emit(OpCode::BoolBegin);
            let short_circuit = self.builder.emit_jump(OpCode::AndEval);
            self.equality()?;
            let end = self.builder.emit(OpCode::BoolEnd);
            self.builder.resolve(short_circuit, end);
        }
        Ok(())
    }

    fn equality(&mut self) -> CompileResult<()> {
        self.relational()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::EqEq => OpCode::Eq,
                TokenKind::NotEq => OpCode::Ne,
                _ => break,
            };
            self.advance();
            self.relational()?;
            self.builder.emit(op);
        }
        Ok(())
    }

    fn relational(&mut self) -> CompileResult<()> {
        self.additive()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Lt => OpCode::Lt,
                TokenKind::LtEq => OpCode::Le,
                TokenKind::Gt => OpCode::Gt,
                TokenKind::GtEq => OpCode::Ge,
                _ => break,
            };
            self.advance();
            self.additive()?;
            self.builder.emit(op);
        }
        Ok(())
    }

    fn additive(&mut self) -> CompileResult<()> {
        self.multiplicative()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => OpCode::Add,
                TokenKind::Minus => OpCode::Sub,
                _ => break,
            };
            self.advance();
            self.multiplicative()?;
            self.builder.emit(op);
        }
        Ok(())
    }

    fn multiplicative(&mut self) -> CompileResult<()> {
        self.unary()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Star => OpCode::Mul,
                TokenKind::Slash => OpCode::Div,
                TokenKind::Percent => OpCode::Mod,
                _ => break,
            };
            self.advance();
            self.unary()?;
            self.builder.emit(op);
        }
        Ok(())
    }

    fn unary(&mut self) -> CompileResult<()> {
        let op = match self.current_kind() {
            TokenKind::Minus => OpCode::Neg,
            TokenKind::Not => OpCode::Not,
            _ => return self.postfix(),
        };
        self.advance();
        self.unary()?;
        self.builder.emit(op);
        Ok(())
    }

    /// Postfix chains: `.field`, `.method(args)`, `[literal]`
    ///
    /// These compile to object opcodes that the virtual machine executes
    /// with stub semantics only.
    fn postfix(&mut self) -> CompileResult<()> {
        self.primary()?;
        loop {
            if self.eat(TokenKind::Dot).is_some() {
                let name = self.expect_ident()?;
                let index = self.builder.add_name(&name.lexeme);
                if self.check(TokenKind::LParen) {
                    let argc = self.arguments()?;
                    self.builder
                        .emit_ab(OpCode::CallMethod, index as i32, argc);
                } else {
                    self.builder.emit_a(OpCode::GetField, index as i32);
                }
            } else if self.eat(TokenKind::LBracket).is_some() {
                let subscript = self.current().clone();
                if !subscript.kind.is_literal() {
                    return Err(CompileError::new(
                        CompileErrorKind::ExpectedLiteralIndex,
                        subscript.span,
                    ));
                }
                self.advance();
                self.expect(TokenKind::RBracket)?;
                let index = self.builder.add_name(&subscript.lexeme);
                self.builder.emit_a(OpCode::GetField, index as i32);
            } else {
                break;
            }
        }
        Ok(())
    }

    fn primary(&mut self) -> CompileResult<()> {
        match self.current_kind() {
            TokenKind::Number => {
                let token = self.advance();
                let value: f64 = token.lexeme.parse().map_err(|_| {
                    CompileError::new(
                        CompileErrorKind::InvalidNumber(token.lexeme.clone()),
                        token.span,
                    )
                })?;
                let index = self.builder.add_constant(Literal::Number(value));
                self.builder.emit_a(OpCode::PushConstant, index as i32);
                Ok(())
            }
            TokenKind::Str => {
                let token = self.advance();
                let index = self.builder.add_constant(Literal::Text(token.lexeme));
                self.builder.emit_a(OpCode::PushConstant, index as i32);
                Ok(())
            }
            TokenKind::Ident => {
                let token = self.advance();
                let index = self.builder.add_name(&token.lexeme);
                self.builder.emit_a(OpCode::PushVar, index as i32);
                Ok(())
            }
            TokenKind::LParen => self.group_or_tuple(),
            TokenKind::New => {
                self.advance();
                let class = self.expect_ident()?;
                let index = self.builder.add_name(&class.lexeme);
                let argc = self.arguments()?;
                self.builder.emit_ab(OpCode::NewClass, index as i32, argc);
                Ok(())
            }
            TokenKind::Eof => Err(CompileError::new(
                CompileErrorKind::UnexpectedEof,
                self.current().span,
            )),
            _ => Err(CompileError::new(
                CompileErrorKind::ExpectedExpression,
                self.current().span,
            )),
        }
    }

    /// `(expr)` is grouping; `(a, b, ...)` builds a tuple
    fn group_or_tuple(&mut self) -> CompileResult<()> {
        self.advance();
        self.expression()?;
        if self.check(TokenKind::Comma) {
            let mut count: i32 = 1;
            while self.eat(TokenKind::Comma).is_some() {
                self.expression()?;
                count += 1;
            }
            self.expect(TokenKind::RParen)?;
            self.builder.emit_a(OpCode::MakeTuple, count);
        } else {
            self.expect(TokenKind::RParen)?;
        }
        Ok(())
    }

    /// Parse a parenthesized argument list, returning the argument count
    fn arguments(&mut self) -> CompileResult<i32> {
        self.expect(TokenKind::LParen)?;
        let mut count: i32 = 0;
        if !self.check(TokenKind::RParen) {
            loop {
                self.expression()?;
                count += 1;
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(count)
    }
}
