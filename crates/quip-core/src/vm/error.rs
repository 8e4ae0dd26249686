//! Runtime errors for the Quip virtual machine

use std::fmt;
use thiserror::Error;

/// A runtime error that occurred during VM execution
///
/// Execution aborts on the first runtime error; there is no recovery or
/// exception handling in the language.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    /// The kind of error
    pub kind: RuntimeErrorKind,

    /// Instruction index at the point of error
    pub at: Option<usize>,
}

impl RuntimeError {
    /// Create a new runtime error
    #[must_use]
    pub fn new(kind: RuntimeErrorKind) -> Self {
        Self { kind, at: None }
    }

    /// Attach the instruction index where the error occurred
    #[must_use]
    pub fn at(mut self, index: usize) -> Self {
        self.at = Some(index);
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(index) = self.at {
            write!(f, " at instruction {index:04}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {}

/// The kind of runtime error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    /// Type mismatch in an operation
    #[error("type error: '{operation}' expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
        operation: &'static str,
    },

    /// Variable read before any assignment
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    /// Pop from an empty value stack (compiler bug)
    #[error("stack underflow")]
    StackUnderflow,

    /// Value stack grew past its limit
    #[error("stack overflow")]
    StackOverflow,

    /// Jump target outside the instruction sequence
    #[error("jump target {target} outside program of {length} instructions")]
    JumpOutOfBounds { target: i32, length: usize },

    /// Constant pool index outside the pool
    #[error("constant index {index} outside pool of {length} entries")]
    ConstantOutOfBounds { index: i32, length: usize },

    /// Name pool index outside the pool
    #[error("name index {index} outside pool of {length} entries")]
    NameOutOfBounds { index: i32, length: usize },

    /// Operand that cannot be interpreted (e.g. a negative count)
    #[error("invalid operand {operand} for {operation}")]
    InvalidOperand {
        operation: &'static str,
        operand: i32,
    },
}

/// Result type for VM operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location() {
        let err = RuntimeError::new(RuntimeErrorKind::StackUnderflow).at(7);
        assert_eq!(err.to_string(), "stack underflow at instruction 0007");
    }

    #[test]
    fn display_without_location() {
        let err = RuntimeError::new(RuntimeErrorKind::UndefinedVariable("x".to_string()));
        assert_eq!(err.to_string(), "undefined variable 'x'");
    }

    #[test]
    fn type_error_names_both_sides() {
        let err = RuntimeError::new(RuntimeErrorKind::TypeError {
            expected: "number",
            got: "text",
            operation: "+",
        });
        assert_eq!(err.to_string(), "type error: '+' expected number, got text");
    }
}
