//! Compiled program representation - instructions plus constant and name pools

// Operand slots are i32 by design; pools anywhere near that size are not
// representable in source anyway.
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use super::opcode::OpCode;
use thiserror::Error;

/// A single bytecode instruction with fixed operand slots
///
/// Every instruction carries three signed operands regardless of opcode;
/// unused slots stay zero. Operand `a` holds table indices and jump
/// targets, `b` holds argument counts for call-style opcodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction {
    pub op: OpCode,
    pub a: i32,
    pub b: i32,
    pub c: i32,
}

impl Instruction {
    /// Create an instruction with no operands
    #[must_use]
    pub const fn new(op: OpCode) -> Self {
        Self { op, a: 0, b: 0, c: 0 }
    }

    /// Create an instruction with operand `a`
    #[must_use]
    pub const fn with_a(op: OpCode, a: i32) -> Self {
        Self { op, a, b: 0, c: 0 }
    }

    /// Create an instruction with operands `a` and `b`
    #[must_use]
    pub const fn with_ab(op: OpCode, a: i32, b: i32) -> Self {
        Self { op, a, b, c: 0 }
    }
}

/// A literal value in the constant pool
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Text(s) => write!(f, "{s}"),
        }
    }
}

/// The compiled artifact: an instruction sequence plus its constant and
/// name pools
///
/// A `Program` can only be obtained from a [`ProgramBuilder`], which
/// guarantees that every jump target was resolved before finalization.
#[derive(Clone, Default)]
pub struct Program {
    instructions: Vec<Instruction>,
    constants: Vec<Literal>,
    names: Vec<String>,
}

impl Program {
    /// Returns the instruction sequence
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the constant pool
    #[must_use]
    pub fn constants(&self) -> &[Literal] {
        &self.constants
    }

    /// Returns the name pool
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Get a constant by pool index
    #[must_use]
    pub fn get_constant(&self, index: usize) -> Option<&Literal> {
        self.constants.get(index)
    }

    /// Get a name by pool index
    #[must_use]
    pub fn get_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Returns the number of instructions
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("instructions", &self.instructions.len())
            .field("constants", &self.constants.len())
            .field("names", &self.names.len())
            .finish()
    }
}

/// Handle to a jump instruction whose target is not yet resolved
///
/// Returned by [`ProgramBuilder::emit_jump`] and consumed by
/// [`ProgramBuilder::resolve`] / [`ProgramBuilder::resolve_here`].
/// Handles cannot be copied, so a jump cannot be patched twice.
#[derive(Debug)]
#[must_use = "an unresolved jump makes the program unfinishable"]
pub struct PatchHandle {
    index: usize,
}

impl PatchHandle {
    /// The instruction index this handle will patch
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Error returned by [`ProgramBuilder::finish`] when a jump target was
/// never resolved
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("jump at instruction {index} was never resolved")]
pub struct UnresolvedJump {
    pub index: usize,
}

/// Incremental builder for a [`Program`]
///
/// Instructions are appended one at a time. Forward and backward branches
/// go through [`emit_jump`](Self::emit_jump), which emits a placeholder
/// target and hands back a [`PatchHandle`]; [`finish`](Self::finish)
/// refuses to produce a `Program` while any handle is outstanding.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    instructions: Vec<Instruction>,
    constants: Vec<Literal>,
    names: Vec<String>,
    /// Instruction indices of jumps emitted but not yet resolved
    unresolved: Vec<usize>,
}

impl ProgramBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The index the next emitted instruction will receive
    #[must_use]
    pub fn next_index(&self) -> usize {
        self.instructions.len()
    }

    /// Append an instruction with no operands, returning its index
    pub fn emit(&mut self, op: OpCode) -> usize {
        let index = self.instructions.len();
        self.instructions.push(Instruction::new(op));
        index
    }

    /// Append an instruction with operand `a`, returning its index
    pub fn emit_a(&mut self, op: OpCode, a: i32) -> usize {
        let index = self.instructions.len();
        self.instructions.push(Instruction::with_a(op, a));
        index
    }

    /// Append an instruction with operands `a` and `b`, returning its index
    pub fn emit_ab(&mut self, op: OpCode, a: i32, b: i32) -> usize {
        let index = self.instructions.len();
        self.instructions.push(Instruction::with_ab(op, a, b));
        index
    }

    /// Append a jump instruction with a placeholder target
    ///
    /// The placeholder is `-1`, never a valid index, so an unpatched jump
    /// is visible in a disassembly. The returned handle must be passed to
    /// [`resolve`](Self::resolve) or [`resolve_here`](Self::resolve_here)
    /// before [`finish`](Self::finish).
    pub fn emit_jump(&mut self, op: OpCode) -> PatchHandle {
        debug_assert!(op.is_jump(), "emit_jump called with non-jump {op:?}");
        let index = self.emit_a(op, -1);
        self.unresolved.push(index);
        PatchHandle { index }
    }

    /// Resolve a jump to an explicit instruction index
    ///
    /// A target equal to the instruction count is valid: jumping there
    /// ends execution.
    pub fn resolve(&mut self, handle: PatchHandle, target: usize) {
        self.instructions[handle.index].a = target as i32;
        self.unresolved.retain(|&index| index != handle.index);
    }

    /// Resolve a jump to the next instruction index
    pub fn resolve_here(&mut self, handle: PatchHandle) {
        let target = self.next_index();
        self.resolve(handle, target);
    }

    /// Intern a constant, returning its pool index
    ///
    /// Identical constants share one pool slot.
    pub fn add_constant(&mut self, literal: Literal) -> usize {
        if let Some(index) = self
            .constants
            .iter()
            .position(|existing| literals_identical(existing, &literal))
        {
            return index;
        }
        let index = self.constants.len();
        self.constants.push(literal);
        index
    }

    /// Intern a name, returning its pool index
    pub fn add_name(&mut self, name: &str) -> usize {
        if let Some(index) = self.names.iter().position(|existing| existing == name) {
            return index;
        }
        let index = self.names.len();
        self.names.push(name.to_string());
        index
    }

    /// Finalize the program
    ///
    /// # Errors
    ///
    /// Returns [`UnresolvedJump`] for the earliest jump whose target was
    /// never resolved.
    pub fn finish(self) -> Result<Program, UnresolvedJump> {
        if let Some(&index) = self.unresolved.iter().min() {
            return Err(UnresolvedJump { index });
        }
        Ok(Program {
            instructions: self.instructions,
            constants: self.constants,
            names: self.names,
        })
    }
}

/// Check if two literals are identical (for constant deduplication)
fn literals_identical(a: &Literal, b: &Literal) -> bool {
    match (a, b) {
        (Literal::Number(a), Literal::Number(b)) => a.to_bits() == b.to_bits(),
        (Literal::Text(a), Literal::Text(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_appends_in_order() {
        let mut builder = ProgramBuilder::new();
        let index = builder.add_constant(Literal::Number(1.0));
        builder.emit_a(OpCode::PushConstant, index as i32);
        builder.emit(OpCode::Pop);
        builder.emit(OpCode::Return);

        let program = builder.finish().unwrap();
        assert_eq!(program.len(), 3);
        assert_eq!(program.instructions()[0].op, OpCode::PushConstant);
        assert_eq!(program.instructions()[2].op, OpCode::Return);
    }

    #[test]
    fn constant_deduplication() {
        let mut builder = ProgramBuilder::new();
        let a = builder.add_constant(Literal::Number(42.0));
        let b = builder.add_constant(Literal::Number(42.0));
        let c = builder.add_constant(Literal::Number(100.0));
        let d = builder.add_constant(Literal::Text("hi".to_string()));
        let e = builder.add_constant(Literal::Text("hi".to_string()));

        assert_eq!(a, b);
        assert_eq!(c, 1);
        assert_eq!(d, 2);
        assert_eq!(d, e);

        let program = builder.finish().unwrap();
        assert_eq!(program.constants().len(), 3);
        assert_eq!(program.get_constant(0), Some(&Literal::Number(42.0)));
    }

    #[test]
    fn name_interning() {
        let mut builder = ProgramBuilder::new();
        assert_eq!(builder.add_name("x"), 0);
        assert_eq!(builder.add_name("y"), 1);
        assert_eq!(builder.add_name("x"), 0);

        let program = builder.finish().unwrap();
        assert_eq!(program.get_name(1), Some("y"));
        assert_eq!(program.get_name(2), None);
    }

    #[test]
    fn jump_resolution() {
        let mut builder = ProgramBuilder::new();
        let handle = builder.emit_jump(OpCode::JumpIfFalse);
        builder.emit(OpCode::Pop);
        builder.emit(OpCode::Pop);
        builder.resolve_here(handle);
        builder.emit(OpCode::Return);

        let program = builder.finish().unwrap();
        assert_eq!(program.instructions()[0].a, 3);
    }

    #[test]
    fn placeholder_target_is_invalid() {
        let mut builder = ProgramBuilder::new();
        let handle = builder.emit_jump(OpCode::Jump);
        assert_eq!(builder.instructions[handle.index()].a, -1);
        builder.resolve(handle, 0);
    }

    #[test]
    fn finish_rejects_unresolved_jump() {
        let mut builder = ProgramBuilder::new();
        builder.emit(OpCode::Pop);
        let _handle = builder.emit_jump(OpCode::Jump);
        builder.emit(OpCode::Return);

        let err = builder.finish().unwrap_err();
        assert_eq!(err, UnresolvedJump { index: 1 });
    }

    #[test]
    fn resolve_to_instruction_count_is_valid() {
        // Jumping to one past the last instruction ends execution
        let mut builder = ProgramBuilder::new();
        let handle = builder.emit_jump(OpCode::Jump);
        builder.resolve(handle, 1);
        let program = builder.finish().unwrap();
        assert_eq!(program.instructions()[0].a, 1);
    }
}
