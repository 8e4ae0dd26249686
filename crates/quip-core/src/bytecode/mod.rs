//! Bytecode module for the Quip virtual machine
//!
//! This module provides:
//! - `OpCode`: The bytecode instruction set
//! - `Program`: A compiled instruction sequence with its constant and name pools
//! - `ProgramBuilder`: Incremental program construction with jump patching
//! - `Compiler`: Single-pass source to bytecode compilation
//! - Disassembler utilities for debugging

mod compiler;
mod debug;
mod error;
mod opcode;
mod program;

pub use compiler::Compiler;
pub use debug::{disassemble_instruction, disassemble_program};
pub use error::{CompileError, CompileErrorKind, CompileResult, ExpectedToken};
pub use opcode::OpCode;
pub use program::{Instruction, Literal, PatchHandle, Program, ProgramBuilder, UnresolvedJump};
