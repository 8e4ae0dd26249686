//! Quip Core - Language engine for the Quip programming language
//!
//! This crate provides the core functionality:
//! - Lexer: Tokenization of source code
//! - Bytecode: Instruction set, single-pass compiler, and disassembler
//! - VM: Bytecode execution

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lexer module - tokenization of Quip source code
pub mod lexer;

/// Bytecode module - instruction set and single-pass compiler
pub mod bytecode;

/// Virtual Machine module - bytecode execution
pub mod vm;

/// Convenience re-export of lexer
pub use lexer::Lexer;

/// Convenience re-export of bytecode compiler
pub use bytecode::Compiler;

/// Convenience re-export of compiled program
pub use bytecode::Program;

/// Convenience re-export of VM
pub use vm::VirtualMachine;

/// Convenience re-export of output channels
pub use vm::{BufferConsole, Console, StdioConsole};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }

    /// Helper to compile and run a Quip script, returning the say channel
    fn run_script(source: &str) -> Result<String, String> {
        let program = Compiler::compile(source).map_err(|e| format!("{e}"))?;
        let mut vm = VirtualMachine::new();
        let mut console = BufferConsole::new();
        vm.execute(&program, &mut console)
            .map_err(|e| format!("{e}"))?;
        Ok(console.say_output().to_string())
    }

    #[test]
    fn test_simple_script() {
        let output = run_script("x = 6 say x * 7").unwrap();
        assert_eq!(output, "42\n");
    }

    #[test]
    fn test_control_flow() {
        let source = r#"
            total = 0
            for i in 1..4 {
                total = total + i
            }
            if (total == 6) { say "six" } else { say "not six" }
        "#;
        let output = run_script(source).unwrap();
        assert_eq!(output, "six\n");
    }

    #[test]
    fn test_errors_surface_from_both_stages() {
        assert!(Compiler::compile("say (").is_err());
        assert!(run_script("say nowhere").is_err());
    }
}
