//! Quip CLI - Command-line interface for the Quip programming language

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use quip_core::bytecode::{disassemble_program, CompileError};
use quip_core::lexer::LineIndex;
use quip_core::vm::Completion;
use quip_core::{Compiler, StdioConsole, VirtualMachine};

#[derive(Parser)]
#[command(name = "quip")]
#[command(version = quip_core::VERSION)]
#[command(about = "The Quip scripting language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Quip source file
    Run {
        /// Path to the source file
        file: PathBuf,
    },

    /// Evaluate Quip source text given on the command line
    Eval {
        /// Source text to evaluate
        source: String,
    },

    /// Compile a Quip source file and print its disassembly
    Dis {
        /// Path to the source file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file } => run_file(&file)?,
        Commands::Eval { source } => eval_source(&source)?,
        Commands::Dis { file } => disassemble_file(&file)?,
    }

    Ok(())
}

/// Run a Quip source file
fn run_file(path: &PathBuf) -> Result<()> {
    let source = read_source(path)?;
    let origin = path.display().to_string();

    let program = Compiler::compile(&source)
        .map_err(|e| anyhow::anyhow!("{}", render_compile_error(&origin, &source, &e)))?;

    let mut vm = VirtualMachine::new();
    let mut console = StdioConsole;
    let completion = vm
        .execute(&program, &mut console)
        .map_err(|e| anyhow::anyhow!("Runtime error: {e}"))?;

    report_stubs(&completion);
    Ok(())
}

/// Evaluate source text given directly on the command line
fn eval_source(source: &str) -> Result<()> {
    let program = Compiler::compile(source)
        .map_err(|e| anyhow::anyhow!("{}", render_compile_error("<eval>", source, &e)))?;

    let mut vm = VirtualMachine::new();
    let mut console = StdioConsole;
    let completion = vm
        .execute(&program, &mut console)
        .map_err(|e| anyhow::anyhow!("Runtime error: {e}"))?;

    report_stubs(&completion);
    Ok(())
}

/// Compile a Quip source file and print the disassembly
fn disassemble_file(path: &PathBuf) -> Result<()> {
    let source = read_source(path)?;
    let origin = path.display().to_string();

    let program = Compiler::compile(&source)
        .map_err(|e| anyhow::anyhow!("{}", render_compile_error(&origin, &source, &e)))?;

    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("program");
    print!("{}", disassemble_program(&program, name));
    Ok(())
}

fn read_source(path: &PathBuf) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file '{}': {}", path.display(), e))
}

/// Render a compile error as `origin:line:column: message`
fn render_compile_error(origin: &str, source: &str, error: &CompileError) -> String {
    let index = LineIndex::new(source);
    let location = index.location(error.span.start);

    let mut message = format!("{origin}:{location}: {}", error.kind);
    if let Some(hint) = &error.hint {
        message.push_str(&format!(" (hint: {hint})"));
    }
    message
}

/// Note any object operations that ran with placeholder semantics
fn report_stubs(completion: &Completion) {
    if !completion.is_fully_supported() {
        eprintln!(
            "note: {} unsupported object operation(s) executed with stub semantics",
            completion.stubbed.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_parses_file_argument() {
        use clap::Parser as ClapParser;
        let cli = Cli::try_parse_from(["quip", "run", "script.quip"]).unwrap();
        match cli.command {
            Commands::Run { file } => assert_eq!(file, PathBuf::from("script.quip")),
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_eval_parses_source_argument() {
        use clap::Parser as ClapParser;
        let cli = Cli::try_parse_from(["quip", "eval", "say 1 + 2"]).unwrap();
        match cli.command {
            Commands::Eval { source } => assert_eq!(source, "say 1 + 2"),
            _ => panic!("Expected Eval command"),
        }
    }

    #[test]
    fn test_dis_parses_file_argument() {
        use clap::Parser as ClapParser;
        let cli = Cli::try_parse_from(["quip", "dis", "script.quip"]).unwrap();
        match cli.command {
            Commands::Dis { file } => assert_eq!(file, PathBuf::from("script.quip")),
            _ => panic!("Expected Dis command"),
        }
    }

    #[test]
    fn test_subcommand_is_required() {
        use clap::Parser as ClapParser;
        assert!(Cli::try_parse_from(["quip"]).is_err());
    }

    #[test]
    fn test_run_executes_a_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "x = 2 say x * 21").unwrap();

        run_file(&file.path().to_path_buf()).unwrap();
    }

    #[test]
    fn test_run_reports_missing_file() {
        let err = run_file(&PathBuf::from("does-not-exist.quip")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }

    #[test]
    fn test_compile_errors_include_position() {
        let source = "x = 1\nsay )";
        let err = Compiler::compile(source).unwrap_err();

        let rendered = render_compile_error("script.quip", source, &err);
        assert!(rendered.starts_with("script.quip:2:5:"), "got: {rendered}");
    }

    #[test]
    fn test_eval_rejects_malformed_source() {
        let err = eval_source("say (1 +").unwrap_err();
        assert!(err.to_string().starts_with("<eval>:"));
    }
}
