//! Bytecode disassembler for debugging

use super::opcode::OpCode;
use super::program::{Literal, Program};
use std::fmt::Write;

/// Disassemble a program to a string
#[must_use]
pub fn disassemble_program(program: &Program, name: &str) -> String {
    let mut output = String::new();

    writeln!(output, "== {name} ==").unwrap();

    for index in 0..program.len() {
        write_instruction(program, index, &mut output);
    }

    output
}

/// Disassemble a single instruction to a one-line string
#[must_use]
pub fn disassemble_instruction(program: &Program, index: usize) -> String {
    let mut output = String::new();
    write_instruction(program, index, &mut output);
    output
}

/// Append the rendering of the instruction at `index` to `output`
fn write_instruction(program: &Program, index: usize, output: &mut String) {
    write!(output, "{index:04} ").unwrap();

    let Some(instruction) = program.instructions().get(index) else {
        writeln!(output, "invalid instruction index").unwrap();
        return;
    };

    let op = instruction.op;
    match op {
        OpCode::PushConstant => {
            let constant = table_entry(instruction.a, |i| program.get_constant(i));
            writeln!(
                output,
                "{:16} {:4} {}",
                op.name(),
                instruction.a,
                format_constant(constant)
            )
            .unwrap();
        }

        OpCode::PushVar | OpCode::SetVar | OpCode::GetField => {
            let name = table_entry(instruction.a, |i| program.get_name(i));
            writeln!(
                output,
                "{:16} {:4} {}",
                op.name(),
                instruction.a,
                format_name(name)
            )
            .unwrap();
        }

        OpCode::CallMethod | OpCode::NewClass => {
            let name = table_entry(instruction.a, |i| program.get_name(i));
            writeln!(
                output,
                "{:16} {:4} {} ({} args)",
                op.name(),
                instruction.a,
                format_name(name),
                instruction.b
            )
            .unwrap();
        }

        OpCode::Jump | OpCode::JumpIfFalse | OpCode::AndEval | OpCode::OrEval => {
            writeln!(output, "{:16} -> {}", op.name(), instruction.a).unwrap();
        }

        OpCode::MakeTuple => {
            writeln!(output, "{:16} {}", op.name(), instruction.a).unwrap();
        }

        _ => {
            writeln!(output, "{}", op.name()).unwrap();
        }
    }
}

/// Look up a table entry by a signed operand
fn table_entry<T>(operand: i32, get: impl Fn(usize) -> Option<T>) -> Option<T> {
    usize::try_from(operand).ok().and_then(get)
}

fn format_constant(constant: Option<&Literal>) -> String {
    match constant {
        Some(Literal::Text(s)) => format!("'{s}'"),
        Some(Literal::Number(n)) => format!("{n}"),
        None => "<invalid>".to_string(),
    }
}

fn format_name(name: Option<&str>) -> String {
    name.map_or_else(|| "<invalid>".to_string(), str::to_string)
}
