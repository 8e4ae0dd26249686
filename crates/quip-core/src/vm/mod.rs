//! Virtual machine for the Quip programming language
//!
//! This module provides a stack-based bytecode interpreter that executes
//! compiled Quip programs. Every table and jump access is bounds checked,
//! so a malformed program fails with a typed error instead of undefined
//! behavior.

mod error;
mod output;
mod value;

pub use error::{RuntimeError, RuntimeErrorKind, RuntimeResult};
pub use output::{BufferConsole, Console, StdioConsole};
pub use value::Value;

use std::collections::HashMap;

use crate::bytecode::{Instruction, Literal, OpCode, Program};

/// Maximum value stack size
const MAX_STACK: usize = 65536;

/// Variable storage for one execution
///
/// Variables come into existence on first assignment; reading a variable
/// that was never assigned is a runtime error. Each call to
/// [`VirtualMachine::execute`] starts from an empty environment.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    variables: HashMap<String, Value>,
}

impl Environment {
    /// Create an empty environment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a variable
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Assign a variable, creating it if needed
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Number of defined variables
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Returns true if no variable is defined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Record of one object instruction that executed with placeholder
/// semantics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubbedOp {
    /// Instruction index where it executed
    pub index: usize,
    /// The operation
    pub op: OpCode,
    /// The field, method, or class name involved, when the instruction
    /// carries one
    pub name: Option<String>,
}

/// The outcome of a successful execution
#[derive(Debug)]
pub struct Completion {
    /// Final variable state
    pub environment: Environment,
    /// Object instructions that executed with placeholder semantics, in
    /// execution order
    pub stubbed: Vec<StubbedOp>,
}

impl Completion {
    /// True if execution involved no placeholder semantics
    #[must_use]
    pub fn is_fully_supported(&self) -> bool {
        self.stubbed.is_empty()
    }
}

/// The Quip virtual machine
///
/// A machine instance can execute any number of programs; each execution
/// gets a fresh environment and value stack, and nothing carries over
/// between runs.
pub struct VirtualMachine {
    /// Value stack
    stack: Vec<Value>,
    /// Variable state for the current execution
    environment: Environment,
    /// Instruction pointer
    ip: usize,
    /// Stub executions recorded during the current run
    stubbed: Vec<StubbedOp>,
}

impl Default for VirtualMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualMachine {
    /// Create a new virtual machine
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(256),
            environment: Environment::new(),
            ip: 0,
            stubbed: Vec::new(),
        }
    }

    /// Execute a program to completion
    ///
    /// Execution starts at instruction 0 with an empty environment and
    /// runs until `RET`, until the instruction sequence is exhausted, or
    /// until a runtime error aborts it. Output goes to `console`.
    ///
    /// # Errors
    ///
    /// Returns a [`RuntimeError`] carrying the failing instruction index.
    pub fn execute(
        &mut self,
        program: &Program,
        console: &mut dyn Console,
    ) -> RuntimeResult<Completion> {
        // Clear any leftover state from previous runs
        self.stack.clear();
        self.environment = Environment::new();
        self.ip = 0;
        self.stubbed.clear();

        loop {
            let Some(&instruction) = program.instructions().get(self.ip) else {
                break;
            };
            let at = self.ip;
            self.ip += 1;

            match instruction.op {
                OpCode::Return => break,

                OpCode::PushConstant => {
                    let literal = self.constant(program, &instruction)?;
                    let value = Value::from(literal);
                    self.push(value)?;
                }

                OpCode::Pop => {
                    self.pop()?;
                }

                OpCode::Dup => {
                    let top = self.peek()?.clone();
                    self.push(top)?;
                }

                OpCode::PushVar => {
                    let name = self.name(program, &instruction)?;
                    let value = self.environment.get(name).cloned().ok_or_else(|| {
                        self.runtime_error(RuntimeErrorKind::UndefinedVariable(name.to_string()))
                    })?;
                    self.push(value)?;
                }

                OpCode::SetVar => {
                    let name = self.name(program, &instruction)?.to_string();
                    let value = self.pop()?;
                    self.environment.set(name, value);
                }

                OpCode::Add => self.arithmetic_op("+", |x, y| x + y)?,
                OpCode::Sub => self.arithmetic_op("-", |x, y| x - y)?,
                OpCode::Mul => self.arithmetic_op("*", |x, y| x * y)?,
                // Division by zero yields positive infinity, never an error
                OpCode::Div => {
                    self.arithmetic_op("/", |x, y| if y == 0.0 { f64::INFINITY } else { x / y })?;
                }
                OpCode::Mod => self.arithmetic_op("%", |x, y| x % y)?,

                OpCode::Neg => {
                    let value = self.pop()?;
                    match value {
                        Value::Number(n) => self.push(Value::Number(-n))?,
                        other => {
                            return Err(self.runtime_error(RuntimeErrorKind::TypeError {
                                expected: "number",
                                got: other.type_name(),
                                operation: "-",
                            }));
                        }
                    }
                }

                // Equality works across kinds and never errors; values of
                // different kinds are simply unequal
                OpCode::Eq => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    self.push(Value::truth(left == right))?;
                }
                OpCode::Ne => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    self.push(Value::truth(left != right))?;
                }

                OpCode::Lt => self.comparison_op("<", |x, y| x < y)?,
                OpCode::Le => self.comparison_op("<=", |x, y| x <= y)?,
                OpCode::Gt => self.comparison_op(">", |x, y| x > y)?,
                OpCode::Ge => self.comparison_op(">=", |x, y| x >= y)?,

                OpCode::Not => {
                    let value = self.pop()?;
                    self.push(Value::truth(!value.is_truthy()))?;
                }

                OpCode::BoolBegin => {}

                OpCode::AndEval => {
                    let left = self.pop()?;
                    if !left.is_truthy() {
                        self.push(Value::truth(false))?;
                        self.ip = self.jump_target(program, &instruction)?;
                    }
                }

                OpCode::OrEval => {
                    let left = self.pop()?;
                    if left.is_truthy() {
                        self.push(Value::truth(true))?;
                        self.ip = self.jump_target(program, &instruction)?;
                    }
                }

                OpCode::BoolEnd => {
                    let value = self.pop()?;
                    self.push(Value::truth(value.is_truthy()))?;
                }

                OpCode::Jump => {
                    self.ip = self.jump_target(program, &instruction)?;
                }

                OpCode::JumpIfFalse => {
                    let condition = self.pop()?;
                    if !condition.is_truthy() {
                        self.ip = self.jump_target(program, &instruction)?;
                    }
                }

                OpCode::Say => {
                    let value = self.pop()?;
                    console.say(&value.to_string());
                }

                OpCode::Echo => {
                    let value = self.pop()?;
                    console.echo(&value.to_string());
                }

                OpCode::GetField => {
                    let name = self.name(program, &instruction)?.to_string();
                    self.run_stub(at, instruction.op, Some(name), 1)?;
                }

                OpCode::CallMethod => {
                    let name = self.name(program, &instruction)?.to_string();
                    let argc = self.count_operand(instruction.op, instruction.b)?;
                    self.run_stub(at, instruction.op, Some(name), argc + 1)?;
                }

                OpCode::NewClass => {
                    let name = self.name(program, &instruction)?.to_string();
                    let argc = self.count_operand(instruction.op, instruction.b)?;
                    self.run_stub(at, instruction.op, Some(name), argc)?;
                }

                OpCode::MakeTuple => {
                    let count = self.count_operand(instruction.op, instruction.a)?;
                    self.run_stub(at, instruction.op, None, count)?;
                }
            }
        }

        Ok(Completion {
            environment: std::mem::take(&mut self.environment),
            stubbed: std::mem::take(&mut self.stubbed),
        })
    }

    // ===== Stack operations =====

    #[inline]
    fn push(&mut self, value: Value) -> RuntimeResult<()> {
        if self.stack.len() >= MAX_STACK {
            return Err(self.runtime_error(RuntimeErrorKind::StackOverflow));
        }
        self.stack.push(value);
        Ok(())
    }

    #[inline]
    fn pop(&mut self) -> RuntimeResult<Value> {
        self.stack
            .pop()
            .ok_or_else(|| self.runtime_error(RuntimeErrorKind::StackUnderflow))
    }

    #[inline]
    fn peek(&self) -> RuntimeResult<&Value> {
        self.stack
            .last()
            .ok_or_else(|| self.runtime_error(RuntimeErrorKind::StackUnderflow))
    }

    // ===== Table access =====

    fn constant<'p>(
        &self,
        program: &'p Program,
        instruction: &Instruction,
    ) -> RuntimeResult<&'p Literal> {
        usize::try_from(instruction.a)
            .ok()
            .and_then(|index| program.get_constant(index))
            .ok_or_else(|| {
                self.runtime_error(RuntimeErrorKind::ConstantOutOfBounds {
                    index: instruction.a,
                    length: program.constants().len(),
                })
            })
    }

    fn name<'p>(
        &self,
        program: &'p Program,
        instruction: &Instruction,
    ) -> RuntimeResult<&'p str> {
        usize::try_from(instruction.a)
            .ok()
            .and_then(|index| program.get_name(index))
            .ok_or_else(|| {
                self.runtime_error(RuntimeErrorKind::NameOutOfBounds {
                    index: instruction.a,
                    length: program.names().len(),
                })
            })
    }

    /// Validate a jump target. A target equal to the instruction count is
    /// allowed; it ends execution.
    fn jump_target(&self, program: &Program, instruction: &Instruction) -> RuntimeResult<usize> {
        match usize::try_from(instruction.a) {
            Ok(index) if index <= program.len() => Ok(index),
            _ => Err(self.runtime_error(RuntimeErrorKind::JumpOutOfBounds {
                target: instruction.a,
                length: program.len(),
            })),
        }
    }

    /// Interpret a signed operand as an element count
    fn count_operand(&self, op: OpCode, operand: i32) -> RuntimeResult<usize> {
        usize::try_from(operand).map_err(|_| {
            self.runtime_error(RuntimeErrorKind::InvalidOperand {
                operation: op.name(),
                operand,
            })
        })
    }

    // ===== Operation helpers =====

    fn arithmetic_op<F>(&mut self, operation: &'static str, op: F) -> RuntimeResult<()>
    where
        F: FnOnce(f64, f64) -> f64,
    {
        let right = self.pop()?;
        let left = self.pop()?;
        match (&left, &right) {
            (Value::Number(x), Value::Number(y)) => self.push(Value::Number(op(*x, *y))),
            _ => Err(self.type_error("number", operation, &left, &right)),
        }
    }

    fn comparison_op<F>(&mut self, operation: &'static str, op: F) -> RuntimeResult<()>
    where
        F: FnOnce(f64, f64) -> bool,
    {
        let right = self.pop()?;
        let left = self.pop()?;
        match (&left, &right) {
            (Value::Number(x), Value::Number(y)) => self.push(Value::truth(op(*x, *y))),
            _ => Err(self.type_error("number", operation, &left, &right)),
        }
    }

    /// Execute an object instruction with placeholder semantics: pop its
    /// declared slots, push a single zero placeholder, record the event
    fn run_stub(
        &mut self,
        at: usize,
        op: OpCode,
        name: Option<String>,
        pops: usize,
    ) -> RuntimeResult<()> {
        for _ in 0..pops {
            self.pop()?;
        }
        self.push(Value::Number(0.0))?;
        self.stubbed.push(StubbedOp {
            index: at,
            op,
            name,
        });
        Ok(())
    }

    fn type_error(
        &self,
        expected: &'static str,
        operation: &'static str,
        left: &Value,
        right: &Value,
    ) -> RuntimeError {
        let got = if matches!(left, Value::Number(_)) {
            right.type_name()
        } else {
            left.type_name()
        };
        self.runtime_error(RuntimeErrorKind::TypeError {
            expected,
            got,
            operation,
        })
    }

    fn runtime_error(&self, kind: RuntimeErrorKind) -> RuntimeError {
        RuntimeError::new(kind).at(self.ip.saturating_sub(1))
    }
}
