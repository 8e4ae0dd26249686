//! Integration tests for the source-to-execution pipeline

use quip_core::bytecode::{disassemble_program, Compiler, OpCode, ProgramBuilder};
use quip_core::lexer::LineIndex;
use quip_core::vm::{BufferConsole, Completion, RuntimeError, Value, VirtualMachine};

/// Compile and execute a script, returning the completion and console
fn run(source: &str) -> (Completion, BufferConsole) {
    let program = Compiler::compile(source).unwrap_or_else(|err| panic!("compile: {err}"));
    let mut vm = VirtualMachine::new();
    let mut console = BufferConsole::new();
    let completion = vm
        .execute(&program, &mut console)
        .unwrap_or_else(|err| panic!("execute: {err}"));
    (completion, console)
}

/// Compile and execute a script, returning its say output
fn said(source: &str) -> String {
    run(source).1.say_output().to_string()
}

/// Compile and execute a script that must fail at runtime
fn run_err(source: &str) -> RuntimeError {
    let program = Compiler::compile(source).unwrap_or_else(|err| panic!("compile: {err}"));
    let mut vm = VirtualMachine::new();
    let mut console = BufferConsole::new();
    vm.execute(&program, &mut console).unwrap_err()
}

#[test]
fn test_hello_world() {
    assert_eq!(said("say \"hello, world\""), "hello, world\n");
}

#[test]
fn test_say_and_echo_are_independent_streams() {
    let (_, console) = run("say \"out\" echo \"err\" say \"out again\"");
    assert_eq!(console.say_output(), "out\nout again\n");
    assert_eq!(console.echo_output(), "err\n");
}

#[test]
fn test_number_formatting_through_the_pipeline() {
    assert_eq!(said("say 0.1 + 0.2"), "0.3\n");
    assert_eq!(said("say 2 / 3"), "0.666667\n");
    assert_eq!(said("say 1000000"), "1e6\n");
    assert_eq!(said("say 5 / 0"), "inf\n");
}

#[test]
fn test_string_escapes_reach_the_output() {
    assert_eq!(said("say \"a\\nb\""), "a\nb\n");
    assert_eq!(said("say \"tab\\there\""), "tab\there\n");
}

#[test]
fn test_statement_separators_are_optional() {
    assert_eq!(said("say 1 say 2"), "1\n2\n");
    assert_eq!(said("say 1; say 2;"), "1\n2\n");
}

#[test]
fn test_and_short_circuits() {
    // `boom` is never defined; reaching it would be a runtime error
    assert_eq!(said("say 0 and boom"), "0\n");

    let err = run_err("say 1 and boom");
    assert!(err.to_string().contains("undefined variable 'boom'"));
}

#[test]
fn test_or_short_circuits() {
    assert_eq!(said("say 1 or boom"), "1\n");

    let err = run_err("say 0 or boom");
    assert!(err.to_string().contains("undefined variable 'boom'"));
}

#[test]
fn test_logical_results_are_boolean_encoded() {
    // The right operand decides the result but is coerced to 1 or 0
    assert_eq!(said("say 2 and 3"), "1\n");
    assert_eq!(said("say 0 or 7"), "1\n");
    assert_eq!(said("say 0 or 0"), "0\n");
    assert_eq!(said("say \"\" or \"x\""), "1\n");
}

#[test]
fn test_if_branches_on_truthiness() {
    assert_eq!(said("if (1 < 2) { say \"yes\" }"), "yes\n");
    assert_eq!(said("if (2 < 1) { say \"yes\" }"), "");
    assert_eq!(said("if (0) { say \"a\" } else { say \"b\" }"), "b\n");
}

#[test]
fn test_else_if_chain() {
    let source = r#"
        x = 2
        if (x == 1) { say "one" }
        else if (x == 2) { say "two" }
        else { say "many" }
    "#;
    assert_eq!(said(source), "two\n");
}

#[test]
fn test_for_loop_counts_upward() {
    assert_eq!(said("for i in 0..3 { say i }"), "0\n1\n2\n");
}

#[test]
fn test_loop_bound_evaluates_once() {
    let source = r#"
        n = 3
        c = 0
        for i in 0..n {
            c = c + 1
            n = 10
        }
        say c
        say n
    "#;
    // Reassigning n inside the body does not extend the loop
    assert_eq!(said(source), "3\n10\n");
}

#[test]
fn test_loop_variable_survives_the_loop() {
    assert_eq!(said("for i in 0..3 {} say i"), "3\n");
}

#[test]
fn test_empty_range_runs_zero_iterations() {
    assert_eq!(said("for i in 5..5 { say \"never\" } say i"), "5\n");
    assert_eq!(said("for i in 3..1 { say \"never\" } say i"), "3\n");
}

#[test]
fn test_nested_loops() {
    let source = r#"
        for i in 0..2 {
            for j in 0..2 {
                say i * 10 + j
            }
        }
    "#;
    assert_eq!(said(source), "0\n1\n10\n11\n");
}

#[test]
fn test_loop_accumulation() {
    let source = r#"
        total = 0
        for i in 1..101 {
            total = total + i
        }
        say total
    "#;
    assert_eq!(said(source), "5050\n");
}

#[test]
fn test_completion_reports_final_variables() {
    let (completion, _) = run("a = 1 b = a * 10");
    assert_eq!(completion.environment.get("a"), Some(&Value::Number(1.0)));
    assert_eq!(completion.environment.get("b"), Some(&Value::Number(10.0)));
    assert_eq!(completion.environment.get("c"), None);
}

#[test]
fn test_repeated_execution_is_deterministic() {
    let program = Compiler::compile("x = 2 say x * x").unwrap();
    let mut vm = VirtualMachine::new();

    for _ in 0..3 {
        let mut console = BufferConsole::new();
        vm.execute(&program, &mut console).unwrap();
        assert_eq!(console.say_output(), "4\n");
    }
}

#[test]
fn test_object_placeholders_keep_scripts_running() {
    let source = r#"
        p = new Point(1, 2)
        say p + 1
        say p.width
        say p.total(3)
    "#;
    let (completion, console) = run(source);
    assert_eq!(console.say_output(), "1\n0\n0\n");
    assert!(!completion.is_fully_supported());

    let ops: Vec<OpCode> = completion.stubbed.iter().map(|s| s.op).collect();
    assert_eq!(
        ops,
        vec![OpCode::NewClass, OpCode::GetField, OpCode::CallMethod]
    );
    assert_eq!(completion.stubbed[0].name.as_deref(), Some("Point"));
    assert_eq!(completion.stubbed[1].name.as_deref(), Some("width"));
    assert_eq!(completion.stubbed[2].name.as_deref(), Some("total"));
}

#[test]
fn test_stub_free_scripts_report_full_support() {
    let (completion, _) = run("say 1 + 2");
    assert!(completion.is_fully_supported());
}

#[test]
fn test_runtime_errors_carry_instruction_position() {
    let err = run_err("say boom");
    assert_eq!(err.at, Some(0));
    assert_eq!(
        err.to_string(),
        "undefined variable 'boom' at instruction 0000"
    );
}

#[test]
fn test_compile_errors_locate_line_and_column() {
    let source = "x = 1\nsay )";
    let err = Compiler::compile(source).unwrap_err();

    let index = LineIndex::new(source);
    let location = index.location(err.span.start);
    assert_eq!(location.line, 2);
    assert_eq!(location.column, 5);
}

#[test]
fn test_disassembly_names_every_symbol() {
    let program = Compiler::compile("width = 2.5 say \"hi\" echo width").unwrap();
    let listing = disassemble_program(&program, "script");

    assert!(listing.contains("== script =="));
    assert!(listing.contains("2.5"));
    assert!(listing.contains("'hi'"));
    assert!(listing.contains("width"));
    assert!(listing.contains("PUSH_CONSTANT"));
    assert!(listing.contains("SAY"));
    assert!(listing.contains("ECHO"));
    assert!(listing.contains("RET"));
}

#[test]
fn test_unresolved_jump_is_rejected() {
    let mut builder = ProgramBuilder::new();
    let _pending = builder.emit_jump(OpCode::Jump);
    builder.emit(OpCode::Return);

    let err = builder.finish().unwrap_err();
    assert!(err.to_string().contains("never resolved"));
}
