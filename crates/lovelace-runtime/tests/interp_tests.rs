//! End-to-end tests for the Lovelace interpreter.
//!
//! Each test runs a complete program through `run_source` and asserts on
//! the captured output lines or the fatal error.

use lovelace_runtime::{Interpreter, RuntimeError};
use std::cell::RefCell;
use std::rc::Rc;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Run a program, returning its emitted lines (panics on a fatal error).
fn run(src: &str) -> Vec<String> {
    try_run(src).expect("program failed")
}

/// Run a program, returning emitted lines or the fatal error.
fn try_run(src: &str) -> Result<Vec<String>, RuntimeError> {
    let out = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&out);
    let mut interp = Interpreter::new(move |s| sink.borrow_mut().push(s.to_string()));
    let result = interp.run_source(src);
    result.map(|()| out.borrow().clone())
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn var_and_out() {
    assert_eq!(run("var x (5)\nout x"), ["5"]);
}

#[test]
fn out_string_building() {
    assert_eq!(run("var n (3)\nout \"n = \" + str(n)"), ["n = 3"]);
}

#[test]
fn mem_round_trip() {
    assert_eq!(run("mem[0] = 7\nout mem[0] + 1"), ["8"]);
}

#[test]
fn mem_write_with_expression_index() {
    assert_eq!(run("var i (2)\nmem[i + 1] = 10\nout mem[3]"), ["10"]);
}

#[test]
fn unwritten_mem_reads_as_zero() {
    assert_eq!(run("out mem[99]"), ["0"]);
}

#[test]
fn mem_holds_strings_without_reinterpretation() {
    assert_eq!(run("mem[0] = \"hi\"\nout mem[0] + \"!\""), ["hi!"]);
}

#[test]
fn sleep_zero_is_a_noop() {
    assert_eq!(run("sleep(0)\nout \"done\""), ["done"]);
}

#[test]
fn comments_are_stripped() {
    assert_eq!(run("out 1 ### trailing\n### whole line\nout 2"), ["1", "2"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Conditionals
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn if_else_takes_the_true_arm() {
    let src = "var x (5)\nif (x > 3):\nout \"big\"\nelse:\nout \"small\"\nend";
    assert_eq!(run(src), ["big"]);
}

#[test]
fn if_else_takes_the_else_arm() {
    let src = "var x (1)\nif (x > 3):\nout \"big\"\nelse:\nout \"small\"\nend";
    assert_eq!(run(src), ["small"]);
}

#[test]
fn exactly_one_arm_executes() {
    let src = "\
var x (7)
if (x > 10):
out \"a\"
elif (x > 5):
out \"b\"
elif (x > 0):
out \"c\"
else:
out \"d\"
end";
    assert_eq!(run(src), ["b"]);
}

#[test]
fn false_if_without_else_executes_nothing() {
    assert_eq!(run("if (0):\nout \"never\"\nend\nout \"after\""), ["after"]);
}

#[test]
fn nested_conditionals() {
    let src = "\
var x (4)
if (x > 1):
if (x > 3):
out \"inner\"
end
out \"outer\"
end";
    assert_eq!(run(src), ["inner", "outer"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Loops
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn counted_loop_repeats() {
    assert_eq!(run("loop (3):\nout \"hi\"\nend"), ["hi", "hi", "hi"]);
}

#[test]
fn negative_count_runs_zero_times() {
    assert_eq!(run("loop (-2):\nout \"no\"\nend\nout \"ok\""), ["ok"]);
}

#[test]
fn non_numeric_count_runs_zero_times() {
    // statement-level coercion: an unreadable count is zero, not an error
    assert_eq!(run("loop (\"abc\"):\nout \"never\"\nend\nout \"ok\""), ["ok"]);
}

#[test]
fn loop_body_side_effects_reexecute() {
    let src = "var n (0)\nloop (3):\nvar n (n + 1)\nout n\nend";
    assert_eq!(run(src), ["1", "2", "3"]);
}

#[test]
fn count_is_evaluated_once() {
    // mutating the counter variable inside the body must not change the
    // iteration count
    let src = "var k (2)\nloop (k):\nvar k (99)\nout \"x\"\nend";
    assert_eq!(run(src), ["x", "x"]);
}

#[test]
fn each_loop_binds_item_in_order() {
    let src = "var xs ([10, 20, 30])\nloop xs:\nout item\nend";
    assert_eq!(run(src), ["10", "20", "30"]);
}

#[test]
fn item_is_unbound_after_the_loop() {
    let src = "var xs ([1])\nloop xs:\nout item\nend\nout item";
    // after the loop, `item` is gone, so the expression degrades to text
    assert_eq!(run(src), ["1", "item"]);
}

#[test]
fn each_loop_over_unbound_name_is_empty() {
    assert_eq!(run("loop ghost:\nout \"never\"\nend\nout \"ok\""), ["ok"]);
}

#[test]
fn each_loop_over_string_iterates_chars() {
    assert_eq!(run("var s (\"ab\")\nloop s:\nout item\nend"), ["a", "b"]);
}

#[test]
fn nested_loops() {
    assert_eq!(
        run("loop (2):\nloop (2):\nout \"x\"\nend\nend"),
        ["x", "x", "x", "x"]
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn expression_function() {
    assert_eq!(run("fn sq(n) => n * n\nout sq(4)"), ["16"]);
}

#[test]
fn expression_function_reads_caller_vars() {
    assert_eq!(run("var base (10)\nfn add(n) => base + n\nout add(2)"), ["12"]);
}

#[test]
fn nested_calls_inside_expressions() {
    assert_eq!(run("fn sq(n) => n * n\nout sq(sq(2)) + 1"), ["17"]);
}

#[test]
fn block_function_with_return() {
    let src = "\
fn pick(n):
if (n > 0):
var sign (\"pos\")
else:
var sign (\"neg\")
end
return sign
end
out pick(3)
out pick(-3)";
    assert_eq!(run(src), ["pos", "neg"]);
}

#[test]
fn block_function_return_bypasses_remaining_lines() {
    let src = "fn f():\nreturn 1\nout \"unreachable\"\nend\nout f()";
    assert_eq!(run(src), ["1"]);
}

#[test]
fn block_function_without_return_yields_none() {
    assert_eq!(run("fn noop():\nout \"ran\"\nend\nout noop()"), ["ran", "none"]);
}

#[test]
fn block_function_restores_caller_environment() {
    let src = "\
var x (1)
fn mutate():
var x (99)
return x
end
out mutate()
out x";
    // inside the call the live environment is shared, but the snapshot
    // comes back on return
    assert_eq!(run(src), ["99", "1"]);
}

#[test]
fn expression_function_is_pure_for_the_caller() {
    let src = "var n (1)\nfn shadow(n) => n * 2\nout shadow(5)\nout n";
    assert_eq!(run(src), ["10", "1"]);
}

#[test]
fn bare_call_runs_for_side_effects() {
    let src = "fn announce(n):\nout \"n = \" + str(n)\nend\nannounce(5)";
    assert_eq!(run(src), ["n = 5"]);
}

#[test]
fn block_function_body_may_contain_loops() {
    let src = "fn ticks(k):\nloop (k):\nout \"tick\"\nend\nend\nticks(2)";
    assert_eq!(run(src), ["tick", "tick"]);
}

#[test]
fn expression_function_may_call_block_function() {
    let src = "fn five():\nreturn 5\nend\nfn plus(x) => five() + x\nout plus(1)";
    assert_eq!(run(src), ["6"]);
}

#[test]
fn later_definition_overwrites() {
    assert_eq!(run("fn f() => 1\nfn f() => 2\nout f()"), ["2"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Spawn
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn spawn_emits_one_line_per_iteration() {
    assert_eq!(
        run("spawn (3) (solo)"),
        ["[spawn] solo (simulated)"; 3]
    );
}

#[test]
fn spawn_picks_from_the_given_pool() {
    for line in run("spawn (10) (alpha, beta)") {
        assert!(line == "[spawn] alpha (simulated)" || line == "[spawn] beta (simulated)");
    }
}

#[test]
fn spawn_ran_uses_the_builtin_pool() {
    let lines = run("spawn (5) (RAN)");
    assert_eq!(lines.len(), 5);
    for line in lines {
        assert!(line.starts_with("[spawn] "));
        assert!(line.ends_with(" (simulated)"));
    }
}

#[test]
fn spawn_count_can_be_an_expression() {
    assert_eq!(run("var n (1)\nspawn (n + 1) (x)").len(), 2);
}

#[test]
fn spawn_with_empty_name_pool_launches_unknown() {
    assert_eq!(run("spawn (1) ( , )"), ["[spawn] unknown (simulated)"]);
}

#[test]
fn non_numeric_spawn_count_launches_nothing() {
    assert!(run("spawn (\"abc\") (x)").is_empty());
}

// ══════════════════════════════════════════════════════════════════════════════
// Fallback policy
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn unevaluable_expression_degrades_to_its_text() {
    assert_eq!(run("out 1 +"), ["1 +"]);
}

#[test]
fn type_error_degrades_to_text() {
    assert_eq!(run("out 1 + \"a\""), ["1 + \"a\""]);
}

#[test]
fn unknown_function_inside_expression_degrades() {
    assert_eq!(run("out ghost(1)"), ["ghost(1)"]);
}

#[test]
fn unquoted_word_reads_as_its_own_name() {
    // unknown identifier → fallback → the raw text
    assert_eq!(run("out hello"), ["hello"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Fatal errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn unterminated_block_is_malformed() {
    assert_eq!(
        try_run("if (1):\nout 1"),
        Err(RuntimeError::MalformedBlock("if (1):".into()))
    );
}

#[test]
fn unterminated_loop_is_malformed() {
    assert!(matches!(
        try_run("loop (2):\nout 1"),
        Err(RuntimeError::MalformedBlock(_))
    ));
}

#[test]
fn stray_elif_is_illegal_control() {
    assert!(matches!(
        try_run("elif (1):\nout 1\nend"),
        Err(RuntimeError::IllegalControl(_))
    ));
}

#[test]
fn stray_end_is_illegal_control() {
    assert!(matches!(try_run("end"), Err(RuntimeError::IllegalControl(_))));
}

#[test]
fn top_level_return_is_illegal_control() {
    let err = try_run("return 1").expect_err("expected failure");
    let RuntimeError::IllegalControl(msg) = err else {
        panic!("wrong error kind");
    };
    assert!(msg.contains("outside of a function"));
}

#[test]
fn return_nested_in_function_if_is_illegal_control() {
    let src = "fn f():\nif (1):\nreturn 1\nend\nend\nf()";
    assert!(matches!(
        try_run(src),
        Err(RuntimeError::IllegalControl(_))
    ));
}

#[test]
fn unknown_bare_call_is_fatal() {
    assert_eq!(
        try_run("launch(1)"),
        Err(RuntimeError::UnknownFunction("launch".into()))
    );
}

#[test]
fn unrecognized_line_reports_itself_verbatim() {
    assert_eq!(
        try_run("this is not lovelace"),
        Err(RuntimeError::UnrecognizedStatement("this is not lovelace".into()))
    );
}

#[test]
fn runaway_recursion_hits_the_limit() {
    assert!(matches!(
        try_run("fn f(n) => f(n)\nf(1)"),
        Err(RuntimeError::RecursionLimit(_))
    ));
}

#[test]
fn recursion_limit_pierces_the_expression_fallback() {
    // even in an `out` expression the limit must surface, not degrade
    assert!(matches!(
        try_run("fn f(n) => f(n)\nout f(1)"),
        Err(RuntimeError::RecursionLimit(_))
    ));
}

#[test]
fn error_inside_called_block_function_propagates() {
    let src = "fn bad():\nthis is not lovelace\nend\nbad()";
    assert!(matches!(
        try_run(src),
        Err(RuntimeError::UnrecognizedStatement(_))
    ));
}

// ══════════════════════════════════════════════════════════════════════════════
// run_file
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn run_file_reads_and_executes() {
    let path = std::env::temp_dir().join("lovelace_run_file_test.lovelace");
    std::fs::write(&path, "out \"from file\"\n").expect("write temp script");
    let out = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&out);
    let mut interp = Interpreter::new(move |s| sink.borrow_mut().push(s.to_string()));
    interp.run_file(&path).expect("file run failed");
    assert_eq!(out.borrow().as_slice(), ["from file"]);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn run_file_missing_path_is_io_error() {
    let mut interp = Interpreter::new(|_| {});
    assert!(matches!(
        interp.run_file("/no/such/lovelace/script"),
        Err(RuntimeError::Io(_))
    ));
}

// ══════════════════════════════════════════════════════════════════════════════
// Instances are independent
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn state_does_not_leak_between_instances() {
    assert_eq!(run("mem[0] = 9\nout mem[0]"), ["9"]);
    // a fresh instance starts from an empty store
    assert_eq!(run("out mem[0]"), ["0"]);
}

#[test]
fn larger_program_end_to_end() {
    let src = "\
fn label(n):
var result (str(n))
if (n % 3 == 0):
var result (\"fizz\")
end
if (n % 5 == 0):
var result (\"buzz\")
end
if (n % 15 == 0):
var result (\"fizzbuzz\")
end
return result
end
var n (0)
loop (15):
var n (n + 1)
out label(n)
end";
    let lines = run(src);
    assert_eq!(lines.len(), 15);
    assert_eq!(lines[0], "1");
    assert_eq!(lines[2], "fizz");
    assert_eq!(lines[4], "buzz");
    assert_eq!(lines[14], "fizzbuzz");
}
