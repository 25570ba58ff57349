//! Command-line runner: `lovelace <script.lovelace>`.
//!
//! Wires the interpreter's output sink to stdout, reports a fatal error
//! to stderr and exits non-zero. Contains no interpreter logic.

use lovelace_runtime::Interpreter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: lovelace <script.lovelace>");
        return ExitCode::FAILURE;
    };

    let mut interp = Interpreter::new(|line| println!("{line}"));
    match interp.run_file(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
