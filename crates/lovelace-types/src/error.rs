//! Fatal runtime errors.
//!
//! Everything here aborts the current `run` call. Expression-level
//! failures are deliberately absent: they degrade to the string fallback
//! inside the evaluator and never reach the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fatal interpreter error. Serializable so callers can report
/// diagnostics in structured form.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RuntimeError {
    /// An opening construct has no matching `end` before its range ends.
    #[error("unterminated block: {0}")]
    MalformedBlock(String),

    /// A bare call references an unregistered function name.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// `elif`/`else`/`end` with no open block, or `return` outside a
    /// function body.
    #[error("{0}")]
    IllegalControl(String),

    /// A line matches no statement shape. Carries the offending line
    /// verbatim.
    #[error("unrecognized syntax: {0}")]
    UnrecognizedStatement(String),

    /// Call nesting exceeded the configured bound.
    #[error("call depth exceeded the limit of {0}")]
    RecursionLimit(usize),

    /// `run_file` could not read the script.
    #[error("io error: {0}")]
    Io(String),
}

/// Result alias for interpreter operations.
pub type RunResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let e = RuntimeError::UnrecognizedStatement("out out out".into());
        assert_eq!(e.to_string(), "unrecognized syntax: out out out");

        let e = RuntimeError::MalformedBlock("if (x > 1):".into());
        assert_eq!(e.to_string(), "unterminated block: if (x > 1):");

        let e = RuntimeError::RecursionLimit(64);
        assert_eq!(e.to_string(), "call depth exceeded the limit of 64");
    }

    #[test]
    fn json_round_trip() {
        let e = RuntimeError::UnknownFunction("launch".into());
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"unknown_function\""));
        assert!(json.contains("\"launch\""));
        let back: RuntimeError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
