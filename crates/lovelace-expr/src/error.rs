//! Expression-level error types.

use lovelace_types::RuntimeError;
use thiserror::Error;

/// An expression failure.
///
/// All variants except `Fatal` are soft: the runtime's evaluation wrapper
/// converts them into the string-literal fallback. `Fatal` re-raises a
/// [`RuntimeError`] produced inside a nested user-function call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Tokenizer or parser rejection.
    #[error("parse error: {0}")]
    Parse(String),

    /// Evaluation-time type error.
    #[error("type error: {0}")]
    Type(String),

    /// Division or modulo by zero, non-finite result, NaN comparison.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// Identifier or call target not known to the context.
    #[error("undefined name: {0}")]
    Undefined(String),

    /// A fatal interpreter error that must not degrade to the fallback.
    #[error(transparent)]
    Fatal(#[from] RuntimeError),
}

/// Result alias for expression operations.
pub type EvalResult<T> = Result<T, EvalError>;
