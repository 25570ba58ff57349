//! Lovelace expression engine.
//!
//! Turns a single expression string into a [`Value`]: tokenizer →
//! recursive descent parser → tree-walking evaluator. User-defined
//! function calls are resolved through the [`EvalContext`] trait so the
//! engine stays independent of the interpreter that hosts it.
//!
//! Every failure in here is soft: the runtime catches [`EvalError`] and
//! degrades the expression to a string literal. The one exception is
//! [`EvalError::Fatal`], which carries a [`RuntimeError`] (e.g. the
//! recursion limit) out of nested calls untouched.
//!
//! [`Value`]: lovelace_types::Value
//! [`RuntimeError`]: lovelace_types::RuntimeError

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod token;

pub use error::{EvalError, EvalResult};
pub use eval::{evaluate, EvalContext};
