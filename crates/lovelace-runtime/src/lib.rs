//! Lovelace interpreter core.
//!
//! Turns source text into executed behavior: the lexical line filter
//! ([`lines`]), block-structure resolution ([`block`]), statement
//! classification ([`stmt`]), the function registry ([`func`]) and the
//! dispatching [`Interpreter`] itself ([`interp`]).
//!
//! Callers construct an [`Interpreter`] around an output sink and feed it
//! whole programs:
//!
//! ```
//! use lovelace_runtime::Interpreter;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let out = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&out);
//! let mut interp = Interpreter::new(move |s| sink.borrow_mut().push(s.to_string()));
//! interp.run_source("var x (2)\nout x * 3").unwrap();
//! assert_eq!(out.borrow().as_slice(), ["6"]);
//! ```

pub mod block;
pub mod func;
pub mod interp;
pub mod lines;
pub mod stmt;

pub use interp::{Interpreter, DEFAULT_CALL_LIMIT};
pub use lovelace_types::{RunResult, RuntimeError, Value};
