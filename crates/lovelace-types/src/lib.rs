//! Shared types for the Lovelace interpreter: the dynamic [`Value`] union
//! and the fatal [`RuntimeError`] taxonomy.

pub mod error;
pub mod value;

pub use error::{RunResult, RuntimeError};
pub use value::Value;
