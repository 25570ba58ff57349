//! The Lovelace runtime value — a dynamically tagged union.
//!
//! A single `Number(f64)` variant carries both integer and float roles;
//! display renders integral numbers without a fractional part, so `8 / 2`
//! prints `4` and `7 / 2` prints `3.5`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A dynamically typed Lovelace value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
    List(Vec<Value>),
    None,
}

impl Value {
    /// Type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Bool(_) => "bool",
            Self::List(_) => "list",
            Self::None => "none",
        }
    }

    /// Truthiness: zero, empty string/list and `none` are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Bool(b) => *b,
            Self::List(items) => !items.is_empty(),
            Self::None => false,
        }
    }

    /// The numeric reading of this value, if it has one.
    ///
    /// Strings parse as numbers when they look like one; bools read as
    /// 0 / 1. Lists and `none` have no numeric reading.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Str(s) => s.trim().parse().ok(),
            Self::List(_) | Self::None => None,
        }
    }

    /// Numeric reading truncated to an integer, defaulting to zero.
    ///
    /// Statement-level coercion (loop counts, mem indices, spawn counts)
    /// never raises; unreadable values count as zero.
    pub fn coerce_int(&self) -> i64 {
        self.as_number().map_or(0, |n| n.trunc() as i64)
    }

    /// Deep structural equality. NaN != NaN.
    pub fn structural_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => {
                if a.is_nan() || b.is_nan() {
                    false
                } else {
                    a == b
                }
            }
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::None, Self::None) => true,
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.structural_eq(y))
            }
            _ => false,
        }
    }

    /// Re-encode this value as Lovelace source text.
    ///
    /// Used by mem-read substitution: the spliced-in text must parse back
    /// to the same value, so strings are re-quoted and escaped.
    pub fn to_literal(&self) -> String {
        match self {
            Self::Number(_) | Self::Bool(_) => self.to_string(),
            Self::Str(s) => quote(s),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::to_literal).collect();
                format!("[{}]", parts.join(", "))
            }
            Self::None => "none".to_string(),
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

impl fmt::Display for Value {
    /// The `out` string form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    // the i64 cast saturates at 2^63; format huge integral
                    // magnitudes directly
                    if n.abs() < i64::MAX as f64 {
                        write!(f, "{}", *n as i64)
                    } else {
                        write!(f, "{n:.0}")
                    }
                } else {
                    write!(f, "{n}")
                }
            }
            Self::Str(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Self::None => write!(f, "none"),
        }
    }
}
