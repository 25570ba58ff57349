//! Tree-walking expression evaluator.

use crate::ast::{BinOp, Expr, UnaryOp};
use crate::error::{EvalError, EvalResult};
use crate::lexer::Lexer;
use crate::parser::Parser;
use lovelace_types::Value;
use rand::Rng;

/// Host context an expression evaluates against.
///
/// The interpreter implements this for its live variable environment;
/// expression-function calls implement it as a parameter overlay on top
/// of the caller's context.
pub trait EvalContext {
    /// Resolve an identifier to its current value.
    fn lookup(&self, name: &str) -> Option<Value>;

    /// Invoke a user-defined function by name with evaluated arguments.
    fn call(&mut self, name: &str, args: Vec<Value>) -> EvalResult<Value>;
}

/// Tokenize, parse and evaluate one expression string.
pub fn evaluate(source: &str, cx: &mut dyn EvalContext) -> EvalResult<Value> {
    let tokens = Lexer::new(source).tokenize()?;
    let expr = Parser::new(tokens).parse()?;
    Evaluator { cx }.eval_expr(&expr)
}

/// The evaluator — walks AST nodes and produces Values.
struct Evaluator<'cx> {
    cx: &'cx mut dyn EvalContext,
}

impl Evaluator<'_> {
    fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::NumberLit(n) => Ok(Value::Number(*n)),
            Expr::StringLit(s) => Ok(Value::Str(s.clone())),
            Expr::BoolLit(b) => Ok(Value::Bool(*b)),
            Expr::NoneLit => Ok(Value::None),
            Expr::ListLit(elems) => self.eval_list_literal(elems),
            Expr::Identifier(name) => self
                .cx
                .lookup(name)
                .ok_or_else(|| EvalError::Undefined(name.clone())),
            Expr::Call { name, args } => self.eval_call(name, args),
            Expr::Index { target, index } => self.eval_index(target, index),
            Expr::Unary { op, operand } => self.eval_unary(*op, operand),
            Expr::Binary { left, op, right } => self.eval_binary(left, *op, right),
        }
    }

    fn eval_list_literal(&mut self, elems: &[Expr]) -> EvalResult<Value> {
        let mut values = Vec::with_capacity(elems.len());
        for elem in elems {
            values.push(self.eval_expr(elem)?);
        }
        Ok(Value::List(values))
    }

    // ── Calls ────────────────────────────────────────────────────────────

    /// Intrinsics are dispatched by name; anything else goes to the host.
    fn eval_call(&mut self, name: &str, args: &[Expr]) -> EvalResult<Value> {
        let mut arg_vals = Vec::with_capacity(args.len());
        for arg in args {
            arg_vals.push(self.eval_expr(arg)?);
        }
        match name {
            "str" => one(name, arg_vals).map(|v| Value::Str(v.to_string())),
            "int" => {
                let v = one(name, arg_vals)?;
                let n = v.as_number().ok_or_else(|| {
                    EvalError::Type(format!("int() cannot convert {}", v.type_name()))
                })?;
                Ok(Value::Number(n.trunc()))
            }
            "float" | "num" => {
                let v = one(name, arg_vals)?;
                let n = v.as_number().ok_or_else(|| {
                    EvalError::Type(format!("{name}() cannot convert {}", v.type_name()))
                })?;
                Ok(Value::Number(n))
            }
            "bool" => one(name, arg_vals).map(|v| Value::Bool(v.is_truthy())),
            "RAN_int" => self.ran_int(arg_vals),
            "RAN_pick" => self.ran_pick(arg_vals),
            _ => self.cx.call(name, arg_vals),
        }
    }

    /// `RAN_int(lo, hi)` — uniform integer in `[lo, hi]` inclusive.
    fn ran_int(&self, args: Vec<Value>) -> EvalResult<Value> {
        let [lo, hi] = args.as_slice() else {
            return Err(EvalError::Type("RAN_int expects two arguments".into()));
        };
        let (lo, hi) = (lo.coerce_int(), hi.coerce_int());
        if lo > hi {
            return Err(EvalError::Type(format!(
                "RAN_int range is empty: {lo} > {hi}"
            )));
        }
        let n = rand::thread_rng().gen_range(lo..=hi);
        Ok(Value::Number(n as f64))
    }

    /// `RAN_pick(seq)` — uniform element of a list or character of a string.
    fn ran_pick(&self, args: Vec<Value>) -> EvalResult<Value> {
        let v = one("RAN_pick", args)?;
        match v {
            Value::List(items) if !items.is_empty() => {
                let i = rand::thread_rng().gen_range(0..items.len());
                Ok(items[i].clone())
            }
            Value::Str(s) if !s.is_empty() => {
                let chars: Vec<char> = s.chars().collect();
                let i = rand::thread_rng().gen_range(0..chars.len());
                Ok(Value::Str(chars[i].to_string()))
            }
            Value::List(_) | Value::Str(_) => {
                Err(EvalError::Type("RAN_pick of an empty sequence".into()))
            }
            other => Err(EvalError::Type(format!(
                "RAN_pick requires a sequence, got {}",
                other.type_name()
            ))),
        }
    }

    // ── Indexing ─────────────────────────────────────────────────────────

    fn eval_index(&mut self, target: &Expr, index: &Expr) -> EvalResult<Value> {
        let target = self.eval_expr(target)?;
        let raw = self.eval_expr(index)?.coerce_int();
        match target {
            Value::List(items) => {
                let i = resolve_index(raw, items.len())?;
                Ok(items[i].clone())
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let i = resolve_index(raw, chars.len())?;
                Ok(Value::Str(chars[i].to_string()))
            }
            other => Err(EvalError::Type(format!(
                "cannot index {}",
                other.type_name()
            ))),
        }
    }

    // ── Operators ────────────────────────────────────────────────────────

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> EvalResult<Value> {
        let val = self.eval_expr(operand)?;
        match op {
            UnaryOp::Neg => {
                if let Value::Number(n) = val {
                    Ok(Value::Number(-n))
                } else {
                    Err(EvalError::Type(format!(
                        "cannot negate {}",
                        val.type_name()
                    )))
                }
            }
            UnaryOp::Not => Ok(Value::Bool(!val.is_truthy())),
        }
    }

    fn eval_binary(&mut self, left: &Expr, op: BinOp, right: &Expr) -> EvalResult<Value> {
        // Logical operators short-circuit and yield the deciding operand,
        // not a coerced bool: `1 or 2` is `1`, `1 and 2` is `2`.
        if op == BinOp::And {
            let lv = self.eval_expr(left)?;
            return if lv.is_truthy() {
                self.eval_expr(right)
            } else {
                Ok(lv)
            };
        }
        if op == BinOp::Or {
            let lv = self.eval_expr(left)?;
            return if lv.is_truthy() {
                Ok(lv)
            } else {
                self.eval_expr(right)
            };
        }

        let lv = self.eval_expr(left)?;
        let rv = self.eval_expr(right)?;

        match op {
            BinOp::Add => eval_add(&lv, &rv),
            BinOp::Sub => eval_arith(&lv, &rv, |a, b| a - b, op.symbol()),
            BinOp::Mul => eval_arith(&lv, &rv, |a, b| a * b, op.symbol()),
            BinOp::Div => {
                let (a, b) = numeric_pair(&lv, &rv, op.symbol())?;
                if b == 0.0 {
                    return Err(EvalError::Arithmetic("division by zero".into()));
                }
                Ok(Value::Number(a / b))
            }
            BinOp::Mod => {
                let (a, b) = numeric_pair(&lv, &rv, op.symbol())?;
                if b == 0.0 {
                    return Err(EvalError::Arithmetic("modulo by zero".into()));
                }
                Ok(Value::Number(a % b))
            }
            BinOp::Eq => Ok(Value::Bool(lv.structural_eq(&rv))),
            BinOp::NotEq => Ok(Value::Bool(!lv.structural_eq(&rv))),
            BinOp::Less | BinOp::LessEq | BinOp::Greater | BinOp::GreaterEq => {
                eval_comparison(op, &lv, &rv)
            }
            BinOp::And | BinOp::Or => unreachable!("handled above"),
        }
    }
}

/// `+` adds numbers, concatenates two strings or two lists.
fn eval_add(lv: &Value, rv: &Value) -> EvalResult<Value> {
    match (lv, rv) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) => {
            let mut out = a.clone();
            out.extend(b.iter().cloned());
            Ok(Value::List(out))
        }
        _ => Err(EvalError::Type(format!(
            "cannot add {} and {}",
            lv.type_name(),
            rv.type_name()
        ))),
    }
}

fn eval_arith(lv: &Value, rv: &Value, op: fn(f64, f64) -> f64, symbol: &str) -> EvalResult<Value> {
    let (a, b) = numeric_pair(lv, rv, symbol)?;
    Ok(Value::Number(op(a, b)))
}

/// Ordering comparison: numeric on numbers, lexicographic on strings.
fn eval_comparison(op: BinOp, lv: &Value, rv: &Value) -> EvalResult<Value> {
    let ord = match (lv, rv) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).ok_or_else(|| {
            EvalError::Arithmetic("comparison involving NaN".into())
        })?,
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        _ => {
            return Err(EvalError::Type(format!(
                "cannot compare {} and {}",
                lv.type_name(),
                rv.type_name()
            )));
        }
    };
    let result = match op {
        BinOp::Less => ord.is_lt(),
        BinOp::LessEq => ord.is_le(),
        BinOp::Greater => ord.is_gt(),
        BinOp::GreaterEq => ord.is_ge(),
        _ => unreachable!("not a comparison operator"),
    };
    Ok(Value::Bool(result))
}

fn numeric_pair(lv: &Value, rv: &Value, symbol: &str) -> EvalResult<(f64, f64)> {
    if let (Value::Number(a), Value::Number(b)) = (lv, rv) {
        Ok((*a, *b))
    } else {
        Err(EvalError::Type(format!(
            "cannot apply '{symbol}' to {} and {}",
            lv.type_name(),
            rv.type_name()
        )))
    }
}

/// Resolve a possibly negative index against a sequence length.
fn resolve_index(raw: i64, len: usize) -> EvalResult<usize> {
    let adjusted = if raw < 0 { raw + len as i64 } else { raw };
    if adjusted < 0 || adjusted as usize >= len {
        return Err(EvalError::Type(format!(
            "index {raw} out of range for length {len}"
        )));
    }
    Ok(adjusted as usize)
}

/// Unpack a single-argument intrinsic call.
fn one(name: &str, mut args: Vec<Value>) -> EvalResult<Value> {
    if args.len() != 1 {
        return Err(EvalError::Type(format!(
            "{name} expects one argument, got {}",
            args.len()
        )));
    }
    Ok(args.remove(0))
}
