//! The interpreter — statement dispatch, call frames, expression glue.
//!
//! All state (variable environment, memory store, function table) lives
//! on one `Interpreter` value; instances are fully independent and never
//! share anything, so multiple programs can run concurrently on separate
//! threads without locking.

use crate::block;
use crate::func::{self, Function};
use crate::lines;
use crate::stmt::{self, Stmt};
use lovelace_expr::{evaluate, EvalContext, EvalError, EvalResult};
use lovelace_types::{RunResult, RuntimeError, Value};
use rand::Rng;
use std::collections::BTreeMap;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Default bound on call nesting.
pub const DEFAULT_CALL_LIMIT: usize = 64;

/// The built-in application pool for `spawn (n) (RAN)`.
const SPAWN_POOL: [&str; 9] = [
    "chrome", "edge", "firefox", "safari", "opera", "notepad", "calc", "vscode", "terminal",
];

/// A Lovelace interpreter instance bound to an output sink.
pub struct Interpreter {
    /// Variable environment — flat; call frames snapshot/overlay it.
    vars: BTreeMap<String, Value>,
    /// Sparse memory store; unset indices read as numeric zero.
    mem: BTreeMap<i64, Value>,
    /// Function table; later definitions overwrite.
    funcs: BTreeMap<String, Function>,
    /// Output sink owned by the caller.
    emit: Box<dyn FnMut(&str)>,
    /// Current call nesting depth.
    call_depth: usize,
    /// Bound on call nesting.
    call_limit: usize,
}

impl Interpreter {
    /// Create an interpreter bound to an output sink.
    pub fn new(emit: impl FnMut(&str) + 'static) -> Self {
        Self::with_call_limit(emit, DEFAULT_CALL_LIMIT)
    }

    /// Create an interpreter with a custom call-nesting bound.
    pub fn with_call_limit(emit: impl FnMut(&str) + 'static, call_limit: usize) -> Self {
        Self {
            vars: BTreeMap::new(),
            mem: BTreeMap::new(),
            funcs: BTreeMap::new(),
            emit: Box::new(emit),
            call_depth: 0,
            call_limit,
        }
    }

    /// Run a complete program from in-memory text.
    pub fn run_source(&mut self, source: &str) -> RunResult<()> {
        let program = lines::filter(source);
        self.exec_block(&program, 0, program.len())
    }

    /// Read a script file (UTF-8) and run it.
    pub fn run_file(&mut self, path: impl AsRef<Path>) -> RunResult<()> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RuntimeError::Io(format!("{}: {e}", path.display())))?;
        self.run_source(&text)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statement execution
    // ══════════════════════════════════════════════════════════════════════

    /// Execute every statement in `[start, bound)`.
    fn exec_block(&mut self, program: &[String], start: usize, bound: usize) -> RunResult<()> {
        let mut i = start;
        while i < bound {
            i = self.exec_stmt(program, i, bound)?;
        }
        Ok(())
    }

    /// Execute the statement at `i`, returning the position after it
    /// (one past the closing `end` for block statements).
    fn exec_stmt(&mut self, program: &[String], i: usize, bound: usize) -> RunResult<usize> {
        let line = program[i].trim();
        let Some(statement) = stmt::classify(line) else {
            return Err(RuntimeError::UnrecognizedStatement(line.to_string()));
        };
        match statement {
            Stmt::Var { name, expr } => {
                let value = self.eval_soft(&expr, None)?;
                self.vars.insert(name, value);
                Ok(i + 1)
            }
            Stmt::MemWrite { index, value } => {
                let idx = self.eval_soft(&index, None)?.coerce_int();
                let value = self.eval_soft(&value, None)?;
                self.mem.insert(idx, value);
                Ok(i + 1)
            }
            Stmt::Out(expr) => {
                let value = self.eval_soft(&expr, None)?;
                let text = value.to_string();
                (self.emit)(&text);
                Ok(i + 1)
            }
            Stmt::Sleep(expr) => {
                let secs = self.eval_soft(&expr, None)?.as_number().unwrap_or(0.0);
                if secs > 0.0 {
                    let duration = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
                    thread::sleep(duration);
                }
                Ok(i + 1)
            }
            Stmt::Spawn { count, pool } => {
                self.exec_spawn(&count, &pool)?;
                Ok(i + 1)
            }
            Stmt::If(_) => self.exec_if(program, i, bound),
            Stmt::Elif(_) | Stmt::Else => Err(RuntimeError::IllegalControl(
                "'elif'/'else' without matching 'if'".into(),
            )),
            Stmt::End => Err(RuntimeError::IllegalControl(
                "'end' without an open block".into(),
            )),
            Stmt::LoopCount(expr) => self.exec_loop_count(program, i, bound, &expr),
            Stmt::LoopEach(name) => self.exec_loop_each(program, i, bound, &name),
            Stmt::FnExpr { name, params, expr } => {
                self.funcs.insert(
                    name,
                    Function::Expr {
                        params: func::parse_params(&params),
                        body: expr,
                    },
                );
                Ok(i + 1)
            }
            Stmt::FnBlock { name, params } => {
                let after = block::find_end(program, i, bound)?;
                let body = program[i + 1..after - 1].to_vec();
                self.funcs.insert(
                    name,
                    Function::Block {
                        params: func::parse_params(&params),
                        body,
                    },
                );
                Ok(after)
            }
            Stmt::Return(_) => Err(RuntimeError::IllegalControl(
                "'return' used outside of a function".into(),
            )),
            Stmt::Call { name, args } => {
                let arg_vals = self.eval_args(&args)?;
                match self.call_function(&name, arg_vals) {
                    Ok(_) => Ok(i + 1),
                    Err(EvalError::Undefined(name)) => Err(RuntimeError::UnknownFunction(name)),
                    Err(EvalError::Fatal(e)) => Err(e),
                    // Value is discarded anyway; soft failures inside the
                    // callee degrade like any other expression failure.
                    Err(_) => Ok(i + 1),
                }
            }
        }
    }

    /// Evaluate arms in written order; execute the first whose condition
    /// holds (or the `else` arm), skip the rest.
    fn exec_if(&mut self, program: &[String], i: usize, bound: usize) -> RunResult<usize> {
        let chain = block::split_chain(program, i, bound)?;
        for arm in &chain.arms {
            let take = match &arm.condition {
                Some(cond) => self.eval_soft(cond, None)?.is_truthy(),
                None => true,
            };
            if take {
                self.exec_block(program, arm.start, arm.end)?;
                break;
            }
        }
        Ok(chain.next)
    }

    /// `loop (N):` — count evaluated once, body re-executed `max(0, N)` times.
    fn exec_loop_count(
        &mut self,
        program: &[String],
        i: usize,
        bound: usize,
        count_expr: &str,
    ) -> RunResult<usize> {
        let after = block::find_end(program, i, bound)?;
        let count = self.eval_soft(count_expr, None)?.coerce_int().max(0);
        for _ in 0..count {
            self.exec_block(program, i + 1, after - 1)?;
        }
        Ok(after)
    }

    /// `loop NAME:` — iterate the sequence bound to `NAME`, exposing each
    /// element as `item`; `item` leaves scope when the loop ends.
    fn exec_loop_each(
        &mut self,
        program: &[String],
        i: usize,
        bound: usize,
        name: &str,
    ) -> RunResult<usize> {
        let after = block::find_end(program, i, bound)?;
        let items: Vec<Value> = match self.vars.get(name) {
            Some(Value::List(items)) => items.clone(),
            Some(Value::Str(s)) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
            _ => Vec::new(),
        };
        let mut result = Ok(());
        for item in items {
            self.vars.insert("item".to_string(), item);
            result = self.exec_block(program, i + 1, after - 1);
            if result.is_err() {
                break;
            }
        }
        self.vars.remove("item");
        result.map(|()| after)
    }

    /// `spawn (n) (list|RAN)` — simulated process launches.
    fn exec_spawn(&mut self, count_expr: &str, pool_text: &str) -> RunResult<()> {
        let count = self.eval_soft(count_expr, None)?.coerce_int().max(0);
        let names: Vec<String> = if pool_text.trim().eq_ignore_ascii_case("RAN") {
            SPAWN_POOL.iter().map(|s| s.to_string()).collect()
        } else {
            pool_text
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };
        let mut rng = rand::thread_rng();
        for _ in 0..count {
            let choice = if names.is_empty() {
                "unknown"
            } else {
                names[rng.gen_range(0..names.len())].as_str()
            };
            let text = format!("[spawn] {choice} (simulated)");
            (self.emit)(&text);
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression with the silent string fallback applied:
    /// any soft failure yields the original text (one pair of surrounding
    /// quotes stripped) as a string value. Fatal errors pass through.
    fn eval_soft(
        &mut self,
        expr: &str,
        locals: Option<&BTreeMap<String, Value>>,
    ) -> RunResult<Value> {
        match self.eval_raw(expr, locals) {
            Ok(value) => Ok(value),
            Err(EvalError::Fatal(e)) => Err(e),
            Err(_) => Ok(Value::Str(fallback_text(expr))),
        }
    }

    /// Substitute mem reads, then run the expression engine.
    fn eval_raw(
        &mut self,
        expr: &str,
        locals: Option<&BTreeMap<String, Value>>,
    ) -> EvalResult<Value> {
        let substituted = self.substitute_mem(expr, locals).map_err(EvalError::Fatal)?;
        let mut cx = Cx {
            interp: self,
            locals,
        };
        evaluate(&substituted, &mut cx)
    }

    /// Replace every `mem[...]` read outside string literals with the
    /// stored value's source form, left to right.
    ///
    /// Each index expression is evaluated independently (and recursively,
    /// so `mem[mem[0]]` works), truncated to an integer; unset indices
    /// read as numeric zero. String values are re-quoted so they are not
    /// reinterpreted as identifiers.
    fn substitute_mem(
        &mut self,
        expr: &str,
        locals: Option<&BTreeMap<String, Value>>,
    ) -> RunResult<String> {
        let bytes = expr.as_bytes();
        let mut out = String::with_capacity(expr.len());
        let mut in_string = false;
        let mut copied = 0;
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i];
            if in_string {
                if c == b'\\' {
                    i += 2;
                    continue;
                }
                if c == b'"' {
                    in_string = false;
                }
                i += 1;
                continue;
            }
            if c == b'"' {
                in_string = true;
                i += 1;
                continue;
            }
            if c == b'm' && bytes[i..].starts_with(b"mem[") && !prev_is_word(bytes, i) {
                let inner = i + 4;
                if let Some(rel) = stmt::matching_delim(&bytes[inner..], b'[', b']') {
                    out.push_str(&expr[copied..i]);
                    let index_text = &expr[inner..inner + rel];
                    let idx = self.eval_soft(index_text, locals)?.coerce_int();
                    let value = self.mem.get(&idx).cloned().unwrap_or(Value::Number(0.0));
                    out.push_str(&value.to_literal());
                    i = inner + rel + 1;
                    copied = i;
                    continue;
                }
            }
            i += 1;
        }
        out.push_str(&expr[copied..]);
        Ok(out)
    }

    /// Split and evaluate a bare call's argument list in the caller's
    /// environment.
    fn eval_args(&mut self, text: &str) -> RunResult<Vec<Value>> {
        let mut values = Vec::new();
        for piece in stmt::split_top_level_commas(text) {
            values.push(self.eval_soft(&piece, None)?);
        }
        Ok(values)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Function calls
    // ══════════════════════════════════════════════════════════════════════

    /// Invoke a registered function with already-evaluated arguments.
    ///
    /// `Undefined` (unregistered name) is soft so expression contexts can
    /// degrade it; the bare-call statement path upgrades it to the fatal
    /// `UnknownFunction`. Exceeding the call-nesting bound is fatal
    /// everywhere.
    fn call_function(&mut self, name: &str, args: Vec<Value>) -> EvalResult<Value> {
        let Some(function) = self.funcs.get(name).cloned() else {
            return Err(EvalError::Undefined(name.to_string()));
        };
        if self.call_depth >= self.call_limit {
            return Err(EvalError::Fatal(RuntimeError::RecursionLimit(
                self.call_limit,
            )));
        }
        self.call_depth += 1;
        let result = match function {
            Function::Expr { params, body } => self.call_expr_fn(&params, &body, args),
            Function::Block { params, body } => self.call_block_fn(&params, &body, args),
        };
        self.call_depth -= 1;
        result
    }

    /// Expression function: parameters overlay the caller's environment;
    /// the caller's real environment is untouched.
    fn call_expr_fn(&mut self, params: &[String], body: &str, args: Vec<Value>) -> EvalResult<Value> {
        let locals: BTreeMap<String, Value> = params.iter().cloned().zip(args).collect();
        match self.eval_raw(body, Some(&locals)) {
            Ok(value) => Ok(value),
            Err(EvalError::Fatal(e)) => Err(EvalError::Fatal(e)),
            Err(_) => Ok(Value::Str(fallback_text(body))),
        }
    }

    /// Block function: snapshot the whole environment, bind parameters
    /// into the live map, run the body, restore unconditionally.
    fn call_block_fn(
        &mut self,
        params: &[String],
        body: &[String],
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        let snapshot = self.vars.clone();
        for (param, arg) in params.iter().zip(args) {
            self.vars.insert(param.clone(), arg);
        }
        let result = self.run_fn_body(body);
        // Restore-everything semantics: on return, fall-through and error
        // alike, so a callee's writes are never visible to the caller.
        self.vars = snapshot;
        result
    }

    /// Run body lines until the first top-level `return`. Returns nested
    /// inside `if`/`loop` are not unwound — the dispatcher rejects them,
    /// same as a stray top-level `return`.
    fn run_fn_body(&mut self, body: &[String]) -> EvalResult<Value> {
        let mut i = 0;
        while i < body.len() {
            let line = body[i].trim();
            if let Some(rest) = line.strip_prefix("return ") {
                return self.eval_soft(rest.trim(), None).map_err(EvalError::Fatal);
            }
            i = self.exec_stmt(body, i, body.len()).map_err(EvalError::Fatal)?;
        }
        Ok(Value::None)
    }
}

/// The expression engine's view of an interpreter: variable lookup (with
/// an optional parameter overlay) and user-function dispatch.
struct Cx<'a, 'b> {
    interp: &'a mut Interpreter,
    locals: Option<&'b BTreeMap<String, Value>>,
}

impl EvalContext for Cx<'_, '_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(locals) = self.locals {
            if let Some(value) = locals.get(name) {
                return Some(value.clone());
            }
        }
        self.interp.vars.get(name).cloned()
    }

    fn call(&mut self, name: &str, args: Vec<Value>) -> EvalResult<Value> {
        self.interp.call_function(name, args)
    }
}

/// The silent-failure fallback: the original expression text with one
/// pair of surrounding double quotes stripped.
fn fallback_text(expr: &str) -> String {
    let text = expr.trim();
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        text[1..text.len() - 1].to_string()
    } else {
        text.to_string()
    }
}

fn prev_is_word(bytes: &[u8], i: usize) -> bool {
    i > 0 && (bytes[i - 1] == b'_' || bytes[i - 1].is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_strips_one_quote_pair() {
        assert_eq!(fallback_text("1 +"), "1 +");
        assert_eq!(fallback_text("\"1 +\""), "1 +");
        assert_eq!(fallback_text("\"\"x\"\""), "\"x\"");
    }

    #[test]
    fn mem_substitution_is_textual_and_quoted() {
        let mut interp = Interpreter::new(|_| {});
        interp.mem.insert(0, Value::Str("a b".into()));
        interp.mem.insert(1, Value::Number(7.0));
        let out = interp.substitute_mem("mem[0] + mem[1]", None).unwrap();
        assert_eq!(out, "\"a b\" + 7");
    }

    #[test]
    fn mem_substitution_skips_string_literals() {
        let mut interp = Interpreter::new(|_| {});
        interp.mem.insert(0, Value::Number(1.0));
        let out = interp.substitute_mem("\"mem[0]\" + mem[0]", None).unwrap();
        assert_eq!(out, "\"mem[0]\" + 1");
    }

    #[test]
    fn nested_mem_reads_resolve_inner_first() {
        let mut interp = Interpreter::new(|_| {});
        interp.mem.insert(0, Value::Number(2.0));
        interp.mem.insert(2, Value::Number(9.0));
        let out = interp.substitute_mem("mem[mem[0]]", None).unwrap();
        assert_eq!(out, "9");
    }

    #[test]
    fn unset_mem_reads_as_zero() {
        let mut interp = Interpreter::new(|_| {});
        let out = interp.substitute_mem("mem[41] + 1", None).unwrap();
        assert_eq!(out, "0 + 1");
    }

    #[test]
    fn identifier_ending_in_mem_is_not_substituted() {
        let mut interp = Interpreter::new(|_| {});
        let out = interp.substitute_mem("totem[0]", None).unwrap();
        assert_eq!(out, "totem[0]");
    }
}
