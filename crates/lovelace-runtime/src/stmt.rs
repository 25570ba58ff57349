//! Statement classification.
//!
//! One logical line maps to exactly one [`Stmt`] variant; shapes are
//! checked in the dispatch priority order and are mutually exclusive by
//! syntax. Expression payloads stay as raw text — the interpreter
//! evaluates them lazily so the string fallback policy applies at the
//! point of use.

/// A classified source line.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `var NAME (expr)`
    Var { name: String, expr: String },
    /// `mem[idxExpr] = expr`
    MemWrite { index: String, value: String },
    /// `out expr`
    Out(String),
    /// `sleep(expr)`
    Sleep(String),
    /// `spawn(countExpr)(list|RAN)`
    Spawn { count: String, pool: String },
    /// `if(cond):`
    If(String),
    /// `elif(cond):` — only legal inside an if chain.
    Elif(String),
    /// `else:` — only legal inside an if chain.
    Else,
    /// `loop(countExpr):`
    LoopCount(String),
    /// `loop NAME:`
    LoopEach(String),
    /// `fn NAME(params) => expr`
    FnExpr {
        name: String,
        params: String,
        expr: String,
    },
    /// `fn NAME(params):`
    FnBlock { name: String, params: String },
    /// `return expr` — only legal at a function body's top level.
    Return(String),
    /// Bare `NAME(args)` call for side effects.
    Call { name: String, args: String },
    /// The block terminator line.
    End,
}

impl Stmt {
    /// Whether this statement opens a block that a matching `end` closes.
    pub fn opens_block(&self) -> bool {
        matches!(
            self,
            Self::If(_) | Self::LoopCount(_) | Self::LoopEach(_) | Self::FnBlock { .. }
        )
    }
}

/// Classify one trimmed line, or `None` for unrecognized syntax.
pub fn classify(line: &str) -> Option<Stmt> {
    let line = line.trim();
    if line == "end" {
        return Some(Stmt::End);
    }
    if let Some(stmt) = classify_var(line) {
        return Some(stmt);
    }
    if let Some(stmt) = classify_mem_write(line) {
        return Some(stmt);
    }
    if let Some(rest) = line.strip_prefix("out ") {
        let expr = rest.trim();
        if !expr.is_empty() {
            return Some(Stmt::Out(expr.to_string()));
        }
    }
    if let Some(stmt) = classify_sleep(line) {
        return Some(stmt);
    }
    if let Some(stmt) = classify_spawn(line) {
        return Some(stmt);
    }
    if let Some(cond) = header_condition(line, "if") {
        return Some(Stmt::If(cond));
    }
    if let Some(cond) = header_condition(line, "elif") {
        return Some(Stmt::Elif(cond));
    }
    if line == "else:" {
        return Some(Stmt::Else);
    }
    if let Some(stmt) = classify_loop(line) {
        return Some(stmt);
    }
    if let Some(stmt) = classify_fn(line) {
        return Some(stmt);
    }
    if let Some(rest) = line.strip_prefix("return ") {
        let expr = rest.trim();
        if !expr.is_empty() {
            return Some(Stmt::Return(expr.to_string()));
        }
    }
    if let Some(stmt) = classify_bare_call(line) {
        return Some(stmt);
    }
    None
}

/// Whether a trimmed line opens a block (used for nesting-depth tracking).
pub fn is_opener(line: &str) -> bool {
    classify(line).is_some_and(|s| s.opens_block())
}

// ── Shape parsers ────────────────────────────────────────────────────────

/// `var NAME (expr)`
fn classify_var(line: &str) -> Option<Stmt> {
    let rest = line.strip_prefix("var ")?.trim_start();
    let (name, rest) = take_ident(rest)?;
    let rest = rest.trim();
    let expr = between_outer_parens(rest)?;
    Some(Stmt::Var {
        name: name.to_string(),
        expr: expr.trim().to_string(),
    })
}

/// `mem[idxExpr] = expr`
fn classify_mem_write(line: &str) -> Option<Stmt> {
    let rest = line.strip_prefix("mem[")?;
    let close = matching_delim(rest.as_bytes(), b'[', b']')?;
    let index = &rest[..close];
    let after = rest[close + 1..].trim_start();
    let value = after.strip_prefix('=')?;
    // `mem[i] == x` is an expression, not a write
    if value.starts_with('=') {
        return None;
    }
    let value = value.trim();
    if index.trim().is_empty() || value.is_empty() {
        return None;
    }
    Some(Stmt::MemWrite {
        index: index.trim().to_string(),
        value: value.to_string(),
    })
}

/// `sleep(expr)` — no space before the parenthesis.
fn classify_sleep(line: &str) -> Option<Stmt> {
    let rest = line.strip_prefix("sleep(")?;
    let close = matching_delim(rest.as_bytes(), b'(', b')')?;
    if !rest[close + 1..].trim().is_empty() {
        return None;
    }
    Some(Stmt::Sleep(rest[..close].trim().to_string()))
}

/// `spawn (countExpr) (list|RAN)`
fn classify_spawn(line: &str) -> Option<Stmt> {
    let rest = line.strip_prefix("spawn")?.trim_start();
    let rest = rest.strip_prefix('(')?;
    let close = matching_delim(rest.as_bytes(), b'(', b')')?;
    let count = rest[..close].trim();
    let rest = rest[close + 1..].trim_start();
    let rest = rest.strip_prefix('(')?;
    let close = matching_delim(rest.as_bytes(), b'(', b')')?;
    let pool = rest[..close].trim();
    if !rest[close + 1..].trim().is_empty() || count.is_empty() || pool.is_empty() {
        return None;
    }
    Some(Stmt::Spawn {
        count: count.to_string(),
        pool: pool.to_string(),
    })
}

/// `if(cond):` / `elif(cond):` — keyword, parenthesized condition, colon.
fn header_condition(line: &str, keyword: &str) -> Option<String> {
    let head = line.strip_suffix(':')?.trim_end();
    let rest = head.strip_prefix(keyword)?;
    // Reject identifiers that merely start with the keyword (`ifx(1):`)
    if !rest.starts_with('(') && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let cond = between_outer_parens(rest.trim_start())?;
    if cond.trim().is_empty() {
        return None;
    }
    Some(cond.trim().to_string())
}

/// `loop(countExpr):` or `loop NAME:`
fn classify_loop(line: &str) -> Option<Stmt> {
    let head = line.strip_suffix(':')?.trim_end();
    let rest = head.strip_prefix("loop")?;
    if let Some(paren) = rest.trim_start().strip_prefix('(') {
        let close = matching_delim(paren.as_bytes(), b'(', b')')?;
        if !paren[close + 1..].trim().is_empty() || paren[..close].trim().is_empty() {
            return None;
        }
        return Some(Stmt::LoopCount(paren[..close].trim().to_string()));
    }
    // Iteration form requires whitespace between `loop` and the name
    let name = rest.strip_prefix(char::is_whitespace)?.trim();
    if is_ident(name) {
        Some(Stmt::LoopEach(name.to_string()))
    } else {
        None
    }
}

/// `fn NAME(params) => expr` or `fn NAME(params):`
fn classify_fn(line: &str) -> Option<Stmt> {
    let rest = line.strip_prefix("fn ")?.trim_start();
    let (name, rest) = take_ident(rest)?;
    let rest = rest.trim_start().strip_prefix('(')?;
    // Parameter lists are plain name lists; no nested parentheses
    let close = rest.find(')')?;
    let params = rest[..close].to_string();
    let after = rest[close + 1..].trim_start();
    if let Some(expr) = after.strip_prefix("=>") {
        let expr = expr.trim();
        if expr.is_empty() {
            return None;
        }
        return Some(Stmt::FnExpr {
            name: name.to_string(),
            params,
            expr: expr.to_string(),
        });
    }
    if after == ":" {
        return Some(Stmt::FnBlock {
            name: name.to_string(),
            params,
        });
    }
    None
}

/// Bare `NAME(args)` — the whole line is one call.
fn classify_bare_call(line: &str) -> Option<Stmt> {
    let (name, rest) = take_ident(line)?;
    let rest = rest.strip_prefix('(')?;
    let close = matching_delim(rest.as_bytes(), b'(', b')')?;
    if !rest[close + 1..].trim().is_empty() {
        return None;
    }
    Some(Stmt::Call {
        name: name.to_string(),
        args: rest[..close].trim().to_string(),
    })
}

// ── Text helpers ─────────────────────────────────────────────────────────

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Split a leading identifier off `s`, if present.
fn take_ident(s: &str) -> Option<(&str, &str)> {
    let end = s
        .char_indices()
        .take_while(|&(i, c)| {
            if i == 0 {
                c == '_' || c.is_ascii_alphabetic()
            } else {
                c == '_' || c.is_ascii_alphanumeric()
            }
        })
        .count();
    if end == 0 {
        None
    } else {
        Some(s.split_at(end))
    }
}

/// The text between a leading `(` and the trailing `)` of `s`.
fn between_outer_parens(s: &str) -> Option<&str> {
    let inner = s.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner)
}

/// Offset of the delimiter closing an already-opened `open` in `s`,
/// tracking nesting and skipping double-quoted segments.
pub(crate) fn matching_delim(s: &[u8], open: u8, close: u8) -> Option<usize> {
    let mut depth = 1u32;
    let mut in_string = false;
    let mut i = 0;
    while i < s.len() {
        let c = s[i];
        if in_string {
            if c == b'\\' {
                i += 1;
            } else if c == b'"' {
                in_string = false;
            }
        } else if c == b'"' {
            in_string = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Split `text` on commas at the top nesting level, honoring quotes,
/// parentheses and brackets. Empty input yields no pieces.
pub(crate) fn split_top_level_commas(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut pieces = Vec::new();
    let mut depth = 0u32;
    let mut in_string = false;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if in_string {
            if c == b'\\' {
                i += 1;
            } else if c == b'"' {
                in_string = false;
            }
        } else {
            match c {
                b'"' => in_string = true,
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                b',' if depth == 0 => {
                    pieces.push(text[start..i].trim().to_string());
                    start = i + 1;
                }
                _ => {}
            }
        }
        i += 1;
    }
    let last = text[start..].trim();
    if !last.is_empty() || !pieces.is_empty() {
        pieces.push(last.to_string());
    }
    pieces
}
