//! Block-structure resolution.
//!
//! Finds the `end` matching a block opener across arbitrary nesting, and
//! splits `if/elif/else` chains into ordered condition→range arms.

use crate::stmt::{self, Stmt};
use lovelace_types::{RunResult, RuntimeError};

/// One arm of an `if/elif/else` chain.
///
/// `condition` is `None` for the `else` arm; `[start, end)` is the arm's
/// body range in the line sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Arm {
    pub condition: Option<String>,
    pub start: usize,
    pub end: usize,
}

/// A resolved `if/elif/else` chain.
#[derive(Debug, Clone, PartialEq)]
pub struct IfChain {
    /// Arms in written order.
    pub arms: Vec<Arm>,
    /// Index one past the chain's closing `end`.
    pub next: usize,
}

/// Find the index one past the `end` matching the opener at `open`.
///
/// Scans forward tracking nesting depth across all opener shapes; running
/// off `bound` with the block still open is a malformed program.
pub fn find_end(lines: &[String], open: usize, bound: usize) -> RunResult<usize> {
    let mut depth = 1u32;
    let mut i = open + 1;
    while i < bound {
        let line = lines[i].trim();
        if line == "end" {
            depth -= 1;
            if depth == 0 {
                return Ok(i + 1);
            }
        } else if stmt::is_opener(line) {
            depth += 1;
        }
        i += 1;
    }
    Err(RuntimeError::MalformedBlock(lines[open].trim().to_string()))
}

/// Split the `if` chain opening at `open` into ordered arms.
///
/// `elif`/`else` headers are collected at nesting depth 1 only, so
/// headers of nested chains stay with their own `if`. Ordering of the
/// arms is not validated; the dispatcher simply takes the first arm whose
/// condition holds.
pub fn split_chain(lines: &[String], open: usize, bound: usize) -> RunResult<IfChain> {
    let opener = lines[open].trim();
    let Some(Stmt::If(first_cond)) = stmt::classify(opener) else {
        return Err(RuntimeError::IllegalControl(format!(
            "not an if header: {opener}"
        )));
    };

    // (header line index, condition-or-None), closing `end` last
    let mut headers: Vec<(usize, Option<String>)> = vec![(open, Some(first_cond))];
    let mut depth = 1u32;
    let mut close = None;
    let mut i = open + 1;
    while i < bound {
        let line = lines[i].trim();
        if line == "end" {
            depth -= 1;
            if depth == 0 {
                close = Some(i);
                break;
            }
        } else if stmt::is_opener(line) {
            depth += 1;
        } else if depth == 1 {
            match stmt::classify(line) {
                Some(Stmt::Elif(cond)) => headers.push((i, Some(cond))),
                Some(Stmt::Else) => headers.push((i, None)),
                _ => {}
            }
        }
        i += 1;
    }
    let Some(close) = close else {
        return Err(RuntimeError::MalformedBlock(opener.to_string()));
    };

    let mut arms = Vec::with_capacity(headers.len());
    for (idx, (line_idx, condition)) in headers.iter().enumerate() {
        let arm_end = headers
            .get(idx + 1)
            .map_or(close, |(next_idx, _)| *next_idx);
        arms.push(Arm {
            condition: condition.clone(),
            start: line_idx + 1,
            end: arm_end,
        });
    }
    Ok(IfChain {
        arms,
        next: close + 1,
    })
}
