//! Expression parsing with full operator precedence.
//!
//! Precedence (lowest → highest):
//! 6. `or`
//! 5. `and`
//! 4. `==`, `!=`, `<`, `>`, `<=`, `>=` (no chaining)
//! 3. `+`, `-`
//! 2. `*`, `/`, `%`
//! 1. unary `-`, `not`
//! 0. postfix `[index]`, primary (literals, identifiers, `name(args)`,
//!    grouping parentheses, list literals)

use crate::ast::{BinOp, Expr, UnaryOp};
use crate::error::{EvalError, EvalResult};
use crate::token::Token;

/// Maximum expression nesting depth.
const MAX_EXPR_DEPTH: u32 = 64;

/// The expression parser.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: u32,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse the whole token stream as one expression; trailing tokens are
    /// a parse error.
    pub fn parse(mut self) -> EvalResult<Expr> {
        let expr = self.parse_expression()?;
        if *self.peek() != Token::Eof {
            return Err(EvalError::Parse(format!(
                "unexpected token '{}' after expression",
                self.peek()
            )));
        }
        Ok(expr)
    }

    fn parse_expression(&mut self) -> EvalResult<Expr> {
        self.depth += 1;
        if self.depth > MAX_EXPR_DEPTH {
            return Err(EvalError::Parse(format!(
                "expression nesting exceeds depth {MAX_EXPR_DEPTH}"
            )));
        }
        let result = self.parse_or();
        self.depth -= 1;
        result
    }

    // ── Precedence chain ─────────────────────────────────────────────────

    /// `OrExpr = AndExpr { "or" AndExpr }`
    fn parse_or(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = binary(left, BinOp::Or, right);
        }
        Ok(left)
    }

    /// `AndExpr = CompExpr { "and" CompExpr }`
    fn parse_and(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_comparison()?;
        while self.eat(&Token::And) {
            let right = self.parse_comparison()?;
            left = binary(left, BinOp::And, right);
        }
        Ok(left)
    }

    /// `CompExpr = AddExpr [ CompOp AddExpr ]`
    ///
    /// Comparison operators do NOT chain: `a < b < c` is a parse error.
    fn parse_comparison(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_add()?;
        if let Some(op) = self.comparison_op() {
            self.advance();
            let right = self.parse_add()?;
            left = binary(left, op, right);
            if self.comparison_op().is_some() {
                return Err(EvalError::Parse(
                    "comparison operators cannot be chained; use 'and' to combine".into(),
                ));
            }
        }
        Ok(left)
    }

    fn comparison_op(&self) -> Option<BinOp> {
        match self.peek() {
            Token::EqEq => Some(BinOp::Eq),
            Token::BangEq => Some(BinOp::NotEq),
            Token::Less => Some(BinOp::Less),
            Token::LessEq => Some(BinOp::LessEq),
            Token::Greater => Some(BinOp::Greater),
            Token::GreaterEq => Some(BinOp::GreaterEq),
            _ => None,
        }
    }

    /// `AddExpr = MulExpr { ("+" | "-") MulExpr }`
    fn parse_add(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_mul()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    /// `MulExpr = UnaryExpr { ("*" | "/" | "%") UnaryExpr }`
    fn parse_mul(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    /// `UnaryExpr = ( "not" | "-" ) UnaryExpr | PostfixExpr`
    fn parse_unary(&mut self) -> EvalResult<Expr> {
        let op = match self.peek() {
            Token::Not => Some(UnaryOp::Not),
            Token::Minus => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    /// `PostfixExpr = PrimaryExpr { "[" Expression "]" }`
    fn parse_postfix(&mut self) -> EvalResult<Expr> {
        let mut expr = self.parse_primary()?;
        while self.eat(&Token::LBracket) {
            let index = self.parse_expression()?;
            self.expect(&Token::RBracket)?;
            expr = Expr::Index {
                target: Box::new(expr),
                index: Box::new(index),
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> EvalResult<Expr> {
        match self.peek().clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::NumberLit(n))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Expr::StringLit(s))
            }
            Token::True => {
                self.advance();
                Ok(Expr::BoolLit(true))
            }
            Token::False => {
                self.advance();
                Ok(Expr::BoolLit(false))
            }
            Token::None => {
                self.advance();
                Ok(Expr::NoneLit)
            }
            Token::Ident(name) => {
                self.advance();
                if self.eat(&Token::LParen) {
                    let args = self.parse_arg_list()?;
                    self.expect(&Token::RParen)?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Identifier(name))
                }
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => {
                self.advance();
                let elems = self.parse_list_elements()?;
                self.expect(&Token::RBracket)?;
                Ok(Expr::ListLit(elems))
            }
            other => Err(EvalError::Parse(format!("unexpected token '{other}'"))),
        }
    }

    /// Comma-separated call arguments, terminator not consumed.
    fn parse_arg_list(&mut self) -> EvalResult<Vec<Expr>> {
        let mut args = Vec::new();
        if *self.peek() == Token::RParen {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if !self.eat(&Token::Comma) {
                return Ok(args);
            }
        }
    }

    /// Comma-separated list elements with an optional trailing comma.
    fn parse_list_elements(&mut self) -> EvalResult<Vec<Expr>> {
        let mut elems = Vec::new();
        if *self.peek() == Token::RBracket {
            return Ok(elems);
        }
        loop {
            elems.push(self.parse_expression()?);
            if !self.eat(&Token::Comma) || *self.peek() == Token::RBracket {
                return Ok(elems);
            }
        }
    }

    // ── Token cursor ─────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> EvalResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(EvalError::Parse(format!(
                "expected '{expected}', found '{}'",
                self.peek()
            )))
        }
    }
}

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> Expr {
        let tokens = Lexer::new(src).tokenize().expect("lex failure");
        Parser::new(tokens).parse().expect("parse failure")
    }

    #[test]
    fn precedence_mul_over_add() {
        let expr = parse("1 + 2 * 3");
        let Expr::Binary { op: BinOp::Add, right, .. } = expr else {
            panic!("expected top-level add");
        };
        assert!(matches!(*right, Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn parens_override_precedence() {
        let expr = parse("(1 + 2) * 3");
        assert!(matches!(expr, Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn comparison_does_not_chain() {
        let tokens = Lexer::new("1 < 2 < 3").tokenize().expect("lex failure");
        assert!(Parser::new(tokens).parse().is_err());
    }

    #[test]
    fn call_with_nested_call() {
        let expr = parse("sq(add(1, 2))");
        let Expr::Call { name, args } = expr else {
            panic!("expected call");
        };
        assert_eq!(name, "sq");
        assert!(matches!(&args[0], Expr::Call { name, .. } if name == "add"));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let tokens = Lexer::new("1 2").tokenize().expect("lex failure");
        assert!(Parser::new(tokens).parse().is_err());
    }

    #[test]
    fn index_postfix() {
        let expr = parse("xs[0][1]");
        assert!(matches!(expr, Expr::Index { .. }));
    }
}
