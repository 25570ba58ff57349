//! Expression tokenizer — converts a single expression string into tokens.
//!
//! Expressions never span lines, so tokens carry no positions; any
//! rejection fails the whole expression (which the runtime then degrades
//! to the string fallback).

use crate::error::{EvalError, EvalResult};
use crate::token::Token;

/// The expression tokenizer.
pub struct Lexer<'src> {
    source: &'src [u8],
    pos: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
        }
    }

    /// Tokenize the entire input. The stream always ends with [`Token::Eof`].
    pub fn tokenize(mut self) -> EvalResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn scan(&mut self) -> EvalResult<Token> {
        self.skip_whitespace();
        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };
        match c {
            b'+' => self.single(Token::Plus),
            b'-' => self.single(Token::Minus),
            b'*' => self.single(Token::Star),
            b'/' => self.single(Token::Slash),
            b'%' => self.single(Token::Percent),
            b'(' => self.single(Token::LParen),
            b')' => self.single(Token::RParen),
            b'[' => self.single(Token::LBracket),
            b']' => self.single(Token::RBracket),
            b',' => self.single(Token::Comma),
            b'=' => {
                self.pos += 1;
                if self.eat(b'=') {
                    Ok(Token::EqEq)
                } else {
                    Err(EvalError::Parse("unexpected '='".into()))
                }
            }
            b'!' => {
                self.pos += 1;
                if self.eat(b'=') {
                    Ok(Token::BangEq)
                } else {
                    Err(EvalError::Parse("unexpected '!'".into()))
                }
            }
            b'<' => {
                self.pos += 1;
                Ok(if self.eat(b'=') {
                    Token::LessEq
                } else {
                    Token::Less
                })
            }
            b'>' => {
                self.pos += 1;
                Ok(if self.eat(b'=') {
                    Token::GreaterEq
                } else {
                    Token::Greater
                })
            }
            b'"' => self.scan_string(),
            b'0'..=b'9' => self.scan_number(),
            c if c == b'_' || c.is_ascii_alphabetic() => Ok(self.scan_word()),
            other => Err(EvalError::Parse(format!(
                "unexpected character '{}'",
                other as char
            ))),
        }
    }

    fn scan_number(&mut self) -> EvalResult<Token> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        // Fractional part, but not a trailing dot
        if self.peek() == Some(b'.')
            && self
                .source
                .get(self.pos + 1)
                .is_some_and(u8::is_ascii_digit)
        {
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text = std::str::from_utf8(&self.source[start..self.pos])
            .map_err(|_| EvalError::Parse("invalid number".into()))?;
        text.parse()
            .map(Token::Number)
            .map_err(|_| EvalError::Parse(format!("invalid number literal '{text}'")))
    }

    fn scan_string(&mut self) -> EvalResult<Token> {
        self.pos += 1; // opening quote
        let mut text = String::new();
        loop {
            match self.peek() {
                Option::None => {
                    return Err(EvalError::Parse("unterminated string literal".into()));
                }
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(Token::Str(text));
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(b'"') => text.push('"'),
                        Some(b'\\') => text.push('\\'),
                        Some(b'n') => text.push('\n'),
                        Some(b't') => text.push('\t'),
                        other => {
                            return Err(EvalError::Parse(format!(
                                "invalid escape '\\{}'",
                                other.map_or(' ', |c| c as char)
                            )));
                        }
                    }
                    self.pos += 1;
                }
                Some(_) => {
                    // Copy the full UTF-8 scalar, not just one byte.
                    let rest = std::str::from_utf8(&self.source[self.pos..])
                        .map_err(|_| EvalError::Parse("invalid utf-8 in string".into()))?;
                    let c = rest.chars().next().unwrap_or('\u{fffd}');
                    text.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
    }

    fn scan_word(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c == b'_' || c.is_ascii_alphanumeric())
        {
            self.pos += 1;
        }
        let word = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("");
        match word {
            "true" => Token::True,
            "false" => Token::False,
            "none" => Token::None,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => Token::Ident(word.to_string()),
        }
    }

    fn single(&mut self, token: Token) -> EvalResult<Token> {
        self.pos += 1;
        Ok(token)
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }
}
