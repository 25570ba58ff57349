//! Expression tokens.

use std::fmt;

/// A single token of the expression grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals & names
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    None,

    // Boolean keywords
    And,
    Or,
    Not,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    BangEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,

    /// End of input.
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Ident(name) => write!(f, "{name}"),
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::None => write!(f, "none"),
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::Not => write!(f, "not"),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Star => write!(f, "*"),
            Self::Slash => write!(f, "/"),
            Self::Percent => write!(f, "%"),
            Self::EqEq => write!(f, "=="),
            Self::BangEq => write!(f, "!="),
            Self::Less => write!(f, "<"),
            Self::LessEq => write!(f, "<="),
            Self::Greater => write!(f, ">"),
            Self::GreaterEq => write!(f, ">="),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::LBracket => write!(f, "["),
            Self::RBracket => write!(f, "]"),
            Self::Comma => write!(f, ","),
            Self::Eof => write!(f, "<eof>"),
        }
    }
}
