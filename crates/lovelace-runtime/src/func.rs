//! User-defined functions.

/// A registered function — two shapes, tagged.
#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    /// `fn name(params) => expr` — a single expression body.
    Expr { params: Vec<String>, body: String },
    /// `fn name(params): ... end` — body captured verbatim as the line
    /// range between the header and its matching `end`.
    Block {
        params: Vec<String>,
        body: Vec<String>,
    },
}

impl Function {
    pub fn params(&self) -> &[String] {
        match self {
            Self::Expr { params, .. } | Self::Block { params, .. } => params,
        }
    }
}

/// Split a raw parameter list into names; blanks are dropped.
pub fn parse_params(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_params() {
        assert_eq!(parse_params("a, b ,c"), vec!["a", "b", "c"]);
        assert!(parse_params("").is_empty());
        assert!(parse_params(" , ").is_empty());
    }
}
