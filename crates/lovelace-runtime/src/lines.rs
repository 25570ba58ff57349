//! Lexical line filter.
//!
//! Strips `###` comment suffixes and blank lines from raw source text,
//! producing the flat line sequence all control flow indexes into.

/// Produce the ordered sequence of non-empty, comment-free source lines.
///
/// Line endings are normalized (`\r\n` and bare `\r`), comments are cut
/// from the first `###` outside a double-quoted segment, and lines that
/// are empty after right-trimming are dropped. Empty input yields an
/// empty sequence (a no-op program).
pub fn filter(source: &str) -> Vec<String> {
    let normalized = source.replace("\r\n", "\n").replace('\r', "\n");
    normalized
        .split('\n')
        .filter_map(|raw| {
            let line = strip_comment(raw).trim_end();
            if line.trim_start().is_empty() {
                None
            } else {
                Some(line.to_string())
            }
        })
        .collect()
}

/// Cut everything from the first `###` that is not inside a string
/// literal.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string => i += 1, // skip the escaped byte
            b'"' => in_string = !in_string,
            b'#' if !in_string && bytes[i..].starts_with(b"###") => {
                return &line[..i];
            }
            _ => {}
        }
        i += 1;
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_and_blank_lines() {
        let src = "var x (1) ### set up\n\n   \nout x ### print\n### whole-line comment\n";
        assert_eq!(filter(src), vec!["var x (1)", "out x"]);
    }

    #[test]
    fn comment_marker_inside_string_is_kept() {
        let src = "out \"### not a comment\"";
        assert_eq!(filter(src), vec!["out \"### not a comment\""]);
    }

    #[test]
    fn normalizes_crlf() {
        assert_eq!(filter("out 1\r\nout 2\rout 3"), vec!["out 1", "out 2", "out 3"]);
    }

    #[test]
    fn empty_input_is_a_noop_program() {
        assert!(filter("").is_empty());
        assert!(filter("\n\n### only comments\n").is_empty());
    }

    #[test]
    fn preserves_leading_indentation() {
        // Indentation is cosmetic but lines are only right-trimmed.
        assert_eq!(filter("  out 1  "), vec!["  out 1"]);
    }
}
