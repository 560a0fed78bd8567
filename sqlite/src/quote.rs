//! Identifier quoting for dynamically built statements.
//!
//! Pragmas and `COUNT(*)` queries cannot bind a table name as a parameter,
//! so names are spliced into the SQL text as delimited identifiers.

const DELIMITER: char = '"';

/// Wraps an identifier in double quotes, doubling any embedded quote.
///
/// Any string is accepted, including empty strings, reserved words, and
/// names containing quotes or whitespace.
///
/// # Examples
///
/// ```
/// use sqlscope_sqlite::quote_identifier;
///
/// assert_eq!(quote_identifier("table_name"), r#""table_name""#);
/// assert_eq!(quote_identifier("table-with-hyphen"), r#""table-with-hyphen""#);
/// assert_eq!(quote_identifier(r#"table"with"quotes"#), r#""table""with""quotes""#);
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    let mut quoted = String::with_capacity(identifier.len() + 2);
    quoted.push(DELIMITER);
    for ch in identifier.chars() {
        if ch == DELIMITER {
            quoted.push(DELIMITER);
        }
        quoted.push(ch);
    }
    quoted.push(DELIMITER);
    quoted
}

/// Reverses [`quote_identifier`].
///
/// Returns `None` if `quoted` is not wrapped in double quotes or contains
/// an inner quote that is not doubled.
///
/// # Examples
///
/// ```
/// use sqlscope_sqlite::{quote_identifier, unquote_identifier};
///
/// let name = r#"odd "name""#;
/// assert_eq!(unquote_identifier(&quote_identifier(name)).as_deref(), Some(name));
/// assert_eq!(unquote_identifier("bare"), None);
/// ```
pub fn unquote_identifier(quoted: &str) -> Option<String> {
    let inner = quoted
        .strip_prefix(DELIMITER)?
        .strip_suffix(DELIMITER)?;

    let mut unquoted = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == DELIMITER && chars.next() != Some(DELIMITER) {
            return None;
        }
        unquoted.push(ch);
    }
    Some(unquoted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain_identifier() {
        assert_eq!(quote_identifier("users"), "\"users\"");
    }

    #[test]
    fn test_quote_doubles_embedded_quotes() {
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_identifier("\""), "\"\"\"\"");
    }

    #[test]
    fn test_quote_empty_identifier() {
        assert_eq!(quote_identifier(""), "\"\"");
    }

    #[test]
    fn test_quote_leaves_other_punctuation_alone() {
        assert_eq!(quote_identifier("it's; DROP TABLE x"), "\"it's; DROP TABLE x\"");
        assert_eq!(quote_identifier("[bracketed]"), "\"[bracketed]\"");
    }

    #[test]
    fn test_round_trip_law() {
        let samples = [
            "",
            "users",
            "select",
            "with space",
            "\"",
            "\"\"",
            "a\"b\"c",
            "\"leading",
            "trailing\"",
            "ünïcødé \"名前\"",
            "new\nline",
        ];
        for sample in samples {
            let quoted = quote_identifier(sample);
            assert_eq!(
                unquote_identifier(&quoted).as_deref(),
                Some(sample),
                "round trip failed for {sample:?}"
            );
        }
    }

    #[test]
    fn test_round_trip_generated_strings() {
        let alphabet = ['a', '"', ' ', '_', 'é'];
        // Every string of length <= 4 over the alphabet.
        let mut current = vec![String::new()];
        for _ in 0..4 {
            let mut next = Vec::new();
            for prefix in &current {
                for ch in alphabet {
                    let mut s = prefix.clone();
                    s.push(ch);
                    assert_eq!(unquote_identifier(&quote_identifier(&s)), Some(s.clone()));
                    next.push(s);
                }
            }
            current = next;
        }
    }

    #[test]
    fn test_unquote_rejects_malformed_input() {
        assert_eq!(unquote_identifier("users"), None);
        assert_eq!(unquote_identifier("\"users"), None);
        assert_eq!(unquote_identifier("\""), None);
        assert_eq!(unquote_identifier("\"a\"b\""), None);
    }
}
