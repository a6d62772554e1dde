//! Quoting rules shared by keyed values, attribute lines and the header.
//!
//! Values that contain a delimiter or any whitespace are wrapped in double
//! quotes; inside quotes `\\`, `\"`, `\n`, `\r` and `\0` are escapes.

/// Whether `c` forces a value to be quoted when written. Keyed values end
/// at the first unquoted whitespace character, Unicode whitespace included.
fn needs_quotes(c: char) -> bool {
    c.is_whitespace() || matches!(c, '|' | '"' | '\\')
}

pub(crate) fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}

pub(crate) fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => break,
        }
    }
    out
}

/// Quote and escape `value` if it contains any character that would break
/// tokenizing.
pub(crate) fn quote_if_needed(value: &str) -> String {
    if value.chars().any(needs_quotes) {
        format!("\"{}\"", escape(value))
    } else {
        value.to_string()
    }
}

/// Strip surrounding double quotes and unescape the content. Values that
/// are not fully quoted are returned unchanged.
pub(crate) fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        unescape(&value[1..value.len() - 1])
    } else {
        value.to_string()
    }
}

/// Split `value` on `delimiter`, honouring double-quoted sections and
/// keeping empty tokens. Quote characters are removed and escapes inside
/// quotes are decoded. An empty input yields no tokens.
pub(crate) fn tokenize(value: &str, delimiter: char) -> Vec<String> {
    let mut tokens = Vec::new();
    if value.is_empty() {
        return tokens;
    }

    let mut token = String::new();
    let mut in_quotes = false;
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if in_quotes && c == '\\' {
            match chars.next() {
                Some('n') => token.push('\n'),
                Some('r') => token.push('\r'),
                Some('0') => token.push('\0'),
                Some(other @ ('"' | '\\')) => token.push(other),
                Some(other) => {
                    token.push('\\');
                    token.push(other);
                }
                None => token.push('\\'),
            }
        } else if c == '"' {
            in_quotes = !in_quotes;
        } else if c == delimiter && !in_quotes {
            tokens.push(std::mem::take(&mut token));
        } else {
            token.push(c);
        }
    }
    tokens.push(token);
    tokens
}

#[cfg(test)]
mod tests {
    use super::{escape, quote_if_needed, tokenize, unescape, unquote};

    #[test]
    fn escapes_quotes_and_newlines() {
        assert_eq!(escape(r#"say "hi"\now"#), r#"say \"hi\"\\now"#);
        assert_eq!(escape("a\nb"), r"a\nb");
        assert_eq!(unescape(r#"say \"hi\"\\now"#), r#"say "hi"\now"#);
        assert_eq!(unescape(r"a\nb"), "a\nb");
    }

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(quote_if_needed("plain"), "plain");
        assert_eq!(quote_if_needed("a|b"), "\"a|b\"");
        assert_eq!(quote_if_needed("two words"), "\"two words\"");
        assert_eq!(quote_if_needed("tab\there"), "\"tab\there\"");
        assert_eq!(quote_if_needed("caf\u{a0}e"), "\"caf\u{a0}e\"");
        assert_eq!(quote_if_needed("x\ry"), "\"x\\ry\"");
        assert_eq!(quote_if_needed("v\u{b}w"), "\"v\u{b}w\"");
    }

    #[test]
    fn unquotes_full_quotes_only() {
        assert_eq!(unquote(r#""+proj=longlat \"x\"""#), r#"+proj=longlat "x""#);
        assert_eq!(unquote("4326"), "4326");
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn tokenizes_with_quotes_and_empty_tokens() {
        assert_eq!(tokenize("a|b|c", '|'), vec!["a", "b", "c"]);
        assert_eq!(tokenize("a||c|", '|'), vec!["a", "", "c", ""]);
        assert_eq!(tokenize(r#""a|b"|3"#, '|'), vec!["a|b", "3"]);
        assert_eq!(
            tokenize(r#""say \"hi\""|"line\nbreak""#, '|'),
            vec![r#"say "hi""#, "line\nbreak"]
        );
        assert_eq!(tokenize(r#""x\ry"|z"#, '|'), vec!["x\ry", "z"]);
        assert!(tokenize("", '|').is_empty());
    }
}
