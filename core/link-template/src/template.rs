//! FILENAME: core/link-template/src/template.rs
//! PURPOSE: URI template expansion (the RFC 6570 subset used by HAL links).
//! CONTEXT: Collection resources advertise templated links such as
//! `/items{?page,limit}` or `/items/{parentId}/children`. Expansion
//! substitutes the variables a caller supplies and drops the rest:
//! - `{var}`        simple path variable, replaced by the encoded value
//! - `{?a,b}`       query group, expands to `?a=..&b=..` for set variables
//! - `{&a,b}`       query continuation, expands to `&a=..&b=..`
//! A query group with no set variables expands to nothing.

/// A server-advertised URI template.
///
/// Wraps the raw template string; expansion never fails. Unknown or
/// malformed expressions are passed through literally so a badly behaved
/// server cannot take the client down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
}

impl UriTemplate {
    /// Wraps a raw template string.
    pub fn new(raw: impl Into<String>) -> Self {
        UriTemplate { raw: raw.into() }
    }

    /// Returns the raw template text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if the template contains at least one `{...}` expression.
    pub fn is_templated(&self) -> bool {
        self.raw.contains('{') && self.raw.contains('}')
    }

    /// Expands the template with the given `(name, value)` pairs.
    ///
    /// Variables not present in `vars` are dropped. Values are
    /// percent-encoded. The template text outside expressions is copied
    /// verbatim.
    pub fn expand(&self, vars: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(self.raw.len());
        let mut rest = self.raw.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after_open = &rest[open + 1..];

            match after_open.find('}') {
                Some(close) => {
                    let expr = &after_open[..close];
                    out.push_str(&expand_expression(expr, vars));
                    rest = &after_open[close + 1..];
                }
                None => {
                    // Unterminated expression: emit literally and stop scanning.
                    out.push_str(&rest[open..]);
                    return out;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// Expands a single `{...}` expression body (without the braces).
fn expand_expression(expr: &str, vars: &[(&str, &str)]) -> String {
    let (operator, names) = match expr.chars().next() {
        Some('?') => (Some('?'), &expr[1..]),
        Some('&') => (Some('&'), &expr[1..]),
        _ => (None, expr),
    };

    match operator {
        Some(op) => {
            let mut pairs: Vec<String> = Vec::new();
            for name in names.split(',') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                if let Some(value) = lookup(vars, name) {
                    pairs.push(format!("{}={}", name, encode_component(value)));
                }
            }
            if pairs.is_empty() {
                String::new()
            } else {
                format!("{}{}", op, pairs.join("&"))
            }
        }
        None => {
            // Simple expansion: only the first name is meaningful here;
            // the links this engine consumes never use multi-variable
            // simple expressions.
            let name = names.split(',').next().unwrap_or("").trim();
            match lookup(vars, name) {
                Some(value) => encode_component(value),
                None => String::new(),
            }
        }
    }
}

fn lookup<'a>(vars: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    vars.iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| *v)
}

/// Percent-encodes a single URI component.
/// Unreserved characters (ALPHA / DIGIT / `-` `.` `_` `~`) pass through;
/// everything else becomes `%XX` over its UTF-8 bytes.
pub fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push(hex_digit(byte >> 4));
                out.push(hex_digit(byte & 0x0F));
            }
        }
    }
    out
}

fn hex_digit(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        _ => (b'A' + nibble - 10) as char,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_path_variable() {
        let tpl = UriTemplate::new("http://api.test/items/{parentId}/children");
        let url = tpl.expand(&[("parentId", "42")]);
        assert_eq!(url, "http://api.test/items/42/children");
    }

    #[test]
    fn test_expand_query_group() {
        let tpl = UriTemplate::new("http://api.test/items{?page,limit}");
        let url = tpl.expand(&[("page", "2"), ("limit", "25")]);
        assert_eq!(url, "http://api.test/items?page=2&limit=25");
    }

    #[test]
    fn test_expand_query_continuation() {
        let tpl = UriTemplate::new("http://api.test/items?f=1{&sortBy,sortOrder}");
        let url = tpl.expand(&[("sortBy", "name"), ("sortOrder", "asc")]);
        assert_eq!(url, "http://api.test/items?f=1&sortBy=name&sortOrder=asc");
    }

    #[test]
    fn test_unset_variables_are_dropped() {
        let tpl = UriTemplate::new("http://api.test/items{?page,limit}");
        let url = tpl.expand(&[("page", "3")]);
        assert_eq!(url, "http://api.test/items?page=3");
    }

    #[test]
    fn test_empty_query_group_expands_to_nothing() {
        let tpl = UriTemplate::new("http://api.test/items{?page,limit}");
        let url = tpl.expand(&[]);
        assert_eq!(url, "http://api.test/items");
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let tpl = UriTemplate::new("http://api.test/items{?searchString}");
        let url = tpl.expand(&[("searchString", "a b&c")]);
        assert_eq!(url, "http://api.test/items?searchString=a%20b%26c");
    }

    #[test]
    fn test_unterminated_expression_passes_through() {
        let tpl = UriTemplate::new("http://api.test/items{?page");
        assert_eq!(tpl.expand(&[("page", "1")]), "http://api.test/items{?page");
    }

    #[test]
    fn test_is_templated() {
        assert!(UriTemplate::new("/a{?b}").is_templated());
        assert!(!UriTemplate::new("/a?b=1").is_templated());
    }
}
