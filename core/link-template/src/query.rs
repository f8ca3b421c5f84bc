//! FILENAME: core/link-template/src/query.rs
//! PURPOSE: Query-string parsing for loaded URLs.
//! CONTEXT: After a load resolves, the grid re-derives its sort state by
//! reading `sortBy`/`sortOrder` back out of the URL that was actually
//! fetched. This module does the reverse of template expansion: it splits
//! a URL's query string into decoded `(name, value)` pairs.

/// Parses the query string of `url` into decoded `(name, value)` pairs,
/// in document order. A URL without a query string yields an empty list.
pub fn parse_query(url: &str) -> Vec<(String, String)> {
    let query = match url.split_once('?') {
        Some((_, q)) => q,
        None => return Vec::new(),
    };
    // A fragment never reaches the server; strip it before splitting.
    let query = query.split('#').next().unwrap_or("");

    query
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((name, value)) => (decode_component(name), decode_component(value)),
            None => (decode_component(part), String::new()),
        })
        .collect()
}

/// Returns the decoded value of the first query parameter named `name`.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    parse_query(url)
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v)
}

/// Percent-decodes a URI component. `+` decodes to a space; malformed
/// percent escapes pass through literally.
pub fn decode_component(component: &str) -> String {
    let bytes = component.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_basic() {
        let pairs = parse_query("http://api.test/items?page=2&limit=25");
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "25".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_query_no_query_string() {
        assert!(parse_query("http://api.test/items").is_empty());
    }

    #[test]
    fn test_query_param() {
        let url = "http://api.test/items?sortBy=name&sortOrder=asc";
        assert_eq!(query_param(url, "sortBy"), Some("name".to_string()));
        assert_eq!(query_param(url, "sortOrder"), Some("asc".to_string()));
        assert_eq!(query_param(url, "missing"), None);
    }

    #[test]
    fn test_decode_percent_escapes() {
        assert_eq!(decode_component("a%20b%26c"), "a b&c");
        assert_eq!(decode_component("caf%C3%A9"), "café");
    }

    #[test]
    fn test_decode_plus_as_space() {
        assert_eq!(decode_component("a+b"), "a b");
    }

    #[test]
    fn test_malformed_escape_passes_through() {
        assert_eq!(decode_component("100%"), "100%");
        assert_eq!(decode_component("%zz"), "%zz");
    }

    #[test]
    fn test_round_trip_with_template_encoding() {
        let encoded = crate::template::encode_component("a b&c=d");
        assert_eq!(decode_component(&encoded), "a b&c=d");
    }
}
