//! URL composition and query-string parsing.

use std::collections::{BTreeMap, HashMap};

use percent_encoding::percent_decode_str;
use url::{form_urlencoded, Position, Url};

use crate::error::{NetError, Result};

/// Stand-in base used to resolve relative references; never emitted.
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// Merge `params` into the query string of `base` and return the full URL.
///
/// Existing parameters are kept unless a key collides, in which case the new
/// value replaces every existing value for that key. The query string is
/// re-encoded with keys in ascending order.
///
/// Relative references such as `/users` or `docs/page` are accepted and
/// returned relative. A base starting with `:` has no scheme and is rejected.
///
/// The whole URL is re-serialized, not just the query: default ports are
/// dropped, `.`/`..` path segments are resolved, a bare trailing `?` is
/// removed, and query characters outside the form-urlencoded safe set
/// (such as `~`) are percent-encoded.
pub fn build_url(base: &str, params: Option<&HashMap<String, String>>) -> Result<String> {
    let (url, relative) = match Url::parse(base) {
        Ok(url) => (url, false),
        Err(url::ParseError::RelativeUrlWithoutBase) if !base.starts_with(':') => {
            (Url::parse(RELATIVE_BASE)?.join(base)?, true)
        }
        Err(err) => return Err(err.into()),
    };

    let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        merged
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    if let Some(params) = params {
        for (key, value) in params {
            merged.insert(key.clone(), vec![value.clone()]);
        }
    }

    // `Url` always carries a leading "/" in the path; keep the caller's spelling.
    let raw_path = base.split(['?', '#']).next().unwrap_or_default();
    let has_authority = !relative || base.starts_with("//");
    let mut out = String::new();
    if has_authority {
        if relative {
            out.push_str("//");
            out.push_str(&url[Position::BeforeUsername..Position::BeforePath]);
        } else {
            out.push_str(&url[..Position::BeforePath]);
        }
        if !(url.path() == "/" && !raw_path.ends_with('/')) {
            out.push_str(url.path());
        }
    } else if raw_path.starts_with('/') {
        out.push_str(url.path());
    } else {
        out.push_str(url.path().trim_start_matches('/'));
    }
    if !merged.is_empty() {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &merged {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        out.push('?');
        out.push_str(&serializer.finish());
    }
    if let Some(fragment) = url.fragment() {
        out.push('#');
        out.push_str(fragment);
    }
    Ok(out)
}

/// Parse a raw query string (no leading `?`) into a name → value map.
///
/// Only the first occurrence of a repeated name is kept.
pub fn parse_query_params(query: &str) -> Result<HashMap<String, String>> {
    let mut params = HashMap::new();
    for segment in query.split('&') {
        if segment.is_empty() {
            continue;
        }
        if segment.contains(';') {
            return Err(NetError::InvalidQuery(format!(
                "invalid semicolon separator in {segment:?}"
            )));
        }
        let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
        let key = unescape(key)?;
        let value = unescape(value)?;
        params.entry(key).or_insert(value);
    }
    Ok(params)
}

/// Decode one form-urlencoded component, rejecting `%` escapes that are not
/// followed by two hex digits.
fn unescape(component: &str) -> Result<String> {
    let bytes = component.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                let end = (i + 3).min(bytes.len());
                return Err(NetError::InvalidQuery(format!(
                    "invalid URL escape {:?}",
                    String::from_utf8_lossy(&bytes[i..end])
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    let spaced = component.replace('+', " ");
    Ok(percent_decode_str(&spaced).decode_utf8_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn build_url_without_params_is_unchanged() {
        assert_eq!(build_url("https://example.com", None).unwrap(), "https://example.com");
        assert_eq!(
            build_url("https://example.com/", Some(&HashMap::new())).unwrap(),
            "https://example.com/"
        );
        assert_eq!(
            build_url("https://api.example.com/users", None).unwrap(),
            "https://api.example.com/users"
        );
    }

    #[test]
    fn build_url_sorts_params_by_key() {
        let url = build_url(
            "https://api.example.com/users",
            Some(&params(&[("sort", "name"), ("page", "1"), ("limit", "10")])),
        )
        .unwrap();
        assert_eq!(url, "https://api.example.com/users?limit=10&page=1&sort=name");
    }

    #[test]
    fn build_url_merges_with_existing_query() {
        let url = build_url(
            "https://api.example.com/search?q=rust&page=1",
            Some(&params(&[("page", "2"), ("lang", "en")])),
        )
        .unwrap();
        assert_eq!(url, "https://api.example.com/search?lang=en&page=2&q=rust");
    }

    #[test]
    fn build_url_reorders_existing_query_without_new_params() {
        let url = build_url("https://example.com/a?b=2&a=1", None).unwrap();
        assert_eq!(url, "https://example.com/a?a=1&b=2");
    }

    #[test]
    fn build_url_keeps_repeated_existing_values() {
        let url = build_url("https://example.com/a?tag=x&tag=y", Some(&params(&[("z", "1")])))
            .unwrap();
        assert_eq!(url, "https://example.com/a?tag=x&tag=y&z=1");
    }

    #[test]
    fn build_url_encodes_values() {
        let url = build_url(
            "https://example.com",
            Some(&params(&[("q", "hello world"), ("x", "a&b")])),
        )
        .unwrap();
        assert_eq!(url, "https://example.com?q=hello+world&x=a%26b");
    }

    #[test]
    fn build_url_preserves_fragment() {
        let url = build_url("https://example.com/docs#intro", Some(&params(&[("v", "2")])))
            .unwrap();
        assert_eq!(url, "https://example.com/docs?v=2#intro");
    }

    #[test]
    fn build_url_accepts_relative_references() {
        assert_eq!(build_url("/relative/path", None).unwrap(), "/relative/path");
        assert_eq!(
            build_url("/relative/path?b=2", Some(&params(&[("a", "1")]))).unwrap(),
            "/relative/path?a=1&b=2"
        );
        assert_eq!(build_url("docs/page", None).unwrap(), "docs/page");
        assert_eq!(build_url("?x=1", None).unwrap(), "?x=1");
        assert_eq!(
            build_url("//cdn.example.com/lib.js", Some(&params(&[("v", "3")]))).unwrap(),
            "//cdn.example.com/lib.js?v=3"
        );
    }

    #[test]
    fn build_url_normalizes_whole_url() {
        assert_eq!(
            build_url("http://example.com:80/x", None).unwrap(),
            "http://example.com/x"
        );
        assert_eq!(build_url("https://example.com/a/../b", None).unwrap(), "https://example.com/b");
        assert_eq!(build_url("https://example.com/?", None).unwrap(), "https://example.com/");
        assert_eq!(
            build_url("https://example.com", Some(&params(&[("k", "a~b*c")]))).unwrap(),
            "https://example.com?k=a%7Eb*c"
        );
    }

    #[test]
    fn build_url_rejects_unparsable_base() {
        let err = build_url("://invalid-url", None).unwrap_err();
        assert!(matches!(err, NetError::InvalidUrl(_)));
    }

    #[test]
    fn parse_query_keeps_first_occurrence() {
        let parsed = parse_query_params("key=value1&key=value2").unwrap();
        assert_eq!(parsed, params(&[("key", "value1")]));
    }

    #[test]
    fn parse_query_empty_input() {
        assert!(parse_query_params("").unwrap().is_empty());
    }

    #[test]
    fn parse_query_decodes_components() {
        let parsed = parse_query_params("name=John+Doe&city=New%20York&flag").unwrap();
        assert_eq!(parsed["name"], "John Doe");
        assert_eq!(parsed["city"], "New York");
        assert_eq!(parsed["flag"], "");
    }

    #[test]
    fn parse_query_rejects_bad_escape() {
        let err = parse_query_params("%invalid").unwrap_err();
        assert!(matches!(err, NetError::InvalidQuery(_)));
        assert!(parse_query_params("a=%2").is_err());
    }

    #[test]
    fn parse_query_rejects_semicolons() {
        assert!(matches!(
            parse_query_params("a=1;b=2"),
            Err(NetError::InvalidQuery(_))
        ));
    }
}
