//! Repository query result extraction
//!
//! The repository-query service answers with a text body that mixes a JSON
//! `sources` array with `data: {"content": "..."}` event lines. This module
//! pulls both out by pattern. Nothing here fails: a missing or malformed
//! `sources` array yields an empty list, and malformed content events are
//! skipped because they do not match.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

static SOURCES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""sources":\s*(\[[^\]]*\])"#).expect("valid sources regex"));

static CONTENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"data:\s*\{\s*"content":\s*"((?:[^"\\]|\\.)+)"\s*\}"#)
        .expect("valid content regex")
});

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Escaped blank line placed between content pieces; it survives whitespace
/// collapsing and becomes a real blank line when un-escaped.
const PIECE_SEPARATOR: &str = r"\n\n";

/// Sources and answer text extracted from a query response
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryExtract {
    /// Parsed `sources` array, empty when absent or malformed
    pub sources: Vec<Value>,
    /// Concatenated answer text
    pub content: String,
}

/// Extract sources and content from a raw query response body
pub fn extract_query_result(text: &str) -> QueryExtract {
    QueryExtract {
        sources: extract_sources(text),
        content: extract_content(text),
    }
}

/// Find the first `"sources": [...]` fragment and parse it
pub fn extract_sources(text: &str) -> Vec<Value> {
    let Some(captures) = SOURCES_RE.captures(text) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<Value>>(&captures[1]) {
        Ok(sources) => sources,
        Err(e) => {
            tracing::warn!(error = %e, "Error parsing sources, using empty list");
            Vec::new()
        }
    }
}

/// Join every content event into one paragraph-formatted string
pub fn extract_content(text: &str) -> String {
    let pieces: Vec<&str> = CONTENT_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    let joined = pieces.join(PIECE_SEPARATOR);
    let collapsed = WHITESPACE_RE.replace_all(joined.trim(), " ");
    unescape(&collapsed)
}

/// Resolve `\\`, `\n` and `\"` in one left-to-right pass
///
/// Other escapes are kept as written.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_sources_and_joins_content() {
        let body = concat!(
            r#"{"sources": [{"path": "src/main.rs"}, {"path": "README.md"}]}"#,
            "\n",
            r#"data: {"content": "a"}"#,
            "\n\n",
            r#"data: {"content": "b"}"#,
            "\n\n",
        );

        let result = extract_query_result(body);
        assert_eq!(
            result.sources,
            vec![json!({"path": "src/main.rs"}), json!({"path": "README.md"})]
        );
        assert_eq!(result.content, "a\n\nb");
    }

    #[test]
    fn test_malformed_sources_yield_empty_list() {
        let body = r#""sources": [{"path": broken}] data: {"content": "still here"}"#;
        let result = extract_query_result(body);
        assert!(result.sources.is_empty());
        assert_eq!(result.content, "still here");
    }

    #[test]
    fn test_missing_everything_is_empty() {
        assert_eq!(extract_query_result("plain text"), QueryExtract::default());
    }

    #[test]
    fn test_whitespace_collapses_and_escapes_unfold() {
        // real tab and spaces, escaped newline
        let body = "data: {\"content\": \"Error   handling\tlives in\\nsrc/errors.rs\"}";
        assert_eq!(
            extract_content(body),
            "Error handling lives in\nsrc/errors.rs"
        );
    }

    #[test]
    fn test_escaped_quotes_inside_content() {
        let body = r#"data: {"content": "call \"run\" first"}"#;
        assert_eq!(extract_content(body), "call \"run\" first");
    }

    #[test]
    fn test_malformed_content_events_are_skipped() {
        let body = concat!(
            r#"data: {"content": "kept"}"#,
            "\n",
            r#"data: {"content": 42}"#,
            "\n",
            r#"data: {"content": "unterminated}"#,
        );
        assert_eq!(extract_content(body), "kept");
    }

    #[test]
    fn test_escaped_backslash_before_n_stays_literal() {
        let body = r#"data: {"content": "saved to C:\\new and C:\\\\share"}"#;
        assert_eq!(extract_content(body), r"saved to C:\new and C:\\share");
    }

    #[test]
    fn test_unknown_escapes_are_kept() {
        let body = r#"data: {"content": "tab\there \u00e9"}"#;
        assert_eq!(extract_content(body), r"tab\there \u00e9");
    }
}
