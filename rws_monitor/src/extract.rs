//! Scalar extraction from RWS response bodies.
//!
//! The controller answers the panel, RAPID and motion-system resources with
//! small HTML documents where each value sits in a `<span class="name">`,
//! and the I/O signal resources with JSON (`?json=1`). Only a handful of
//! scalars are needed from either, so both are matched with patterns rather
//! than parsed into full documents.
//!
//! # Example
//!
//! ```
//! use rws_monitor::extract::{extract_span, extract_json_string, first_json_string};
//!
//! let html = r#"<li class="pnl-ctrlstate"><span class="ctrlstate">motoron</span></li>"#;
//! assert_eq!(extract_span(html, "ctrlstate").as_deref(), Some("motoron"));
//!
//! let json = r#"{"_embedded":{"_state":[{"name":"AO_TCP_SPEED","lvalue":"0.75"}]}}"#;
//! assert_eq!(extract_json_string(json, "lvalue").as_deref(), Some("0.75"));
//! assert_eq!(first_json_string(json, &["value", "lvalue"]).as_deref(), Some("0.75"));
//! ```

use regex::{Regex, RegexBuilder};

/// Span classes tried in order for the RAPID execution state.
pub const PROGRAM_STATE_CLASSES: [&str; 3] = ["ctrlexecstate", "execstate", "state"];

/// JSON keys tried in order for an I/O signal value.
pub const SIGNAL_VALUE_KEYS: [&str; 2] = ["lvalue", "value"];

/// Inner text of the first `<span>` whose `class` attribute is `class_name`.
///
/// Tag and attribute names match case-insensitively and the inner text may
/// span lines. The result is trimmed.
pub fn extract_span(html: &str, class_name: &str) -> Option<String> {
    let pattern = format!(
        r#"<span\b[^>]*?\sclass\s*=\s*["']{}["'][^>]*>(.*?)</span\s*>"#,
        regex::escape(class_name)
    );
    capture_first(html, &pattern)
}

/// Trimmed value of the first `"key": "value"` pair, matched case-insensitively.
///
/// Only string values are recognised; RWS reports every signal value as a
/// quoted string.
pub fn extract_json_string(json: &str, key: &str) -> Option<String> {
    let pattern = format!(r#""{}"\s*:\s*"([^"]*)""#, regex::escape(key));
    capture_first(json, &pattern)
}

/// First span present among `class_names`, in order.
pub fn first_span(html: &str, class_names: &[&str]) -> Option<String> {
    class_names.iter().find_map(|name| extract_span(html, name))
}

/// First JSON string present among `keys`, in order.
pub fn first_json_string(json: &str, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| extract_json_string(json, key))
}

fn capture_first(haystack: &str, pattern: &str) -> Option<String> {
    let re: Regex = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .ok()?;
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}
