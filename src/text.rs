//! Free-text formatting for card bodies.
//!
//! Payload text is authored by hand in JSON files and may contain anything.
//! It is always escaped before it reaches a page. Blank lines separate
//! paragraphs and single newlines become line breaks.

use maud::{Markup, PreEscaped};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph regex is valid"));

/// Escape `& < > " '` for safe inclusion in HTML text or attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render text as escaped `<p>` blocks with `<br>` for single newlines.
///
/// Empty text renders nothing.
pub fn format_text(text: &str) -> Markup {
    if text.is_empty() {
        return PreEscaped(String::new());
    }
    let normalized = text.replace("\r\n", "\n");
    let escaped = escape_html(&normalized);
    let html: String = PARAGRAPH_BREAK
        .split(&escaped)
        .map(|p| format!("<p>{}</p>", p.replace('\n', "<br>")))
        .collect();
    PreEscaped(html)
}

/// Read a payload field as display text.
///
/// Strings are returned as-is and numbers are stringified. Everything else,
/// including a missing key, is empty.
pub fn field(data: &Value, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// First non-empty value among `candidates`.
pub fn first_non_empty(candidates: &[&str]) -> String {
    candidates
        .iter()
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_default()
}
