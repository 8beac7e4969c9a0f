//! Recovers the JSON object from a model answer.
//!
//! Models wrap JSON in prose or code fences despite being told not to. The
//! answer is tried, in order: fenced content, the whole text, the widest
//! `{...}` span, and finally the first balanced object.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static FENCED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)\s*```").expect("fence pattern is valid")
});

static OBJECT_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("object pattern is valid"));

/// Extracts the first JSON object from `raw`, or `None` if there is none.
pub fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
    let text = raw.trim();

    let fenced = FENCED.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str());
    if let Some(object) = fenced.and_then(parse_object) {
        return Some(object);
    }
    if let Some(object) = parse_object(text) {
        return Some(object);
    }
    if let Some(object) = OBJECT_SPAN.find(text).and_then(|m| parse_object(m.as_str())) {
        return Some(object);
    }
    first_balanced_object(text)
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Scans for brace-balanced spans, skipping braces inside string literals.
fn first_balanced_object(text: &str) -> Option<Map<String, Value>> {
    for (start, _) in text.match_indices('{') {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        for (offset, ch) in text[start..].char_indices() {
            if in_string {
                match ch {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match ch {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(object) = parse_object(&text[start..=start + offset]) {
                            return Some(object);
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
    }
    None
}
