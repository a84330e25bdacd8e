//! Embedded JSON payload access
//!
//! Next.js pages ship their server state in
//! `<script id="__NEXT_DATA__" type="application/json">`. Reading that
//! payload is far more stable than scraping the rendered markup.

use scraper::{Html, Selector};
use serde_json::Value;

/// Parses the `__NEXT_DATA__` script body of a document
///
/// Returns `None` if the script is missing or its body is not valid JSON.
pub fn next_data_payload(document: &Html) -> Option<Value> {
    let selector = Selector::parse("script#__NEXT_DATA__").ok()?;
    let script = document.select(&selector).next()?;
    let body: String = script.text().collect();

    match serde_json::from_str(body.trim()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("__NEXT_DATA__ is not valid JSON: {}", e);
            None
        }
    }
}

/// Walks a key path through nested objects
pub fn value_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// Renders a JSON scalar as a cell value
///
/// Strings are trimmed, numbers and booleans are printed; null, arrays,
/// objects and blank strings count as absent.
pub fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
