//! Media handle extraction from byte-upload responses.
//!
//! The upload endpoint has been observed to return the handle under
//! different keys. Each shape is an explicit strategy, tried in order;
//! the first non-empty string wins.

use serde_json::Value;

type HandleStrategy = fn(&Value) -> Option<&str>;

/// Named extraction strategies in priority order.
const HANDLE_STRATEGIES: &[(&str, HandleStrategy)] = &[
    ("h", top_level_h),
    ("handle", top_level_handle),
    ("data[0].h|handle", first_data_item),
    ("data.h|handle", data_object),
];

/// Return the media handle from an upload response body, if any shape matches.
pub fn extract_handle(body: &Value) -> Option<String> {
    HANDLE_STRATEGIES.iter().find_map(|(name, strategy)| {
        let handle = strategy(body)?;
        tracing::debug!(strategy = *name, "Extracted media handle");
        Some(handle.to_string())
    })
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn top_level_h(body: &Value) -> Option<&str> {
    non_empty_str(body, "h")
}

fn top_level_handle(body: &Value) -> Option<&str> {
    non_empty_str(body, "handle")
}

fn first_data_item(body: &Value) -> Option<&str> {
    let item = body.get("data")?.as_array()?.first()?;
    non_empty_str(item, "h").or_else(|| non_empty_str(item, "handle"))
}

fn data_object(body: &Value) -> Option<&str> {
    let data = body.get("data").filter(|d| d.is_object())?;
    non_empty_str(data, "h").or_else(|| non_empty_str(data, "handle"))
}
