//! Argument extraction and response formatting shared by the tools.

use super::{Arguments, ToolError};
use serde::Serialize;
use serde_json::{Value, json};

/// Bytes kept at the very least when a response is truncated.
const MIN_TRUNCATED_SIZE: usize = 1000;
/// Bytes reserved for the truncation warning.
const WARNING_RESERVE: usize = 500;

/// A non-empty string argument.
pub fn string_arg(args: &Arguments, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A required non-empty string argument.
pub fn require_string_arg(args: &Arguments, key: &str) -> Result<String, ToolError> {
    string_arg(args, key).ok_or_else(|| {
        ToolError::InvalidArgument(format!(
            "{} parameter is required and must be a non-empty string. Received parameters: {}",
            key,
            Value::Object(args.clone())
        ))
    })
}

/// An integer argument. JSON numbers with a fraction are truncated.
pub fn int_arg(args: &Arguments, key: &str, default: i64) -> i64 {
    match args.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        _ => default,
    }
}

pub fn bool_arg(args: &Arguments, key: &str) -> Option<bool> {
    args.get(key).and_then(Value::as_bool)
}

/// The string elements of an array argument; other elements are skipped.
pub fn string_array_arg(args: &Arguments, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Indented JSON for single objects.
pub fn format_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, ToolError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Compact JSON, truncated with a warning once it exceeds `max_size` bytes.
///
/// A truncated result is cut at the last comma before the limit and has the
/// warning fields (`_warning`, `_reason`, `_original_size`,
/// `_truncated_size`, `_suggestion`) appended so the caller knows to narrow
/// the query.
pub fn format_json_response<T: Serialize + ?Sized>(
    value: &T,
    max_size: usize,
) -> Result<String, ToolError> {
    let json = serde_json::to_string(value)?;
    if json.len() <= max_size {
        return Ok(json);
    }
    Ok(truncate_response(&json, max_size))
}

fn truncate_response(json: &str, max_size: usize) -> String {
    let mut cut = max_size
        .saturating_sub(WARNING_RESERVE)
        .max(MIN_TRUNCATED_SIZE)
        .min(json.len());
    while !json.is_char_boundary(cut) {
        cut -= 1;
    }

    let mut truncated = &json[..cut];
    if let Some(comma) = truncated.rfind(',')
        && comma > 0
    {
        truncated = &truncated[..comma];
    }

    let warning = json!({
        "_warning": "Response truncated",
        "_reason": format!(
            "Response size ({} bytes) exceeded limit ({} bytes)",
            json.len(),
            max_size
        ),
        "_original_size": json.len(),
        "_truncated_size": truncated.len(),
        "_suggestion": "Use more specific filters or reduce page_size to get smaller responses",
    })
    .to_string();

    let body = truncated
        .strip_suffix('}')
        .or_else(|| truncated.strip_suffix(']'))
        .unwrap_or(truncated);

    // The warning object loses its opening brace and continues the cut object.
    format!("{},{}", body, &warning[1..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_string_arg() {
        let args = args(json!({"a": "x", "b": "", "c": 3}));
        assert_eq!(string_arg(&args, "a").as_deref(), Some("x"));
        assert_eq!(string_arg(&args, "b"), None);
        assert_eq!(string_arg(&args, "c"), None);
        assert_eq!(string_arg(&args, "missing"), None);
    }

    #[test]
    fn test_require_string_arg_reports_received() {
        let args = args(json!({"id": 42}));
        let err = require_string_arg(&args, "incident_id").unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("incident_id parameter is required"));
        assert!(message.contains(r#"{"id":42}"#));
    }

    #[test]
    fn test_int_arg() {
        let args = args(json!({"n": 10, "f": 25.0, "s": "7"}));
        assert_eq!(int_arg(&args, "n", 1), 10);
        assert_eq!(int_arg(&args, "f", 1), 25);
        assert_eq!(int_arg(&args, "s", 1), 1);
        assert_eq!(int_arg(&args, "missing", 5), 5);
    }

    #[test]
    fn test_string_array_arg_skips_non_strings() {
        let args = args(json!({"status": ["active", 1, "triage"], "bad": "active"}));
        assert_eq!(string_array_arg(&args, "status"), vec!["active", "triage"]);
        assert!(string_array_arg(&args, "bad").is_empty());
    }

    #[test]
    fn test_small_response_untouched() {
        let out = format_json_response(&json!({"a": 1}), 1024).unwrap();
        assert_eq!(out, r#"{"a":1}"#);
    }

    #[test]
    fn test_large_response_truncated_with_warning() {
        let items: Vec<Value> = (0..500)
            .map(|i| json!({"id": i, "name": format!("incident number {}", i)}))
            .collect();
        let value = json!({"incidents": items});
        let original = serde_json::to_string(&value).unwrap();

        let out = format_json_response(&value, 2000).unwrap();

        assert!(out.len() < original.len());
        assert!(out.len() <= 2000);
        assert!(out.contains(r#""_warning":"Response truncated""#));
        assert!(out.contains(&format!(r#""_original_size":{}"#, original.len())));
        assert!(out.contains("exceeded limit (2000 bytes)"));
        assert!(out.ends_with('}'));
    }

    #[test]
    fn test_truncation_keeps_minimum_size() {
        let value = json!({"data": "x".repeat(5000), "more": [1, 2, 3]});
        let out = format_json_response(&value, 100).unwrap();

        // No comma before the 1000-byte floor, so the raw prefix is kept.
        assert!(out.starts_with(r#"{"data":"xxx"#));
        assert!(out.contains("_suggestion"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let value = json!({"data": "é".repeat(3000)});
        let out = format_json_response(&value, 1500).unwrap();
        assert!(out.contains("_warning"));
    }
}
