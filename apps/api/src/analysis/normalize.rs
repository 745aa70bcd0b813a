//! Lenient field deserializers for model output.
//!
//! Model JSON is never trusted to match the requested shape. Every field of
//! an analysis type is read through one of these helpers together with
//! `#[serde(default)]`, so a missing, `null` or mistyped field degrades to an
//! empty value instead of failing the whole response.

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

/// Array field: non-arrays become `[]`, elements that don't fit `T` are dropped.
pub fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// String field: numbers and booleans are stringified, anything else is `""`.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(scalar_to_string).unwrap_or_default())
}

/// Optional string field: blank strings become `None`.
pub fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(scalar_to_string))
}

/// Score field on a 0–100 scale. Accepts numbers or numeric strings
/// ("85", "85%"), rounds, and clamps. Anything else is 0.
pub fn lenient_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(raw
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(0))
}

fn scalar_to_string(value: Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Keeps at most `max` items.
pub fn truncate<T>(mut items: Vec<T>, max: usize) -> Vec<T> {
    items.truncate(max);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_vec")]
        items: Vec<String>,
        #[serde(default, deserialize_with = "lenient_string")]
        name: String,
        #[serde(default, deserialize_with = "lenient_opt_string")]
        email: Option<String>,
        #[serde(default, deserialize_with = "lenient_score")]
        score: u8,
    }

    fn decode(value: Value) -> Sample {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_fields_become_empty() {
        let p = decode(json!({}));
        assert!(p.items.is_empty());
        assert_eq!(p.name, "");
        assert!(p.email.is_none());
        assert_eq!(p.score, 0);
    }

    #[test]
    fn test_null_and_wrong_types_become_empty() {
        let p = decode(json!({"items": null, "name": null, "email": {"x": 1}, "score": null}));
        assert!(p.items.is_empty());
        assert_eq!(p.name, "");
        assert!(p.email.is_none());
        assert_eq!(p.score, 0);

        let p = decode(json!({"items": "Rust, Go", "score": [1]}));
        assert!(p.items.is_empty());
        assert_eq!(p.score, 0);
    }

    #[test]
    fn test_mistyped_elements_are_dropped() {
        let p = decode(json!({"items": ["Rust", 3, null, "Go", {"a": 1}]}));
        assert_eq!(p.items, vec!["Rust", "Go"]);
    }

    #[test]
    fn test_scores_are_coerced_and_clamped() {
        assert_eq!(decode(json!({"score": 87.6})).score, 88);
        assert_eq!(decode(json!({"score": "72"})).score, 72);
        assert_eq!(decode(json!({"score": "64%"})).score, 64);
        assert_eq!(decode(json!({"score": 140})).score, 100);
        assert_eq!(decode(json!({"score": -5})).score, 0);
        assert_eq!(decode(json!({"score": "high"})).score, 0);
    }

    #[test]
    fn test_blank_optional_string_is_none() {
        assert!(decode(json!({"email": "   "})).email.is_none());
        assert_eq!(
            decode(json!({"email": " a@b.co "})).email.as_deref(),
            Some("a@b.co")
        );
        assert_eq!(decode(json!({"name": 42})).name, "42");
    }

    #[test]
    fn test_truncate_keeps_prefix() {
        assert_eq!(truncate(vec![1, 2, 3, 4], 2), vec![1, 2]);
        assert_eq!(truncate(vec![1], 5), vec![1]);
    }
}
