//! Response body matching for HTTP probes and smoke tests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Expected-response matcher for an HTTP smoke test.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum BodyMatcher {
    /// Any body is accepted.
    #[default]
    Any,
    /// Body parses as JSON equal to `value`.
    JsonEquals { value: Value },
    /// The JSON value at `pointer` (RFC 6901) equals `equals`.
    JsonPointer { pointer: String, equals: Value },
    /// Body contains `text`.
    Contains { text: String },
}

impl BodyMatcher {
    /// Check `body`, returning a mismatch description on failure.
    pub fn check(&self, body: &str) -> Result<(), String> {
        match self {
            BodyMatcher::Any => Ok(()),
            BodyMatcher::Contains { text } => {
                if body.contains(text.as_str()) {
                    Ok(())
                } else {
                    Err(format!("body does not contain '{}'", text))
                }
            }
            BodyMatcher::JsonEquals { value } => {
                let actual = parse_json(body)?;
                if &actual == value {
                    Ok(())
                } else {
                    Err(format!("expected {}, got {}", value, actual))
                }
            }
            BodyMatcher::JsonPointer { pointer, equals } => {
                let actual = parse_json(body)?;
                match actual.pointer(pointer) {
                    Some(found) if found == equals => Ok(()),
                    Some(found) => Err(format!("{}: expected {}, got {}", pointer, equals, found)),
                    None => Err(format!("{}: not present in {}", pointer, actual)),
                }
            }
        }
    }
}

fn parse_json(body: &str) -> Result<Value, String> {
    serde_json::from_str(body).map_err(|e| format!("body is not JSON ({}): {}", e, truncate(body)))
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(120) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// True when every field of `expected` appears in `actual` with the same value.
///
/// Objects match as subsets; everything else must be equal.
pub fn json_contains(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(actual), Value::Object(expected)) => expected
            .iter()
            .all(|(key, want)| actual.get(key).is_some_and(|got| json_contains(got, want))),
        _ => actual == expected,
    }
}
