use std::cmp::Ordering;
use weftcore::{NodeError, Value};

/// Evaluate a comparison operator shared by the condition and filter
/// nodes. Ordering operators apply to two numbers or two strings;
/// anything else compares as not-ordered and yields `false`.
pub(crate) fn compare(
    operator: &str,
    value: &Value,
    comparison: &Value,
) -> Result<bool, NodeError> {
    let result = match operator {
        "equals" => value == comparison,
        "not_equals" => value != comparison,
        "greater_than" => ordering(value, comparison) == Some(Ordering::Greater),
        "less_than" => ordering(value, comparison) == Some(Ordering::Less),
        "greater_than_or_equal" => matches!(
            ordering(value, comparison),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        "less_than_or_equal" => matches!(
            ordering(value, comparison),
            Some(Ordering::Less | Ordering::Equal)
        ),
        "contains" => contains(value, comparison),
        other => {
            return Err(NodeError::Configuration(format!(
                "Unknown operator: {}",
                other
            )))
        }
    };
    Ok(result)
}

fn ordering(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Strings contain substrings, arrays contain elements, objects contain
/// keys.
fn contains(value: &Value, comparison: &Value) -> bool {
    match value {
        Value::String(s) => s.contains(&comparison.to_string()),
        Value::Array(items) => items.contains(comparison),
        Value::Object(map) => comparison
            .as_str()
            .map(|key| map.contains_key(key))
            .unwrap_or(false),
        _ => false,
    }
}
