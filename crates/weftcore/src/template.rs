//! Template interpolation for node inputs.
//!
//! One scanning primitive behind two entry points with deliberately
//! different missing-path behavior:
//!
//! - [`interpolate_value`] — deep object interpolation. `${{ path }}`
//!   placeholders are resolved recursively through arrays and objects;
//!   an unresolvable path leaves the placeholder literal in place.
//! - [`interpolate_string`] — flat string interpolation. `{{ path }}`
//!   placeholders in a single string; an unresolvable path substitutes
//!   the empty string.

use crate::value::{Value, ValueMap};

#[derive(Clone, Copy)]
enum Grammar {
    /// `${{ path }}`; missing path keeps the literal placeholder.
    Deep,
    /// `{{ path }}`; missing path becomes the empty string.
    Flat,
}

impl Grammar {
    fn open(self) -> &'static str {
        match self {
            Grammar::Deep => "${{",
            Grammar::Flat => "{{",
        }
    }
}

/// Walk a `.`-separated path through the context. Only object keys are
/// addressable; an array or scalar mid-path resolves to nothing.
fn resolve_path<'a>(context: &'a ValueMap, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = context.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn expand(input: &str, grammar: Grammar, context: &ValueMap) -> String {
    let open = grammar.open();
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find(open) {
        out.push_str(&rest[..start]);
        let after = &rest[start + open.len()..];
        let Some(end) = after.find("}}") else {
            // Unterminated placeholder: copy the tail through verbatim.
            out.push_str(&rest[start..]);
            return out;
        };
        let path = after[..end].trim();
        match resolve_path(context, path) {
            // Flat maps a null leaf to "", mirroring the `?? ""` fallback
            // of the substring-replacement mode it reimplements.
            Some(Value::Null) if matches!(grammar, Grammar::Flat) => {}
            Some(value) => out.push_str(&value.to_string()),
            None => {
                if let Grammar::Deep = grammar {
                    out.push_str(&rest[start..start + open.len() + end + 2]);
                }
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// Deep object interpolation: returns a structurally identical value with
/// every `${{ path }}` placeholder resolved against `context`. Does not
/// mutate its input; strings stay strings.
pub fn interpolate_value(value: &Value, context: &ValueMap) -> Value {
    match value {
        Value::String(s) => Value::String(expand(s, Grammar::Deep, context)),
        Value::Array(items) => Value::Array(
            items.iter().map(|item| interpolate_value(item, context)).collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, val)| (key.clone(), interpolate_value(val, context)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Interpolate every value in a map, using the map itself (or any other
/// context) for path resolution.
pub fn interpolate_map(values: &ValueMap, context: &ValueMap) -> ValueMap {
    values
        .iter()
        .map(|(key, val)| (key.clone(), interpolate_value(val, context)))
        .collect()
}

/// Flat string interpolation: substitutes `{{ path }}` placeholders,
/// replacing unresolvable paths with the empty string.
pub fn interpolate_string(template: &str, context: &ValueMap) -> String {
    expand(template, Grammar::Flat, context)
}
