//! Dotted property paths over the data model.
//!
//! `order.lines.0.sku` walks object members by name and array elements by
//! index. Writes never create members: the parent must resolve and the final
//! member must already exist.

use serde_json::Value;

use crate::errors::ArgumentError;

fn segments(path: &str) -> Result<Vec<&str>, ArgumentError> {
    let segments: Vec<&str> = path.split('.').map(str::trim).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(ArgumentError::PropertyNotFound {
            path: path.to_string(),
            reason: "empty path segment".into(),
        });
    }
    Ok(segments)
}

fn step<'a>(current: &'a Value, segment: &str) -> Option<&'a Value> {
    match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn step_mut<'a>(current: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match current {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

pub fn get<'a>(root: &'a Value, path: &str) -> Result<&'a Value, ArgumentError> {
    let mut current = root;
    for (depth, segment) in segments(path)?.into_iter().enumerate() {
        current = step(current, segment).ok_or_else(|| ArgumentError::PropertyNotFound {
            path: path.to_string(),
            reason: format!("no member '{segment}' at depth {depth}"),
        })?;
    }
    Ok(current)
}

pub fn set(root: &mut Value, path: &str, value: Value) -> Result<(), ArgumentError> {
    let segments = segments(path)?;
    let Some((last, parents)) = segments.split_last() else {
        return Err(ArgumentError::NotAssignable {
            path: path.to_string(),
            reason: "empty path".into(),
        });
    };

    let mut current = root;
    for segment in parents {
        current = step_mut(current, segment).ok_or_else(|| ArgumentError::PropertyNotFound {
            path: path.to_string(),
            reason: format!("no member '{segment}'"),
        })?;
    }

    let slot = step_mut(current, last).ok_or_else(|| ArgumentError::NotAssignable {
        path: path.to_string(),
        reason: format!("member '{last}' does not exist"),
    })?;
    *slot = value;
    Ok(())
}

/// Member names reachable one level below `value`, used for binding pickers.
pub fn member_names(value: &Value) -> Vec<String> {
    match value {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        _ => Vec::new(),
    }
}
