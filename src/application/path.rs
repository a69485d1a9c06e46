// Path-addressed partial mutation over JSON documents
//
// Paths use dotted/bracket syntax (`data.series[0].name`), with an
// optional leading `$.`. Mutations never edit in place; `apply` works
// on a deep clone and returns the new document.
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PathError {
    #[error("Path \"{0}\" not found")]
    NotFound(String),
    #[error("Path \"{0}\" is not an array. Cannot {1}.")]
    NotAnArray(String, &'static str),
    #[error("Path \"{0}\" is not an object or array. Cannot merge.")]
    NotMergeable(String),
    #[error("Array index {1} out of range at \"{0}\"")]
    IndexOutOfRange(String, usize),
}

#[derive(Debug, Clone)]
pub enum PathOp {
    /// Replace the value at the path, creating missing object keys on
    /// the way down. Array indexes are never fabricated.
    Set { value: Value },
    /// Append to the array at the path. A list of items appends each
    /// element; anything else appends as a single element.
    Push { items: Value },
    /// Remove/insert at an index, with JS-style clamping of `start`
    /// and `delete_count`.
    Splice {
        start: usize,
        delete_count: usize,
        items: Vec<Value>,
    },
    /// Shallow-merge an object, or concatenate when the target is an
    /// array.
    Merge { value: Value },
}

fn segments(path: &str) -> Vec<String> {
    let clean = path
        .strip_prefix("$.")
        .or_else(|| path.strip_prefix('$'))
        .unwrap_or(path);
    clean
        .split(['.', '[', ']'])
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect()
}

/// Read the value at a path, or None when any step is missing.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for part in segments(path) {
        current = match current {
            Value::Array(items) => {
                let index: usize = part.parse().ok()?;
                items.get(index)?
            }
            Value::Object(map) => map.get(&part)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Apply one mutation and return the resulting document. The source
/// document is never modified.
pub fn apply(root: &Value, path: &str, op: PathOp) -> Result<Value, PathError> {
    match op {
        PathOp::Set { value } => set_at(root, path, value),
        PathOp::Push { items } => {
            let target = resolve(root, path)
                .ok_or_else(|| PathError::NotFound(path.to_string()))?;
            let Value::Array(existing) = target else {
                return Err(PathError::NotAnArray(path.to_string(), "push"));
            };
            let mut next = existing.clone();
            match items {
                Value::Array(list) => next.extend(list),
                single => next.push(single),
            }
            set_at(root, path, Value::Array(next))
        }
        PathOp::Splice {
            start,
            delete_count,
            items,
        } => {
            let target = resolve(root, path)
                .ok_or_else(|| PathError::NotFound(path.to_string()))?;
            let Value::Array(existing) = target else {
                return Err(PathError::NotAnArray(path.to_string(), "splice"));
            };
            let mut next = existing.clone();
            let start = start.min(next.len());
            let end = (start + delete_count).min(next.len());
            next.splice(start..end, items);
            set_at(root, path, Value::Array(next))
        }
        PathOp::Merge { value } => {
            let target = resolve(root, path)
                .ok_or_else(|| PathError::NotFound(path.to_string()))?;
            let merged = match target {
                Value::Array(existing) => {
                    let mut next = existing.clone();
                    if let Value::Array(list) = value {
                        next.extend(list);
                    }
                    Value::Array(next)
                }
                Value::Object(existing) => {
                    let mut next = existing.clone();
                    if let Value::Object(updates) = value {
                        for (k, v) in updates {
                            next.insert(k, v);
                        }
                    }
                    Value::Object(next)
                }
                _ => return Err(PathError::NotMergeable(path.to_string())),
            };
            set_at(root, path, merged)
        }
    }
}

fn set_at(root: &Value, path: &str, value: Value) -> Result<Value, PathError> {
    let parts = segments(path);
    if parts.is_empty() {
        return Ok(value);
    }
    let mut result = root.clone();
    set_recursive(&mut result, path, &parts, value)?;
    Ok(result)
}

fn set_recursive(
    current: &mut Value,
    path: &str,
    parts: &[String],
    value: Value,
) -> Result<(), PathError> {
    let part = &parts[0];
    let last = parts.len() == 1;

    match current {
        Value::Array(items) => {
            let index: usize = part
                .parse()
                .map_err(|_| PathError::NotFound(path.to_string()))?;
            if index >= items.len() {
                return Err(PathError::IndexOutOfRange(path.to_string(), index));
            }
            if last {
                items[index] = value;
                Ok(())
            } else {
                set_recursive(&mut items[index], path, &parts[1..], value)
            }
        }
        Value::Object(map) => {
            if last {
                map.insert(part.clone(), value);
                Ok(())
            } else {
                let child = map.entry(part.clone()).or_insert(Value::Object(Map::new()));
                set_recursive(child, path, &parts[1..], value)
            }
        }
        _ => Err(PathError::NotFound(path.to_string())),
    }
}
