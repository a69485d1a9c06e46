// Heuristic reshaping of arbitrary tabular data into a canonical
// chart option. Total (never panics for any input) and idempotent:
// already-canonical options pass through unchanged. Only chart data
// goes through here; table and stat-card payloads are never reshaped.
use serde_json::{Value, json};

pub fn normalize(value: Value) -> Value {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Value::Null;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(parsed) => normalize(parsed),
                Err(_) => Value::String(text),
            }
        }
        Value::Object(map) => {
            if is_canonical(&map) {
                return Value::Object(map);
            }
            if let (Some(Value::Array(labels)), Some(Value::Array(datasets))) =
                (map.get("labels"), map.get("datasets"))
            {
                return from_labeled_datasets(labels, datasets);
            }
            Value::Object(map)
        }
        Value::Array(items) => normalize_array(items),
        other => other,
    }
}

fn is_canonical(map: &serde_json::Map<String, Value>) -> bool {
    map.contains_key("series")
        || map.contains_key("xAxis")
        || map.contains_key("yAxis")
        || map
            .get("dataset")
            .and_then(|d| d.get("source"))
            .is_some()
}

/// Chart.js-style `{labels, datasets}` input: one bar series per
/// dataset, categorical x axis over the labels.
fn from_labeled_datasets(labels: &[Value], datasets: &[Value]) -> Value {
    let series: Vec<Value> = datasets
        .iter()
        .map(|ds| {
            let name = ds
                .get("label")
                .and_then(Value::as_str)
                .unwrap_or("Series");
            let data = match ds.get("data") {
                Some(Value::Array(points)) => Value::Array(points.clone()),
                _ => json!([]),
            };
            json!({"name": name, "type": "bar", "data": data})
        })
        .collect();
    let names: Vec<Value> = series.iter().map(|s| s["name"].clone()).collect();

    json!({
        "tooltip": {"trigger": "axis"},
        "legend": {"data": names},
        "xAxis": {"type": "category", "data": labels},
        "yAxis": {"type": "value"},
        "series": series,
    })
}

fn normalize_array(items: Vec<Value>) -> Value {
    let Some(first) = items.first() else {
        // Explicit empty-chart skeleton rather than a bare []
        return json!({
            "xAxis": {"type": "category", "data": []},
            "yAxis": {"type": "value"},
            "series": [{"type": "bar", "data": []}],
        });
    };

    if first.is_number() {
        let categories: Vec<String> = (1..=items.len()).map(|i| i.to_string()).collect();
        return json!({
            "tooltip": {"trigger": "axis"},
            "xAxis": {"type": "category", "data": categories},
            "yAxis": {"type": "value"},
            "series": [{"name": "Series 1", "type": "bar", "data": items}],
        });
    }

    if let Value::Array(pair) = first
        && pair.len() >= 2
        && pair[0].is_number()
        && pair[1].is_number()
    {
        return json!({
            "tooltip": {"trigger": "axis"},
            "xAxis": {"type": "value"},
            "yAxis": {"type": "value"},
            "series": [{"name": "Series 1", "type": "line", "data": items}],
        });
    }

    if let Value::Object(first_map) = first {
        return from_object_rows(&items, first_map);
    }

    Value::Array(items)
}

/// Rows of objects: numeric-valued keys of the first row become one
/// bar series each; the first string-valued key (or failing that the
/// first non-numeric key) is the category axis.
fn from_object_rows(rows: &[Value], first: &serde_json::Map<String, Value>) -> Value {
    let numeric_keys: Vec<&String> = first
        .iter()
        .filter(|(_, v)| v.is_number())
        .map(|(k, _)| k)
        .collect();
    let category_key = first
        .iter()
        .find(|(_, v)| v.is_string())
        .or_else(|| first.iter().find(|(_, v)| !v.is_number()))
        .map(|(k, _)| k);

    let x_data: Vec<Value> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| match category_key.and_then(|k| row.get(k)) {
            Some(v) if !v.is_null() => v.clone(),
            _ => Value::String((i + 1).to_string()),
        })
        .collect();

    let series_keys: Vec<&String> = if numeric_keys.is_empty() {
        first
            .keys()
            .filter(|k| Some(*k) != category_key)
            .take(1)
            .collect()
    } else {
        numeric_keys
    };

    let series: Vec<Value> = series_keys
        .iter()
        .map(|key| {
            let data: Vec<Value> = rows
                .iter()
                .map(|row| row.get(key.as_str()).cloned().unwrap_or(Value::Null))
                .collect();
            json!({"name": key, "type": "bar", "data": data})
        })
        .collect();
    let names: Vec<Value> = series.iter().map(|s| s["name"].clone()).collect();

    json!({
        "tooltip": {"trigger": "axis"},
        "legend": {"data": names},
        "xAxis": {"type": "category", "data": x_data},
        "yAxis": {"type": "value"},
        "series": series,
    })
}
