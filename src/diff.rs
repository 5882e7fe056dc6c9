use serde_json::{Map, Value};

/// A single leaf change: dotted path, old value, new value.
pub(crate) type Change = (String, Value, Value);

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Collects leaf-level differences between two vendor documents.
///
/// Arrays are compared element by element, so `RemoteZoneInfo[2].LiveTemp_oC`
/// shows up as `RemoteZoneInfo.2.LiveTemp_oC`. Keys that disappear are
/// reported with a `null` new value.
pub(crate) fn diff_json(previous: &Value, current: &Value, path_prefix: &str, changes: &mut Vec<Change>) {
    match (previous, current) {
        (Value::Object(prev_map), Value::Object(curr_map)) => {
            for (key, curr_val) in curr_map {
                let path = join(path_prefix, key);
                match prev_map.get(key) {
                    Some(prev_val) => diff_json(prev_val, curr_val, &path, changes),
                    None if curr_val.is_object() => {
                        diff_json(&Value::Object(Map::new()), curr_val, &path, changes);
                    }
                    None => changes.push((path, Value::Null, curr_val.clone())),
                }
            }
            for (key, prev_val) in prev_map {
                if !curr_map.contains_key(key) {
                    changes.push((join(path_prefix, key), prev_val.clone(), Value::Null));
                }
            }
        }
        (Value::Array(prev_arr), Value::Array(curr_arr)) => {
            let len = prev_arr.len().max(curr_arr.len());
            for idx in 0..len {
                let path = join(path_prefix, &idx.to_string());
                match (prev_arr.get(idx), curr_arr.get(idx)) {
                    (Some(p), Some(c)) => diff_json(p, c, &path, changes),
                    (None, Some(c)) => changes.push((path, Value::Null, c.clone())),
                    (Some(p), None) => changes.push((path, p.clone(), Value::Null)),
                    (None, None) => {}
                }
            }
        }
        (prev, curr) if prev != curr => {
            changes.push((path_prefix.to_string(), prev.clone(), curr.clone()));
        }
        _ => {}
    }
}
