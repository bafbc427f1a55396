//! Leaf-path helpers over nested JSON state trees.

use serde_json::{Map, Value};

/// A path of object keys from the root to a leaf.
pub type LeafPath = Vec<String>;

/// Every path that ends on a leaf, depth-first in key order.
///
/// A node is a leaf unless it is a non-empty object. Empty objects
/// contribute nothing; arrays and `null` are leaves.
pub fn leaf_paths(root: &Value) -> Vec<LeafPath> {
    let mut paths = Vec::new();
    if let Value::Object(map) = root {
        collect(map, &mut Vec::new(), &mut paths);
    }
    paths
}

fn collect(map: &Map<String, Value>, prefix: &mut LeafPath, out: &mut Vec<LeafPath>) {
    for (key, value) in map {
        prefix.push(key.clone());
        match value {
            Value::Object(child) => collect(child, prefix, out),
            _ => out.push(prefix.clone()),
        }
        prefix.pop();
    }
}

/// Value at `path`, if every intermediate level is an object.
pub fn get_path<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| node.get(key))
}

/// Write `value` at `path`, creating (or replacing non-object) intermediate
/// levels. Siblings along the path are untouched.
pub fn set_path(root: &mut Value, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        *root = value;
        return;
    };
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    if let Value::Object(map) = root {
        let child = map.entry(first.clone()).or_insert(Value::Null);
        set_path(child, rest, value);
    }
}

/// Tree with every path in `paths` set to `null`.
pub fn echo_nulls(paths: &[LeafPath]) -> Value {
    let mut echo = Value::Object(Map::new());
    for path in paths {
        set_path(&mut echo, path, Value::Null);
    }
    echo
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(keys: &[&str]) -> LeafPath {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn flat_object_paths() {
        let paths = leaf_paths(&json!({"a": 1, "b": "2", "c": null}));
        assert_eq!(paths, vec![p(&["a"]), p(&["b"]), p(&["c"])]);
    }

    #[test]
    fn nested_object_single_path() {
        assert_eq!(leaf_paths(&json!({"a": {"b": {"c": 1}}})), vec![p(&["a", "b", "c"])]);
    }

    #[test]
    fn empty_object_contributes_nothing() {
        assert!(leaf_paths(&json!({"d": {}})).is_empty());
        assert_eq!(leaf_paths(&json!({"d": {}, "e": 1})), vec![p(&["e"])]);
    }

    #[test]
    fn arrays_are_leaves() {
        assert_eq!(leaf_paths(&json!({"a": [1, {"b": 2}]})), vec![p(&["a"])]);
    }

    #[test]
    fn scalar_root_has_no_paths() {
        assert!(leaf_paths(&json!(5)).is_empty());
    }

    #[test]
    fn set_path_keeps_siblings() {
        let mut state = json!({"fan": {"5": {"power": true, "isForward": true}}});
        set_path(&mut state, &p(&["fan", "5", "power"]), json!(false));
        assert_eq!(state, json!({"fan": {"5": {"power": false, "isForward": true}}}));
    }

    #[test]
    fn set_path_creates_levels() {
        let mut state = json!({"fan": 3});
        set_path(&mut state, &p(&["fan", "9", "power"]), json!(true));
        assert_eq!(state, json!({"fan": {"9": {"power": true}}}));
    }

    #[test]
    fn get_path_walks_objects() {
        let state = json!({"fan": {"5": {"power": true}}});
        assert_eq!(get_path(&state, &p(&["fan", "5", "power"])), Some(&json!(true)));
        assert_eq!(get_path(&state, &p(&["fan", "6", "power"])), None);
    }

    #[test]
    fn echo_nulls_mirrors_paths() {
        let echo = echo_nulls(&[p(&["fan", "5", "commandedSpeedPercent"]), p(&["autoIdealTemperature"])]);
        assert_eq!(
            echo,
            json!({"fan": {"5": {"commandedSpeedPercent": null}}, "autoIdealTemperature": null})
        );
    }
}
