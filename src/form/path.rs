//! Dot-path utilities
//!
//! Field names like `"address.city"` address nested structures. Rule maps
//! fold such names into nested rule groups once at collection time, and
//! submission payloads fold control values into a nested JSON tree once at
//! assembly time.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::validate::{RuleMap, RuleNode};

/// Fold dotted rule names without a matching control into nested groups.
///
/// A name that matches a registered control is left alone even when it
/// contains a dot; on collision, the folded tree wins.
pub fn collect_rules(rules: RuleMap, has_control: impl Fn(&str) -> bool) -> RuleMap {
    let mut flat = RuleMap::new();
    let mut folded = RuleMap::new();

    for (name, node) in rules {
        if !has_control(&name) && name.contains('.') {
            insert_rule_path(&mut folded, &name, node);
        } else {
            flat.insert(name, node);
        }
    }

    for (name, node) in folded {
        flat.insert(name, node);
    }
    flat
}

fn insert_rule_path(map: &mut RuleMap, path: &str, node: RuleNode) {
    let mut parts: Vec<&str> = path.split('.').collect();
    let Some(last) = parts.pop() else { return };

    let mut current = map;
    for part in parts {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| RuleNode::Group(HashMap::new()));
        if !matches!(entry, RuleNode::Group(_)) {
            *entry = RuleNode::Group(HashMap::new());
        }
        let RuleNode::Group(group) = entry else { return };
        current = group;
    }
    current.insert(last.to_string(), node);
}

/// Fold a flat `name → value` map into a nested JSON tree along dots.
pub fn nest_params(flat: &Map<String, Value>) -> Value {
    let mut root = Map::new();
    for (name, value) in flat {
        insert_value_path(&mut root, name, value.clone());
    }
    Value::Object(root)
}

fn insert_value_path(map: &mut Map<String, Value>, path: &str, value: Value) {
    let mut parts: Vec<&str> = path.split('.').collect();
    let Some(last) = parts.pop() else { return };

    let mut current = map;
    for part in parts {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Some(object) = entry.as_object_mut() else {
            return;
        };
        current = object;
    }
    current.insert(last.to_string(), value);
}
