//! Declarative field validation
//!
//! Rules are data, fetched alongside the form or set programmatically:
//! a field maps to a list of rules, or to a nested group when its value is
//! structured. The first failing rule sets the control's error message and
//! stops that field's remaining rules; other fields still run.

use std::collections::HashMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::FieldControl;

/// Named built-in patterns usable as a `regexp` rule's `rule` value.
static BUILTIN_PATTERNS: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    let arr: Vec<(&str, &str)> = vec![
        (
            "email",
            r"^[_\w-]+(\.[_\w-]+)*@([\w-])+(\.[\w-]+)*((\.[\w]{2,})|(\.[\w]{2,}\.[\w]{2,}))$",
        ),
        ("url", r"^[^.]+(\.[^.]+)+$"),
        ("zipCode", r"^\d{6}$"),
        ("mobilePhone", r"^1\d{10}$"),
    ];
    arr.into_iter()
        .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (name, re)))
        .collect()
});

const DEFAULT_ERROR_MSG: &str = "Invalid value";

/// One validation rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Rule {
    /// String length bounds (counted in characters).
    Len {
        #[serde(default)]
        min: Option<u64>,
        #[serde(default)]
        max: Option<u64>,
        #[serde(default)]
        msg: Option<String>,
    },
    /// Numeric range bounds.
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        #[serde(default)]
        msg: Option<String>,
    },
    /// Regex match; `rule` is a built-in pattern name or a raw pattern.
    Regexp {
        rule: String,
        #[serde(default)]
        msg: Option<String>,
    },
    /// Date string bounds, `YYYY-MM-DD` or `YYYY/MM/DD`.
    Date {
        #[serde(default)]
        min: Option<String>,
        #[serde(default)]
        max: Option<String>,
        #[serde(default)]
        msg: Option<String>,
    },
}

impl Rule {
    fn msg(&self) -> &str {
        let msg = match self {
            Rule::Len { msg, .. }
            | Rule::Range { msg, .. }
            | Rule::Regexp { msg, .. }
            | Rule::Date { msg, .. } => msg,
        };
        msg.as_deref().unwrap_or(DEFAULT_ERROR_MSG)
    }
}

/// Rules for one field: a flat list, or a group keyed by sub-field for
/// structured values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleNode {
    Rules(Vec<Rule>),
    Group(HashMap<String, RuleNode>),
}

/// Field name → rules for the whole form.
pub type RuleMap = HashMap<String, RuleNode>;

/// Run a field's rules against its control.
///
/// Clears any prior error first; a failing rule sets the control's error to
/// the rule's message.
pub fn validate_control(control: &dyn FieldControl, node: &RuleNode) -> bool {
    control.set_error(None);
    let value = control.get_value();
    validate_value(control, &value, node)
}

fn validate_value(control: &dyn FieldControl, value: &Value, node: &RuleNode) -> bool {
    match node {
        RuleNode::Group(group) => group.iter().all(|(key, child)| {
            let sub_value = value.get(key).cloned().unwrap_or(Value::Null);
            validate_value(control, &sub_value, child)
        }),
        RuleNode::Rules(rules) => {
            for rule in rules {
                if !check(value, rule) {
                    control.set_error(Some(rule.msg()));
                    return false;
                }
            }
            true
        }
    }
}

fn check(value: &Value, rule: &Rule) -> bool {
    match rule {
        Rule::Len { min, max, .. } => {
            let len = value_as_string(value).chars().count() as u64;
            min.map_or(true, |m| len >= m) && max.map_or(true, |m| len <= m)
        }
        Rule::Range { min, max, .. } => match value_as_f64(value) {
            Some(v) => min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m),
            None => false,
        },
        Rule::Regexp { rule, .. } => {
            let text = value_as_string(value);
            match BUILTIN_PATTERNS.get(rule.as_str()) {
                Some(re) => re.is_match(&text),
                None => match Regex::new(rule) {
                    Ok(re) => re.is_match(&text),
                    Err(err) => {
                        log::warn!("Invalid regexp rule {rule:?}: {err}");
                        false
                    }
                },
            }
        }
        Rule::Date { min, max, .. } => match parse_date(&value_as_string(value)) {
            Some(date) => {
                min.as_deref().and_then(parse_date_ref).map_or(true, |m| date >= m)
                    && max.as_deref().and_then(parse_date_ref).map_or(true, |m| date <= m)
            }
            None => false,
        },
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y/%m/%d"))
        .ok()
}

fn parse_date_ref(text: &str) -> Option<NaiveDate> {
    parse_date(text)
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::test_support::TestControl;
    use serde_json::json;

    fn rules(json: Value) -> RuleNode {
        serde_json::from_value(json).expect("rule json")
    }

    #[test]
    fn test_len_rule_bounds() {
        let control = TestControl::new("name", json!("abc"));
        assert!(validate_control(
            &control,
            &rules(json!([{"type": "len", "min": 2, "max": 5}])),
        ));
        assert!(!validate_control(
            &control,
            &rules(json!([{"type": "len", "min": 4, "msg": "too short"}])),
        ));
        assert_eq!(control.error(), Some("too short".to_string()));
    }

    #[test]
    fn test_range_rule_accepts_numeric_strings() {
        let control = TestControl::new("age", json!("30"));
        assert!(validate_control(
            &control,
            &rules(json!([{"type": "range", "min": 18, "max": 99}])),
        ));

        let control = TestControl::new("age", json!(12));
        assert!(!validate_control(
            &control,
            &rules(json!([{"type": "range", "min": 18}])),
        ));
    }

    #[test]
    fn test_regexp_builtin_and_custom() {
        let control = TestControl::new("email", json!("a.b@example.com"));
        assert!(validate_control(
            &control,
            &rules(json!([{"type": "regexp", "rule": "email"}])),
        ));

        let control = TestControl::new("code", json!("AB-12"));
        assert!(validate_control(
            &control,
            &rules(json!([{"type": "regexp", "rule": "^[A-Z]{2}-\\d{2}$"}])),
        ));
        assert!(!validate_control(
            &control,
            &rules(json!([{"type": "regexp", "rule": "zipCode", "msg": "bad zip"}])),
        ));
        assert_eq!(control.error(), Some("bad zip".to_string()));
    }

    #[test]
    fn test_date_rule_bounds() {
        let control = TestControl::new("from", json!("2024-06-01"));
        assert!(validate_control(
            &control,
            &rules(json!([{"type": "date", "min": "2024-01-01", "max": "2024-12-31"}])),
        ));
        assert!(!validate_control(
            &control,
            &rules(json!([{"type": "date", "min": "2025-01-01"}])),
        ));
    }

    #[test]
    fn test_first_failing_rule_wins() {
        let control = TestControl::new("name", json!(""));
        let node = rules(json!([
            {"type": "len", "min": 1, "msg": "required"},
            {"type": "regexp", "rule": "email", "msg": "bad email"}
        ]));
        assert!(!validate_control(&control, &node));
        assert_eq!(control.error(), Some("required".to_string()));
    }

    #[test]
    fn test_group_rules_follow_structured_value() {
        let control = TestControl::new(
            "address",
            json!({"city": "berlin", "zip": "12345"}),
        );
        let node = rules(json!({
            "city": [{"type": "len", "min": 1}],
            "zip": [{"type": "regexp", "rule": "zipCode", "msg": "bad zip"}]
        }));
        assert!(!validate_control(&control, &node));
        assert_eq!(control.error(), Some("bad zip".to_string()));
    }

    #[test]
    fn test_validation_clears_stale_error() {
        let control = TestControl::new("name", json!("ok"));
        control.set_error(Some("old error"));
        assert!(validate_control(
            &control,
            &rules(json!([{"type": "len", "min": 1}])),
        ));
        assert_eq!(control.error(), None);
    }
}
