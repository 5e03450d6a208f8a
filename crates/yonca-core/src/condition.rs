//! Condition trees and their evaluation.
//!
//! Rule conditions are data, not code: a tree of AND/OR groups whose leaves
//! compare one context field against a literal value. Evaluation is total:
//! unknown operators and failed coercions evaluate to `false` instead of
//! raising.
//!
//! ```json
//! {
//!   "operator": "AND",
//!   "items": [
//!     { "field": "weather.temperature", "operator": ">", "value": 35 },
//!     { "operator": "OR", "items": [
//!       { "field": "crop_context.stage", "operator": "IN", "value": ["heading", "flowering"] },
//!       { "field": "soil.soil_moisture", "operator": "<", "value": 20 }
//!     ]}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::context::{Context, ContextValue};

/// Comparison operator of a leaf condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Contains,
    NotEmpty,
    Empty,
    /// Anything else; always evaluates to `false`.
    Unknown(String),
}

impl Operator {
    pub fn parse(value: &str) -> Self {
        match value {
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            "IN" => Operator::In,
            "NOT_IN" => Operator::NotIn,
            "CONTAINS" => Operator::Contains,
            "NOT_EMPTY" => Operator::NotEmpty,
            "EMPTY" => Operator::Empty,
            other => Operator::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
            Operator::Contains => "CONTAINS",
            Operator::NotEmpty => "NOT_EMPTY",
            Operator::Empty => "EMPTY",
            Operator::Unknown(other) => other,
        }
    }
}

impl From<String> for Operator {
    fn from(value: String) -> Self {
        Operator::parse(&value)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

/// Boolean combinator of a group condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GroupOperator {
    And,
    Or,
    /// Unrecognized combinator; evaluated with AND semantics.
    Unknown(String),
}

impl GroupOperator {
    pub fn parse(value: &str) -> Self {
        match value {
            "AND" => GroupOperator::And,
            "OR" => GroupOperator::Or,
            other => GroupOperator::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GroupOperator::And => "AND",
            GroupOperator::Or => "OR",
            GroupOperator::Unknown(other) => other,
        }
    }
}

impl From<String> for GroupOperator {
    fn from(value: String) -> Self {
        GroupOperator::parse(&value)
    }
}

impl From<GroupOperator> for String {
    fn from(op: GroupOperator) -> Self {
        op.as_str().to_string()
    }
}

/// A node of a condition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCondition", into = "RawCondition")]
pub enum Condition {
    /// Compare the context value at `field` against `value`.
    Leaf {
        field: String,
        operator: Operator,
        value: JsonValue,
    },
    /// Combine child conditions. Empty groups are vacuously true.
    Group {
        operator: GroupOperator,
        items: Vec<Condition>,
    },
}

/// Wire shape shared by leaves and groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    operator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Vec<Condition>>,
}

impl From<RawCondition> for Condition {
    fn from(raw: RawCondition) -> Self {
        // A node with `items` is a group; a node with `field` is a leaf.
        // `{}` and a bare `{"operator": "AND"|"OR"}` are empty groups.
        if let Some(items) = raw.items {
            return Condition::Group {
                operator: GroupOperator::parse(raw.operator.as_deref().unwrap_or("AND")),
                items,
            };
        }

        let is_bare_group = raw.field.is_none()
            && matches!(raw.operator.as_deref(), None | Some("AND") | Some("OR"));
        if is_bare_group {
            return Condition::Group {
                operator: GroupOperator::parse(raw.operator.as_deref().unwrap_or("AND")),
                items: Vec::new(),
            };
        }

        Condition::Leaf {
            field: raw.field.unwrap_or_default(),
            operator: Operator::parse(raw.operator.as_deref().unwrap_or("==")),
            value: raw.value.unwrap_or(JsonValue::Null),
        }
    }
}

impl From<Condition> for RawCondition {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Leaf { field, operator, value } => RawCondition {
                field: Some(field),
                operator: Some(operator.into()),
                value: Some(value),
                items: None,
            },
            Condition::Group { operator, items } => RawCondition {
                field: None,
                operator: Some(operator.into()),
                value: None,
                items: Some(items),
            },
        }
    }
}

impl Default for Condition {
    /// The empty AND group, which always passes.
    fn default() -> Self {
        Condition::all(Vec::new())
    }
}

impl Condition {
    /// Leaf condition `field <op> value`.
    pub fn leaf(field: impl Into<String>, operator: &str, value: impl Into<JsonValue>) -> Self {
        Condition::Leaf {
            field: field.into(),
            operator: Operator::parse(operator),
            value: value.into(),
        }
    }

    /// AND group.
    pub fn all(items: Vec<Condition>) -> Self {
        Condition::Group {
            operator: GroupOperator::And,
            items,
        }
    }

    /// OR group.
    pub fn any(items: Vec<Condition>) -> Self {
        Condition::Group {
            operator: GroupOperator::Or,
            items,
        }
    }

    /// Evaluate this tree against `ctx`.
    ///
    /// Children are visited left to right; AND and OR short-circuit.
    pub fn evaluate(&self, ctx: &Context) -> bool {
        match self {
            Condition::Group { items, .. } if items.is_empty() => true,
            Condition::Group { operator, items } => match operator {
                GroupOperator::Or => items.iter().any(|item| item.evaluate(ctx)),
                GroupOperator::And => items.iter().all(|item| item.evaluate(ctx)),
                GroupOperator::Unknown(name) => {
                    tracing::warn!(operator = %name, "Unknown group operator, using AND");
                    items.iter().all(|item| item.evaluate(ctx))
                }
            },
            Condition::Leaf { field, operator, value } => {
                let result = evaluate_leaf(field, operator, value, ctx);
                tracing::trace!(field = %field, operator = operator.as_str(), result, "Leaf evaluated");
                result
            }
        }
    }
}

/// Evaluate a condition tree against a context.
pub fn evaluate(condition: &Condition, ctx: &Context) -> bool {
    condition.evaluate(ctx)
}

fn evaluate_leaf(field: &str, operator: &Operator, expected: &JsonValue, ctx: &Context) -> bool {
    let actual = match ctx.get(field) {
        Some(actual) => actual,
        // Absent field: only EMPTY can match.
        None => return matches!(operator, Operator::Empty),
    };

    match operator {
        Operator::Eq => actual.equals_json(expected),
        Operator::Ne => !actual.equals_json(expected),
        Operator::Gt => compare_numbers(actual, expected, |a, b| a > b),
        Operator::Gte => compare_numbers(actual, expected, |a, b| a >= b),
        Operator::Lt => compare_numbers(actual, expected, |a, b| a < b),
        Operator::Lte => compare_numbers(actual, expected, |a, b| a <= b),
        Operator::In => match expected {
            JsonValue::Array(options) => options.iter().any(|o| actual.equals_json(o)),
            _ => false,
        },
        Operator::NotIn => match expected {
            JsonValue::Array(options) => !options.iter().any(|o| actual.equals_json(o)),
            _ => true,
        },
        Operator::Contains => match (actual, expected) {
            (ContextValue::List(_), JsonValue::Array(needles)) => {
                needles.iter().any(|n| actual.list_contains(n))
            }
            (ContextValue::List(_), needle) => actual.list_contains(needle),
            _ => false,
        },
        Operator::NotEmpty => actual.is_truthy(),
        Operator::Empty => !actual.is_truthy(),
        Operator::Unknown(name) => {
            tracing::warn!(field = %field, operator = %name, "Unknown condition operator");
            false
        }
    }
}

/// Compare both sides as `f64`; any failed coercion is `false`.
fn compare_numbers(actual: &ContextValue, expected: &JsonValue, cmp: fn(f64, f64) -> bool) -> bool {
    match (actual.as_f64(), json_as_f64(expected)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn json_as_f64(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> Context {
        Context::new()
            .with("weather.temperature", 40.0)
            .with("weather.humidity", 85)
            .with("weather.frost_warning", false)
            .with("crop_context.stage", "heading")
            .with("crop_context.previous_crop", "")
            .with("soil.soil_moisture", "18")
            .with("farm_components.crop_types", vec!["wheat", "barley"])
            .with("farm_components.livestock_types", Vec::<String>::new())
    }

    fn leaf(field: &str, op: &str, value: JsonValue) -> bool {
        Condition::leaf(field, op, value).evaluate(&ctx())
    }

    #[test]
    fn test_equality() {
        assert!(leaf("crop_context.stage", "==", json!("heading")));
        assert!(!leaf("crop_context.stage", "==", json!("tillering")));
        assert!(leaf("weather.humidity", "==", json!(85.0)));
        assert!(leaf("crop_context.stage", "!=", json!("tillering")));
        // Different kinds are unequal.
        assert!(leaf("weather.humidity", "!=", json!("85")));
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(leaf("weather.temperature", ">", json!(35)));
        assert!(leaf("weather.temperature", ">=", json!(40)));
        assert!(!leaf("weather.temperature", "<", json!(40)));
        assert!(leaf("weather.temperature", "<=", json!("40.0")));
        // Numeric strings in the context coerce.
        assert!(leaf("soil.soil_moisture", "<", json!(20)));
    }

    #[test]
    fn test_numeric_coercion_failure_is_false() {
        assert!(!leaf("crop_context.stage", ">", json!(3)));
        assert!(!leaf("weather.temperature", ">", json!("hot")));
        assert!(!leaf("weather.temperature", "<", json!(null)));
        assert!(!leaf("farm_components.crop_types", ">=", json!(0)));
    }

    #[test]
    fn test_in_and_not_in() {
        assert!(leaf("crop_context.stage", "IN", json!(["heading", "flowering"])));
        assert!(!leaf("crop_context.stage", "IN", json!(["tillering"])));
        assert!(!leaf("crop_context.stage", "IN", json!("heading")));

        assert!(leaf("crop_context.stage", "NOT_IN", json!(["tillering"])));
        assert!(!leaf("crop_context.stage", "NOT_IN", json!(["heading"])));
        // Non-array value fails open.
        assert!(leaf("crop_context.stage", "NOT_IN", json!("heading")));
    }

    #[test]
    fn test_contains() {
        assert!(leaf("farm_components.crop_types", "CONTAINS", json!("wheat")));
        assert!(!leaf("farm_components.crop_types", "CONTAINS", json!("cotton")));
        assert!(leaf("farm_components.crop_types", "CONTAINS", json!(["cotton", "barley"])));
        assert!(!leaf("farm_components.crop_types", "CONTAINS", json!(["cotton"])));
        // Actual must be a list.
        assert!(!leaf("crop_context.stage", "CONTAINS", json!("head")));
    }

    #[test]
    fn test_emptiness() {
        assert!(leaf("farm_components.crop_types", "NOT_EMPTY", json!(null)));
        assert!(leaf("farm_components.livestock_types", "EMPTY", json!(null)));
        assert!(leaf("crop_context.previous_crop", "EMPTY", json!(null)));
        assert!(leaf("weather.frost_warning", "EMPTY", json!(null)));
        assert!(!leaf("weather.temperature", "EMPTY", json!(null)));
    }

    #[test]
    fn test_missing_field_policy() {
        for op in ["==", "!=", ">", ">=", "<", "<=", "IN", "NOT_IN", "CONTAINS", "NOT_EMPTY", "~="] {
            assert!(!leaf("soil.ph", op, json!([1])), "operator {} matched a missing field", op);
        }
        assert!(leaf("soil.ph", "EMPTY", json!(null)));
    }

    #[test]
    fn test_unknown_operator_is_false() {
        assert!(!leaf("weather.temperature", "BETWEEN", json!([30, 45])));
    }

    #[test]
    fn test_groups() {
        let hot = Condition::leaf("weather.temperature", ">", 35);
        let cold = Condition::leaf("weather.temperature", "<", 0);

        assert!(Condition::all(vec![hot.clone()]).evaluate(&ctx()));
        assert!(!Condition::all(vec![hot.clone(), cold.clone()]).evaluate(&ctx()));
        assert!(Condition::any(vec![cold.clone(), hot.clone()]).evaluate(&ctx()));
        assert!(!Condition::any(vec![cold.clone()]).evaluate(&ctx()));

        let unknown = Condition::Group {
            operator: GroupOperator::Unknown("XOR".to_string()),
            items: vec![hot, cold],
        };
        assert!(!unknown.evaluate(&ctx()));
    }

    #[test]
    fn test_empty_groups_pass() {
        assert!(Condition::all(vec![]).evaluate(&Context::new()));
        assert!(Condition::any(vec![]).evaluate(&Context::new()));
        assert!(Condition::default().evaluate(&Context::new()));
    }

    #[test]
    fn test_nested_tree_from_json() {
        let condition: Condition = serde_json::from_value(json!({
            "operator": "AND",
            "items": [
                { "field": "weather.temperature", "operator": ">", "value": 35 },
                { "operator": "OR", "items": [
                    { "field": "crop_context.stage", "operator": "IN", "value": ["heading", "flowering"] },
                    { "field": "soil.soil_moisture", "operator": "<", "value": 10 }
                ]}
            ]
        }))
        .unwrap();

        assert!(condition.evaluate(&ctx()));
        match &condition {
            Condition::Group { operator, items } => {
                assert_eq!(operator, &GroupOperator::And);
                assert!(matches!(items[1], Condition::Group { .. }));
            }
            _ => panic!("expected group"),
        }
    }

    #[test]
    fn test_parsing_edge_shapes() {
        let empty: Condition = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty, Condition::all(vec![]));

        let bare_or: Condition = serde_json::from_value(json!({ "operator": "OR" })).unwrap();
        assert!(bare_or.evaluate(&Context::new()));

        let implicit_eq: Condition =
            serde_json::from_value(json!({ "field": "crop_context.stage", "value": "heading" })).unwrap();
        assert!(implicit_eq.evaluate(&ctx()));

        let items_without_operator: Condition = serde_json::from_value(json!({
            "items": [{ "field": "weather.temperature", "operator": ">", "value": 50 }]
        }))
        .unwrap();
        assert!(!items_without_operator.evaluate(&ctx()));

        let unknown: Condition =
            serde_json::from_value(json!({ "field": "x", "operator": "LIKE", "value": "a%" })).unwrap();
        assert!(matches!(unknown, Condition::Leaf { operator: Operator::Unknown(ref op), .. } if op == "LIKE"));
    }

    #[test]
    fn test_serialization_keeps_wire_shape() {
        let condition = Condition::all(vec![Condition::leaf("weather.temperature", ">", 35)]);
        let value = serde_json::to_value(&condition).unwrap();
        assert_eq!(
            value,
            json!({
                "operator": "AND",
                "items": [{ "field": "weather.temperature", "operator": ">", "value": 35 }]
            })
        );
    }
}
