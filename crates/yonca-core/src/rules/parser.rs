//! Rule document parsing from JSON/YAML.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::condition::Condition;
use crate::types::UrgencyLevel;

/// Score used when a rule's action omits `urgency_score`.
pub const DEFAULT_URGENCY_SCORE: i64 = 50;

/// Action type used when a rule's action omits `type`.
pub const DEFAULT_ACTION_TYPE: &str = "info";

/// Errors that can occur when reading rule documents.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Failed to read rule file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Rule validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// The action block of a rule.
///
/// Known keys are typed; everything else is kept in `details` and passed
/// through to the recommendation untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuleAction {
    /// Urgency label (critical/high/medium/low/info), kept as written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<JsonValue>,

    /// Ranking score, nominally 0-100
    #[serde(
        default,
        deserialize_with = "deserialize_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub urgency_score: Option<i64>,

    /// Action type, used for scheduling (irrigate, fertilize, ...)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,

    /// When to act, in Azerbaijani
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_az: Option<String>,

    /// Remaining action-specific fields
    #[serde(flatten)]
    pub details: Map<String, JsonValue>,
}

impl RuleAction {
    /// Parsed urgency; `medium` when missing, not a string or unrecognized.
    pub fn urgency_level(&self) -> UrgencyLevel {
        self.urgency
            .as_ref()
            .and_then(JsonValue::as_str)
            .and_then(UrgencyLevel::parse)
            .unwrap_or_default()
    }

    /// Score taken verbatim, not range-checked.
    pub fn score(&self) -> i64 {
        self.urgency_score.unwrap_or(DEFAULT_URGENCY_SCORE)
    }

    pub fn action_type(&self) -> &str {
        self.action_type.as_deref().unwrap_or(DEFAULT_ACTION_TYPE)
    }

    /// The whole action block as JSON.
    pub fn to_json(&self) -> Option<JsonValue> {
        serde_json::to_value(self).ok()
    }
}

/// Integers, or floats with no fractional part (`90.0`).
fn deserialize_score<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => integral(&value).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!("urgency_score must be an integer, got {}", value))
        }),
    }
}

fn integral(value: &JsonValue) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn default_priority() -> String {
    "medium".to_string()
}

fn default_enabled() -> bool {
    true
}

/// A condition → action rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rule {
    /// Unique identifier (e.g., "WHT_IRR_001")
    pub rule_id: String,

    #[serde(default)]
    pub name_az: String,

    #[serde(default)]
    pub name_en: String,

    /// Informational priority label
    #[serde(default = "default_priority")]
    pub priority: String,

    /// Crop or animal types the rule is restricted to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicable_to: Option<Vec<String>>,

    pub conditions: Condition,

    pub action: RuleAction,

    /// Message template, Azerbaijani
    #[serde(default)]
    pub message_az: String,

    /// Message template, English
    #[serde(default)]
    pub message_en: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Rule {
    /// Case-insensitive keyword match over id, names and messages.
    pub fn mentions(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        [
            &self.name_az,
            &self.name_en,
            &self.message_az,
            &self.message_en,
            &self.rule_id,
        ]
        .iter()
        .any(|text| text.to_lowercase().contains(&keyword))
    }
}

/// A category file: a list of rules plus free-form metadata.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RuleDocument {
    pub rules: Vec<Rule>,

    /// Any other top-level keys (category, version, description, ...)
    #[serde(flatten)]
    pub metadata: Map<String, JsonValue>,
}

/// Document shape before per-rule decoding.
#[derive(Deserialize)]
struct RawDocument {
    rules: Vec<JsonValue>,

    #[serde(flatten)]
    metadata: Map<String, JsonValue>,
}

impl RuleDocument {
    /// Parse a rule document from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, RuleError> {
        Self::from_raw(serde_yaml::from_str(yaml)?)
    }

    /// Parse a rule document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        Self::from_raw(serde_json::from_str(json)?)
    }

    /// Build a rule document from an already-parsed JSON value.
    pub fn from_value(value: JsonValue) -> Result<Self, RuleError> {
        Self::from_raw(serde_json::from_value(value)?)
    }

    /// Parse a rule document from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a rule document from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a file, choosing YAML for `.yaml`/`.yml` and JSON otherwise.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RuleError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            _ => Self::from_json_file(path),
        }
    }

    /// Check each rule's structure, then decode rules one by one.
    ///
    /// A missing `rule_id`, `conditions` or `action`, or a duplicate id,
    /// fails the document. Any other decoding problem only drops that rule.
    fn from_raw(raw: RawDocument) -> Result<Self, RuleError> {
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(raw.rules.len());

        for (index, value) in raw.rules.into_iter().enumerate() {
            let rule_id = required_rule_id(&value, index)?;
            for key in ["conditions", "action"] {
                if value.get(key).is_none() {
                    return Err(RuleError::MissingField(format!("rules[{}].{}", index, key)));
                }
            }
            if !seen.insert(rule_id.clone()) {
                return Err(RuleError::ValidationError(format!(
                    "Duplicate rule ID: {}",
                    rule_id
                )));
            }

            match serde_json::from_value::<Rule>(value) {
                Ok(rule) => rules.push(rule),
                Err(e) => {
                    tracing::warn!(rule_id = %rule_id, error = %e, "Skipping malformed rule");
                }
            }
        }

        Ok(Self {
            rules,
            metadata: raw.metadata,
        })
    }
}

fn required_rule_id(value: &JsonValue, index: usize) -> Result<String, RuleError> {
    value
        .get("rule_id")
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| RuleError::MissingField(format!("rules[{}].rule_id", index)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_DOCUMENT: &str = r#"
category: irrigation
rules:
  - rule_id: "WHT_IRR_001"
    name_az: "Təcili suvarma"
    name_en: "Urgent irrigation"
    priority: high
    conditions:
      operator: AND
      items:
        - field: soil.soil_moisture
          operator: "<"
          value: 25
    action:
      type: irrigate
      urgency: high
      urgency_score: 85
      water_amount_mm: 40
    message_az: "Torpaq nəmliyi {soil_moisture}%"
    message_en: "Soil moisture {soil_moisture}%"
"#;

    #[test]
    fn test_parse_valid_document() {
        let document = RuleDocument::from_yaml(VALID_DOCUMENT).unwrap();
        assert_eq!(document.rules.len(), 1);
        assert_eq!(document.metadata.get("category"), Some(&serde_json::json!("irrigation")));

        let rule = &document.rules[0];
        assert!(rule.enabled);
        assert_eq!(rule.action.urgency_level(), UrgencyLevel::High);
        assert_eq!(rule.action.score(), 85);
        assert_eq!(rule.action.action_type(), "irrigate");
        assert_eq!(rule.action.details.get("water_amount_mm"), Some(&serde_json::json!(40)));
    }

    #[test]
    fn test_action_defaults() {
        let action: RuleAction = serde_json::from_value(serde_json::json!({ "urgency": "severe" })).unwrap();
        assert_eq!(action.urgency_level(), UrgencyLevel::Medium);
        assert_eq!(action.score(), DEFAULT_URGENCY_SCORE);
        assert_eq!(action.action_type(), DEFAULT_ACTION_TYPE);
    }

    #[test]
    fn test_action_details_keep_whole_block() {
        let action: RuleAction = serde_json::from_value(serde_json::json!({
            "type": "apply_fungicide",
            "urgency": "critical",
            "urgency_score": 95,
            "product": "tebuconazole"
        }))
        .unwrap();
        let details = action.to_json().unwrap();
        assert_eq!(details["type"], "apply_fungicide");
        assert_eq!(details["urgency_score"], 95);
        assert_eq!(details["product"], "tebuconazole");
    }

    #[test]
    fn test_missing_conditions_rejected() {
        let json = r#"{ "rules": [ { "rule_id": "X1", "action": {} } ] }"#;
        assert!(matches!(RuleDocument::from_json(json), Err(RuleError::MissingField(_))));

        let no_action = r#"{ "rules": [ { "rule_id": "X1", "conditions": {} } ] }"#;
        match RuleDocument::from_json(no_action) {
            Err(RuleError::MissingField(field)) => assert_eq!(field, "rules[0].action"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_lenient_urgency_fields() {
        let json = r#"{ "rules": [
            { "rule_id": "F1", "conditions": {}, "action": { "urgency": "high", "urgency_score": 90.0 } },
            { "rule_id": "F2", "conditions": {}, "action": { "urgency": 3, "urgency_score": 70 } }
        ] }"#;
        let document = RuleDocument::from_json(json).unwrap();
        assert_eq!(document.rules.len(), 2);

        let float_score = &document.rules[0].action;
        assert_eq!(float_score.urgency_level(), UrgencyLevel::High);
        assert_eq!(float_score.score(), 90);

        let numeric_label = &document.rules[1].action;
        assert_eq!(numeric_label.urgency_level(), UrgencyLevel::Medium);
        assert_eq!(numeric_label.score(), 70);
        assert_eq!(numeric_label.to_json().unwrap()["urgency"], 3);
    }

    #[test]
    fn test_malformed_rule_is_skipped() {
        let json = r#"{ "category": "harvest", "rules": [
            { "rule_id": "H1", "conditions": {}, "action": { "urgency": "low" } },
            { "rule_id": "H2", "conditions": {}, "action": { "urgency_score": 90.5 } },
            { "rule_id": "H3", "conditions": { "operator": "AND", "items": 5 }, "action": {} },
            { "rule_id": "H4", "conditions": {}, "action": {}, "enabled": "yes" },
            { "rule_id": "H5", "conditions": {}, "action": { "urgency_score": "high" } },
            { "rule_id": "H6", "conditions": {}, "action": {} }
        ] }"#;
        let document = RuleDocument::from_json(json).unwrap();
        let ids: Vec<_> = document.rules.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["H1", "H6"]);
        assert_eq!(document.metadata.get("category"), Some(&serde_json::json!("harvest")));
    }

    #[test]
    fn test_yaml_float_score() {
        let yaml = r#"
rules:
  - rule_id: Y1
    conditions: {}
    action:
      urgency: critical
      urgency_score: 95.0
"#;
        let document = RuleDocument::from_yaml(yaml).unwrap();
        assert_eq!(document.rules[0].action.score(), 95);
    }

    #[test]
    fn test_empty_rule_id_rejected() {
        let json = r#"{ "rules": [ { "rule_id": " ", "conditions": {}, "action": {} } ] }"#;
        assert!(matches!(RuleDocument::from_json(json), Err(RuleError::MissingField(_))));

        let numeric = r#"{ "rules": [ { "rule_id": 7, "conditions": {}, "action": {} } ] }"#;
        assert!(matches!(RuleDocument::from_json(numeric), Err(RuleError::MissingField(_))));
    }

    #[test]
    fn test_duplicate_rule_ids() {
        let json = r#"{ "rules": [
            { "rule_id": "X1", "conditions": {}, "action": {} },
            { "rule_id": "X1", "conditions": {}, "action": {} }
        ] }"#;
        assert!(matches!(
            RuleDocument::from_json(json),
            Err(RuleError::ValidationError(_))
        ));
    }

    #[test]
    fn test_keyword_search() {
        let document = RuleDocument::from_yaml(VALID_DOCUMENT).unwrap();
        let rule = &document.rules[0];
        assert!(rule.mentions("URGENT"));
        assert!(rule.mentions("suvarma"));
        assert!(rule.mentions("wht_irr"));
        assert!(!rule.mentions("harvest"));
    }
}
