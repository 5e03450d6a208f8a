//! JSON Schema validation for rule documents and requests.
//!
//! Rule documents are linted against schema/rule_document.schema.json and
//! requests against schema/recommendation_request.schema.json. Both schemas
//! are embedded at compile time and compiled once.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded rule document schema.
const RULE_DOCUMENT_SCHEMA_JSON: &str = include_str!("../../../schema/rule_document.schema.json");

/// Embedded request schema.
const REQUEST_SCHEMA_JSON: &str = include_str!("../../../schema/recommendation_request.schema.json");

static RULE_DOCUMENT_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();
static REQUEST_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn compile(source: &str) -> Result<jsonschema::Validator, String> {
    let schema_value: serde_json::Value = match serde_json::from_str(source) {
        Ok(v) => v,
        Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
    };

    match jsonschema::options().build(&schema_value) {
        Ok(v) => Ok(v),
        Err(e) => Err(format!("Failed to compile schema: {}", e)),
    }
}

fn get_validator(
    cell: &'static OnceLock<Result<jsonschema::Validator, String>>,
    source: &str,
) -> Result<&'static jsonschema::Validator, SchemaError> {
    match cell.get_or_init(|| compile(source)) {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

fn collect_errors(validator: &jsonschema::Validator, value: &serde_json::Value) -> Result<(), Vec<String>> {
    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Lint a rule document against the rule schema.
///
/// Returns every violation found. The engine tolerates documents that fail
/// this check; it is meant for authoring tools.
pub fn validate_rule_document_schema(document: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator(&RULE_DOCUMENT_SCHEMA, RULE_DOCUMENT_SCHEMA_JSON)
        .map_err(|e| vec![e.to_string()])?;
    collect_errors(validator, document)
}

/// Validate a recommendation request before it is deserialized.
pub fn validate_request_schema(request: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator =
        get_validator(&REQUEST_SCHEMA, REQUEST_SCHEMA_JSON).map_err(|e| vec![e.to_string()])?;
    collect_errors(validator, request)
}

pub fn is_valid_rule_document(document: &serde_json::Value) -> bool {
    get_validator(&RULE_DOCUMENT_SCHEMA, RULE_DOCUMENT_SCHEMA_JSON)
        .map(|v| v.is_valid(document))
        .unwrap_or(false)
}

pub fn is_valid_request(request: &serde_json::Value) -> bool {
    get_validator(&REQUEST_SCHEMA, REQUEST_SCHEMA_JSON)
        .map(|v| v.is_valid(request))
        .unwrap_or(false)
}
