//! # yonca-core
//!
//! Deterministic rule evaluation engine for farm advisory recommendations.
//!
//! Given a farm's current readings (weather, soil, crop or herd state), the
//! engine answers:
//! - Which advisory rules fire today?
//! - How urgent is each one?
//! - When in the day should the work be done?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same rules, request and instant give the same response
//! 2. **Total**: bad operators, values or templates degrade to "no match"
//! 3. **Data-driven**: rules are JSON/YAML documents, never code
//! 4. **Shareable**: the rule set is immutable and `Arc`-shared across threads
//!
//! ## Example
//!
//! ```rust,ignore
//! use yonca_core::{Catalog, RecommendationRequest};
//!
//! let catalog = Catalog::load_dir("data")?;
//! let request: RecommendationRequest = serde_json::from_str(&json)?;
//! let response = catalog.engine().evaluate(&request);
//!
//! for alert in &response.critical_alerts {
//!     println!("{}: {}", alert.rule_id, alert.message_en);
//! }
//! println!("{}", response.summary_en);
//! ```

pub mod action;
pub mod catalog;
pub mod condition;
pub mod context;
pub mod engine;
pub mod ranking;
pub mod rules;
pub mod schedule;
pub mod schema;
pub mod summary;
pub mod template;
pub mod types;

// Re-export main types at crate root
pub use catalog::{lint_rules_dir, Catalog, CatalogError, Constants, FarmProfile, LintReport};
pub use condition::{Condition, GroupOperator, Operator};
pub use context::{build_context, Context, ContextValue, TimeOfDay};
pub use engine::RuleEngine;
pub use rules::{Rule, RuleAction, RuleDocument, RuleError, RuleSet};
pub use schedule::{Scheduler, TimeSlot};
pub use schema::SchemaError;
pub use types::{
    AnimalType, CropContext, DailyScheduleItem, FarmComponents, FarmType, GreenhouseContext,
    LivestockContext, RecommendationAction, RecommendationRequest, RecommendationResponse, Region,
    ResourceContext, SchedulePriority, SoilData, UrgencyLevel, WeatherData,
};

use chrono::{DateTime, Local};
use thiserror::Error;

/// Errors surfaced around evaluation. Evaluation itself never fails.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Invalid request: {}", .0.join("; "))]
    InvalidRequest(Vec<String>),

    #[error("Failed to decode request: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Evaluate a request against a rule set at the current local time.
pub fn evaluate(rules: &RuleSet, request: &RecommendationRequest) -> RecommendationResponse {
    evaluate_at(rules, request, Local::now())
}

/// Evaluate a request against a rule set as of `now`.
///
/// Prefer [`RuleEngine`] when evaluating many requests; this clones the set.
pub fn evaluate_at(
    rules: &RuleSet,
    request: &RecommendationRequest,
    now: DateTime<Local>,
) -> RecommendationResponse {
    RuleEngine::from(rules.clone()).evaluate_at(request, now)
}

/// Validate a raw request against the request schema, then decode it.
pub fn parse_request(value: serde_json::Value) -> Result<RecommendationRequest, Error> {
    schema::validate_request_schema(&value).map_err(Error::InvalidRequest)?;
    Ok(serde_json::from_value(value)?)
}
