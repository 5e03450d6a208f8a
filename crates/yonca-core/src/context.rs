//! Flattened evaluation context.
//!
//! A request is flattened into a single-level map of dotted keys
//! (`weather.temperature`, `crop_context.stage`, ...) so that rule conditions
//! can address any reading by path. Absent readings are never stored, which
//! keeps the "missing field" policy of the evaluator uniform.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, Local, Timelike};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::types::RecommendationRequest;

/// Key of the derived time-of-day bucket.
pub const TIME_OF_DAY_KEY: &str = "time_of_day";

/// Key of the derived weekday name.
pub const DAY_OF_WEEK_KEY: &str = "day_of_week";

/// A scalar or string-list value stored in the context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

impl ContextValue {
    /// Convert a JSON value; `null` and objects have no context representation.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null | JsonValue::Object(_) => None,
            JsonValue::Bool(b) => Some(ContextValue::Bool(*b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Some(ContextValue::Int(i)),
                None => n.as_f64().map(ContextValue::Float),
            },
            JsonValue::String(s) => Some(ContextValue::Text(s.clone())),
            JsonValue::Array(items) => Some(ContextValue::List(
                items
                    .iter()
                    .map(|item| match item {
                        JsonValue::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            )),
        }
    }

    /// Floating-point coercion used by the ordering operators.
    ///
    /// Numbers convert directly, booleans as 1/0, strings when they parse.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ContextValue::Int(i) => Some(*i as f64),
            ContextValue::Float(f) => Some(*f),
            ContextValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ContextValue::Text(s) => s.trim().parse::<f64>().ok(),
            ContextValue::List(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ContextValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ContextValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Truthiness: non-zero numbers, `true`, non-empty strings and lists.
    pub fn is_truthy(&self) -> bool {
        match self {
            ContextValue::Int(i) => *i != 0,
            ContextValue::Float(f) => *f != 0.0,
            ContextValue::Bool(b) => *b,
            ContextValue::Text(s) => !s.is_empty(),
            ContextValue::List(items) => !items.is_empty(),
        }
    }

    /// Raw equality against a rule value.
    ///
    /// Numbers compare by value regardless of integer/float representation.
    /// Values of different kinds are never equal.
    pub fn equals_json(&self, expected: &JsonValue) -> bool {
        match (self, expected) {
            (ContextValue::Int(a), JsonValue::Number(b)) => match b.as_i64() {
                Some(b) => *a == b,
                None => b.as_f64().is_some_and(|b| *a as f64 == b),
            },
            (ContextValue::Float(a), JsonValue::Number(b)) => b.as_f64().is_some_and(|b| *a == b),
            (ContextValue::Bool(a), JsonValue::Bool(b)) => a == b,
            (ContextValue::Text(a), JsonValue::String(b)) => a == b,
            (ContextValue::List(a), JsonValue::Array(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| y.as_str() == Some(x.as_str()))
            }
            _ => false,
        }
    }

    /// Whether `needle` is an element of this list value.
    pub fn list_contains(&self, needle: &JsonValue) -> bool {
        match (self, needle) {
            (ContextValue::List(items), JsonValue::String(s)) => items.iter().any(|i| i == s),
            _ => false,
        }
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Int(i) => write!(f, "{}", i),
            // Whole floats keep a trailing ".0".
            ContextValue::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            ContextValue::Float(v) => write!(f, "{}", v),
            ContextValue::Bool(b) => write!(f, "{}", b),
            ContextValue::Text(s) => f.write_str(s),
            ContextValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Int(value)
    }
}

impl From<i32> for ContextValue {
    fn from(value: i32) -> Self {
        ContextValue::Int(value as i64)
    }
}

impl From<u32> for ContextValue {
    fn from(value: u32) -> Self {
        ContextValue::Int(value as i64)
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue::Float(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Bool(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<Vec<String>> for ContextValue {
    fn from(value: Vec<String>) -> Self {
        ContextValue::List(value)
    }
}

impl From<Vec<&str>> for ContextValue {
    fn from(value: Vec<&str>) -> Self {
        ContextValue::List(value.into_iter().map(str::to_string).collect())
    }
}

/// Flat, read-only-after-construction evaluation context.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Context {
    values: BTreeMap<String, ContextValue>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style insert, handy for assembling contexts by hand.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flatten every non-null field of `section` under `prefix.`.
    fn flatten_section<T: Serialize>(&mut self, prefix: &str, section: &T) {
        match serde_json::to_value(section) {
            Ok(JsonValue::Object(fields)) => {
                for (field, value) in fields {
                    if let Some(value) = ContextValue::from_json(&value) {
                        self.values.insert(format!("{}.{}", prefix, field), value);
                    }
                }
            }
            Ok(_) => {
                tracing::warn!(section = prefix, "Context section is not an object, skipped");
            }
            Err(e) => {
                tracing::warn!(section = prefix, error = %e, "Failed to flatten context section");
            }
        }
    }
}

impl FromIterator<(String, ContextValue)> for Context {
    fn from_iter<I: IntoIterator<Item = (String, ContextValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Coarse bucket of the local hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Midday,
    Evening,
    Night,
}

impl TimeOfDay {
    /// `[05,12)` morning, `[12,17)` midday, `[17,21)` evening, otherwise night.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Midday,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Midday => "midday",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

/// Lowercase full English weekday name.
fn weekday_name(date: &impl Datelike) -> &'static str {
    match date.weekday() {
        chrono::Weekday::Mon => "monday",
        chrono::Weekday::Tue => "tuesday",
        chrono::Weekday::Wed => "wednesday",
        chrono::Weekday::Thu => "thursday",
        chrono::Weekday::Fri => "friday",
        chrono::Weekday::Sat => "saturday",
        chrono::Weekday::Sun => "sunday",
    }
}

/// Build the flat context for `request`, evaluated at instant `now`.
///
/// `time_of_day` comes from `now`; `day_of_week` comes from the request date.
pub fn build_context(request: &RecommendationRequest, now: &DateTime<Local>) -> Context {
    let mut ctx = Context::new();

    ctx.insert("farm_type", request.farm_type.as_str());
    ctx.insert("region", request.region.as_str());
    ctx.insert("date", request.request_date.format("%Y-%m-%d").to_string());

    ctx.flatten_section("weather", &request.weather);

    if let Some(soil) = &request.soil {
        ctx.flatten_section("soil", soil);
    }
    if let Some(crop) = &request.crop_context {
        ctx.flatten_section("crop_context", crop);
    }
    if let Some(livestock) = &request.livestock_context {
        ctx.flatten_section("livestock_context", livestock);
    }
    if let Some(greenhouse) = &request.greenhouse_context {
        ctx.flatten_section("greenhouse_context", greenhouse);
    }
    if let Some(resources) = &request.resource_context {
        ctx.flatten_section("resource_context", resources);
    }
    if let Some(components) = &request.farm_components {
        ctx.flatten_section("farm_components", components);
    }

    ctx.insert(TIME_OF_DAY_KEY, TimeOfDay::from_hour(now.hour()).as_str());
    ctx.insert(DAY_OF_WEEK_KEY, weekday_name(&request.request_date));

    ctx
}
