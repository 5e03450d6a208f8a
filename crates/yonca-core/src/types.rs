//! Request and response types for recommendation evaluation.
//!
//! Requests mirror what a farmer (or an upstream service) submits: farm type,
//! region, date, a weather reading and optional soil / crop / livestock /
//! greenhouse / resource readings. Responses group the matched
//! recommendations by urgency and carry the derived daily schedule.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// Enumerations
// ============================================================================

/// Kind of farm a request is evaluated for. Selects the rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FarmType {
    Wheat,
    Livestock,
    Orchard,
    Vegetable,
    Mixed,
}

impl FarmType {
    /// All farm types, in catalog order.
    pub const ALL: [FarmType; 5] = [
        FarmType::Wheat,
        FarmType::Livestock,
        FarmType::Orchard,
        FarmType::Vegetable,
        FarmType::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FarmType::Wheat => "wheat",
            FarmType::Livestock => "livestock",
            FarmType::Orchard => "orchard",
            FarmType::Vegetable => "vegetable",
            FarmType::Mixed => "mixed",
        }
    }

    /// Parse a snake_case farm type name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == value)
    }

    pub fn name_az(&self) -> &'static str {
        match self {
            FarmType::Wheat => "Taxıl təsərrüfatı",
            FarmType::Livestock => "Heyvandarlıq",
            FarmType::Orchard => "Meyvə bağı",
            FarmType::Vegetable => "Tərəvəzçilik",
            FarmType::Mixed => "Qarışıq təsərrüfat",
        }
    }

    pub fn name_en(&self) -> &'static str {
        match self {
            FarmType::Wheat => "Wheat/Cereals Farm",
            FarmType::Livestock => "Livestock Farm",
            FarmType::Orchard => "Orchard",
            FarmType::Vegetable => "Vegetable Farm",
            FarmType::Mixed => "Mixed Farm",
        }
    }

    /// What the farm type covers, in Azerbaijani.
    pub fn description_az(&self) -> &'static str {
        match self {
            FarmType::Wheat => "Buğda, arpa və digər dənli bitkilər",
            FarmType::Livestock => "Mal-qara, qoyun, keçi, quşçuluq",
            FarmType::Orchard => "Alma, üzüm, nar, əncir və digər meyvələr",
            FarmType::Vegetable => "Pomidor, xiyar, kartof və digər tərəvəzlər",
            FarmType::Mixed => "Bitkiçilik və heyvandarlıq birlikdə",
        }
    }
}

impl std::fmt::Display for FarmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Agricultural region of Azerbaijan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Aran,
    Lankaran,
    ShekiZagatala,
    GanjaGazakh,
    Mountainous,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::Aran,
        Region::Lankaran,
        Region::ShekiZagatala,
        Region::GanjaGazakh,
        Region::Mountainous,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Aran => "aran",
            Region::Lankaran => "lankaran",
            Region::ShekiZagatala => "sheki_zagatala",
            Region::GanjaGazakh => "ganja_gazakh",
            Region::Mountainous => "mountainous",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency label used for bucketing recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl UrgencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Critical => "critical",
            UrgencyLevel::High => "high",
            UrgencyLevel::Medium => "medium",
            UrgencyLevel::Low => "low",
            UrgencyLevel::Info => "info",
        }
    }

    /// Parse a label, returning `None` for anything unrecognized.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "critical" => Some(UrgencyLevel::Critical),
            "high" => Some(UrgencyLevel::High),
            "medium" => Some(UrgencyLevel::Medium),
            "low" => Some(UrgencyLevel::Low),
            "info" => Some(UrgencyLevel::Info),
            _ => None,
        }
    }

    /// Critical and high items are mandatory in the daily schedule.
    pub fn is_pressing(&self) -> bool {
        matches!(self, UrgencyLevel::Critical | UrgencyLevel::High)
    }
}

impl Default for UrgencyLevel {
    fn default() -> Self {
        UrgencyLevel::Medium
    }
}

/// Livestock species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimalType {
    Cattle,
    Sheep,
    Goat,
    Poultry,
}

// ============================================================================
// Request readings
// ============================================================================

fn default_true() -> bool {
    true
}

/// Current weather reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    /// Air temperature (°C)
    pub temperature: f64,

    /// Relative humidity (%)
    pub humidity: f64,

    #[serde(default)]
    pub rainfall_last_24h: f64,

    #[serde(default)]
    pub rainfall_last_7days: f64,

    /// Rain expected within 48 hours
    #[serde(default)]
    pub rainfall_forecast_48h: bool,

    #[serde(default)]
    pub rainfall_forecast_amount_mm: f64,

    /// Wind speed (km/h)
    #[serde(default)]
    pub wind_speed: f64,

    #[serde(default)]
    pub frost_warning: bool,

    /// Client-reported time of day (morning/midday/evening/night)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
}

impl WeatherData {
    /// A reading with only the required fields set.
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature,
            humidity,
            rainfall_last_24h: 0.0,
            rainfall_last_7days: 0.0,
            rainfall_forecast_48h: false,
            rainfall_forecast_amount_mm: 0.0,
            wind_speed: 0.0,
            frost_warning: false,
            time_of_day: None,
        }
    }
}

/// Soil reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilData {
    /// Soil moisture (%)
    pub soil_moisture: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
}

/// Crop state for field and orchard farms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropContext {
    /// Crop species (wheat, tomato, grape, ...)
    pub crop_type: String,

    /// Growth stage
    pub stage: String,

    #[serde(default)]
    pub days_in_stage: u32,

    #[serde(default)]
    pub days_since_irrigation: u32,

    #[serde(default)]
    pub days_since_fertilization: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_until_harvest: Option<i64>,

    /// open_field or greenhouse
    #[serde(default = "default_growing_type", skip_serializing_if = "Option::is_none")]
    pub growing_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grain_moisture: Option<f64>,

    #[serde(default)]
    pub grain_shattering: bool,

    #[serde(default)]
    pub nitrogen_deficiency_signs: bool,

    #[serde(default)]
    pub calcium_deficiency_signs: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aphid_count_per_head: Option<u32>,

    #[serde(default = "default_true")]
    pub seed_treated: bool,

    #[serde(default)]
    pub diseased_branches_present: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_crop: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_age_years: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_after_harvest: Option<u32>,
}

fn default_growing_type() -> Option<String> {
    Some("open_field".to_string())
}

impl CropContext {
    /// Crop context with defaults for everything but type and stage.
    pub fn new(crop_type: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            crop_type: crop_type.into(),
            stage: stage.into(),
            days_in_stage: 0,
            days_since_irrigation: 0,
            days_since_fertilization: 0,
            days_until_harvest: None,
            growing_type: default_growing_type(),
            grain_moisture: None,
            grain_shattering: false,
            nitrogen_deficiency_signs: false,
            calcium_deficiency_signs: false,
            aphid_count_per_head: None,
            seed_treated: true,
            diseased_branches_present: false,
            previous_crop: None,
            tree_age_years: None,
            days_after_harvest: None,
        }
    }
}

/// Greenhouse climate reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenhouseContext {
    pub inside_temperature: f64,

    pub inside_humidity: f64,

    /// open / closed / auto
    #[serde(default = "default_ventilation_status")]
    pub ventilation_status: String,

    /// on / off / auto
    #[serde(default = "default_heating_status", skip_serializing_if = "Option::is_none")]
    pub heating_status: Option<String>,
}

fn default_ventilation_status() -> String {
    "open".to_string()
}

fn default_heating_status() -> Option<String> {
    Some("off".to_string())
}

/// Herd state for livestock farms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivestockContext {
    pub animal_type: AnimalType,

    #[serde(default = "default_count")]
    pub count: u32,

    /// Barn hygiene score (1-10)
    pub barn_hygiene_score: u8,

    #[serde(default)]
    pub days_since_vet_check: u32,

    /// current / due / overdue
    #[serde(default = "default_vaccination_status")]
    pub vaccination_status: String,

    #[serde(default)]
    pub days_since_deworming: u32,

    /// good / adequate / poor
    #[serde(default = "default_ventilation_quality")]
    pub ventilation_quality: String,

    #[serde(default = "default_adequate")]
    pub water_availability: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lactation_stage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reproductive_stage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_until_expected_birth: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_days: Option<u32>,
}

fn default_count() -> u32 {
    1
}

fn default_vaccination_status() -> String {
    "current".to_string()
}

fn default_ventilation_quality() -> String {
    "good".to_string()
}

fn default_adequate() -> String {
    "adequate".to_string()
}

/// Resource availability for mixed farms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContext {
    /// adequate / limited / scarce
    #[serde(default = "default_adequate")]
    pub water_availability: String,

    /// adequate / limited
    #[serde(default = "default_adequate")]
    pub labor_availability: String,

    /// normal / tight
    #[serde(default = "default_financial_status")]
    pub financial_status: String,
}

fn default_financial_status() -> String {
    "normal".to_string()
}

impl Default for ResourceContext {
    fn default() -> Self {
        Self {
            water_availability: default_adequate(),
            labor_availability: default_adequate(),
            financial_status: default_financial_status(),
        }
    }
}

/// Enterprises present on a mixed farm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmComponents {
    #[serde(default)]
    pub crop_types: Vec<String>,

    #[serde(default)]
    pub livestock_types: Vec<String>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// A request for recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub farm_type: FarmType,

    pub region: Region,

    /// Date the advice is for; defaults to today
    #[serde(default = "today")]
    pub request_date: NaiveDate,

    pub weather: WeatherData,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil: Option<SoilData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_context: Option<CropContext>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub livestock_context: Option<LivestockContext>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greenhouse_context: Option<GreenhouseContext>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_context: Option<ResourceContext>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_components: Option<FarmComponents>,
}

impl RecommendationRequest {
    /// Minimal request: farm type, region, date and weather only.
    pub fn new(farm_type: FarmType, region: Region, request_date: NaiveDate, weather: WeatherData) -> Self {
        Self {
            farm_type,
            region,
            request_date,
            weather,
            soil: None,
            crop_context: None,
            livestock_context: None,
            greenhouse_context: None,
            resource_context: None,
            farm_components: None,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A single recommended action produced by a matched rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationAction {
    pub rule_id: String,
    pub name_az: String,
    pub name_en: String,
    pub category: String,
    pub urgency: UrgencyLevel,

    /// Ranking score, copied verbatim from the rule (nominally 0-100)
    pub urgency_score: i64,

    pub message_az: String,
    pub message_en: String,
    pub action_type: String,

    /// The rule's full action block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_details: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_az: Option<String>,
}

/// Whether a scheduled task is mandatory today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulePriority {
    MustDo,
    ShouldDo,
}

impl SchedulePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulePriority::MustDo => "must_do",
            SchedulePriority::ShouldDo => "should_do",
        }
    }

    pub fn for_urgency(urgency: UrgencyLevel) -> Self {
        if urgency.is_pressing() {
            SchedulePriority::MustDo
        } else {
            SchedulePriority::ShouldDo
        }
    }
}

impl std::fmt::Display for SchedulePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task placed in a time slot of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyScheduleItem {
    /// Time window, e.g. "05:00-07:00"
    pub time_slot: String,
    pub task_az: String,
    pub task_en: String,
    pub priority: SchedulePriority,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_rule_id: Option<String>,

    pub urgency_score: i64,
}

/// Recommendations for one request, grouped by urgency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub farm_type: FarmType,
    pub region: Region,
    pub response_date: NaiveDate,
    pub generated_at: DateTime<Local>,

    pub critical_alerts: Vec<RecommendationAction>,
    pub high_priority: Vec<RecommendationAction>,
    pub medium_priority: Vec<RecommendationAction>,
    pub low_priority: Vec<RecommendationAction>,
    pub info: Vec<RecommendationAction>,

    pub daily_schedule: Vec<DailyScheduleItem>,

    pub total_recommendations: usize,
    pub summary_az: String,
    pub summary_en: String,
}

impl RecommendationResponse {
    /// Empty response for a request, stamped with `generated_at`.
    pub fn empty(request: &RecommendationRequest, generated_at: DateTime<Local>) -> Self {
        Self {
            farm_type: request.farm_type,
            region: request.region,
            response_date: request.request_date,
            generated_at,
            critical_alerts: Vec::new(),
            high_priority: Vec::new(),
            medium_priority: Vec::new(),
            low_priority: Vec::new(),
            info: Vec::new(),
            daily_schedule: Vec::new(),
            total_recommendations: 0,
            summary_az: String::new(),
            summary_en: String::new(),
        }
    }

    /// The bucket holding recommendations of the given urgency.
    pub fn bucket(&self, urgency: UrgencyLevel) -> &[RecommendationAction] {
        match urgency {
            UrgencyLevel::Critical => &self.critical_alerts,
            UrgencyLevel::High => &self.high_priority,
            UrgencyLevel::Medium => &self.medium_priority,
            UrgencyLevel::Low => &self.low_priority,
            UrgencyLevel::Info => &self.info,
        }
    }

    pub(crate) fn bucket_mut(&mut self, urgency: UrgencyLevel) -> &mut Vec<RecommendationAction> {
        match urgency {
            UrgencyLevel::Critical => &mut self.critical_alerts,
            UrgencyLevel::High => &mut self.high_priority,
            UrgencyLevel::Medium => &mut self.medium_priority,
            UrgencyLevel::Low => &mut self.low_priority,
            UrgencyLevel::Info => &mut self.info,
        }
    }

    /// Iterate every recommendation, bucket by bucket.
    pub fn all_recommendations(&self) -> impl Iterator<Item = &RecommendationAction> {
        self.critical_alerts
            .iter()
            .chain(self.high_priority.iter())
            .chain(self.medium_priority.iter())
            .chain(self.low_priority.iter())
            .chain(self.info.iter())
    }
}
