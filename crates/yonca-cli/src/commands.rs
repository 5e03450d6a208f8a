//! Command handlers.

use std::path::Path;

use anyhow::{bail, Context as _, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::Serialize;
use yonca_core::{
    lint_rules_dir, parse_request, Catalog, CropContext, FarmType, RecommendationRequest,
    RecommendationResponse, Region, SoilData, UrgencyLevel, WeatherData,
};
use yonca_runtime::{LocalWeather, RuntimeConfig, WeatherService};

use crate::Format;

fn load_catalog(data_dir: &Path) -> Result<Catalog> {
    Catalog::load_dir(data_dir)
        .with_context(|| format!("Failed to load data directory {}", data_dir.display()))
}

/// Parse `--at`: RFC 3339, or a naive local `YYYY-MM-DDTHH:MM[:SS]`.
pub fn parse_at(value: &str) -> Result<DateTime<Local>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Local));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .with_context(|| format!("Invalid --at '{}': expected RFC 3339 or YYYY-MM-DDTHH:MM", value))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .with_context(|| format!("'{}' does not exist in the local timezone", value))
}

fn instant(at: Option<&str>) -> Result<DateTime<Local>> {
    at.map(parse_at).unwrap_or_else(|| Ok(Local::now()))
}

/// Read a request file, YAML if the extension says so, JSON otherwise.
pub fn load_request(path: &Path) -> Result<RecommendationRequest> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let value: serde_json::Value = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML in {}", path.display()))?,
        _ => serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON in {}", path.display()))?,
    };

    parse_request(value).with_context(|| format!("Invalid request in {}", path.display()))
}

fn print_value<T: Serialize>(value: &T, format: Format) -> Result<()> {
    match format {
        Format::Yaml => print!("{}", serde_yaml::to_string(value)?),
        Format::Json | Format::Text => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn print_response(response: &RecommendationResponse, format: Format) -> Result<()> {
    if format != Format::Text {
        return print_value(response, format);
    }

    println!("{}", response.summary_en);
    println!("{}", response.summary_az);

    for urgency in [
        UrgencyLevel::Critical,
        UrgencyLevel::High,
        UrgencyLevel::Medium,
        UrgencyLevel::Low,
        UrgencyLevel::Info,
    ] {
        let bucket = response.bucket(urgency);
        if bucket.is_empty() {
            continue;
        }
        println!("\n[{}]", urgency.as_str());
        for action in bucket {
            println!("  {:<14} {:>3}  {}", action.rule_id, action.urgency_score, action.message_en);
        }
    }

    if !response.daily_schedule.is_empty() {
        println!("\nSchedule:");
        for item in &response.daily_schedule {
            println!("  {}  {:<9} {}", item.time_slot, item.priority.as_str(), item.task_en);
        }
    }

    Ok(())
}

pub fn evaluate(data_dir: &Path, request: &Path, at: Option<&str>, format: Format) -> Result<()> {
    let now = instant(at)?;
    let request = load_request(request)?;
    let catalog = load_catalog(data_dir)?;

    let response = catalog.engine().evaluate_at(&request, now);
    print_response(&response, format)
}

/// Minimal readings for `yonca quick`.
#[derive(Debug, Clone)]
pub struct QuickInput {
    pub farm_type: FarmType,
    pub region: Region,
    pub temperature: f64,
    pub humidity: f64,
    pub crop: Option<(String, String)>,
    pub days_since_irrigation: u32,
    pub soil_moisture: f64,
}

impl QuickInput {
    pub fn to_request(&self, date: chrono::NaiveDate) -> RecommendationRequest {
        let mut request = RecommendationRequest::new(
            self.farm_type,
            self.region,
            date,
            WeatherData::new(self.temperature, self.humidity),
        );
        request.soil = Some(SoilData {
            soil_moisture: self.soil_moisture,
            soil_temperature: None,
            soil_type: None,
            ph: None,
        });
        request.crop_context = self.crop.as_ref().map(|(crop_type, stage)| CropContext {
            days_since_irrigation: self.days_since_irrigation,
            ..CropContext::new(crop_type.as_str(), stage.as_str())
        });
        request
    }
}

pub fn quick(data_dir: &Path, input: &QuickInput, at: Option<&str>, format: Format) -> Result<()> {
    let now = instant(at)?;
    let request = input.to_request(now.date_naive());
    let catalog = load_catalog(data_dir)?;

    let response = catalog.engine().evaluate_at(&request, now);
    print_response(&response, format)
}

pub fn rules_list(data_dir: &Path, farm_type: Option<FarmType>) -> Result<()> {
    let catalog = load_catalog(data_dir)?;
    let summaries = catalog
        .rules()
        .summaries()
        .into_iter()
        .filter(|s| farm_type.map_or(true, |f| s.farm_type == f));

    for summary in summaries {
        println!(
            "{:<14} {:<10} {:<20} {:<8} {}",
            summary.rule_id, summary.farm_type, summary.category, summary.priority, summary.name_en
        );
    }
    Ok(())
}

pub fn rules_search(data_dir: &Path, query: &str) -> Result<()> {
    let catalog = load_catalog(data_dir)?;
    let hits = catalog.rules().search(query);

    if hits.is_empty() {
        println!("No rules match '{}'", query);
        return Ok(());
    }

    for hit in &hits {
        println!(
            "{:<14} {}/{:<20} {}",
            hit.rule.rule_id, hit.farm_type, hit.category, hit.rule.name_en
        );
    }
    println!("\n{} rule(s)", hits.len());
    Ok(())
}

pub fn rules_stats(data_dir: &Path) -> Result<()> {
    let catalog = load_catalog(data_dir)?;
    let counts = catalog.rules().counts();

    for (farm_type, categories) in &counts.by_farm_type {
        println!("{} ({})", farm_type, counts.farm_total(*farm_type));
        for (category, count) in categories {
            println!("  {:<22} {}", category, count);
        }
    }
    println!("\nTotal: {}", counts.total);
    Ok(())
}

pub fn rules_show(data_dir: &Path, rule_id: &str) -> Result<()> {
    let catalog = load_catalog(data_dir)?;
    match catalog.rules().find(rule_id) {
        Some(rule) => print_value(&rule, Format::Json),
        None => bail!("Rule '{}' not found", rule_id),
    }
}

pub fn validate(data_dir: &Path) -> Result<()> {
    let reports = lint_rules_dir(data_dir)
        .with_context(|| format!("Failed to lint {}", data_dir.display()))?;

    if reports.is_empty() {
        println!("✅ All rule documents are valid");
        return Ok(());
    }

    for report in &reports {
        eprintln!("❌ {}", report.path.display());
        for error in &report.errors {
            eprintln!("   └─ {}", error);
        }
    }
    bail!("{} rule document(s) failed validation", reports.len())
}

fn print_weather(local: &LocalWeather) {
    let reading = &local.reading;
    println!(
        "{}, {}{}",
        local.location.city,
        local.location.country,
        if local.fallback { " (fallback)" } else { "" }
    );
    println!("  region:      {}", local.region);
    println!("  temperature: {}°C", reading.temperature);
    println!("  humidity:    {}%", reading.humidity);
    println!("  rainfall:    {} mm", reading.rainfall_last_24h);
    println!("  wind:        {} km/h", reading.wind_speed);
    if reading.frost_warning {
        println!("  ❄️ frost warning");
    }
}

pub async fn weather(
    data_dir: &Path,
    ip: Option<&str>,
    config: Option<&Path>,
    farm_type: Option<FarmType>,
    format: Format,
) -> Result<()> {
    let config = match config {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("Failed to load runtime config {}", path.display()))?,
        None => RuntimeConfig::default(),
    };

    let service = WeatherService::from_config(config)?;
    let local = service.auto_fetch(ip).await?;

    match format {
        Format::Text => print_weather(&local),
        _ => print_value(&local, format)?,
    }

    if let Some(farm_type) = farm_type {
        let catalog = load_catalog(data_dir)?;
        let now = Local::now();
        let response = catalog
            .engine()
            .evaluate_at(&local.request(farm_type, now.date_naive()), now);
        println!();
        print_response(&response, format)?;
    }

    Ok(())
}

pub fn farms(data_dir: &Path) -> Result<()> {
    let catalog = load_catalog(data_dir)?;
    let counts = catalog.rules().counts();

    for farm_type in FarmType::ALL {
        println!(
            "{:<10} {} / {} ({} rules)",
            farm_type,
            farm_type.name_az(),
            farm_type.name_en(),
            counts.farm_total(farm_type)
        );
        println!("           {}", farm_type.description_az());
    }
    Ok(())
}

pub fn profile(data_dir: &Path, farm_type: FarmType, scenarios: bool) -> Result<()> {
    let catalog = load_catalog(data_dir)?;
    let Some(profile) = catalog.profile(farm_type) else {
        bail!("No profile for farm type '{}'", farm_type);
    };

    if scenarios {
        print_value(&profile.synthetic_scenarios, Format::Json)
    } else {
        print_value(profile, Format::Json)
    }
}

pub fn constants(data_dir: &Path, table: Option<&str>) -> Result<()> {
    let catalog = load_catalog(data_dir)?;
    let constants = catalog.constants();

    match table {
        None => print_value(constants, Format::Json),
        Some(name) => match constants.table(name) {
            Some(value) => print_value(value, Format::Json),
            None => bail!("Unknown or missing constants table '{}' (stages, regions, thresholds)", name),
        },
    }
}
