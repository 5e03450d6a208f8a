//! Data directory loading: rules, constants and farm profiles.
//!
//! A catalog directory looks like:
//!
//! ```text
//! data/
//!   rules/<farm_type>/<category>.json
//!   constants/{stages,regions,thresholds}.json
//!   profiles/<farm_type>_profile.json
//! ```
//!
//! Everything is loaded once into an immutable [`Catalog`]. Missing files are
//! skipped; files that exist but do not parse are errors.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::engine::RuleEngine;
use crate::rules::{categories_for, RuleDocument, RuleError, RuleSet};
use crate::schema::validate_rule_document_schema;
use crate::types::FarmType;

/// Errors from loading a catalog directory.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Data directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to load rules: {0}")]
    Rules(#[from] RuleError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, CatalogError> {
    let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_optional_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, CatalogError> {
    if path.exists() {
        read_json(path).map(Some)
    } else {
        tracing::debug!(path = %path.display(), "Optional data file not found");
        Ok(None)
    }
}

/// Reference tables: growth stages, regions and agronomic thresholds.
///
/// Kept as opaque JSON; rules embed the values they need.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constants {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<JsonValue>,
}

impl Constants {
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        Ok(Self {
            stages: read_optional_json(&dir.join("stages.json"))?,
            regions: read_optional_json(&dir.join("regions.json"))?,
            thresholds: read_optional_json(&dir.join("thresholds.json"))?,
        })
    }

    /// Look up a table by name (`stages`, `regions`, `thresholds`).
    pub fn table(&self, name: &str) -> Option<&JsonValue> {
        match name {
            "stages" => self.stages.as_ref(),
            "regions" => self.regions.as_ref(),
            "thresholds" => self.thresholds.as_ref(),
            _ => None,
        }
    }

    /// Dotted lookup into the thresholds table, e.g. `wheat.irrigation.soil_moisture_min`.
    pub fn threshold(&self, path: &str) -> Option<&JsonValue> {
        path.split('.')
            .try_fold(self.thresholds.as_ref()?, |value, key| value.get(key))
    }
}

/// Descriptive profile of a farm type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmProfile {
    #[serde(default)]
    pub sub_types: Vec<String>,

    /// Request fields the farm type's rules rely on
    #[serde(default)]
    pub required_inputs: Vec<String>,

    #[serde(default)]
    pub rule_categories: Vec<JsonValue>,

    /// Named sample scenarios (request fragments)
    #[serde(default)]
    pub synthetic_scenarios: Map<String, JsonValue>,

    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl FarmProfile {
    pub fn scenario(&self, name: &str) -> Option<&JsonValue> {
        self.synthetic_scenarios.get(name)
    }
}

/// Lint findings for one rule file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LintReport {
    pub path: PathBuf,
    pub errors: Vec<String>,
}

/// Rules, constants and profiles loaded from a data directory.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
    rules: Arc<RuleSet>,
    constants: Constants,
    profiles: BTreeMap<FarmType, FarmProfile>,
}

impl Catalog {
    /// Load everything under `dir`.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let root = dir.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(CatalogError::NotFound(root));
        }

        let rules = RuleSet::load_dir(root.join("rules"))?;
        let constants = Constants::load_dir(root.join("constants"))?;

        let mut profiles = BTreeMap::new();
        for farm_type in FarmType::ALL {
            let path = root
                .join("profiles")
                .join(format!("{}_profile.json", farm_type.as_str()));
            if let Some(profile) = read_optional_json::<FarmProfile>(&path)? {
                profiles.insert(farm_type, profile);
            }
        }

        tracing::info!(
            root = %root.display(),
            rules = rules.len(),
            profiles = profiles.len(),
            "Catalog loaded"
        );

        Ok(Self {
            root,
            rules: Arc::new(rules),
            constants,
            profiles,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    pub fn profile(&self, farm_type: FarmType) -> Option<&FarmProfile> {
        self.profiles.get(&farm_type)
    }

    pub fn profiles(&self) -> impl Iterator<Item = (FarmType, &FarmProfile)> {
        self.profiles.iter().map(|(farm_type, profile)| (*farm_type, profile))
    }

    /// An engine sharing this catalog's rule set.
    pub fn engine(&self) -> RuleEngine {
        RuleEngine::new(Arc::clone(&self.rules))
    }
}

/// Lint every configured rule file under `<dir>/rules` against the rule schema.
///
/// Only files with findings are reported. Unparseable JSON is a finding too.
pub fn lint_rules_dir(dir: impl AsRef<Path>) -> Result<Vec<LintReport>, CatalogError> {
    let rules_dir = dir.as_ref().join("rules");
    if !rules_dir.is_dir() {
        return Err(CatalogError::NotFound(rules_dir));
    }

    let mut reports = Vec::new();
    for farm_type in FarmType::ALL {
        for category in categories_for(farm_type) {
            let path = rules_dir
                .join(farm_type.as_str())
                .join(format!("{}.json", category));
            if !path.exists() {
                continue;
            }

            let errors = match read_json::<JsonValue>(&path) {
                Ok(value) => lint_document(&value),
                Err(CatalogError::Parse { source, .. }) => vec![format!("Invalid JSON: {}", source)],
                Err(e) => return Err(e),
            };

            if !errors.is_empty() {
                reports.push(LintReport { path, errors });
            }
        }
    }

    Ok(reports)
}

/// Schema findings plus the loader's own structural checks.
fn lint_document(value: &JsonValue) -> Vec<String> {
    let mut errors = validate_rule_document_schema(value).err().unwrap_or_default();

    if let Err(e) = RuleDocument::from_value(value.clone()) {
        errors.push(e.to_string());
    }

    errors
}
