//! The loaded rule set: farm type → ordered categories → ordered rules.
//!
//! A `RuleSet` is built once and then shared read-only (usually behind an
//! `Arc`) by every evaluation. Category and rule order is preserved from the
//! source documents because ties in urgency score keep evaluation order.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use super::parser::{Rule, RuleDocument, RuleError};
use crate::types::FarmType;

/// Rule categories per farm type, in evaluation order.
pub const FARM_RULE_CATEGORIES: [(FarmType, &[&str]); 5] = [
    (FarmType::Wheat, &["irrigation", "fertilization", "pest_disease", "harvest"]),
    (FarmType::Livestock, &["disease_risk", "feeding", "veterinary"]),
    (FarmType::Orchard, &["irrigation", "fertilization", "pruning", "pest_disease"]),
    (FarmType::Vegetable, &["irrigation", "fertilization", "greenhouse", "pest_disease"]),
    (FarmType::Mixed, &["integration", "resource_allocation", "daily_coordination"]),
];

/// Rule categories configured for `farm_type`.
pub fn categories_for(farm_type: FarmType) -> &'static [&'static str] {
    FARM_RULE_CATEGORIES
        .iter()
        .find(|(farm, _)| *farm == farm_type)
        .map(|(_, categories)| *categories)
        .unwrap_or(&[])
}

/// One category of rules for a farm type.
#[derive(Debug, Clone, Serialize)]
pub struct RuleCategory {
    pub name: String,
    pub rules: Vec<Rule>,
}

/// A rule together with where it lives in the set.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RuleRef<'a> {
    pub farm_type: FarmType,
    pub category: &'a str,
    #[serde(flatten)]
    pub rule: &'a Rule,
}

/// Listing entry for a rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSummary {
    pub rule_id: String,
    pub name_az: String,
    pub name_en: String,
    pub priority: String,
    pub category: String,
    pub farm_type: FarmType,
}

impl From<RuleRef<'_>> for RuleSummary {
    fn from(r: RuleRef<'_>) -> Self {
        Self {
            rule_id: r.rule.rule_id.clone(),
            name_az: r.rule.name_az.clone(),
            name_en: r.rule.name_en.clone(),
            priority: r.rule.priority.clone(),
            category: r.category.to_string(),
            farm_type: r.farm_type,
        }
    }
}

/// Rule counts per farm type and category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleCounts {
    pub by_farm_type: BTreeMap<FarmType, BTreeMap<String, usize>>,
    pub total: usize,
}

impl RuleCounts {
    /// Total rules for one farm type.
    pub fn farm_total(&self, farm_type: FarmType) -> usize {
        self.by_farm_type
            .get(&farm_type)
            .map(|categories| categories.values().sum())
            .unwrap_or(0)
    }
}

/// Immutable rule set shared across evaluations.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    farms: BTreeMap<FarmType, Vec<RuleCategory>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category, replacing any existing category with the same name.
    pub fn insert_category(&mut self, farm_type: FarmType, name: impl Into<String>, rules: Vec<Rule>) {
        let name = name.into();
        let categories = self.farms.entry(farm_type).or_default();
        match categories.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.rules = rules,
            None => categories.push(RuleCategory { name, rules }),
        }
    }

    /// Builder-style [`insert_category`](Self::insert_category).
    pub fn with_category(mut self, farm_type: FarmType, name: impl Into<String>, rules: Vec<Rule>) -> Self {
        self.insert_category(farm_type, name, rules);
        self
    }

    /// Load `<dir>/<farm_type>/<category>.json` for every configured category.
    ///
    /// Missing files are skipped; unreadable or malformed files are errors.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, RuleError> {
        let dir = dir.as_ref();
        let mut set = RuleSet::new();

        for (farm_type, categories) in FARM_RULE_CATEGORIES {
            for category in categories {
                let path = dir.join(farm_type.as_str()).join(format!("{}.json", category));
                if !path.exists() {
                    tracing::debug!(path = %path.display(), "Rule file not found, skipping");
                    continue;
                }

                let document = RuleDocument::from_json_file(&path).map_err(|e| {
                    tracing::error!(path = %path.display(), error = %e, "Failed to load rule file");
                    e
                })?;
                set.insert_category(farm_type, *category, document.rules);
            }
        }

        tracing::info!(total = set.len(), "Rule set loaded");
        Ok(set)
    }

    /// Categories of a farm type, in evaluation order.
    pub fn categories(&self, farm_type: FarmType) -> &[RuleCategory] {
        self.farms.get(&farm_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn category(&self, farm_type: FarmType, name: &str) -> Option<&RuleCategory> {
        self.categories(farm_type).iter().find(|c| c.name == name)
    }

    /// Farm types that have at least one category loaded.
    pub fn farm_types(&self) -> impl Iterator<Item = FarmType> + '_ {
        self.farms.keys().copied()
    }

    /// Every rule of a farm type in evaluation order.
    pub fn rules_for(&self, farm_type: FarmType) -> impl Iterator<Item = RuleRef<'_>> {
        self.categories(farm_type).iter().flat_map(move |category| {
            category.rules.iter().map(move |rule| RuleRef {
                farm_type,
                category: &category.name,
                rule,
            })
        })
    }

    /// Every rule in the set.
    pub fn iter(&self) -> impl Iterator<Item = RuleRef<'_>> {
        self.farms.keys().flat_map(move |farm_type| self.rules_for(*farm_type))
    }

    pub fn len(&self) -> usize {
        self.farms
            .values()
            .flat_map(|categories| categories.iter())
            .map(|c| c.rules.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All non-empty rule ids.
    pub fn rule_ids(&self) -> Vec<&str> {
        self.iter()
            .map(|r| r.rule.rule_id.as_str())
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// First rule with the given id.
    pub fn find(&self, rule_id: &str) -> Option<RuleRef<'_>> {
        self.iter().find(|r| r.rule.rule_id == rule_id)
    }

    pub fn counts(&self) -> RuleCounts {
        let mut counts = RuleCounts::default();
        for (farm_type, categories) in &self.farms {
            let per_category = counts.by_farm_type.entry(*farm_type).or_default();
            for category in categories {
                per_category.insert(category.name.clone(), category.rules.len());
                counts.total += category.rules.len();
            }
        }
        counts
    }

    /// Rules whose id, names or messages contain `keyword` (case-insensitive).
    pub fn search(&self, keyword: &str) -> Vec<RuleRef<'_>> {
        self.iter().filter(|r| r.rule.mentions(keyword)).collect()
    }

    pub fn summaries(&self) -> Vec<RuleSummary> {
        self.iter().map(RuleSummary::from).collect()
    }
}
