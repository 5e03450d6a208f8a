//! The rule engine: context → matches → ranking → schedule → summary.

use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::action::match_rule;
use crate::context::build_context;
use crate::ranking::{group, rank};
use crate::rules::RuleSet;
use crate::schedule::Scheduler;
use crate::summary::summarize;
use crate::types::{RecommendationRequest, RecommendationResponse};

/// Evaluates requests against a shared, immutable rule set.
///
/// Cloning is cheap; clones share the same rule set.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Arc<RuleSet>,
    scheduler: Scheduler,
}

impl RuleEngine {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self {
            rules,
            scheduler: Scheduler::default(),
        }
    }

    /// Use a custom scheduler (e.g., a different item limit).
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    /// Evaluate `request` at the current local time.
    pub fn evaluate(&self, request: &RecommendationRequest) -> RecommendationResponse {
        self.evaluate_at(request, Local::now())
    }

    /// Evaluate `request` as if it were `now`.
    ///
    /// `now` drives the derived `time_of_day` and stamps `generated_at`.
    pub fn evaluate_at(&self, request: &RecommendationRequest, now: DateTime<Local>) -> RecommendationResponse {
        let span = tracing::info_span!(
            "evaluate",
            farm_type = request.farm_type.as_str(),
            region = request.region.as_str()
        );
        let _guard = span.enter();

        let ctx = build_context(request, &now);

        let mut matched: Vec<_> = self
            .rules
            .rules_for(request.farm_type)
            .filter_map(|r| match_rule(r.rule, &ctx, r.category))
            .collect();

        rank(&mut matched);

        let mut response = RecommendationResponse::empty(request, now);
        response.total_recommendations = matched.len();
        response.daily_schedule = self.scheduler.schedule(&matched);
        group(matched, &mut response);

        let summary = summarize(&response);
        response.summary_az = summary.az;
        response.summary_en = summary.en;

        tracing::debug!(
            total = response.total_recommendations,
            critical = response.critical_alerts.len(),
            scheduled = response.daily_schedule.len(),
            "Evaluation complete"
        );

        response
    }
}

impl From<RuleSet> for RuleEngine {
    fn from(rules: RuleSet) -> Self {
        Self::new(Arc::new(rules))
    }
}
