//! Rule matching and recommendation construction.

use crate::context::Context;
use crate::rules::Rule;
use crate::template;
use crate::types::RecommendationAction;

/// Context keys checked against a rule's `applicable_to` list.
const APPLICABILITY_KEYS: [&str; 2] = ["crop_context.crop_type", "livestock_context.animal_type"];

/// Whether `rule` may apply to the crop or animal described by `ctx`.
///
/// A rule without an allow-list applies everywhere. With one, every crop or
/// animal type present in the context must be listed.
pub fn is_applicable(rule: &Rule, ctx: &Context) -> bool {
    let allowed = match rule.applicable_to.as_deref() {
        Some(allowed) if !allowed.is_empty() => allowed,
        _ => return true,
    };

    APPLICABILITY_KEYS.iter().all(|key| match ctx.get(key) {
        Some(value) if value.is_truthy() => allowed.iter().any(|a| a == &value.to_string()),
        _ => true,
    })
}

/// Build the recommendation for a matched rule.
pub fn build_action(rule: &Rule, ctx: &Context, category: &str) -> RecommendationAction {
    let action = &rule.action;

    RecommendationAction {
        rule_id: rule.rule_id.clone(),
        name_az: rule.name_az.clone(),
        name_en: rule.name_en.clone(),
        category: category.to_string(),
        urgency: action.urgency_level(),
        urgency_score: action.score(),
        message_az: template::render(&rule.message_az, ctx).into_owned(),
        message_en: template::render(&rule.message_en, ctx).into_owned(),
        action_type: action.action_type().to_string(),
        action_details: action.to_json(),
        timing_az: action.timing_az.clone(),
    }
}

/// Match one rule against the context.
///
/// Returns `None` for disabled, inapplicable or non-matching rules, and for
/// rules without an id (logged, never fatal).
pub fn match_rule(rule: &Rule, ctx: &Context, category: &str) -> Option<RecommendationAction> {
    if !rule.enabled {
        return None;
    }

    if rule.rule_id.trim().is_empty() {
        tracing::warn!(category, "Skipping rule without rule_id");
        return None;
    }

    if !is_applicable(rule, ctx) {
        tracing::debug!(rule_id = %rule.rule_id, "Rule not applicable to this crop or animal");
        return None;
    }

    if !rule.conditions.evaluate(ctx) {
        return None;
    }

    tracing::debug!(rule_id = %rule.rule_id, category, "Rule matched");
    Some(build_action(rule, ctx, category))
}
