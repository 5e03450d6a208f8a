//! Ranking and urgency bucketing.

use crate::types::{RecommendationAction, RecommendationResponse};

/// Sort by urgency score, highest first. Ties keep evaluation order.
pub fn rank(actions: &mut [RecommendationAction]) {
    actions.sort_by(|a, b| b.urgency_score.cmp(&a.urgency_score));
}

/// Move ranked actions into the response's urgency buckets.
///
/// Relative order is preserved inside each bucket.
pub fn group(ranked: Vec<RecommendationAction>, response: &mut RecommendationResponse) {
    for action in ranked {
        response.bucket_mut(action.urgency).push(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FarmType, RecommendationRequest, Region, UrgencyLevel, WeatherData};
    use chrono::{Local, NaiveDate};

    fn action(id: &str, urgency: UrgencyLevel, score: i64) -> RecommendationAction {
        RecommendationAction {
            rule_id: id.to_string(),
            name_az: String::new(),
            name_en: String::new(),
            category: "test".to_string(),
            urgency,
            urgency_score: score,
            message_az: String::new(),
            message_en: String::new(),
            action_type: "info".to_string(),
            action_details: None,
            timing_az: None,
        }
    }

    fn ids(actions: &[RecommendationAction]) -> Vec<&str> {
        actions.iter().map(|a| a.rule_id.as_str()).collect()
    }

    #[test]
    fn test_rank_descending_and_stable() {
        let mut actions = vec![
            action("a", UrgencyLevel::Low, 20),
            action("b", UrgencyLevel::High, 80),
            action("c", UrgencyLevel::Medium, 50),
            action("d", UrgencyLevel::High, 80),
        ];
        rank(&mut actions);
        assert_eq!(ids(&actions), vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_group_into_buckets() {
        let request = RecommendationRequest::new(
            FarmType::Wheat,
            Region::Aran,
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            WeatherData::new(25.0, 50.0),
        );
        let mut response = RecommendationResponse::empty(&request, Local::now());

        let mut actions = vec![
            action("m1", UrgencyLevel::Medium, 40),
            action("c1", UrgencyLevel::Critical, 95),
            action("m2", UrgencyLevel::Medium, 60),
            action("i1", UrgencyLevel::Info, 10),
        ];
        rank(&mut actions);
        group(actions, &mut response);

        assert_eq!(ids(&response.critical_alerts), vec!["c1"]);
        assert_eq!(ids(&response.medium_priority), vec!["m2", "m1"]);
        assert_eq!(ids(&response.info), vec!["i1"]);
        assert!(response.high_priority.is_empty());
        assert!(response.low_priority.is_empty());
    }

    #[test]
    fn test_label_and_score_are_independent() {
        let mut actions = vec![
            action("low_but_urgent", UrgencyLevel::Low, 99),
            action("critical_but_low_score", UrgencyLevel::Critical, 5),
        ];
        rank(&mut actions);
        assert_eq!(ids(&actions), vec!["low_but_urgent", "critical_but_low_score"]);
    }
}
