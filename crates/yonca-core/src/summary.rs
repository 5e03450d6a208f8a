//! Bilingual status line for a response.

use crate::types::RecommendationResponse;

/// Summary texts in Azerbaijani and English.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub az: String,
    pub en: String,
}

/// Derive the summary from bucket counts.
///
/// Critical alerts take precedence, then high-priority work, then any
/// recommendation at all. `total` counts every bucket, info included.
pub fn summarize(response: &RecommendationResponse) -> Summary {
    let critical = response.critical_alerts.len();
    let high = response.high_priority.len();
    let medium = response.medium_priority.len();
    let total = response.all_recommendations().count();

    if critical > 0 {
        Summary {
            az: format!(
                "⚠️ DİQQƏT: {} kritik xəbərdarlıq var! Dərhal müdaxilə lazımdır. Ümumi {} tövsiyə.",
                critical, total
            ),
            en: format!(
                "⚠️ ATTENTION: {} critical alerts! Immediate action required. Total {} recommendations.",
                critical, total
            ),
        }
    } else if high > 0 {
        Summary {
            az: format!(
                "📋 Bu gün {} yüksək prioritetli və {} orta prioritetli tapşırıq var.",
                high, medium
            ),
            en: format!(
                "📋 Today you have {} high priority and {} medium priority tasks.",
                high, medium
            ),
        }
    } else if total > 0 {
        Summary {
            az: format!("✅ Vəziyyət sabitdir. {} ümumi tövsiyə var.", total),
            en: format!("✅ Situation stable. {} total recommendations.", total),
        }
    } else {
        Summary {
            az: "✅ Heç bir xüsusi tövsiyə yoxdur. Hər şey qaydasındadır.".to_string(),
            en: "✅ No special recommendations. Everything is in order.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        FarmType, RecommendationAction, RecommendationRequest, Region, UrgencyLevel, WeatherData,
    };
    use chrono::{Local, NaiveDate};

    fn response_with(urgencies: &[UrgencyLevel]) -> RecommendationResponse {
        let request = RecommendationRequest::new(
            FarmType::Livestock,
            Region::Lankaran,
            NaiveDate::from_ymd_opt(2025, 7, 14).unwrap(),
            WeatherData::new(30.0, 70.0),
        );
        let mut response = RecommendationResponse::empty(&request, Local::now());
        for (i, urgency) in urgencies.iter().enumerate() {
            response.bucket_mut(*urgency).push(RecommendationAction {
                rule_id: format!("R{}", i),
                name_az: String::new(),
                name_en: String::new(),
                category: "feeding".to_string(),
                urgency: *urgency,
                urgency_score: 50,
                message_az: String::new(),
                message_en: String::new(),
                action_type: "info".to_string(),
                action_details: None,
                timing_az: None,
            });
        }
        response
    }

    #[test]
    fn test_critical_summary() {
        let summary = summarize(&response_with(&[
            UrgencyLevel::Critical,
            UrgencyLevel::High,
            UrgencyLevel::Info,
        ]));
        assert_eq!(
            summary.en,
            "⚠️ ATTENTION: 1 critical alerts! Immediate action required. Total 3 recommendations."
        );
        assert_eq!(
            summary.az,
            "⚠️ DİQQƏT: 1 kritik xəbərdarlıq var! Dərhal müdaxilə lazımdır. Ümumi 3 tövsiyə."
        );
    }

    #[test]
    fn test_high_summary() {
        let summary = summarize(&response_with(&[
            UrgencyLevel::High,
            UrgencyLevel::Medium,
            UrgencyLevel::Medium,
        ]));
        assert_eq!(summary.en, "📋 Today you have 1 high priority and 2 medium priority tasks.");
        assert_eq!(
            summary.az,
            "📋 Bu gün 1 yüksək prioritetli və 2 orta prioritetli tapşırıq var."
        );
    }

    #[test]
    fn test_stable_summary_counts_info() {
        let summary = summarize(&response_with(&[UrgencyLevel::Low, UrgencyLevel::Info]));
        assert_eq!(summary.en, "✅ Situation stable. 2 total recommendations.");

        let info_only = summarize(&response_with(&[UrgencyLevel::Info]));
        assert_eq!(info_only.az, "✅ Vəziyyət sabitdir. 1 ümumi tövsiyə var.");
    }

    #[test]
    fn test_nothing_to_report() {
        let summary = summarize(&response_with(&[]));
        assert_eq!(summary.az, "✅ Heç bir xüsusi tövsiyə yoxdur. Hər şey qaydasındadır.");
        assert_eq!(summary.en, "✅ No special recommendations. Everything is in order.");
    }
}
