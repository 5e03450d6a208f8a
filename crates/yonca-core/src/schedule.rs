//! Daily schedule generation.
//!
//! The top-ranked recommendations are placed into fixed two-hour windows by
//! action type. The result is ordered by the window label string.

use serde::{Deserialize, Serialize};

use crate::types::{DailyScheduleItem, RecommendationAction, SchedulePriority};

/// Default number of recommendations placed on the schedule.
pub const DEFAULT_MAX_ITEMS: usize = 10;

/// A fixed window of the working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    EarlyMorning,
    Morning,
    LateMorning,
    Midday,
    Afternoon,
    Evening,
    Night,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 7] = [
        TimeSlot::EarlyMorning,
        TimeSlot::Morning,
        TimeSlot::LateMorning,
        TimeSlot::Midday,
        TimeSlot::Afternoon,
        TimeSlot::Evening,
        TimeSlot::Night,
    ];

    /// Slot key, e.g. `early_morning`.
    pub fn key(&self) -> &'static str {
        match self {
            TimeSlot::EarlyMorning => "early_morning",
            TimeSlot::Morning => "morning",
            TimeSlot::LateMorning => "late_morning",
            TimeSlot::Midday => "midday",
            TimeSlot::Afternoon => "afternoon",
            TimeSlot::Evening => "evening",
            TimeSlot::Night => "night",
        }
    }

    /// Window label, e.g. `05:00-07:00`.
    pub fn window(&self) -> &'static str {
        match self {
            TimeSlot::EarlyMorning => "05:00-07:00",
            TimeSlot::Morning => "07:00-10:00",
            TimeSlot::LateMorning => "10:00-12:00",
            TimeSlot::Midday => "12:00-15:00",
            TimeSlot::Afternoon => "15:00-17:00",
            TimeSlot::Evening => "17:00-19:00",
            TimeSlot::Night => "19:00-21:00",
        }
    }

    /// Slot for an action type. Unlisted types go to the morning.
    pub fn for_action(action_type: &str) -> Self {
        match action_type {
            "irrigate" | "apply_insecticide" | "feeding_recommendation" => TimeSlot::EarlyMorning,
            "harvest" => TimeSlot::LateMorning,
            "emergency_cooling" => TimeSlot::Midday,
            // fertilize, apply_fungicide, prune, vaccination_reminder,
            // vet_checkup_reminder, monitor
            _ => TimeSlot::Morning,
        }
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.window())
    }
}

/// Builds the daily schedule from ranked recommendations.
#[derive(Debug, Clone)]
pub struct Scheduler {
    max_items: usize,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
        }
    }

    pub fn with_max_items(max_items: usize) -> Self {
        Self { max_items }
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Schedule the first `max_items` of `ranked`.
    ///
    /// Items are sorted (stably) by window label as a string.
    pub fn schedule(&self, ranked: &[RecommendationAction]) -> Vec<DailyScheduleItem> {
        let mut items: Vec<DailyScheduleItem> = ranked
            .iter()
            .take(self.max_items)
            .map(|rec| DailyScheduleItem {
                time_slot: TimeSlot::for_action(&rec.action_type).window().to_string(),
                task_az: rec.name_az.clone(),
                task_en: rec.name_en.clone(),
                priority: SchedulePriority::for_urgency(rec.urgency),
                related_rule_id: Some(rec.rule_id.clone()),
                urgency_score: rec.urgency_score,
            })
            .collect();

        items.sort_by(|a, b| a.time_slot.cmp(&b.time_slot));
        items
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
