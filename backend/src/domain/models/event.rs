//! Domain model for a logged moment.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::behavior::BehaviorType;

/// A single timestamped observation logged against a child.
///
/// `points_applied` is a snapshot of the behavior type's points at logging
/// time. Storage offers no update path for events, so editing a behavior type
/// later never rewrites history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorEvent {
    pub id: String,
    pub child_id: String,
    pub behavior_type_id: String,
    pub timestamp: DateTime<Utc>,
    pub points_applied: i32,
    pub note: Option<String>,
}

impl BehaviorEvent {
    pub fn generate_id() -> String {
        format!("event::{}", uuid::Uuid::new_v4())
    }

    /// Record a new moment for `child_id`, capturing the behavior's current points.
    pub fn record(
        child_id: &str,
        behavior: &BehaviorType,
        timestamp: DateTime<Utc>,
        note: Option<String>,
    ) -> Self {
        let note = note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Self {
            id: Self::generate_id(),
            child_id: child_id.to_string(),
            behavior_type_id: behavior.id.clone(),
            timestamp,
            points_applied: behavior.points,
            note,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.points_applied > 0
    }

    /// Calendar day of this moment as seen from `offset`.
    pub fn calendar_day(&self, offset: &FixedOffset) -> NaiveDate {
        self.timestamp.with_timezone(offset).date_naive()
    }
}
