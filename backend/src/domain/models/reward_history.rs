use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::RewardHistoryKind;

/// Append-only audit record for a reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardHistoryEvent {
    pub id: String,
    pub reward_id: String,
    pub child_id: String,
    pub kind: RewardHistoryKind,
    /// Points earned in the reward window when this record was written
    pub stars_earned: i64,
    pub timestamp: DateTime<Utc>,
}

impl RewardHistoryEvent {
    pub fn new(
        reward_id: &str,
        child_id: &str,
        kind: RewardHistoryKind,
        stars_earned: i64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("reward_history::{}", uuid::Uuid::new_v4()),
            reward_id: reward_id.to_string(),
            child_id: child_id.to_string(),
            kind,
            stars_earned,
            timestamp,
        }
    }
}

/// Convert to string for CSV storage
pub fn kind_to_str(kind: RewardHistoryKind) -> &'static str {
    match kind {
        RewardHistoryKind::Earned => "earned",
        RewardHistoryKind::Given => "given",
        RewardHistoryKind::Expired => "expired",
    }
}

/// Parse from string for CSV loading
pub fn kind_from_str(s: &str) -> Result<RewardHistoryKind, String> {
    match s.to_lowercase().as_str() {
        "earned" => Ok(RewardHistoryKind::Earned),
        "given" | "redeemed" => Ok(RewardHistoryKind::Given),
        "expired" => Ok(RewardHistoryKind::Expired),
        _ => Err(format!("Invalid reward history kind: {}", s)),
    }
}
