//! Wire-facing types shared between the Tiny Wins backend and any front end.
//!
//! Everything here is plain serde data. Timestamps are RFC 3339 strings so
//! front ends never need to agree on a date library with the backend.

use serde::{Deserialize, Serialize};

/// Represents a child whose moments are tracked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub name: String,
    /// Display color (e.g. "#FFB347")
    pub color_tag: String,
    /// Running sum of all points applied by logged moments
    pub total_points: i64,
    pub is_archived: bool,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

/// A configured kind of moment a parent can log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorType {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Signed point value (positive = desirable, negative = undesirable)
    pub points: i32,
}

/// A single logged moment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorEvent {
    pub id: String,
    pub child_id: String,
    pub behavior_type_id: String,
    pub timestamp: String, // RFC 3339 timestamp
    /// Points captured when the moment was logged
    pub points_applied: i32,
    pub note: Option<String>,
}

/// Lifecycle state of a reward, always derived on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardStatus {
    /// Below target and before the deadline
    Active,
    /// Target reached, waiting for a parent to hand it over
    ReadyToRedeem,
    /// Handed over (terminal)
    Redeemed,
    /// Deadline passed without redemption
    Expired,
}

/// A reward with its current progress, ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardSummary {
    pub id: String,
    pub child_id: String,
    pub name: String,
    pub target_points: i32,
    /// 0 = primary (actively accruing), higher = queued
    pub priority: u32,
    /// Progress within the reward window, floored at zero
    pub earned_points: i64,
    /// Points still needed to reach the target (never negative)
    pub points_remaining: i64,
    /// Progress as a fraction in [0.0, 1.0]
    pub progress_fraction: f64,
    pub status: RewardStatus,
    pub deadline: Option<String>, // RFC 3339 timestamp
    pub auto_reset_on_expire: bool,
}

/// Kind of entry in a reward's audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardHistoryKind {
    Earned,
    Given,
    Expired,
}

/// Single entry in a reward's append-only audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardHistoryEntry {
    pub id: String,
    pub reward_id: String,
    pub kind: RewardHistoryKind,
    pub stars_earned: i64,
    pub timestamp: String, // RFC 3339 timestamp
}

/// What a celebration is about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CelebrationKind {
    GoalReached {
        reward_id: String,
        reward_name: String,
        target_points: i32,
    },
    MilestoneCrossed {
        reward_id: String,
        reward_name: String,
        percent: u8,
    },
    GoldStarDay {
        positive_moments: usize,
    },
    PatternFound {
        behavior_type_id: String,
        occurrences: usize,
        message: String,
    },
}

/// A celebration emitted by a single logged moment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Celebration {
    /// Id of the moment that triggered this celebration
    pub event_id: String,
    pub child_id: String,
    pub kind: CelebrationKind,
}

/// Everything a child's home screen needs in one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildDashboard {
    pub child: Child,
    pub active_reward: Option<RewardSummary>,
    pub queued_rewards: Vec<RewardSummary>,
    /// Positive moments logged for the child on the current calendar day
    pub positive_moments_today: usize,
    pub gold_star_threshold: usize,
}

/// Result of logging a moment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMomentResponse {
    pub event: BehaviorEvent,
    pub child_total_points: i64,
    pub active_reward: Option<RewardSummary>,
    pub celebrations: Vec<Celebration>,
}

/// Result of redeeming a reward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemRewardResponse {
    pub reward: RewardSummary,
    /// The reward promoted to primary, if any
    pub promoted: Option<RewardSummary>,
    /// True when the reward had already been redeemed and nothing changed
    pub already_redeemed: bool,
}
