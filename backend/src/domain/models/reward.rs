use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A goal a child accrues points toward.
///
/// Only `is_redeemed` and `priority` are true persisted state; the lifecycle
/// status is derived from the event log on every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub child_id: String,
    pub name: String,
    pub target_points: i32,
    /// 0 = primary (actively accruing), higher = queued
    pub priority: u32,
    pub is_redeemed: bool,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub auto_reset_on_expire: bool,
    pub created_at: DateTime<Utc>,
    /// Set by a soft reset; replaces `created_at` as the window start
    pub reset_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Reward {
    pub fn generate_id() -> String {
        format!("reward::{}", uuid::Uuid::new_v4())
    }

    pub fn is_primary(&self) -> bool {
        self.priority == 0
    }

    /// Effective start of the accrual window.
    pub fn window_start(&self) -> DateTime<Utc> {
        self.reset_at.unwrap_or(self.created_at)
    }

    /// End of the accrual window: the earlier of the deadline and `now`.
    pub fn window_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.deadline {
            Some(deadline) => deadline.min(now),
            None => now,
        }
    }

    pub fn is_in_window(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        timestamp >= self.window_start() && timestamp <= self.window_end(now)
    }

    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now > deadline)
    }

    /// Neither redeemed nor expired.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        !self.is_redeemed && !self.is_past_deadline(now)
    }

    /// Reinitialise the accrual window at `now`, keeping identity and target.
    ///
    /// The deadline moves forward by the original window length.
    pub fn soft_reset(&mut self, now: DateTime<Utc>) {
        if let Some(deadline) = self.deadline {
            let window = (deadline - self.window_start()).max(Duration::zero());
            self.deadline = Some(now + window);
        }
        self.reset_at = Some(now);
        self.is_redeemed = false;
        self.redeemed_at = None;
        self.updated_at = now;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RewardValidationError {
    #[error("Reward name cannot be empty")]
    EmptyName,
    #[error("Reward name cannot exceed {0} characters")]
    NameTooLong(usize),
    #[error("Target points must be positive")]
    NonPositiveTarget,
    #[error("Deadline must be in the future")]
    DeadlineInPast,
    #[error("Reward order must list every open reward exactly once")]
    InvalidOrder,
}
