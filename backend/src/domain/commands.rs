//! Command and result types for the domain services.
//!
//! Commands carry raw input from a front end; results carry domain models
//! back. Mapping to wire DTOs happens in the io layer.

pub mod child {
    use crate::domain::models::child::Child;

    #[derive(Debug, Clone)]
    pub struct CreateChildCommand {
        pub name: String,
        pub color_tag: String,
    }

    #[derive(Debug, Clone)]
    pub struct CreateChildResult {
        pub child: Child,
    }

    /// How a delete request was carried out
    #[derive(Debug, Clone, PartialEq)]
    pub enum DeleteChildResult {
        /// No history referenced the child, so it was removed
        Deleted,
        /// History exists, so the child was archived instead
        Archived(Child),
    }
}

pub mod behavior {
    use chrono::{DateTime, Utc};
    use shared::Celebration;

    use super::reward::RewardSnapshot;
    use crate::domain::models::behavior::BehaviorType;
    use crate::domain::models::child::Child;
    use crate::domain::models::event::BehaviorEvent;

    #[derive(Debug, Clone)]
    pub struct CreateBehaviorTypeCommand {
        pub name: String,
        pub category: String,
        pub points: i32,
    }

    #[derive(Debug, Clone, Default)]
    pub struct UpdateBehaviorTypeCommand {
        pub behavior_type_id: String,
        pub name: Option<String>,
        pub category: Option<String>,
        pub points: Option<i32>,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateBehaviorTypeResult {
        pub behavior: BehaviorType,
    }

    /// Log a moment for a child
    #[derive(Debug, Clone)]
    pub struct LogBehaviorCommand {
        pub child_id: String,
        pub behavior_type_id: String,
        /// Defaults to "now" when absent
        pub timestamp: Option<DateTime<Utc>>,
        pub note: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct LogBehaviorResult {
        pub event: BehaviorEvent,
        /// Child after the running total was updated
        pub child: Child,
        /// Primary reward state after the moment was applied
        pub active_reward: Option<RewardSnapshot>,
        pub celebrations: Vec<Celebration>,
    }
}

pub mod reward {
    use chrono::{DateTime, Utc};
    use shared::RewardStatus;

    use crate::domain::models::event::BehaviorEvent;
    use crate::domain::models::reward::Reward;
    use crate::domain::progress::RewardProgress;
    use crate::domain::reward_status::status_from_points;

    #[derive(Debug, Clone)]
    pub struct CreateRewardCommand {
        pub child_id: String,
        pub name: String,
        pub target_points: i32,
        pub deadline: Option<DateTime<Utc>>,
        pub auto_reset_on_expire: bool,
    }

    #[derive(Debug, Clone)]
    pub struct RedeemRewardResult {
        pub reward: Reward,
        /// Reward moved to priority 0 by this redemption
        pub promoted: Option<Reward>,
        /// True when nothing changed because the reward was already redeemed
        pub already_redeemed: bool,
    }

    /// A reward together with its derived progress and status
    #[derive(Debug, Clone)]
    pub struct RewardSnapshot {
        pub reward: Reward,
        pub progress: RewardProgress,
        pub status: RewardStatus,
    }

    impl RewardSnapshot {
        pub fn compute(reward: Reward, events: &[BehaviorEvent], now: DateTime<Utc>) -> Self {
            let progress = RewardProgress::compute(&reward, events, now);
            let status = status_from_points(&reward, progress.raw_points, now);
            Self {
                reward,
                progress,
                status,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct ExpirationOutcome {
        pub reward_id: String,
        /// An `expired` history record was written by this pass
        pub recorded: bool,
        /// The reward was soft-reset into a new window
        pub reset: bool,
        pub promoted: Option<Reward>,
    }
}
