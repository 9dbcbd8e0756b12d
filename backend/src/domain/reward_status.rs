//! Reward lifecycle, derived on demand.
//!
//! ```text
//! Active ──(earned ≥ target)──▶ ReadyToRedeem ──(parent redeems)──▶ Redeemed
//!    │                               │
//!    └────────(deadline passes)──────┴──▶ Expired ──(auto reset)──▶ Active
//! ```
//!
//! Status is never stored. `is_redeemed` is the only input that cannot be
//! derived from the event log.

use chrono::{DateTime, Utc};
use shared::RewardStatus;

use crate::domain::models::event::BehaviorEvent;
use crate::domain::models::reward::Reward;
use crate::domain::progress::window_points;

pub fn reward_status(reward: &Reward, events: &[BehaviorEvent], now: DateTime<Utc>) -> RewardStatus {
    let earned = window_points(reward, events, now);
    status_from_points(reward, earned, now)
}

/// Status given an already computed signed window sum.
pub fn status_from_points(reward: &Reward, earned: i64, now: DateTime<Utc>) -> RewardStatus {
    if reward.is_redeemed {
        RewardStatus::Redeemed
    } else if reward.is_past_deadline(now) {
        RewardStatus::Expired
    } else if earned >= i64::from(reward.target_points) {
        RewardStatus::ReadyToRedeem
    } else {
        RewardStatus::Active
    }
}
