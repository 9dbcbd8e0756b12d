//! Reward queue ordering and promotion.
//!
//! Each child has at most one *open* (neither redeemed nor expired) reward at
//! priority 0. Queued rewards wait at higher priorities and move up only
//! through [`RewardQueue::promote_next`] or an explicit reorder.

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::info;
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::models::reward::{Reward, RewardValidationError};
use crate::storage::{Connection, RewardStorage};

#[derive(Clone)]
pub struct RewardQueue<C: Connection> {
    reward_repository: C::RewardRepository,
}

impl<C: Connection> RewardQueue<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            reward_repository: connection.create_reward_repository(),
        }
    }

    /// Open rewards for a child, lowest priority first
    pub fn open_rewards(&self, child_id: &str, now: DateTime<Utc>) -> Result<Vec<Reward>> {
        let mut rewards: Vec<Reward> = self
            .reward_repository
            .list_rewards(child_id)?
            .into_iter()
            .filter(|r| r.is_open(now))
            .collect();
        rewards.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(rewards)
    }

    /// The child's primary reward, if one is open
    pub fn active_reward(&self, child_id: &str, now: DateTime<Utc>) -> Result<Option<Reward>> {
        Ok(self
            .open_rewards(child_id, now)?
            .into_iter()
            .find(|r| r.is_primary()))
    }

    /// Priority for a newly created reward: 0 when nothing is open, otherwise
    /// the back of the queue.
    pub fn next_priority(&self, child_id: &str, now: DateTime<Utc>) -> Result<u32> {
        Ok(self
            .open_rewards(child_id, now)?
            .iter()
            .map(|r| r.priority + 1)
            .max()
            .unwrap_or(0))
    }

    /// Make the lowest-priority open reward primary.
    ///
    /// Must run after a redemption (or a non-resetting expiry) has been
    /// written, so the old primary is already closed. Returns the reward that
    /// was promoted, or `None` when nothing changed.
    pub fn promote_next(&self, child_id: &str, now: DateTime<Utc>) -> Result<Option<Reward>> {
        let mut next = match self.open_rewards(child_id, now)?.into_iter().next() {
            Some(reward) => reward,
            None => {
                info!("No queued rewards to promote for child {}", child_id);
                return Ok(None);
            }
        };

        if next.is_primary() {
            return Ok(None);
        }

        info!(
            "Promoting reward {} from priority {} to primary for child {}",
            next.id, next.priority, child_id
        );
        next.priority = 0;
        next.updated_at = now;
        self.reward_repository.update_reward(&next)?;
        Ok(Some(next))
    }

    /// Assign priorities 0..n to the child's open rewards in the given order.
    pub fn reorder(
        &self,
        child_id: &str,
        ordered_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<Reward>> {
        let open = self.open_rewards(child_id, now)?;
        let requested: HashSet<&str> = ordered_ids.iter().map(String::as_str).collect();
        let existing: HashSet<&str> = open.iter().map(|r| r.id.as_str()).collect();
        if requested.len() != ordered_ids.len() || requested != existing {
            return Err(RewardValidationError::InvalidOrder.into());
        }

        let mut reordered = Vec::with_capacity(open.len());
        for (priority, reward_id) in ordered_ids.iter().enumerate() {
            // Presence checked against `existing` above
            let Some(mut reward) = open.iter().find(|r| &r.id == reward_id).cloned() else {
                continue;
            };
            let priority = priority as u32;
            if reward.priority != priority {
                reward.priority = priority;
                reward.updated_at = now;
                self.reward_repository.update_reward(&reward)?;
            }
            reordered.push(reward);
        }

        info!("Reordered {} rewards for child {}", reordered.len(), child_id);
        Ok(reordered)
    }
}
