//! Reward service domain logic.
//!
//! Handles the reward lifecycle around the derived status machine:
//!
//! - **Creation**: validation and queue placement (primary when nothing is open)
//! - **Redemption**: the explicit parent action, followed by exactly one promotion
//! - **Expiry**: one `expired` history record per expiry, soft reset or promotion
//! - **Audit trail**: `earned`/`given`/`expired` history records
//!
//! Status itself is never stored. Every query recomputes it from the reward,
//! the child's event log and the clock. Child-scoped queries settle expired
//! rewards first, so an expiry is recorded as soon as anyone looks.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use shared::RewardHistoryKind;
use std::sync::Arc;

use crate::domain::clock::Clock;
use crate::domain::commands::reward::{
    CreateRewardCommand, ExpirationOutcome, RedeemRewardResult, RewardSnapshot,
};
use crate::domain::models::reward::{Reward, RewardValidationError};
use crate::domain::models::reward_history::RewardHistoryEvent;
use crate::domain::notifications::{DomainNotification, NotificationHub};
use crate::domain::progress::window_points;
use crate::domain::reward_queue::RewardQueue;
use crate::storage::{
    BehaviorEventStorage, ChildStorage, Connection, RewardHistoryStorage, RewardStorage,
};

const MAX_REWARD_NAME_LENGTH: usize = 64;

#[derive(Clone)]
pub struct RewardService<C: Connection> {
    child_repository: C::ChildRepository,
    event_repository: C::EventRepository,
    reward_repository: C::RewardRepository,
    history_repository: C::RewardHistoryRepository,
    queue: RewardQueue<C>,
    clock: Arc<dyn Clock>,
    notifications: NotificationHub,
}

impl<C: Connection> RewardService<C> {
    pub fn new(connection: Arc<C>, clock: Arc<dyn Clock>, notifications: NotificationHub) -> Self {
        Self {
            child_repository: connection.create_child_repository(),
            event_repository: connection.create_event_repository(),
            reward_repository: connection.create_reward_repository(),
            history_repository: connection.create_reward_history_repository(),
            queue: RewardQueue::new(connection),
            clock,
            notifications,
        }
    }

    /// Create a new reward at the back of the child's queue
    pub fn create_reward(&self, command: CreateRewardCommand) -> Result<Reward> {
        info!(
            "Creating reward '{}' (target {}) for child {}",
            command.name, command.target_points, command.child_id
        );

        let name = command.name.trim();
        if name.is_empty() {
            return Err(RewardValidationError::EmptyName.into());
        }
        if name.chars().count() > MAX_REWARD_NAME_LENGTH {
            return Err(RewardValidationError::NameTooLong(MAX_REWARD_NAME_LENGTH).into());
        }
        if command.target_points <= 0 {
            return Err(RewardValidationError::NonPositiveTarget.into());
        }

        let now = self.clock.now();
        if command.deadline.is_some_and(|deadline| deadline <= now) {
            return Err(RewardValidationError::DeadlineInPast.into());
        }

        let child = self
            .child_repository
            .get_child(&command.child_id)?
            .ok_or_else(|| anyhow!("Child {} not found", command.child_id))?;
        if child.is_archived {
            return Err(anyhow!("Child {} is archived", child.id));
        }

        // Expired rewards must leave the queue before the new one is placed
        self.process_expirations(&child.id)?;

        let reward = Reward {
            id: Reward::generate_id(),
            child_id: child.id.clone(),
            name: name.to_string(),
            target_points: command.target_points,
            priority: self.queue.next_priority(&child.id, now)?,
            is_redeemed: false,
            redeemed_at: None,
            deadline: command.deadline,
            auto_reset_on_expire: command.auto_reset_on_expire,
            created_at: now,
            reset_at: None,
            updated_at: now,
        };
        self.reward_repository.store_reward(&reward)?;

        info!(
            "Created reward {} at priority {} for child {}",
            reward.id, reward.priority, reward.child_id
        );
        self.notifications
            .publish(DomainNotification::RewardChanged(reward.clone()));
        Ok(reward)
    }

    /// Mark a reward as handed over and promote the next queued reward.
    ///
    /// Returns `None` without writing anything when the reward does not exist
    /// or has expired. Redeeming twice returns the reward unchanged with
    /// `already_redeemed` set.
    pub fn redeem_reward(&self, reward_id: &str) -> Result<Option<RedeemRewardResult>> {
        let reward = match self.reward_repository.get_reward(reward_id)? {
            Some(reward) => reward,
            None => {
                warn!("Cannot redeem reward {}: not found", reward_id);
                return Ok(None);
            }
        };

        if reward.is_redeemed {
            info!("Reward {} was already redeemed, nothing to do", reward_id);
            return Ok(Some(RedeemRewardResult {
                reward,
                promoted: None,
                already_redeemed: true,
            }));
        }

        self.process_expirations(&reward.child_id)?;

        // Re-read: an expiry pass may have reset the window
        let mut reward = match self.reward_repository.get_reward(reward_id)? {
            Some(reward) => reward,
            None => return Ok(None),
        };
        let now = self.clock.now();
        if reward.is_past_deadline(now) {
            warn!("Cannot redeem reward {}: expired", reward_id);
            return Ok(None);
        }

        let events = self.event_repository.list_events(&reward.child_id)?;
        let stars = window_points(&reward, &events, now).max(0);

        reward.is_redeemed = true;
        reward.redeemed_at = Some(now);
        reward.updated_at = now;
        self.reward_repository.update_reward(&reward)?;

        let entry = RewardHistoryEvent::new(
            &reward.id,
            &reward.child_id,
            RewardHistoryKind::Given,
            stars,
            now,
        );
        self.history_repository.append_history_event(&entry)?;
        info!(
            "Redeemed reward {} for child {} with {} stars",
            reward.id, reward.child_id, stars
        );

        // The redemption write is committed, so at most one primary exists after this
        let promoted = self.queue.promote_next(&reward.child_id, now)?;

        self.notifications
            .publish(DomainNotification::RewardChanged(reward.clone()));
        self.notifications
            .publish(DomainNotification::RewardHistoryRecorded(entry));
        if let Some(next) = &promoted {
            self.notifications
                .publish(DomainNotification::RewardChanged(next.clone()));
        }

        Ok(Some(RedeemRewardResult {
            reward,
            promoted,
            already_redeemed: false,
        }))
    }

    /// Settle every reward of the child whose deadline has passed.
    ///
    /// Safe to call any number of times: an expiry is recorded once, keyed on
    /// the deadline it passed.
    pub fn process_expirations(&self, child_id: &str) -> Result<Vec<ExpirationOutcome>> {
        let now = self.clock.now();
        let mut outcomes = Vec::new();
        let mut events = None;

        for reward in self.reward_repository.list_rewards(child_id)? {
            if reward.is_redeemed {
                continue;
            }
            let deadline = match reward.deadline {
                Some(deadline) if now > deadline => deadline,
                _ => continue,
            };

            let already_recorded = self
                .history_repository
                .list_reward_history(&reward.id)?
                .iter()
                .any(|h| h.kind == RewardHistoryKind::Expired && h.timestamp >= deadline);

            let mut recorded = false;
            if !already_recorded {
                if events.is_none() {
                    events = Some(self.event_repository.list_events(child_id)?);
                }
                let stars = events
                    .as_deref()
                    .map(|events| window_points(&reward, events, now).max(0))
                    .unwrap_or(0);
                let entry = RewardHistoryEvent::new(
                    &reward.id,
                    child_id,
                    RewardHistoryKind::Expired,
                    stars,
                    now,
                );
                self.history_repository.append_history_event(&entry)?;
                info!("Reward {} expired at {}", reward.id, deadline);
                self.notifications
                    .publish(DomainNotification::RewardHistoryRecorded(entry));
                recorded = true;
            }

            let mut reset = false;
            let mut promoted = None;
            if reward.auto_reset_on_expire {
                let mut revived = reward.clone();
                revived.soft_reset(now);
                self.reward_repository.update_reward(&revived)?;
                info!(
                    "Reward {} reset into a new window ending {:?}",
                    revived.id, revived.deadline
                );
                self.notifications
                    .publish(DomainNotification::RewardChanged(revived));
                reset = true;
            } else if recorded && reward.is_primary() {
                promoted = self.queue.promote_next(child_id, now)?;
                if let Some(next) = &promoted {
                    self.notifications
                        .publish(DomainNotification::RewardChanged(next.clone()));
                }
            }

            if recorded || reset {
                outcomes.push(ExpirationOutcome {
                    reward_id: reward.id.clone(),
                    recorded,
                    reset,
                    promoted,
                });
            }
        }

        Ok(outcomes)
    }

    /// Append an `earned` record unless one already exists for the current window.
    pub(crate) fn record_earned_if_needed(
        &self,
        reward: &Reward,
        stars: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<RewardHistoryEvent>> {
        let window_start = reward.window_start();
        let already_earned = self
            .history_repository
            .list_reward_history(&reward.id)?
            .iter()
            .any(|h| h.kind == RewardHistoryKind::Earned && h.timestamp >= window_start);
        if already_earned {
            return Ok(None);
        }

        let entry = RewardHistoryEvent::new(
            &reward.id,
            &reward.child_id,
            RewardHistoryKind::Earned,
            stars,
            now,
        );
        self.history_repository.append_history_event(&entry)?;
        info!("Reward {} is ready to redeem", reward.id);
        self.notifications
            .publish(DomainNotification::RewardHistoryRecorded(entry.clone()));
        Ok(Some(entry))
    }

    /// Reorder the child's open rewards; the first id becomes primary
    pub fn reorder_rewards(&self, child_id: &str, ordered_ids: &[String]) -> Result<Vec<Reward>> {
        self.process_expirations(child_id)?;
        let rewards = self.queue.reorder(child_id, ordered_ids, self.clock.now())?;
        for reward in &rewards {
            self.notifications
                .publish(DomainNotification::RewardChanged(reward.clone()));
        }
        Ok(rewards)
    }

    pub fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>> {
        self.reward_repository.get_reward(reward_id)
    }

    /// Current progress and status of one reward
    pub fn reward_snapshot(&self, reward_id: &str) -> Result<Option<RewardSnapshot>> {
        let child_id = match self.reward_repository.get_reward(reward_id)? {
            Some(reward) => reward.child_id,
            None => return Ok(None),
        };
        self.process_expirations(&child_id)?;

        // Re-read: a soft reset moves the window
        let reward = match self.reward_repository.get_reward(reward_id)? {
            Some(reward) => reward,
            None => return Ok(None),
        };
        let events = self.event_repository.list_events(&reward.child_id)?;
        Ok(Some(RewardSnapshot::compute(reward, &events, self.clock.now())))
    }

    /// Every reward of the child, in queue order, with progress and status
    pub fn list_rewards(&self, child_id: &str) -> Result<Vec<RewardSnapshot>> {
        self.process_expirations(child_id)?;
        let now = self.clock.now();
        let events = self.event_repository.list_events(child_id)?;
        Ok(self
            .reward_repository
            .list_rewards(child_id)?
            .into_iter()
            .map(|reward| RewardSnapshot::compute(reward, &events, now))
            .collect())
    }

    /// The child's primary reward with progress and status
    pub fn active_reward(&self, child_id: &str) -> Result<Option<RewardSnapshot>> {
        self.process_expirations(child_id)?;
        let now = self.clock.now();
        match self.queue.active_reward(child_id, now)? {
            Some(reward) => {
                let events = self.event_repository.list_events(child_id)?;
                Ok(Some(RewardSnapshot::compute(reward, &events, now)))
            }
            None => Ok(None),
        }
    }

    /// Open rewards waiting behind the primary one
    pub fn queued_rewards(&self, child_id: &str) -> Result<Vec<RewardSnapshot>> {
        self.process_expirations(child_id)?;
        let now = self.clock.now();
        let events = self.event_repository.list_events(child_id)?;
        Ok(self
            .queue
            .open_rewards(child_id, now)?
            .into_iter()
            .filter(|reward| !reward.is_primary())
            .map(|reward| RewardSnapshot::compute(reward, &events, now))
            .collect())
    }

    pub fn reward_history(&self, reward_id: &str) -> Result<Vec<RewardHistoryEvent>> {
        self.history_repository.list_reward_history(reward_id)
    }

    pub fn child_reward_history(&self, child_id: &str) -> Result<Vec<RewardHistoryEvent>> {
        self.history_repository.list_child_history(child_id)
    }
}
