//! Behavior types and the moment log.
//!
//! [`BehaviorService::log_behavior`] is the single write path for moments. It
//! runs as one synchronous transaction:
//!
//! 1. settle expired rewards for the child
//! 2. snapshot the event log and the primary reward
//! 3. append the event
//! 4. recompute progress and status from the stored log
//! 5. decide celebrations from the before/after snapshots
//! 6. update the child's running total and Gold Star day
//! 7. publish notifications
//!
//! Because celebrations are decided only after every aggregate has been
//! recomputed, subscribers never see a celebration ahead of the state that
//! caused it.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use shared::{CelebrationKind, RewardStatus};
use std::sync::Arc;

use crate::domain::celebrations::{positive_events_on_day, CelebrationEngine, CelebrationInput};
use crate::domain::clock::Clock;
use crate::domain::commands::behavior::{
    CreateBehaviorTypeCommand, LogBehaviorCommand, LogBehaviorResult, UpdateBehaviorTypeCommand,
    UpdateBehaviorTypeResult,
};
use crate::domain::commands::reward::RewardSnapshot;
use crate::domain::models::behavior::{BehaviorType, BehaviorValidationError};
use crate::domain::models::event::BehaviorEvent;
use crate::domain::notifications::{DomainNotification, NotificationHub};
use crate::domain::reward_queue::RewardQueue;
use crate::domain::reward_service::RewardService;
use crate::storage::{BehaviorEventStorage, BehaviorTypeStorage, ChildStorage, Connection};

const MAX_BEHAVIOR_NAME_LENGTH: usize = 64;

#[derive(Clone)]
pub struct BehaviorService<C: Connection> {
    behavior_type_repository: C::BehaviorTypeRepository,
    child_repository: C::ChildRepository,
    event_repository: C::EventRepository,
    reward_service: RewardService<C>,
    queue: RewardQueue<C>,
    engine: CelebrationEngine,
    clock: Arc<dyn Clock>,
    notifications: NotificationHub,
}

impl<C: Connection> BehaviorService<C> {
    pub fn new(
        connection: Arc<C>,
        reward_service: RewardService<C>,
        engine: CelebrationEngine,
        clock: Arc<dyn Clock>,
        notifications: NotificationHub,
    ) -> Self {
        Self {
            behavior_type_repository: connection.create_behavior_type_repository(),
            child_repository: connection.create_child_repository(),
            event_repository: connection.create_event_repository(),
            reward_service,
            queue: RewardQueue::new(connection),
            engine,
            clock,
            notifications,
        }
    }

    pub fn create_behavior_type(&self, command: CreateBehaviorTypeCommand) -> Result<BehaviorType> {
        info!(
            "Creating behavior type '{}' worth {} points",
            command.name, command.points
        );
        let name = command.name.trim();
        Self::validate(name, command.points)?;

        let behavior = BehaviorType {
            id: BehaviorType::generate_id(),
            name: name.to_string(),
            category: command.category.trim().to_string(),
            points: command.points,
        };
        self.behavior_type_repository.store_behavior_type(&behavior)?;

        self.notifications
            .publish(DomainNotification::BehaviorTypeChanged(behavior.clone()));
        Ok(behavior)
    }

    /// Update a behavior type. Moments already logged keep the points they
    /// were logged with.
    pub fn update_behavior_type(
        &self,
        command: UpdateBehaviorTypeCommand,
    ) -> Result<UpdateBehaviorTypeResult> {
        let mut behavior = self
            .behavior_type_repository
            .get_behavior_type(&command.behavior_type_id)?
            .ok_or_else(|| anyhow!("Behavior type not found: {}", command.behavior_type_id))?;

        if let Some(name) = command.name {
            behavior.name = name.trim().to_string();
        }
        if let Some(category) = command.category {
            behavior.category = category.trim().to_string();
        }
        if let Some(points) = command.points {
            behavior.points = points;
        }
        Self::validate(&behavior.name, behavior.points)?;

        self.behavior_type_repository.update_behavior_type(&behavior)?;
        info!("Updated behavior type {}", behavior.id);
        self.notifications
            .publish(DomainNotification::BehaviorTypeChanged(behavior.clone()));
        Ok(UpdateBehaviorTypeResult { behavior })
    }

    pub fn list_behavior_types(&self) -> Result<Vec<BehaviorType>> {
        self.behavior_type_repository.list_behavior_types()
    }

    /// Log a moment for a child.
    ///
    /// A missing or archived child, or a missing behavior type, makes this a
    /// no-op returning `None`.
    pub fn log_behavior(&self, command: LogBehaviorCommand) -> Result<Option<LogBehaviorResult>> {
        let mut child = match self.child_repository.get_child(&command.child_id)? {
            Some(child) if !child.is_archived => child,
            Some(_) => {
                warn!("Not logging for archived child {}", command.child_id);
                return Ok(None);
            }
            None => {
                warn!("Not logging for unknown child {}", command.child_id);
                return Ok(None);
            }
        };
        let behavior = match self
            .behavior_type_repository
            .get_behavior_type(&command.behavior_type_id)?
        {
            Some(behavior) => behavior,
            None => {
                warn!(
                    "Not logging unknown behavior type {}",
                    command.behavior_type_id
                );
                return Ok(None);
            }
        };

        self.reward_service.process_expirations(&child.id)?;

        let now = self.clock.now();
        let events_before = self.event_repository.list_events(&child.id)?;
        let active_reward = self.queue.active_reward(&child.id, now)?;

        let event = BehaviorEvent::record(
            &child.id,
            &behavior,
            command.timestamp.unwrap_or(now),
            command.note,
        );
        self.event_repository.append_event(&event)?;

        let events_after = self.event_repository.list_events(&child.id)?;

        let snapshot = match &active_reward {
            Some(reward) => {
                let snapshot = RewardSnapshot::compute(reward.clone(), &events_after, now);
                if snapshot.status == RewardStatus::ReadyToRedeem {
                    self.reward_service.record_earned_if_needed(
                        reward,
                        snapshot.progress.display_points,
                        now,
                    )?;
                }
                Some(snapshot)
            }
            None => None,
        };

        let celebrations = self.engine.evaluate(&CelebrationInput {
            event: &event,
            events_before: &events_before,
            events_after: &events_after,
            active_reward: active_reward.as_ref(),
            last_gold_star_day: child.last_gold_star_day,
            now,
        });

        child.total_points += i64::from(event.points_applied);
        child.updated_at = now;
        if celebrations
            .iter()
            .any(|c| matches!(c.kind, CelebrationKind::GoldStarDay { .. }))
        {
            child.last_gold_star_day = Some(now.with_timezone(&self.engine.offset()).date_naive());
        }
        self.child_repository.update_child(&child)?;
        info!(
            "Logged {} ({:+}) for child {}, total now {}",
            behavior.name, event.points_applied, child.id, child.total_points
        );

        self.notifications
            .publish(DomainNotification::EventLogged(event.clone()));
        self.notifications
            .publish(DomainNotification::ChildChanged(child.clone()));
        if let Some(snapshot) = &snapshot {
            self.notifications
                .publish(DomainNotification::RewardChanged(snapshot.reward.clone()));
        }
        for celebration in &celebrations {
            self.notifications
                .publish(DomainNotification::Celebration(celebration.clone()));
        }

        Ok(Some(LogBehaviorResult {
            event,
            child,
            active_reward: snapshot,
            celebrations,
        }))
    }

    /// Remove a logged moment and take its points back out of the child's total
    pub fn delete_event(&self, event_id: &str) -> Result<Option<BehaviorEvent>> {
        let event = match self.event_repository.get_event(event_id)? {
            Some(event) => event,
            None => {
                warn!("Event not found: {}", event_id);
                return Ok(None);
            }
        };

        if !self.event_repository.delete_event(event_id)? {
            return Ok(None);
        }

        if let Some(mut child) = self.child_repository.get_child(&event.child_id)? {
            child.total_points -= i64::from(event.points_applied);
            child.updated_at = self.clock.now();
            self.child_repository.update_child(&child)?;
            self.notifications
                .publish(DomainNotification::ChildChanged(child));
        }

        info!("Deleted event {} for child {}", event.id, event.child_id);
        self.notifications
            .publish(DomainNotification::EventDeleted(event.clone()));
        Ok(Some(event))
    }

    pub fn list_events(&self, child_id: &str) -> Result<Vec<BehaviorEvent>> {
        self.event_repository.list_events(child_id)
    }

    /// Every child's moments, oldest first
    pub fn list_all_events(&self) -> Result<Vec<BehaviorEvent>> {
        self.event_repository.list_all_events()
    }

    /// Events for a child whose timestamps fall within `[from, to]`
    pub fn list_events_between(
        &self,
        child_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BehaviorEvent>> {
        let mut events = self.event_repository.list_events(child_id)?;
        events.retain(|e| e.timestamp >= from && e.timestamp <= to);
        Ok(events)
    }

    /// Positive moments logged for the child on the current calendar day
    pub fn positive_moments_today(&self, child_id: &str) -> Result<usize> {
        let offset = self.engine.offset();
        let today = self.clock.now().with_timezone(&offset).date_naive();
        let events = self.event_repository.list_events(child_id)?;
        Ok(positive_events_on_day(&events, child_id, today, &offset))
    }

    fn validate(name: &str, points: i32) -> Result<(), BehaviorValidationError> {
        if name.is_empty() {
            return Err(BehaviorValidationError::EmptyName);
        }
        if name.chars().count() > MAX_BEHAVIOR_NAME_LENGTH {
            return Err(BehaviorValidationError::NameTooLong(MAX_BEHAVIOR_NAME_LENGTH));
        }
        if points == 0 {
            return Err(BehaviorValidationError::ZeroPoints);
        }
        Ok(())
    }
}
