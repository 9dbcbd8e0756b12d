use anyhow::{anyhow, Result};
use log::{info, warn};
use std::sync::Arc;

use crate::domain::clock::Clock;
use crate::domain::commands::child::{CreateChildCommand, CreateChildResult, DeleteChildResult};
use crate::domain::models::child::{Child, ChildValidationError};
use crate::domain::notifications::{DomainNotification, NotificationHub};
use crate::storage::{
    BehaviorEventStorage, ChildStorage, Connection, RewardHistoryStorage, RewardStorage,
};

const MAX_CHILD_NAME_LENGTH: usize = 64;

/// Service for managing the children a family tracks
#[derive(Clone)]
pub struct ChildService<C: Connection> {
    child_repository: C::ChildRepository,
    event_repository: C::EventRepository,
    reward_repository: C::RewardRepository,
    history_repository: C::RewardHistoryRepository,
    clock: Arc<dyn Clock>,
    notifications: NotificationHub,
}

impl<C: Connection> ChildService<C> {
    pub fn new(connection: Arc<C>, clock: Arc<dyn Clock>, notifications: NotificationHub) -> Self {
        Self {
            child_repository: connection.create_child_repository(),
            event_repository: connection.create_event_repository(),
            reward_repository: connection.create_reward_repository(),
            history_repository: connection.create_reward_history_repository(),
            clock,
            notifications,
        }
    }

    /// Create a new child
    pub fn create_child(&self, command: CreateChildCommand) -> Result<CreateChildResult> {
        info!("Creating child: name={}", command.name);

        let name = command.name.trim();
        let color_tag = command.color_tag.trim();
        Self::validate(name, color_tag)?;

        let now = self.clock.now();
        let child = Child {
            id: Child::generate_id(),
            name: name.to_string(),
            color_tag: color_tag.to_string(),
            total_points: 0,
            is_archived: false,
            last_gold_star_day: None,
            created_at: now,
            updated_at: now,
        };
        self.child_repository.store_child(&child)?;

        info!("Created child: {} with ID: {}", child.name, child.id);
        self.notifications
            .publish(DomainNotification::ChildChanged(child.clone()));
        Ok(CreateChildResult { child })
    }

    pub fn get_child(&self, child_id: &str) -> Result<Option<Child>> {
        let child = self.child_repository.get_child(child_id)?;
        if child.is_none() {
            warn!("Child not found: {}", child_id);
        }
        Ok(child)
    }

    /// List children, skipping archived ones unless asked for
    pub fn list_children(&self, include_archived: bool) -> Result<Vec<Child>> {
        let mut children = self.child_repository.list_children()?;
        if !include_archived {
            children.retain(|c| !c.is_archived);
        }
        Ok(children)
    }

    /// Hide a child from the family view while keeping their history
    pub fn archive_child(&self, child_id: &str) -> Result<Child> {
        let mut child = self
            .child_repository
            .get_child(child_id)?
            .ok_or_else(|| anyhow!("Child not found: {}", child_id))?;

        if !child.is_archived {
            child.is_archived = true;
            child.updated_at = self.clock.now();
            self.child_repository.update_child(&child)?;
            info!("Archived child: {} ({})", child.name, child.id);
            self.notifications
                .publish(DomainNotification::ChildChanged(child.clone()));
        }
        Ok(child)
    }

    /// Delete a child, falling back to archiving while any history refers to them
    pub fn delete_child(&self, child_id: &str) -> Result<DeleteChildResult> {
        info!("Deleting child: {}", child_id);

        if self.child_repository.get_child(child_id)?.is_none() {
            return Err(anyhow!("Child not found: {}", child_id));
        }

        let has_history = !self.event_repository.list_events(child_id)?.is_empty()
            || !self.reward_repository.list_rewards(child_id)?.is_empty()
            || !self.history_repository.list_child_history(child_id)?.is_empty();

        if has_history {
            info!("Child {} has history, archiving instead of deleting", child_id);
            return Ok(DeleteChildResult::Archived(self.archive_child(child_id)?));
        }

        self.child_repository.delete_child(child_id)?;
        info!("Deleted child: {}", child_id);
        self.notifications.publish(DomainNotification::ChildDeleted {
            child_id: child_id.to_string(),
        });
        Ok(DeleteChildResult::Deleted)
    }

    fn validate(name: &str, color_tag: &str) -> Result<(), ChildValidationError> {
        if name.is_empty() {
            return Err(ChildValidationError::EmptyName);
        }
        if name.chars().count() > MAX_CHILD_NAME_LENGTH {
            return Err(ChildValidationError::NameTooLong(MAX_CHILD_NAME_LENGTH));
        }
        if color_tag.is_empty() {
            return Err(ChildValidationError::EmptyColorTag);
        }
        Ok(())
    }
}
