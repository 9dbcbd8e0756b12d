//! # In-memory Storage
//!
//! Arena-style store: every entity lives in a flat collection keyed by id and
//! refers to others by id only. All repositories created from one
//! [`MemoryConnection`] share the same arena.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::models::behavior::BehaviorType;
use crate::domain::models::child::Child;
use crate::domain::models::event::BehaviorEvent;
use crate::domain::models::reward::Reward;
use crate::domain::models::reward_history::RewardHistoryEvent;
use crate::storage::traits::{
    BehaviorEventStorage, BehaviorTypeStorage, ChildStorage, Connection, RewardHistoryStorage,
    RewardStorage,
};

#[derive(Debug, Default)]
struct Arena {
    children: HashMap<String, Child>,
    behavior_types: HashMap<String, BehaviorType>,
    /// Kept in append order
    events: Vec<BehaviorEvent>,
    rewards: HashMap<String, Reward>,
    reward_history: Vec<RewardHistoryEvent>,
}

/// Shared handle to an in-memory arena
#[derive(Debug, Clone, Default)]
pub struct MemoryConnection {
    arena: Arc<RwLock<Arena>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Arena> {
        self.arena.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Arena> {
        self.arena.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Connection for MemoryConnection {
    type ChildRepository = MemoryConnection;
    type BehaviorTypeRepository = MemoryConnection;
    type EventRepository = MemoryConnection;
    type RewardRepository = MemoryConnection;
    type RewardHistoryRepository = MemoryConnection;

    fn create_child_repository(&self) -> Self::ChildRepository {
        self.clone()
    }

    fn create_behavior_type_repository(&self) -> Self::BehaviorTypeRepository {
        self.clone()
    }

    fn create_event_repository(&self) -> Self::EventRepository {
        self.clone()
    }

    fn create_reward_repository(&self) -> Self::RewardRepository {
        self.clone()
    }

    fn create_reward_history_repository(&self) -> Self::RewardHistoryRepository {
        self.clone()
    }
}

impl ChildStorage for MemoryConnection {
    fn store_child(&self, child: &Child) -> Result<()> {
        let mut arena = self.write();
        if arena.children.contains_key(&child.id) {
            return Err(anyhow!("Child {} already exists", child.id));
        }
        arena.children.insert(child.id.clone(), child.clone());
        Ok(())
    }

    fn get_child(&self, child_id: &str) -> Result<Option<Child>> {
        Ok(self.read().children.get(child_id).cloned())
    }

    fn list_children(&self) -> Result<Vec<Child>> {
        let mut children: Vec<Child> = self.read().children.values().cloned().collect();
        children.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(children)
    }

    fn update_child(&self, child: &Child) -> Result<()> {
        let mut arena = self.write();
        match arena.children.get_mut(&child.id) {
            Some(existing) => {
                *existing = child.clone();
                Ok(())
            }
            None => Err(anyhow!("Child {} not found", child.id)),
        }
    }

    fn delete_child(&self, child_id: &str) -> Result<bool> {
        Ok(self.write().children.remove(child_id).is_some())
    }
}

impl BehaviorTypeStorage for MemoryConnection {
    fn store_behavior_type(&self, behavior: &BehaviorType) -> Result<()> {
        let mut arena = self.write();
        if arena.behavior_types.contains_key(&behavior.id) {
            return Err(anyhow!("Behavior type {} already exists", behavior.id));
        }
        arena
            .behavior_types
            .insert(behavior.id.clone(), behavior.clone());
        Ok(())
    }

    fn get_behavior_type(&self, behavior_type_id: &str) -> Result<Option<BehaviorType>> {
        Ok(self.read().behavior_types.get(behavior_type_id).cloned())
    }

    fn list_behavior_types(&self) -> Result<Vec<BehaviorType>> {
        let mut behaviors: Vec<BehaviorType> =
            self.read().behavior_types.values().cloned().collect();
        behaviors.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(behaviors)
    }

    fn update_behavior_type(&self, behavior: &BehaviorType) -> Result<()> {
        let mut arena = self.write();
        match arena.behavior_types.get_mut(&behavior.id) {
            Some(existing) => {
                *existing = behavior.clone();
                Ok(())
            }
            None => Err(anyhow!("Behavior type {} not found", behavior.id)),
        }
    }
}

impl BehaviorEventStorage for MemoryConnection {
    fn append_event(&self, event: &BehaviorEvent) -> Result<()> {
        self.write().events.push(event.clone());
        Ok(())
    }

    fn get_event(&self, event_id: &str) -> Result<Option<BehaviorEvent>> {
        Ok(self.read().events.iter().find(|e| e.id == event_id).cloned())
    }

    fn list_events(&self, child_id: &str) -> Result<Vec<BehaviorEvent>> {
        let mut events: Vec<BehaviorEvent> = self
            .read()
            .events
            .iter()
            .filter(|e| e.child_id == child_id)
            .cloned()
            .collect();
        // Stable sort keeps append order for identical timestamps
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(events)
    }

    fn list_all_events(&self) -> Result<Vec<BehaviorEvent>> {
        let mut events = self.read().events.clone();
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(events)
    }

    fn delete_event(&self, event_id: &str) -> Result<bool> {
        let mut arena = self.write();
        let before = arena.events.len();
        arena.events.retain(|e| e.id != event_id);
        Ok(arena.events.len() != before)
    }
}

impl RewardStorage for MemoryConnection {
    fn store_reward(&self, reward: &Reward) -> Result<()> {
        let mut arena = self.write();
        if arena.rewards.contains_key(&reward.id) {
            return Err(anyhow!("Reward {} already exists", reward.id));
        }
        arena.rewards.insert(reward.id.clone(), reward.clone());
        Ok(())
    }

    fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>> {
        Ok(self.read().rewards.get(reward_id).cloned())
    }

    fn list_rewards(&self, child_id: &str) -> Result<Vec<Reward>> {
        let mut rewards: Vec<Reward> = self
            .read()
            .rewards
            .values()
            .filter(|r| r.child_id == child_id)
            .cloned()
            .collect();
        rewards.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(rewards)
    }

    fn update_reward(&self, reward: &Reward) -> Result<()> {
        let mut arena = self.write();
        match arena.rewards.get_mut(&reward.id) {
            Some(existing) => {
                *existing = reward.clone();
                Ok(())
            }
            None => Err(anyhow!("Reward {} not found", reward.id)),
        }
    }
}

impl RewardHistoryStorage for MemoryConnection {
    fn append_history_event(&self, event: &RewardHistoryEvent) -> Result<()> {
        self.write().reward_history.push(event.clone());
        Ok(())
    }

    fn list_reward_history(&self, reward_id: &str) -> Result<Vec<RewardHistoryEvent>> {
        Ok(self
            .read()
            .reward_history
            .iter()
            .filter(|h| h.reward_id == reward_id)
            .cloned()
            .collect())
    }

    fn list_child_history(&self, child_id: &str) -> Result<Vec<RewardHistoryEvent>> {
        Ok(self
            .read()
            .reward_history
            .iter()
            .filter(|h| h.child_id == child_id)
            .cloned()
            .collect())
    }
}
