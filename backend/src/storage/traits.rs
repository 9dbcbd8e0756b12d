//! # Storage Traits
//!
//! Storage abstraction traits that let the domain layer run against different
//! backends (in-memory arena, CSV files) without modification. All operations
//! are synchronous: every mutation runs on the single writer that owns the
//! backend, and each write is visible to the next read in the same process.

use anyhow::Result;

use crate::domain::models::behavior::BehaviorType;
use crate::domain::models::child::Child;
use crate::domain::models::event::BehaviorEvent;
use crate::domain::models::reward::Reward;
use crate::domain::models::reward_history::RewardHistoryEvent;

/// Trait defining the interface for child storage operations
pub trait ChildStorage: Send + Sync {
    /// Store a new child
    fn store_child(&self, child: &Child) -> Result<()>;

    /// Retrieve a specific child by ID
    fn get_child(&self, child_id: &str) -> Result<Option<Child>>;

    /// List all children (archived included) ordered by name
    fn list_children(&self) -> Result<Vec<Child>>;

    /// Replace an existing child record
    fn update_child(&self, child: &Child) -> Result<()>;

    /// Remove a child and its directory of records
    fn delete_child(&self, child_id: &str) -> Result<bool>;
}

/// Trait defining the interface for behavior type storage operations
pub trait BehaviorTypeStorage: Send + Sync {
    fn store_behavior_type(&self, behavior: &BehaviorType) -> Result<()>;

    fn get_behavior_type(&self, behavior_type_id: &str) -> Result<Option<BehaviorType>>;

    /// List all behavior types ordered by name
    fn list_behavior_types(&self) -> Result<Vec<BehaviorType>>;

    fn update_behavior_type(&self, behavior: &BehaviorType) -> Result<()>;
}

/// Trait defining the interface for the behavior event log
///
/// There is deliberately no update operation: events are immutable once
/// appended and can only be deleted.
pub trait BehaviorEventStorage: Send + Sync {
    /// Append a new event to the log
    fn append_event(&self, event: &BehaviorEvent) -> Result<()>;

    fn get_event(&self, event_id: &str) -> Result<Option<BehaviorEvent>>;

    /// List a child's events in chronological order (oldest first)
    fn list_events(&self, child_id: &str) -> Result<Vec<BehaviorEvent>>;

    /// List every child's events in chronological order
    fn list_all_events(&self) -> Result<Vec<BehaviorEvent>>;

    /// Delete a single event
    /// Returns true if the event was found and deleted, false otherwise
    fn delete_event(&self, event_id: &str) -> Result<bool>;
}

/// Trait defining the interface for reward storage operations
pub trait RewardStorage: Send + Sync {
    fn store_reward(&self, reward: &Reward) -> Result<()>;

    fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>>;

    /// List a child's rewards ordered by priority, then creation time
    fn list_rewards(&self, child_id: &str) -> Result<Vec<Reward>>;

    /// Replace an existing reward record
    fn update_reward(&self, reward: &Reward) -> Result<()>;
}

/// Trait defining the interface for the append-only reward audit trail
pub trait RewardHistoryStorage: Send + Sync {
    fn append_history_event(&self, event: &RewardHistoryEvent) -> Result<()>;

    /// History for one reward in chronological order
    fn list_reward_history(&self, reward_id: &str) -> Result<Vec<RewardHistoryEvent>>;

    /// History for every reward of a child in chronological order
    fn list_child_history(&self, child_id: &str) -> Result<Vec<RewardHistoryEvent>>;
}

/// Trait defining the interface for storage connections
///
/// Abstracts the concrete backend and provides factory methods for its
/// repositories, so services can be generic over any connection.
pub trait Connection: Send + Sync + Clone {
    type ChildRepository: ChildStorage + Clone;
    type BehaviorTypeRepository: BehaviorTypeStorage + Clone;
    type EventRepository: BehaviorEventStorage + Clone;
    type RewardRepository: RewardStorage + Clone;
    type RewardHistoryRepository: RewardHistoryStorage + Clone;

    fn create_child_repository(&self) -> Self::ChildRepository;
    fn create_behavior_type_repository(&self) -> Self::BehaviorTypeRepository;
    fn create_event_repository(&self) -> Self::EventRepository;
    fn create_reward_repository(&self) -> Self::RewardRepository;
    fn create_reward_history_repository(&self) -> Self::RewardHistoryRepository;
}
