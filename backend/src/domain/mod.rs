//! # Domain Module
//!
//! Business rules for tracking a child's moments, their progress toward
//! rewards, and the celebrations those moments earn. Nothing here knows how
//! data is stored; services are generic over a [`Connection`](crate::storage::Connection).
//!
//! ## Module Organization
//!
//! - **progress** / **reward_status**: pure functions of `(reward, events, now)`
//! - **celebrations**: threshold-transition rules evaluated once per logged moment
//! - **reward_queue**: primary/queued ordering and promotion
//! - **child_service**, **behavior_service**, **reward_service**: use cases
//! - **notifications**: broadcast of completed changes to any subscriber
//!
//! ## Business Rules
//!
//! - A logged moment's points are a snapshot and never change afterwards
//! - At most one open reward per child sits at priority 0
//! - Reward status is derived on every query, never stored
//! - Celebrations fire on transitions only, so they never repeat

pub mod behavior_service;
pub mod celebrations;
pub mod child_service;
pub mod clock;
pub mod commands;
pub mod config;
pub mod models;
pub mod notifications;
pub mod progress;
pub mod reward_queue;
pub mod reward_service;
pub mod reward_status;

pub use behavior_service::BehaviorService;
pub use celebrations::{
    CelebrationEngine, DisabledPatternDetector, PatternDetector, RepeatedBehaviorDetector,
};
pub use child_service::ChildService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use notifications::{DomainNotification, NotificationHub};
pub use reward_queue::RewardQueue;
pub use reward_service::RewardService;
