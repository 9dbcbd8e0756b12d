//! # CSV Storage Module
//!
//! File-based storage for Tiny Wins. The domain logic is storage-agnostic;
//! this backend keeps a family's data in a plain directory that can be backed
//! up or synced by any file tool.
//!
//! ## File Structure
//!
//! ```text
//! data/
//! ├── tiny_wins.yaml
//! ├── behavior_types.yaml
//! └── {child_directory}/
//!     ├── child.yaml
//!     ├── events.csv
//!     ├── rewards.csv
//!     └── reward_history.csv
//! ```
//!
//! Logs are appended in place; files that change as a whole are written to a
//! temp file and renamed over the original.

pub mod behavior_type_repository;
pub mod child_repository;
pub mod config_repository;
pub mod connection;
pub mod event_repository;
pub mod reward_history_repository;
pub mod reward_repository;

#[cfg(test)]
pub mod test_utils;

pub use behavior_type_repository::BehaviorTypeRepository;
pub use child_repository::ChildRepository;
pub use config_repository::ConfigRepository;
pub use connection::CsvConnection;
pub use event_repository::EventRepository;
pub use reward_history_repository::RewardHistoryRepository;
pub use reward_repository::RewardRepository;
