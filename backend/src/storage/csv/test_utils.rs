//! Test utilities for the CSV backend.
//!
//! [`TestEnvironment`] owns a `TempDir`, so test data is removed even when a
//! test panics.

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use super::connection::CsvConnection;
use crate::domain::models::behavior::BehaviorType;
use crate::domain::models::child::Child;
use crate::domain::models::event::BehaviorEvent;
use crate::domain::models::reward::Reward;

/// Temporary data directory plus a connection to it
pub struct TestEnvironment {
    pub connection: CsvConnection,
    /// Base directory path for manual inspection if needed
    pub base_path: std::path::PathBuf,
    _temp_dir: TempDir, // Keep alive to prevent cleanup
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let connection = CsvConnection::new(temp_dir.path())?;
        Ok(Self {
            connection,
            base_path: temp_dir.path().to_path_buf(),
            _temp_dir: temp_dir,
        })
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 20, 10, 0, 0).unwrap()
}

pub fn test_child(name: &str) -> Child {
    Child {
        id: Child::generate_id(),
        name: name.to_string(),
        color_tag: "#FFB347".to_string(),
        total_points: 0,
        is_archived: false,
        last_gold_star_day: None,
        created_at: base_time(),
        updated_at: base_time(),
    }
}

pub fn test_behavior(name: &str, points: i32) -> BehaviorType {
    BehaviorType {
        id: BehaviorType::generate_id(),
        name: name.to_string(),
        category: "routine".to_string(),
        points,
    }
}

pub fn test_event(child_id: &str, after: Duration, points: i32, note: Option<&str>) -> BehaviorEvent {
    BehaviorEvent {
        id: BehaviorEvent::generate_id(),
        child_id: child_id.to_string(),
        behavior_type_id: "behavior::test".to_string(),
        timestamp: base_time() + after,
        points_applied: points,
        note: note.map(str::to_string),
    }
}

pub fn test_reward(child_id: &str, name: &str, priority: u32) -> Reward {
    Reward {
        id: Reward::generate_id(),
        child_id: child_id.to_string(),
        name: name.to_string(),
        target_points: 10,
        priority,
        is_redeemed: false,
        redeemed_at: None,
        deadline: None,
        auto_reset_on_expire: false,
        created_at: base_time(),
        reset_at: None,
        updated_at: base_time(),
    }
}
