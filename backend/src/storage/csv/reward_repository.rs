//! # CSV Reward Repository
//!
//! A child's rewards are kept in `{child_directory}/rewards.csv`, one row per
//! reward. Unlike the event log this file holds current state, so updates
//! rewrite it atomically:
//!
//! ```csv
//! id,child_id,name,target_points,priority,is_redeemed,redeemed_at,deadline,auto_reset_on_expire,created_at,reset_at,updated_at
//! reward::5d2e..,child::1b4e..,Ice cream,10,0,false,,,false,2025-01-20T10:00:00+00:00,,2025-01-20T10:00:00+00:00
//! ```

use anyhow::{anyhow, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::connection::{
    parse_optional_timestamp, parse_timestamp, read_csv_records, write_csv_records, CsvConnection,
};
use crate::domain::models::reward::Reward;
use crate::storage::traits::RewardStorage;

const REWARDS_FILE: &str = "rewards.csv";

/// CSV record structure for rewards
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RewardRecord {
    id: String,
    child_id: String,
    name: String,
    target_points: i32,
    priority: u32,
    is_redeemed: bool,
    redeemed_at: Option<String>,
    deadline: Option<String>,
    auto_reset_on_expire: bool,
    created_at: String,
    reset_at: Option<String>,
    updated_at: String,
}

impl From<&Reward> for RewardRecord {
    fn from(reward: &Reward) -> Self {
        RewardRecord {
            id: reward.id.clone(),
            child_id: reward.child_id.clone(),
            name: reward.name.clone(),
            target_points: reward.target_points,
            priority: reward.priority,
            is_redeemed: reward.is_redeemed,
            redeemed_at: reward.redeemed_at.map(|t| t.to_rfc3339()),
            deadline: reward.deadline.map(|t| t.to_rfc3339()),
            auto_reset_on_expire: reward.auto_reset_on_expire,
            created_at: reward.created_at.to_rfc3339(),
            reset_at: reward.reset_at.map(|t| t.to_rfc3339()),
            updated_at: reward.updated_at.to_rfc3339(),
        }
    }
}

impl TryFrom<RewardRecord> for Reward {
    type Error = anyhow::Error;

    fn try_from(record: RewardRecord) -> Result<Self> {
        Ok(Reward {
            redeemed_at: parse_optional_timestamp(&record.redeemed_at)?,
            deadline: parse_optional_timestamp(&record.deadline)?,
            created_at: parse_timestamp(&record.created_at)?,
            reset_at: parse_optional_timestamp(&record.reset_at)?,
            updated_at: parse_timestamp(&record.updated_at)?,
            id: record.id,
            child_id: record.child_id,
            name: record.name,
            target_points: record.target_points,
            priority: record.priority,
            is_redeemed: record.is_redeemed,
            auto_reset_on_expire: record.auto_reset_on_expire,
        })
    }
}

/// CSV-backed reward repository using per-child files
#[derive(Debug, Clone)]
pub struct RewardRepository {
    connection: CsvConnection,
}

impl RewardRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn rewards_file_path(&self, child_id: &str) -> PathBuf {
        self.connection.get_child_directory(child_id).join(REWARDS_FILE)
    }

    fn read_rewards(&self, path: &Path) -> Result<Vec<Reward>> {
        let mut rewards = Vec::new();
        for record in read_csv_records::<RewardRecord>(path)? {
            match Reward::try_from(record) {
                Ok(reward) => rewards.push(reward),
                Err(e) => warn!("Failed to parse reward record in {:?}: {}. Skipping.", path, e),
            }
        }
        Ok(rewards)
    }

    fn write_rewards(&self, path: &Path, rewards: &[Reward]) -> Result<()> {
        let records: Vec<RewardRecord> = rewards.iter().map(RewardRecord::from).collect();
        write_csv_records(path, &records)
    }
}

impl RewardStorage for RewardRepository {
    fn store_reward(&self, reward: &Reward) -> Result<()> {
        self.connection.ensure_child_directory(&reward.child_id)?;
        let path = self.rewards_file_path(&reward.child_id);
        let mut rewards = self.read_rewards(&path)?;
        if rewards.iter().any(|r| r.id == reward.id) {
            return Err(anyhow!("Reward {} already exists", reward.id));
        }
        rewards.push(reward.clone());
        self.write_rewards(&path, &rewards)?;
        debug!("Stored reward {} in {:?}", reward.id, path);
        Ok(())
    }

    fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>> {
        for dir in self.connection.child_directories()? {
            let rewards = self.read_rewards(&dir.join(REWARDS_FILE))?;
            if let Some(reward) = rewards.into_iter().find(|r| r.id == reward_id) {
                return Ok(Some(reward));
            }
        }
        Ok(None)
    }

    fn list_rewards(&self, child_id: &str) -> Result<Vec<Reward>> {
        let mut rewards = self.read_rewards(&self.rewards_file_path(child_id))?;
        rewards.retain(|r| r.child_id == child_id);
        rewards.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(rewards)
    }

    fn update_reward(&self, reward: &Reward) -> Result<()> {
        let path = self.rewards_file_path(&reward.child_id);
        let mut rewards = self.read_rewards(&path)?;
        let existing = rewards
            .iter_mut()
            .find(|r| r.id == reward.id)
            .ok_or_else(|| anyhow!("Reward {} not found", reward.id))?;
        *existing = reward.clone();
        self.write_rewards(&path, &rewards)?;
        debug!("Updated reward {} in {:?}", reward.id, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::{base_time, test_reward, TestEnvironment};
    use chrono::Duration;

    #[test]
    fn test_store_and_list_by_priority() {
        let env = TestEnvironment::new().unwrap();
        let repo = RewardRepository::new(env.connection.clone());

        let queued = test_reward("child::a", "Bike ride", 1);
        let mut primary = test_reward("child::a", "Ice cream", 0);
        primary.deadline = Some(base_time() + Duration::days(7));
        repo.store_reward(&queued).unwrap();
        repo.store_reward(&primary).unwrap();

        let rewards = repo.list_rewards("child::a").unwrap();
        assert_eq!(rewards, vec![primary.clone(), queued]);
        assert!(repo.store_reward(&primary).is_err());
    }

    #[test]
    fn test_update_reward_persists_optional_fields() {
        let env = TestEnvironment::new().unwrap();
        let repo = RewardRepository::new(env.connection.clone());
        let mut reward = test_reward("child::a", "Zoo", 0);
        repo.store_reward(&reward).unwrap();

        reward.is_redeemed = true;
        reward.redeemed_at = Some(base_time() + Duration::hours(5));
        reward.reset_at = Some(base_time() + Duration::hours(1));
        repo.update_reward(&reward).unwrap();

        assert_eq!(repo.get_reward(&reward.id).unwrap(), Some(reward));
    }

    #[test]
    fn test_update_missing_reward_fails() {
        let env = TestEnvironment::new().unwrap();
        let repo = RewardRepository::new(env.connection.clone());
        assert!(repo.update_reward(&test_reward("child::a", "Ghost", 0)).is_err());
    }
}
