//! Append-only reward audit trail, one `reward_history.csv` per child.

use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::connection::{append_csv_record, parse_timestamp, read_csv_records, CsvConnection};
use crate::domain::models::reward_history::{kind_from_str, kind_to_str, RewardHistoryEvent};
use crate::storage::traits::RewardHistoryStorage;

const HISTORY_FILE: &str = "reward_history.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RewardHistoryRecord {
    id: String,
    reward_id: String,
    child_id: String,
    kind: String,
    stars_earned: i64,
    timestamp: String,
}

impl From<&RewardHistoryEvent> for RewardHistoryRecord {
    fn from(event: &RewardHistoryEvent) -> Self {
        RewardHistoryRecord {
            id: event.id.clone(),
            reward_id: event.reward_id.clone(),
            child_id: event.child_id.clone(),
            kind: kind_to_str(event.kind).to_string(),
            stars_earned: event.stars_earned,
            timestamp: event.timestamp.to_rfc3339(),
        }
    }
}

impl TryFrom<RewardHistoryRecord> for RewardHistoryEvent {
    type Error = anyhow::Error;

    fn try_from(record: RewardHistoryRecord) -> Result<Self> {
        let kind = kind_from_str(&record.kind)
            .map_err(|e| anyhow::anyhow!("Failed to parse reward history kind: {}", e))?;
        Ok(RewardHistoryEvent {
            timestamp: parse_timestamp(&record.timestamp)?,
            id: record.id,
            reward_id: record.reward_id,
            child_id: record.child_id,
            kind,
            stars_earned: record.stars_earned,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RewardHistoryRepository {
    connection: CsvConnection,
}

impl RewardHistoryRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_history(&self, path: &Path) -> Result<Vec<RewardHistoryEvent>> {
        let mut history = Vec::new();
        for record in read_csv_records::<RewardHistoryRecord>(path)? {
            match RewardHistoryEvent::try_from(record) {
                Ok(event) => history.push(event),
                Err(e) => warn!("Failed to parse reward history in {:?}: {}. Skipping.", path, e),
            }
        }
        history.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(history)
    }
}

impl RewardHistoryStorage for RewardHistoryRepository {
    fn append_history_event(&self, event: &RewardHistoryEvent) -> Result<()> {
        let dir = self.connection.ensure_child_directory(&event.child_id)?;
        append_csv_record(&dir.join(HISTORY_FILE), &RewardHistoryRecord::from(event))
    }

    fn list_reward_history(&self, reward_id: &str) -> Result<Vec<RewardHistoryEvent>> {
        for dir in self.connection.child_directories()? {
            let history = self.read_history(&dir.join(HISTORY_FILE))?;
            let matching: Vec<RewardHistoryEvent> = history
                .into_iter()
                .filter(|h| h.reward_id == reward_id)
                .collect();
            // A reward's history lives with its child, so the first hit is all of it
            if !matching.is_empty() {
                return Ok(matching);
            }
        }
        Ok(Vec::new())
    }

    fn list_child_history(&self, child_id: &str) -> Result<Vec<RewardHistoryEvent>> {
        let path = self.connection.get_child_directory(child_id).join(HISTORY_FILE);
        let mut history = self.read_history(&path)?;
        history.retain(|h| h.child_id == child_id);
        Ok(history)
    }
}
