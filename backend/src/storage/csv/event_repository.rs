//! # CSV Event Repository
//!
//! Each child's moments are an append-only log in
//! `{child_directory}/events.csv`:
//!
//! ```csv
//! id,child_id,behavior_type_id,timestamp,points_applied,note
//! event::9f1c..,child::1b4e..,behavior::77aa..,2025-01-20T18:30:00+00:00,2,"Shared toys"
//! ```
//!
//! Deleting an event rewrites the child's file through a temp file.

use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::connection::{
    append_csv_record, parse_timestamp, read_csv_records, write_csv_records, CsvConnection,
};
use crate::domain::models::event::BehaviorEvent;
use crate::storage::traits::BehaviorEventStorage;

const EVENTS_FILE: &str = "events.csv";

/// CSV record structure for events
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventRecord {
    id: String,
    child_id: String,
    behavior_type_id: String,
    timestamp: String,
    points_applied: i32,
    note: Option<String>,
}

impl From<&BehaviorEvent> for EventRecord {
    fn from(event: &BehaviorEvent) -> Self {
        EventRecord {
            id: event.id.clone(),
            child_id: event.child_id.clone(),
            behavior_type_id: event.behavior_type_id.clone(),
            timestamp: event.timestamp.to_rfc3339(),
            points_applied: event.points_applied,
            note: event.note.clone(),
        }
    }
}

impl TryFrom<EventRecord> for BehaviorEvent {
    type Error = anyhow::Error;

    fn try_from(record: EventRecord) -> Result<Self> {
        Ok(BehaviorEvent {
            timestamp: parse_timestamp(&record.timestamp)?,
            id: record.id,
            child_id: record.child_id,
            behavior_type_id: record.behavior_type_id,
            points_applied: record.points_applied,
            note: record.note.filter(|n| !n.is_empty()),
        })
    }
}

/// CSV-backed event log using per-child files
#[derive(Debug, Clone)]
pub struct EventRepository {
    connection: CsvConnection,
}

impl EventRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn events_file_path(&self, child_id: &str) -> PathBuf {
        self.connection.get_child_directory(child_id).join(EVENTS_FILE)
    }

    fn read_events(&self, path: &Path) -> Result<Vec<BehaviorEvent>> {
        let mut events = Vec::new();
        for record in read_csv_records::<EventRecord>(path)? {
            match BehaviorEvent::try_from(record) {
                Ok(event) => events.push(event),
                Err(e) => warn!("Failed to parse event record in {:?}: {}. Skipping.", path, e),
            }
        }
        Ok(events)
    }

    fn write_events(&self, path: &Path, events: &[BehaviorEvent]) -> Result<()> {
        let records: Vec<EventRecord> = events.iter().map(EventRecord::from).collect();
        write_csv_records(path, &records)
    }
}

impl BehaviorEventStorage for EventRepository {
    fn append_event(&self, event: &BehaviorEvent) -> Result<()> {
        let dir = self.connection.ensure_child_directory(&event.child_id)?;
        let path = dir.join(EVENTS_FILE);
        append_csv_record(&path, &EventRecord::from(event))?;
        debug!("Appended event {} to {:?}", event.id, path);
        Ok(())
    }

    fn get_event(&self, event_id: &str) -> Result<Option<BehaviorEvent>> {
        for dir in self.connection.child_directories()? {
            let events = self.read_events(&dir.join(EVENTS_FILE))?;
            if let Some(event) = events.into_iter().find(|e| e.id == event_id) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    fn list_events(&self, child_id: &str) -> Result<Vec<BehaviorEvent>> {
        let mut events = self.read_events(&self.events_file_path(child_id))?;
        events.retain(|e| e.child_id == child_id);
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(events)
    }

    fn list_all_events(&self) -> Result<Vec<BehaviorEvent>> {
        let mut events = Vec::new();
        for dir in self.connection.child_directories()? {
            events.extend(self.read_events(&dir.join(EVENTS_FILE))?);
        }
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(events)
    }

    fn delete_event(&self, event_id: &str) -> Result<bool> {
        for dir in self.connection.child_directories()? {
            let path = dir.join(EVENTS_FILE);
            let mut events = self.read_events(&path)?;
            let before = events.len();
            events.retain(|e| e.id != event_id);
            if events.len() != before {
                self.write_events(&path, &events)?;
                debug!("Deleted event {} from {:?}", event_id, path);
                return Ok(true);
            }
        }
        Ok(false)
    }
}
