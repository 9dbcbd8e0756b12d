//! backend/src/domain/models/child.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Domain model representing a child in the system.
///
/// Children are archived rather than removed while any history refers to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub name: String,
    pub color_tag: String,
    /// Running sum of `points_applied` over every logged event
    pub total_points: i64,
    pub is_archived: bool,
    /// Calendar day of the last Gold Star Day awarded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_gold_star_day: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Child {
    /// Generate a unique ID for a child
    pub fn generate_id() -> String {
        format!("child::{}", uuid::Uuid::new_v4())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChildValidationError {
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("Name cannot exceed {0} characters")]
    NameTooLong(usize),
    #[error("Color tag cannot be empty")]
    EmptyColorTag,
}
