use serde::{Deserialize, Serialize};

/// A kind of moment a parent can log, with the points it is worth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorType {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Signed point value applied whenever a moment of this type is logged
    pub points: i32,
}

impl BehaviorType {
    pub fn generate_id() -> String {
        format!("behavior::{}", uuid::Uuid::new_v4())
    }

    pub fn is_positive(&self) -> bool {
        self.points > 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BehaviorValidationError {
    #[error("Behavior name cannot be empty")]
    EmptyName,
    #[error("Behavior name cannot exceed {0} characters")]
    NameTooLong(usize),
    #[error("Behavior points cannot be zero")]
    ZeroPoints,
}
