use serde::{Deserialize, Serialize};
use shared::{Celebration, CelebrationKind};

/// Payload produced by a pattern detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternInsight {
    pub behavior_type_id: String,
    pub occurrences: usize,
    pub message: String,
}

impl PatternInsight {
    pub fn into_celebration(self, event_id: &str, child_id: &str) -> Celebration {
        Celebration {
            event_id: event_id.to_string(),
            child_id: child_id.to_string(),
            kind: CelebrationKind::PatternFound {
                behavior_type_id: self.behavior_type_id,
                occurrences: self.occurrences,
                message: self.message,
            },
        }
    }
}
