use shared::{BehaviorEvent as SharedEvent, BehaviorType as SharedBehaviorType};

use crate::domain::models::behavior::BehaviorType;
use crate::domain::models::event::BehaviorEvent;

pub struct BehaviorMapper;

impl BehaviorMapper {
    pub fn behavior_type_to_dto(domain: BehaviorType) -> SharedBehaviorType {
        SharedBehaviorType {
            id: domain.id,
            name: domain.name,
            category: domain.category,
            points: domain.points,
        }
    }

    pub fn event_to_dto(domain: BehaviorEvent) -> SharedEvent {
        SharedEvent {
            id: domain.id,
            child_id: domain.child_id,
            behavior_type_id: domain.behavior_type_id,
            timestamp: domain.timestamp.to_rfc3339(),
            points_applied: domain.points_applied,
            note: domain.note,
        }
    }

    pub fn event_to_dto_list(events: Vec<BehaviorEvent>) -> Vec<SharedEvent> {
        events.into_iter().map(Self::event_to_dto).collect()
    }
}
