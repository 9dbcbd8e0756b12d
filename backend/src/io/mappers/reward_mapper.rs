use shared::{RewardHistoryEntry, RewardSummary};

use crate::domain::commands::reward::RewardSnapshot;
use crate::domain::models::reward_history::RewardHistoryEvent;

pub struct RewardMapper;

impl RewardMapper {
    /// Flatten a reward and its derived progress into a display summary
    pub fn to_summary(snapshot: RewardSnapshot) -> RewardSummary {
        let RewardSnapshot {
            reward,
            progress,
            status,
        } = snapshot;

        RewardSummary {
            id: reward.id,
            child_id: reward.child_id,
            name: reward.name,
            target_points: reward.target_points,
            priority: reward.priority,
            earned_points: progress.display_points,
            points_remaining: progress.points_remaining(),
            progress_fraction: progress.fraction(),
            status,
            deadline: reward.deadline.map(|d| d.to_rfc3339()),
            auto_reset_on_expire: reward.auto_reset_on_expire,
        }
    }

    pub fn to_summary_list(snapshots: Vec<RewardSnapshot>) -> Vec<RewardSummary> {
        snapshots.into_iter().map(Self::to_summary).collect()
    }

    pub fn history_to_dto(domain: RewardHistoryEvent) -> RewardHistoryEntry {
        RewardHistoryEntry {
            id: domain.id,
            reward_id: domain.reward_id,
            kind: domain.kind,
            stars_earned: domain.stars_earned,
            timestamp: domain.timestamp.to_rfc3339(),
        }
    }
}
