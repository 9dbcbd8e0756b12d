//! Composite queries returning front-end DTOs.

use anyhow::Result;
use chrono::{DateTime, Utc};
use shared::{
    BehaviorEvent, BehaviorType, Child, ChildDashboard, LogMomentResponse, RedeemRewardResponse,
    RewardHistoryEntry, RewardSummary,
};

use crate::domain::commands::behavior::LogBehaviorCommand;
use crate::domain::commands::reward::RewardSnapshot;
use crate::domain::models::reward::Reward;
use crate::io::mappers::{BehaviorMapper, ChildMapper, RewardMapper};
use crate::storage::Connection;
use crate::Backend;

impl<C: Connection> Backend<C> {
    /// Everything a child's home screen shows.
    ///
    /// Rewards whose deadline has passed are settled first, so the active
    /// reward is never an expired one.
    pub fn child_dashboard(&self, child_id: &str) -> Result<Option<ChildDashboard>> {
        let child = match self.child_service.get_child(child_id)? {
            Some(child) => child,
            None => return Ok(None),
        };

        let active_reward = self
            .reward_service
            .active_reward(child_id)?
            .map(RewardMapper::to_summary);
        let queued_rewards =
            RewardMapper::to_summary_list(self.reward_service.queued_rewards(child_id)?);
        let positive_moments_today = self.behavior_service.positive_moments_today(child_id)?;

        Ok(Some(ChildDashboard {
            child: ChildMapper::to_dto(child),
            active_reward,
            queued_rewards,
            positive_moments_today,
            gold_star_threshold: self.config().gold_star_threshold,
        }))
    }

    /// Log a moment and return what the view needs to react to it
    pub fn log_moment(&self, command: LogBehaviorCommand) -> Result<Option<LogMomentResponse>> {
        let result = match self.behavior_service.log_behavior(command)? {
            Some(result) => result,
            None => return Ok(None),
        };

        Ok(Some(LogMomentResponse {
            event: BehaviorMapper::event_to_dto(result.event),
            child_total_points: result.child.total_points,
            active_reward: result.active_reward.map(RewardMapper::to_summary),
            celebrations: result.celebrations,
        }))
    }

    /// Redeem a reward and return the updated queue head
    pub fn redeem(&self, reward_id: &str) -> Result<Option<RedeemRewardResponse>> {
        let result = match self.reward_service.redeem_reward(reward_id)? {
            Some(result) => result,
            None => return Ok(None),
        };

        let reward = self.summarize(result.reward)?;
        let promoted = match result.promoted {
            Some(next) => Some(self.summarize(next)?),
            None => None,
        };

        Ok(Some(RedeemRewardResponse {
            reward,
            promoted,
            already_redeemed: result.already_redeemed,
        }))
    }

    pub fn children(&self, include_archived: bool) -> Result<Vec<Child>> {
        Ok(ChildMapper::to_dto_list(
            self.child_service.list_children(include_archived)?,
        ))
    }

    pub fn behavior_types(&self) -> Result<Vec<BehaviorType>> {
        Ok(self
            .behavior_service
            .list_behavior_types()?
            .into_iter()
            .map(BehaviorMapper::behavior_type_to_dto)
            .collect())
    }

    /// A child's moments, oldest first
    pub fn child_events(&self, child_id: &str) -> Result<Vec<BehaviorEvent>> {
        Ok(BehaviorMapper::event_to_dto_list(
            self.behavior_service.list_events(child_id)?,
        ))
    }

    /// A child's moments with timestamps in `[from, to]`
    pub fn child_events_between(
        &self,
        child_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BehaviorEvent>> {
        Ok(BehaviorMapper::event_to_dto_list(
            self.behavior_service.list_events_between(child_id, from, to)?,
        ))
    }

    /// The latest moments across every child, newest first
    pub fn family_feed(&self, limit: usize) -> Result<Vec<BehaviorEvent>> {
        let mut events = self.behavior_service.list_all_events()?;
        events.reverse();
        events.truncate(limit);
        Ok(BehaviorMapper::event_to_dto_list(events))
    }

    pub fn reward_history(&self, reward_id: &str) -> Result<Vec<RewardHistoryEntry>> {
        Ok(self
            .reward_service
            .reward_history(reward_id)?
            .into_iter()
            .map(RewardMapper::history_to_dto)
            .collect())
    }

    fn summarize(&self, reward: Reward) -> Result<RewardSummary> {
        let events = self.behavior_service.list_events(&reward.child_id)?;
        let snapshot = RewardSnapshot::compute(reward, &events, self.clock().now());
        Ok(RewardMapper::to_summary(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::behavior::CreateBehaviorTypeCommand;
    use crate::domain::commands::child::CreateChildCommand;
    use crate::domain::commands::reward::CreateRewardCommand;
    use crate::domain::{Clock, EngineConfig, FixedClock};
    use crate::storage::MemoryConnection;
    use chrono::{Duration, TimeZone};
    use shared::RewardStatus;
    use std::sync::Arc;

    fn backend() -> (Backend<MemoryConnection>, FixedClock) {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 8, 11, 7, 0, 0).unwrap());
        let backend = Backend::in_memory(EngineConfig::default(), Arc::new(clock.clone())).unwrap();
        (backend, clock)
    }

    #[test]
    fn test_dashboard_for_missing_child_is_none() {
        let (backend, _clock) = backend();
        assert!(backend.child_dashboard("child::missing").unwrap().is_none());
    }

    #[test]
    fn test_dashboard_log_and_redeem_flow() {
        let (backend, clock) = backend();
        let child = backend
            .child_service
            .create_child(CreateChildCommand {
                name: "Iris".to_string(),
                color_tag: "#FF8FAB".to_string(),
            })
            .unwrap()
            .child;
        let brushing = backend
            .behavior_service
            .create_behavior_type(CreateBehaviorTypeCommand {
                name: "Brushed teeth".to_string(),
                category: "routine".to_string(),
                points: 3,
            })
            .unwrap();
        let first = backend
            .reward_service
            .create_reward(CreateRewardCommand {
                child_id: child.id.clone(),
                name: "Sticker".to_string(),
                target_points: 3,
                deadline: None,
                auto_reset_on_expire: false,
            })
            .unwrap();
        let second = backend
            .reward_service
            .create_reward(CreateRewardCommand {
                child_id: child.id.clone(),
                name: "Comic".to_string(),
                target_points: 9,
                deadline: None,
                auto_reset_on_expire: false,
            })
            .unwrap();

        clock.advance(Duration::minutes(30));
        let logged = backend
            .log_moment(LogBehaviorCommand {
                child_id: child.id.clone(),
                behavior_type_id: brushing.id.clone(),
                timestamp: None,
                note: None,
            })
            .unwrap()
            .unwrap();
        assert_eq!(logged.child_total_points, 3);
        assert_eq!(
            logged.active_reward.as_ref().map(|r| r.status),
            Some(RewardStatus::ReadyToRedeem)
        );
        assert_eq!(logged.celebrations.len(), 1);

        let dashboard = backend.child_dashboard(&child.id).unwrap().unwrap();
        assert_eq!(dashboard.active_reward.as_ref().map(|r| r.id.clone()), Some(first.id.clone()));
        assert_eq!(dashboard.queued_rewards.len(), 1);
        assert_eq!(dashboard.positive_moments_today, 1);
        assert_eq!(dashboard.gold_star_threshold, 5);

        let redeemed = backend.redeem(&first.id).unwrap().unwrap();
        assert_eq!(redeemed.reward.status, RewardStatus::Redeemed);
        let promoted = redeemed.promoted.unwrap();
        assert_eq!(promoted.id, second.id);
        assert_eq!(promoted.priority, 0);

        let dashboard = backend.child_dashboard(&child.id).unwrap().unwrap();
        assert_eq!(dashboard.active_reward.map(|r| r.id), Some(second.id));
        assert!(dashboard.queued_rewards.is_empty());

        let history = backend.reward_history(&first.id).unwrap();
        assert_eq!(history.len(), 2);

        assert_eq!(backend.children(false).unwrap()[0].total_points, 3);
        assert_eq!(backend.behavior_types().unwrap()[0].name, "Brushed teeth");
        assert_eq!(backend.child_events(&child.id).unwrap()[0].points_applied, 3);
    }

    #[test]
    fn test_feed_and_event_range() {
        let (backend, clock) = backend();
        let mut child_ids = Vec::new();
        for name in ["Iris", "Theo"] {
            let child = backend
                .child_service
                .create_child(CreateChildCommand {
                    name: name.to_string(),
                    color_tag: "#FF8FAB".to_string(),
                })
                .unwrap()
                .child;
            child_ids.push(child.id);
        }
        let helping = backend
            .behavior_service
            .create_behavior_type(CreateBehaviorTypeCommand {
                name: "Helped out".to_string(),
                category: "kindness".to_string(),
                points: 1,
            })
            .unwrap();

        let start = clock.now();
        let mut logged = Vec::new();
        for child_id in child_ids.iter().chain(child_ids.iter()) {
            clock.advance(Duration::hours(1));
            let moment = backend
                .log_moment(LogBehaviorCommand {
                    child_id: child_id.clone(),
                    behavior_type_id: helping.id.clone(),
                    timestamp: None,
                    note: None,
                })
                .unwrap()
                .unwrap();
            logged.push(moment.event.id);
        }

        let feed: Vec<String> = backend.family_feed(3).unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(feed, vec![logged[3].clone(), logged[2].clone(), logged[1].clone()]);

        let first_two_hours = backend
            .child_events_between(&child_ids[0], start, start + Duration::hours(2))
            .unwrap();
        assert_eq!(first_two_hours.len(), 1);
        assert_eq!(first_two_hours[0].id, logged[0]);
    }

    #[test]
    fn test_dashboard_settles_expired_primary() {
        let (backend, clock) = backend();
        let child = backend
            .child_service
            .create_child(CreateChildCommand {
                name: "Iris".to_string(),
                color_tag: "#FF8FAB".to_string(),
            })
            .unwrap()
            .child;
        let reward = |name: &str, deadline| CreateRewardCommand {
            child_id: child.id.clone(),
            name: name.to_string(),
            target_points: 5,
            deadline,
            auto_reset_on_expire: false,
        };
        let expiring = backend
            .reward_service
            .create_reward(reward("Museum", Some(clock.now() + Duration::days(1))))
            .unwrap();
        let waiting = backend.reward_service.create_reward(reward("Pool", None)).unwrap();

        clock.advance(Duration::days(2));
        let dashboard = backend.child_dashboard(&child.id).unwrap().unwrap();

        assert_eq!(dashboard.active_reward.map(|r| r.id), Some(waiting.id));
        assert!(dashboard.queued_rewards.is_empty());
        assert_eq!(backend.reward_history(&expiring.id).unwrap().len(), 1);
    }
}
