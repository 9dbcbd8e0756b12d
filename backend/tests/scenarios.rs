//! End-to-end scenarios run against both storage backends.

use chrono::{DateTime, Duration, TimeZone, Utc};
use shared::{CelebrationKind, RewardHistoryKind, RewardStatus};
use std::sync::Arc;
use tempfile::TempDir;

use tiny_wins_backend::domain::commands::behavior::{
    CreateBehaviorTypeCommand, LogBehaviorCommand, LogBehaviorResult,
};
use tiny_wins_backend::domain::commands::child::CreateChildCommand;
use tiny_wins_backend::domain::commands::reward::CreateRewardCommand;
use tiny_wins_backend::domain::models::behavior::BehaviorType;
use tiny_wins_backend::domain::models::reward::Reward;
use tiny_wins_backend::domain::{Clock, EngineConfig, FixedClock};
use tiny_wins_backend::storage::{Connection, CsvConnection, MemoryConnection};
use tiny_wins_backend::Backend;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 17, 9, 0, 0).unwrap()
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Family<C: Connection> {
    backend: Backend<C>,
    clock: FixedClock,
    child_id: String,
    _data_dir: Option<TempDir>,
}

fn memory_family() -> Family<MemoryConnection> {
    init_logging();
    let clock = FixedClock::new(start());
    let backend = Backend::in_memory(EngineConfig::default(), Arc::new(clock.clone())).unwrap();
    Family::new(backend, clock, None)
}

fn csv_family() -> Family<CsvConnection> {
    init_logging();
    let data_dir = TempDir::new().unwrap();
    let clock = FixedClock::new(start());
    let connection = CsvConnection::new(data_dir.path()).unwrap();
    let backend =
        Backend::new(connection, EngineConfig::default(), Arc::new(clock.clone())).unwrap();
    Family::new(backend, clock, Some(data_dir))
}

impl<C: Connection> Family<C> {
    fn new(backend: Backend<C>, clock: FixedClock, data_dir: Option<TempDir>) -> Self {
        let child_id = backend
            .child_service
            .create_child(CreateChildCommand {
                name: "Sam".to_string(),
                color_tag: "#FFD166".to_string(),
            })
            .unwrap()
            .child
            .id;
        Self {
            backend,
            clock,
            child_id,
            _data_dir: data_dir,
        }
    }

    fn behavior(&self, name: &str, points: i32) -> BehaviorType {
        self.backend
            .behavior_service
            .create_behavior_type(CreateBehaviorTypeCommand {
                name: name.to_string(),
                category: "daily".to_string(),
                points,
            })
            .unwrap()
    }

    fn reward(&self, name: &str, target: i32, deadline: Option<DateTime<Utc>>) -> Reward {
        self.backend
            .reward_service
            .create_reward(CreateRewardCommand {
                child_id: self.child_id.clone(),
                name: name.to_string(),
                target_points: target,
                deadline,
                auto_reset_on_expire: false,
            })
            .unwrap()
    }

    fn log_at(&self, behavior: &BehaviorType, timestamp: Option<DateTime<Utc>>) -> LogBehaviorResult {
        self.backend
            .behavior_service
            .log_behavior(LogBehaviorCommand {
                child_id: self.child_id.clone(),
                behavior_type_id: behavior.id.clone(),
                timestamp,
                note: None,
            })
            .unwrap()
            .expect("moment should be logged")
    }

    fn log(&self, behavior: &BehaviorType) -> LogBehaviorResult {
        self.log_at(behavior, None)
    }

    fn status(&self, reward_id: &str) -> RewardStatus {
        self.backend
            .reward_service
            .reward_snapshot(reward_id)
            .unwrap()
            .unwrap()
            .status
    }

    fn history(&self, reward_id: &str, kind: RewardHistoryKind) -> usize {
        self.backend
            .reward_service
            .reward_history(reward_id)
            .unwrap()
            .iter()
            .filter(|h| h.kind == kind)
            .count()
    }

    /// Open (not redeemed, not expired) rewards holding priority 0
    fn open_primaries(&self) -> usize {
        let now = self.clock.now();
        self.backend
            .reward_service
            .list_rewards(&self.child_id)
            .unwrap()
            .iter()
            .filter(|s| s.reward.is_open(now) && s.reward.priority == 0)
            .count()
    }
}

fn count<F: Fn(&CelebrationKind) -> bool>(result: &LogBehaviorResult, pick: F) -> usize {
    result.celebrations.iter().filter(|c| pick(&c.kind)).count()
}

fn is_goal(kind: &CelebrationKind) -> bool {
    matches!(kind, CelebrationKind::GoalReached { .. })
}

fn is_gold_star(kind: &CelebrationKind) -> bool {
    matches!(kind, CelebrationKind::GoldStarDay { .. })
}

fn three_moments_reach_target<C: Connection>(family: Family<C>) {
    let sharing = family.behavior("Shared with sibling", 2);
    let reward = family.reward("Extra story", 5, None);

    family.clock.advance(Duration::minutes(1));
    let first = family.log(&sharing);
    family.clock.advance(Duration::minutes(1));
    let second = family.log(&sharing);
    assert_eq!(family.status(&reward.id), RewardStatus::Active);
    assert_eq!(second.active_reward.as_ref().unwrap().progress.raw_points, 4);

    family.clock.advance(Duration::minutes(1));
    let third = family.log(&sharing);
    assert_eq!(family.status(&reward.id), RewardStatus::ReadyToRedeem);

    assert_eq!(count(&first, is_goal), 0);
    assert_eq!(count(&second, is_goal), 0);
    assert_eq!(count(&third, is_goal), 1);
    assert_eq!(third.celebrations[0].event_id, third.event.id);
    assert_eq!(family.history(&reward.id, RewardHistoryKind::Earned), 1);
}

fn redeem_promotes_queued_reward<C: Connection>(family: Family<C>) {
    let primary = family.reward("Park", 5, None);
    let queued = family.reward("Baking", 8, None);
    assert_eq!(queued.priority, 1);

    let result = family
        .backend
        .reward_service
        .redeem_reward(&primary.id)
        .unwrap()
        .unwrap();

    assert!(result.reward.is_redeemed);
    let reloaded = family.backend.reward_service.get_reward(&queued.id).unwrap().unwrap();
    assert_eq!(reloaded.priority, 0);
    assert_eq!(family.status(&primary.id), RewardStatus::Redeemed);
    assert_eq!(family.open_primaries(), 1);
}

fn past_deadline_expires_once<C: Connection>(family: Family<C>) {
    let moment = family.behavior("Made bed", 1);
    let reward = family.reward("Zoo trip", 10, Some(start() + Duration::hours(1)));
    family.clock.advance(Duration::hours(2));

    for _ in 0..3 {
        assert_eq!(family.status(&reward.id), RewardStatus::Expired);
        family
            .backend
            .reward_service
            .process_expirations(&family.child_id)
            .unwrap();
    }
    family.log(&moment);
    assert!(family.backend.redeem(&reward.id).unwrap().is_none());

    assert_eq!(family.history(&reward.id, RewardHistoryKind::Expired), 1);
    assert_eq!(family.status(&reward.id), RewardStatus::Expired);
}

fn gold_star_regardless_of_insertion_order<C: Connection>(family: Family<C>) {
    let kind = family.behavior("Kind words", 1);
    let whining = family.behavior("Whining", -1);
    family.clock.advance(Duration::hours(9)); // 18:00

    // Out-of-order backfill, a negative moment and yesterday's moment
    let offsets = [3, 1, 5, 2];
    let mut results = Vec::new();
    for hours in offsets {
        results.push(family.log_at(&kind, Some(family.clock.now() - Duration::hours(hours))));
    }
    results.push(family.log(&whining));
    results.push(family.log_at(&kind, Some(family.clock.now() - Duration::days(1))));
    assert!(results.iter().all(|r| count(r, is_gold_star) == 0));

    let fifth = family.log_at(&kind, Some(family.clock.now() - Duration::hours(8)));
    assert_eq!(count(&fifth, is_gold_star), 1);

    let sixth = family.log(&kind);
    assert_eq!(count(&sixth, is_gold_star), 0);
}

fn redemption_is_idempotent<C: Connection>(family: Family<C>) {
    let primary = family.reward("Pancakes", 3, None);
    family.reward("Board game", 6, None);

    let first = family.backend.redeem(&primary.id).unwrap().unwrap();
    assert!(!first.already_redeemed);
    let rewards_after_first = family
        .backend
        .reward_service
        .list_rewards(&family.child_id)
        .unwrap()
        .into_iter()
        .map(|s| s.reward)
        .collect::<Vec<_>>();

    family.clock.advance(Duration::minutes(10));
    let second = family.backend.redeem(&primary.id).unwrap().unwrap();
    assert!(second.already_redeemed);
    assert!(second.promoted.is_none());

    let rewards_after_second = family
        .backend
        .reward_service
        .list_rewards(&family.child_id)
        .unwrap()
        .into_iter()
        .map(|s| s.reward)
        .collect::<Vec<_>>();
    assert_eq!(rewards_after_first, rewards_after_second);
    assert_eq!(family.history(&primary.id, RewardHistoryKind::Given), 1);
}

fn single_primary_through_lifecycle<C: Connection>(family: Family<C>) {
    let a = family.reward("A", 5, Some(start() + Duration::days(1)));
    assert_eq!(family.open_primaries(), 1);
    let b = family.reward("B", 5, None);
    let c = family.reward("C", 5, None);
    assert_eq!(family.open_primaries(), 1);

    family
        .backend
        .reward_service
        .reorder_rewards(&family.child_id, &[c.id.clone(), a.id.clone(), b.id.clone()])
        .unwrap();
    assert_eq!(family.open_primaries(), 1);

    family.backend.redeem(&c.id).unwrap().unwrap();
    assert_eq!(family.open_primaries(), 1);

    // A is primary again and expires; B takes over
    family.clock.advance(Duration::days(2));
    family
        .backend
        .reward_service
        .process_expirations(&family.child_id)
        .unwrap();
    assert_eq!(family.open_primaries(), 1);
    let active = family.backend.reward_service.active_reward(&family.child_id).unwrap();
    assert_eq!(active.map(|s| s.reward.id), Some(b.id.clone()));

    family.backend.redeem(&b.id).unwrap().unwrap();
    assert_eq!(family.open_primaries(), 0);

    let d = family.reward("D", 5, None);
    assert_eq!(d.priority, 0);
    assert_eq!(family.open_primaries(), 1);
}

fn negative_dip_must_be_earned_back<C: Connection>(family: Family<C>) {
    let good = family.behavior("Helped", 3);
    let bad = family.behavior("Hit sibling", -4);
    let reward = family.reward("Swimming", 5, None);

    family.clock.advance(Duration::minutes(1));
    family.log(&bad);
    family.clock.advance(Duration::minutes(1));
    let after_good = family.log(&good);
    let snapshot = after_good.active_reward.unwrap();
    assert_eq!(snapshot.progress.raw_points, -1);
    assert_eq!(snapshot.progress.display_points, 0);

    family.clock.advance(Duration::minutes(1));
    family.log(&good);
    family.clock.advance(Duration::minutes(1));
    let reached = family.log(&good);
    assert_eq!(count(&reached, is_goal), 1);
    assert_eq!(family.status(&reward.id), RewardStatus::ReadyToRedeem);
}

fn status_queries_settle_expiry<C: Connection>(family: Family<C>) {
    let primary = family.reward("Aquarium", 10, Some(start() + Duration::days(1)));
    let queued = family.reward("Puzzle", 6, None);
    family.clock.advance(Duration::days(2));

    for _ in 0..3 {
        assert_eq!(family.status(&primary.id), RewardStatus::Expired);
        family.backend.child_dashboard(&family.child_id).unwrap().unwrap();
    }

    assert_eq!(family.history(&primary.id, RewardHistoryKind::Expired), 1);
    let dashboard = family.backend.child_dashboard(&family.child_id).unwrap().unwrap();
    let active = dashboard.active_reward.unwrap();
    assert_eq!(active.id, queued.id);
    assert_eq!(active.priority, 0);
    assert!(dashboard.queued_rewards.is_empty());
}

fn gold_star_once_after_delete_and_relog<C: Connection>(family: Family<C>) {
    let tidy = family.behavior("Tidied up", 1);
    let mut fired = 0;
    let mut last_event = None;
    for _ in 0..5 {
        family.clock.advance(Duration::minutes(10));
        let result = family.log(&tidy);
        fired += count(&result, is_gold_star);
        last_event = Some(result.event.id);
    }

    family
        .backend
        .behavior_service
        .delete_event(&last_event.unwrap())
        .unwrap()
        .unwrap();
    family.clock.advance(Duration::minutes(10));
    fired += count(&family.log(&tidy), is_gold_star);

    assert_eq!(fired, 1);
}

macro_rules! on_both_backends {
    ($($scenario:ident),* $(,)?) => {
        mod memory {
            $(
                #[test]
                fn $scenario() {
                    super::$scenario(super::memory_family());
                }
            )*
        }

        mod csv_files {
            $(
                #[test]
                fn $scenario() {
                    super::$scenario(super::csv_family());
                }
            )*
        }
    };
}

on_both_backends!(
    three_moments_reach_target,
    redeem_promotes_queued_reward,
    past_deadline_expires_once,
    gold_star_regardless_of_insertion_order,
    redemption_is_idempotent,
    single_primary_through_lifecycle,
    negative_dip_must_be_earned_back,
    status_queries_settle_expiry,
    gold_star_once_after_delete_and_relog,
);

#[test]
fn csv_data_survives_reopen() {
    init_logging();
    let data_dir = TempDir::new().unwrap();
    let (child_id, reward_id) = {
        let family = Family::new(Backend::open(data_dir.path()).unwrap(), FixedClock::new(start()), None);
        let helped = family.behavior("Helped", 2);
        let reward = family.reward("Kite", 4, None);
        family.log(&helped);
        (family.child_id, reward.id)
    };

    let reopened = Backend::open(data_dir.path()).unwrap();
    let dashboard = reopened.child_dashboard(&child_id).unwrap().unwrap();
    assert_eq!(dashboard.child.total_points, 2);
    assert_eq!(dashboard.active_reward.map(|r| r.id), Some(reward_id));
}
