//! Celebration triggering.
//!
//! Celebrations are decided once, synchronously, for each logged moment by
//! comparing the event log before and after the append. Every rule is a
//! threshold *transition* so re-evaluating a later moment never repeats a
//! celebration that already fired:
//!
//! - **Goal reached**: `previous < target <= new` on the primary reward.
//! - **Milestone crossed**: same comparison against `ceil(target * pct / 100)`,
//!   skipped when the goal itself is reached by the same moment.
//! - **Gold Star Day**: today's positive-moment count for the child goes from
//!   `threshold - 1` to `threshold`. The count is a query over the log for the
//!   calendar day of "now", so backfilled moments are handled correctly.
//!   The day an award was given is kept on the child, so deleting and
//!   re-logging a moment cannot award the same day twice.
//! - **Pattern found**: delegated to a pluggable [`PatternDetector`].

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use log::{debug, info};
use shared::{Celebration, CelebrationKind};
use std::sync::Arc;

use crate::domain::config::EngineConfig;
use crate::domain::models::celebration::PatternInsight;
use crate::domain::models::event::BehaviorEvent;
use crate::domain::models::reward::Reward;
use crate::domain::progress::points_earned_in_window;

/// Extension point for behavioral-pattern insights.
pub trait PatternDetector: Send + Sync {
    /// Inspect the log right after `event` was appended to it.
    fn detect(
        &self,
        event: &BehaviorEvent,
        events: &[BehaviorEvent],
        offset: &FixedOffset,
        now: DateTime<Utc>,
    ) -> Option<PatternInsight>;
}

/// Detector that never reports anything. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPatternDetector;

impl PatternDetector for DisabledPatternDetector {
    fn detect(
        &self,
        _event: &BehaviorEvent,
        _events: &[BehaviorEvent],
        _offset: &FixedOffset,
        _now: DateTime<Utc>,
    ) -> Option<PatternInsight> {
        None
    }
}

/// Reports when the same behavior is logged exactly `threshold` times for a
/// child on the current calendar day.
#[derive(Debug, Clone, Copy)]
pub struct RepeatedBehaviorDetector {
    threshold: usize,
}

impl RepeatedBehaviorDetector {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }
}

impl PatternDetector for RepeatedBehaviorDetector {
    fn detect(
        &self,
        event: &BehaviorEvent,
        events: &[BehaviorEvent],
        offset: &FixedOffset,
        now: DateTime<Utc>,
    ) -> Option<PatternInsight> {
        let today = now.with_timezone(offset).date_naive();
        if event.calendar_day(offset) != today {
            return None;
        }

        let occurrences = events
            .iter()
            .filter(|e| e.child_id == event.child_id)
            .filter(|e| e.behavior_type_id == event.behavior_type_id)
            .filter(|e| e.calendar_day(offset) == today)
            .count();

        (occurrences == self.threshold).then(|| PatternInsight {
            behavior_type_id: event.behavior_type_id.clone(),
            occurrences,
            message: format!("Logged {} times today", occurrences),
        })
    }
}

/// Number of positive moments logged for `child_id` on `day`.
pub fn positive_events_on_day(
    events: &[BehaviorEvent],
    child_id: &str,
    day: NaiveDate,
    offset: &FixedOffset,
) -> usize {
    events
        .iter()
        .filter(|e| e.child_id == child_id && e.is_positive())
        .filter(|e| e.calendar_day(offset) == day)
        .count()
}

/// Snapshot handed to the engine for one freshly logged moment
pub struct CelebrationInput<'a> {
    pub event: &'a BehaviorEvent,
    /// Event log without the new moment
    pub events_before: &'a [BehaviorEvent],
    /// Event log including the new moment
    pub events_after: &'a [BehaviorEvent],
    /// The child's primary reward, if one is open
    pub active_reward: Option<&'a Reward>,
    /// Day the child last earned a Gold Star Day
    pub last_gold_star_day: Option<NaiveDate>,
    pub now: DateTime<Utc>,
}

/// Decides which celebrations a logged moment earns
#[derive(Clone)]
pub struct CelebrationEngine {
    gold_star_threshold: usize,
    milestones: Vec<u8>,
    offset: FixedOffset,
    pattern_detector: Arc<dyn PatternDetector>,
}

impl CelebrationEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let pattern_detector: Arc<dyn PatternDetector> = if config.pattern_detection.enabled {
            Arc::new(RepeatedBehaviorDetector::new(
                config.pattern_detection.repeat_threshold,
            ))
        } else {
            Arc::new(DisabledPatternDetector)
        };

        let mut milestones = config.progress_milestones.clone();
        milestones.sort_unstable();
        milestones.dedup();

        Self {
            gold_star_threshold: config.gold_star_threshold,
            milestones,
            offset: config.calendar_offset(),
            pattern_detector,
        }
    }

    /// Replace the pattern detector.
    pub fn with_pattern_detector(mut self, detector: Arc<dyn PatternDetector>) -> Self {
        self.pattern_detector = detector;
        self
    }

    pub fn gold_star_threshold(&self) -> usize {
        self.gold_star_threshold
    }

    /// Offset defining the family's calendar day
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn evaluate(&self, input: &CelebrationInput<'_>) -> Vec<Celebration> {
        let event = input.event;
        let mut celebrations = Vec::new();
        let celebrate = |kind: CelebrationKind| Celebration {
            event_id: event.id.clone(),
            child_id: event.child_id.clone(),
            kind,
        };

        if let Some(reward) = input.active_reward {
            let previous = points_earned_in_window(reward, input.events_before, true, input.now);
            let current = points_earned_in_window(reward, input.events_after, true, input.now);
            let target = i64::from(reward.target_points);
            debug!(
                "Reward {} progress {} -> {} (target {})",
                reward.id, previous, current, target
            );

            if previous < target && target <= current {
                info!("Reward {} reached by event {}", reward.id, event.id);
                celebrations.push(celebrate(CelebrationKind::GoalReached {
                    reward_id: reward.id.clone(),
                    reward_name: reward.name.clone(),
                    target_points: reward.target_points,
                }));
            } else {
                for &percent in &self.milestones {
                    let milestone = milestone_points(target, percent);
                    if previous < milestone && milestone <= current {
                        celebrations.push(celebrate(CelebrationKind::MilestoneCrossed {
                            reward_id: reward.id.clone(),
                            reward_name: reward.name.clone(),
                            percent,
                        }));
                    }
                }
            }
        }

        let today = input.now.with_timezone(&self.offset).date_naive();
        if event.is_positive() && input.last_gold_star_day != Some(today) {
            let before =
                positive_events_on_day(input.events_before, &event.child_id, today, &self.offset);
            let after =
                positive_events_on_day(input.events_after, &event.child_id, today, &self.offset);
            if before < self.gold_star_threshold && after == self.gold_star_threshold {
                info!("Gold Star Day for child {}", event.child_id);
                celebrations.push(celebrate(CelebrationKind::GoldStarDay {
                    positive_moments: after,
                }));
            }
        }

        if let Some(insight) =
            self.pattern_detector
                .detect(event, input.events_after, &self.offset, input.now)
        {
            celebrations.push(insight.into_celebration(&event.id, &event.child_id));
        }

        celebrations
    }
}

fn milestone_points(target: i64, percent: u8) -> i64 {
    let scaled = target * i64::from(percent);
    (scaled + 99) / 100
}
