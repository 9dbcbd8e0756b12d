//! Reward progress calculation.
//!
//! Progress is a pure function of a reward, the event log and the current
//! time. Window sums are signed and never clamped internally: a negative dip
//! has to be earned back before a reward reaches its target. Only the value
//! shown to a family is floored at zero.

use chrono::{DateTime, Utc};

use crate::domain::models::event::BehaviorEvent;
use crate::domain::models::reward::Reward;

/// Signed sum of points applied to the reward's child within its window.
pub fn window_points(reward: &Reward, events: &[BehaviorEvent], now: DateTime<Utc>) -> i64 {
    events
        .iter()
        .filter(|event| event.child_id == reward.child_id)
        .filter(|event| reward.is_in_window(event.timestamp, now))
        .map(|event| i64::from(event.points_applied))
        .sum()
}

/// Points a reward has earned in its active window.
///
/// For the primary reward the signed sum is returned, since it is compared
/// against the target. Queued rewards are only ever displayed, so their value
/// is floored at zero.
pub fn points_earned_in_window(
    reward: &Reward,
    events: &[BehaviorEvent],
    is_primary_reward: bool,
    now: DateTime<Utc>,
) -> i64 {
    let points = window_points(reward, events, now);
    if is_primary_reward {
        points
    } else {
        points.max(0)
    }
}

/// Display view of a reward's progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardProgress {
    /// Signed window sum used for comparisons
    pub raw_points: i64,
    /// Window sum floored at zero
    pub display_points: i64,
    pub target_points: i64,
}

impl RewardProgress {
    pub fn compute(reward: &Reward, events: &[BehaviorEvent], now: DateTime<Utc>) -> Self {
        let raw_points = window_points(reward, events, now);
        Self {
            raw_points,
            display_points: raw_points.max(0),
            target_points: i64::from(reward.target_points),
        }
    }

    pub fn has_reached_target(&self) -> bool {
        self.raw_points >= self.target_points
    }

    pub fn points_remaining(&self) -> i64 {
        (self.target_points - self.raw_points).max(0)
    }

    /// Progress in [0.0, 1.0]
    pub fn fraction(&self) -> f64 {
        if self.target_points <= 0 {
            return 1.0;
        }
        (self.display_points as f64 / self.target_points as f64).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn reward(created_at: DateTime<Utc>) -> Reward {
        Reward {
            id: "reward::r".to_string(),
            child_id: "child::c".to_string(),
            name: "Park trip".to_string(),
            target_points: 5,
            priority: 0,
            is_redeemed: false,
            redeemed_at: None,
            deadline: None,
            auto_reset_on_expire: false,
            created_at,
            reset_at: None,
            updated_at: created_at,
        }
    }

    fn event(child_id: &str, timestamp: DateTime<Utc>, points: i32) -> BehaviorEvent {
        BehaviorEvent {
            id: BehaviorEvent::generate_id(),
            child_id: child_id.to_string(),
            behavior_type_id: "behavior::b".to_string(),
            timestamp,
            points_applied: points,
            note: None,
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_only_counts_events_for_child_inside_window() {
        let r = reward(start());
        let now = start() + Duration::days(2);
        let events = vec![
            event("child::c", start() - Duration::hours(1), 10), // before window
            event("child::c", start() + Duration::hours(1), 2),
            event("child::other", start() + Duration::hours(2), 7),
            event("child::c", start() + Duration::days(3), 4), // after now
            event("child::c", start() + Duration::days(1), 1),
        ];

        assert_eq!(points_earned_in_window(&r, &events, true, now), 3);
    }

    #[test]
    fn test_window_starts_at_reset() {
        let mut r = reward(start());
        r.reset_at = Some(start() + Duration::days(1));
        let now = start() + Duration::days(2);
        let events = vec![
            event("child::c", start() + Duration::hours(1), 4),
            event("child::c", start() + Duration::days(1) + Duration::hours(1), 2),
        ];

        assert_eq!(window_points(&r, &events, now), 2);
    }

    #[test]
    fn test_window_closes_at_deadline() {
        let mut r = reward(start());
        r.deadline = Some(start() + Duration::days(1));
        let now = start() + Duration::days(5);
        let events = vec![
            event("child::c", start() + Duration::hours(3), 3),
            event("child::c", start() + Duration::days(2), 3),
        ];

        assert_eq!(window_points(&r, &events, now), 3);
    }

    #[test]
    fn test_recovers_from_negative_dip() {
        let r = reward(start());
        let now = start() + Duration::days(1);
        let mut events = vec![event("child::c", start() + Duration::hours(1), -3)];

        let progress = RewardProgress::compute(&r, &events, now);
        assert_eq!(progress.raw_points, -3);
        assert!(!progress.has_reached_target());

        // 5 points after a -3 dip is not enough; the dip has to be earned back
        events.push(event("child::c", start() + Duration::hours(2), 5));
        assert!(!RewardProgress::compute(&r, &events, now).has_reached_target());

        events.push(event("child::c", start() + Duration::hours(3), 3));
        let progress = RewardProgress::compute(&r, &events, now);
        assert_eq!(progress.raw_points, 5);
        assert!(progress.has_reached_target());
    }

    #[test]
    fn test_display_is_floored_at_zero() {
        let r = reward(start());
        let now = start() + Duration::days(1);
        let events = vec![
            event("child::c", start() + Duration::hours(1), 2),
            event("child::c", start() + Duration::hours(2), -6),
        ];

        let progress = RewardProgress::compute(&r, &events, now);
        assert_eq!(progress.raw_points, -4);
        assert_eq!(progress.display_points, 0);
        assert_eq!(progress.fraction(), 0.0);
        assert_eq!(progress.points_remaining(), 9);
        assert_eq!(points_earned_in_window(&r, &events, false, now), 0);
        assert_eq!(points_earned_in_window(&r, &events, true, now), -4);
    }

    #[test]
    fn test_non_decreasing_as_positive_events_are_added() {
        let r = reward(start());
        let now = start() + Duration::days(1);
        let mut events = Vec::new();
        let mut previous = points_earned_in_window(&r, &events, true, now);

        for hour in 1..8 {
            events.push(event("child::c", start() + Duration::hours(hour), 1));
            let current = points_earned_in_window(&r, &events, true, now);
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(previous, 7);
    }
}
