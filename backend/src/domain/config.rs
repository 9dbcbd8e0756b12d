//! Engine configuration.
//!
//! Loaded from `tiny_wins.yaml` in the data directory (see
//! `storage::csv::ConfigRepository`). Every field has a default so a partial
//! file is valid.

use anyhow::{bail, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Tunables for celebrations and calendar handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Positive moments in one calendar day that make a Gold Star Day
    pub gold_star_threshold: usize,
    /// Percent-of-target milestones that trigger a milestone celebration
    pub progress_milestones: Vec<u8>,
    /// Offset from UTC, in minutes, that defines the family's calendar day
    pub utc_offset_minutes: i32,
    pub pattern_detection: PatternDetectionConfig,
    /// Capacity of the notification broadcast channel
    pub notification_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternDetectionConfig {
    pub enabled: bool,
    /// Same-behavior occurrences in one day that count as a pattern
    pub repeat_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gold_star_threshold: 5,
            progress_milestones: vec![50],
            utc_offset_minutes: 0,
            pattern_detection: PatternDetectionConfig::default(),
            notification_capacity: 64,
        }
    }
}

impl Default for PatternDetectionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            repeat_threshold: 3,
        }
    }
}

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.gold_star_threshold == 0 {
            bail!("gold_star_threshold must be at least 1");
        }
        if let Some(bad) = self
            .progress_milestones
            .iter()
            .find(|pct| **pct == 0 || **pct >= 100)
        {
            bail!("progress milestone {}% must be between 1 and 99", bad);
        }
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            bail!(
                "utc_offset_minutes {} is outside +/-{}",
                self.utc_offset_minutes,
                MAX_OFFSET_MINUTES
            );
        }
        if self.pattern_detection.repeat_threshold < 2 {
            bail!("pattern_detection.repeat_threshold must be at least 2");
        }
        if self.notification_capacity == 0 {
            bail!("notification_capacity must be at least 1");
        }
        Ok(())
    }

    /// Offset used to decide which calendar day a timestamp falls on.
    pub fn calendar_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gold_star_threshold, 5);
        assert_eq!(config.calendar_offset(), Utc.fix());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: EngineConfig = serde_yaml::from_str("utc_offset_minutes: -300\n").unwrap();
        assert_eq!(config.utc_offset_minutes, -300);
        assert_eq!(config.gold_star_threshold, 5);
        assert_eq!(config.calendar_offset().local_minus_utc(), -300 * 60);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut config = EngineConfig::default();
        config.progress_milestones = vec![50, 100];
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.utc_offset_minutes = 15 * 60;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.gold_star_threshold = 0;
        assert!(config.validate().is_err());
    }
}
