use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RepeatError;

/// Parameters of the banded local self-alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalAlignmentConfig {
    /// Minimum number of events ahead an alignment partner may be.
    pub min_events_distance: usize,
    /// Maximum number of events ahead an alignment partner may be.
    pub max_events_distance: usize,
    /// Flat per-step bonus added to every transition.
    pub score_for_moving: f64,
    /// Upper bound on how many rows or columns one transition may skip.
    pub max_speed_ratio: usize,
    /// Tolerance for treating consecutive samples as one event.
    pub event_threshold: f64,
    /// Anti-diagonals a traceback pointer waits before it is committed.
    /// Must exceed the effective step-back radius.
    pub min_lookahead: usize,
    /// Keep only paths whose end reaches back over their own start.
    pub repeats_only: bool,
    /// z-score the signal before alignment (pipeline front-end only).
    pub normalize_signal: bool,
}

impl LocalAlignmentConfig {
    pub const DEFAULT_MIN_EVENTS_DISTANCE: usize = 3;
    pub const DEFAULT_MAX_EVENTS_DISTANCE: usize = 60;
    pub const DEFAULT_SCORE_FOR_MOVING: f64 = 0.13;
    pub const DEFAULT_MAX_SPEED_RATIO: usize = 4;
    pub const DEFAULT_EVENT_THRESHOLD: f64 = 0.5;
    pub const DEFAULT_MIN_LOOKAHEAD: usize = 250;

    pub fn load(path: &Path) -> Result<Self, RepeatError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| RepeatError::io("read alignment config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| RepeatError::json("parse alignment config", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the preconditions that do not depend on the input trace.
    /// The lookahead/radius relation is checked once the radius is known.
    pub fn validate(&self) -> Result<(), RepeatError> {
        if self.min_events_distance > self.max_events_distance {
            return Err(RepeatError::invalid_input(format!(
                "min_events_distance ({}) exceeds max_events_distance ({})",
                self.min_events_distance, self.max_events_distance
            )));
        }
        if !(self.event_threshold.is_finite() && self.event_threshold > 0.0) {
            return Err(RepeatError::invalid_input(format!(
                "event_threshold must be a positive finite number, got {}",
                self.event_threshold
            )));
        }
        if !self.score_for_moving.is_finite() {
            return Err(RepeatError::invalid_input(format!(
                "score_for_moving must be finite, got {}",
                self.score_for_moving
            )));
        }
        if self.max_speed_ratio == 0 {
            return Err(RepeatError::invalid_input("max_speed_ratio must be >= 1"));
        }
        if self.min_lookahead == 0 {
            return Err(RepeatError::invalid_input("min_lookahead must be >= 1"));
        }
        Ok(())
    }
}

impl Default for LocalAlignmentConfig {
    fn default() -> Self {
        Self {
            min_events_distance: Self::DEFAULT_MIN_EVENTS_DISTANCE,
            max_events_distance: Self::DEFAULT_MAX_EVENTS_DISTANCE,
            score_for_moving: Self::DEFAULT_SCORE_FOR_MOVING,
            max_speed_ratio: Self::DEFAULT_MAX_SPEED_RATIO,
            event_threshold: Self::DEFAULT_EVENT_THRESHOLD,
            min_lookahead: Self::DEFAULT_MIN_LOOKAHEAD,
            repeats_only: true,
            normalize_signal: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RepeatFinderConfig {
    pub alignment: LocalAlignmentConfig,
    /// Where to write the traceback diagnostic; `None` disables it.
    pub traceback_log_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_alignment_config_default() {
        let config = LocalAlignmentConfig::default();
        assert_eq!(config.min_events_distance, 3);
        assert_eq!(config.max_events_distance, 60);
        assert!((config.score_for_moving - 0.13).abs() < 1e-12);
        assert_eq!(config.max_speed_ratio, 4);
        assert!((config.event_threshold - 0.5).abs() < 1e-12);
        assert_eq!(config.min_lookahead, 250);
        assert!(config.repeats_only);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{ "max_speed_ratio": 6, "min_lookahead": 40 }"#;
        let config: LocalAlignmentConfig = serde_json::from_str(json).expect("valid config json");
        assert_eq!(config.max_speed_ratio, 6);
        assert_eq!(config.min_lookahead, 40);
        assert_eq!(config.max_events_distance, 60);
    }

    #[test]
    fn validate_rejects_inverted_distances() {
        let config = LocalAlignmentConfig {
            min_events_distance: 10,
            max_events_distance: 2,
            ..LocalAlignmentConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_events_distance"));
    }

    #[test]
    fn validate_rejects_non_positive_threshold() {
        let config = LocalAlignmentConfig {
            event_threshold: 0.0,
            ..LocalAlignmentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_speed_ratio_and_lookahead() {
        let no_speed = LocalAlignmentConfig {
            max_speed_ratio: 0,
            ..LocalAlignmentConfig::default()
        };
        assert!(no_speed.validate().is_err());
        let no_lookahead = LocalAlignmentConfig {
            min_lookahead: 0,
            ..LocalAlignmentConfig::default()
        };
        assert!(no_lookahead.validate().is_err());
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "score_for_moving": 0.5 }"#).expect("write config");
        let config = LocalAlignmentConfig::load(&path).expect("load config");
        assert!((config.score_for_moving - 0.5).abs() < 1e-12);
    }

    #[test]
    fn load_fails_on_missing_file() {
        let result = LocalAlignmentConfig::load(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(RepeatError::Io { .. })));
    }
}
