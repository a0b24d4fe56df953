use std::path::PathBuf;

use crate::config::RepeatFinderConfig;
use crate::error::RepeatError;
use crate::pipeline::defaults::{SameDifferentScorer, ThresholdSegmenter};
use crate::pipeline::runtime::{RepeatFinder, RepeatFinderParts};
use crate::pipeline::traits::{EventSegmenter, PairScorer};

pub struct RepeatFinderBuilder {
    config: RepeatFinderConfig,
    segmenter: Option<Box<dyn EventSegmenter>>,
    scorer: Option<Box<dyn PairScorer>>,
}

impl RepeatFinderBuilder {
    pub fn new(config: RepeatFinderConfig) -> Self {
        Self {
            config,
            segmenter: None,
            scorer: None,
        }
    }

    pub fn with_segmenter(mut self, segmenter: Box<dyn EventSegmenter>) -> Self {
        self.segmenter = Some(segmenter);
        self
    }

    pub fn with_scorer(mut self, scorer: Box<dyn PairScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.traceback_log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<RepeatFinder, RepeatError> {
        self.config.alignment.validate()?;
        Ok(RepeatFinder::from_parts(RepeatFinderParts {
            config: self.config,
            segmenter: self
                .segmenter
                .unwrap_or_else(|| Box::new(ThresholdSegmenter)),
            scorer: self
                .scorer
                .unwrap_or_else(|| Box::new(SameDifferentScorer::default())),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::events::EventBoundaries;
    use crate::config::LocalAlignmentConfig;
    use crate::types::AlignmentInput;

    struct SingleEventSegmenter;

    impl EventSegmenter for SingleEventSegmenter {
        fn segment(&self, signal: &[f64], _tolerance: f64) -> EventBoundaries {
            EventBoundaries::from_bounds(vec![0, signal.len()], signal.len())
                .unwrap_or_else(|| EventBoundaries::segment(signal, f64::MAX))
        }
    }

    struct FlatScorer;

    impl PairScorer for FlatScorer {
        fn penalty(&self, _first: &[f32], _second: &[f32]) -> f64 {
            10.0
        }
    }

    fn small_config() -> RepeatFinderConfig {
        RepeatFinderConfig {
            alignment: LocalAlignmentConfig {
                min_events_distance: 0,
                max_events_distance: 1,
                min_lookahead: 8,
                normalize_signal: false,
                ..LocalAlignmentConfig::default()
            },
            traceback_log_path: None,
        }
    }

    #[test]
    fn builder_defaults_build() {
        let finder = RepeatFinderBuilder::new(small_config())
            .build()
            .expect("default config is valid");
        assert!(finder.config().traceback_log_path.is_none());
    }

    #[test]
    fn builder_log_path_is_recorded() {
        let finder = RepeatFinderBuilder::new(small_config())
            .with_log_path("/tmp/traceback.bin")
            .build()
            .expect("valid config");
        assert_eq!(
            finder.config().traceback_log_path.as_deref(),
            Some(std::path::Path::new("/tmp/traceback.bin"))
        );
    }

    #[test]
    fn build_fails_on_invalid_config() {
        let mut config = small_config();
        config.alignment.max_speed_ratio = 0;
        assert!(RepeatFinderBuilder::new(config).build().is_err());
    }

    #[test]
    fn custom_stages_are_used() {
        let finder = RepeatFinderBuilder::new(small_config())
            .with_segmenter(Box::new(SingleEventSegmenter))
            .with_scorer(Box::new(FlatScorer))
            .build()
            .expect("valid config");
        let input = AlignmentInput {
            signal: vec![0.0, 1.0, 2.0, 3.0],
            predictions: vec![vec![1.0, 0.0]; 4],
        };
        let output = finder.find_repeats(&input).expect("alignment runs");
        // A prohibitive flat penalty leaves nothing worth extracting.
        assert!(output.paths.is_empty());
        assert_eq!(output.stats.event_count, 1);
    }
}
