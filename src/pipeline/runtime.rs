use std::borrow::Cow;
use std::path::Path;

use crate::alignment::align_with_stages;
use crate::config::RepeatFinderConfig;
use crate::error::RepeatError;
use crate::pipeline::traits::{EventSegmenter, PairScorer};
use crate::types::{AlignmentInput, AlignmentOutput};

pub struct RepeatFinder {
    config: RepeatFinderConfig,
    segmenter: Box<dyn EventSegmenter>,
    scorer: Box<dyn PairScorer>,
}

pub(crate) struct RepeatFinderParts {
    pub config: RepeatFinderConfig,
    pub segmenter: Box<dyn EventSegmenter>,
    pub scorer: Box<dyn PairScorer>,
}

impl RepeatFinder {
    pub(crate) fn from_parts(parts: RepeatFinderParts) -> Self {
        Self {
            config: parts.config,
            segmenter: parts.segmenter,
            scorer: parts.scorer,
        }
    }

    pub fn config(&self) -> &RepeatFinderConfig {
        &self.config
    }

    pub fn find_repeats(&self, input: &AlignmentInput) -> Result<AlignmentOutput, RepeatError> {
        self.find_repeats_with_log(input, self.config.traceback_log_path.as_deref())
    }

    /// Like [`RepeatFinder::find_repeats`], with a per-call traceback log
    /// destination overriding the configured one.
    pub fn find_repeats_with_log(
        &self,
        input: &AlignmentInput,
        log_path: Option<&Path>,
    ) -> Result<AlignmentOutput, RepeatError> {
        let alignment = &self.config.alignment;
        if input.signal.len() != input.predictions.len() {
            return Err(RepeatError::invalid_input(format!(
                "signal has {} samples but {} predictions were given",
                input.signal.len(),
                input.predictions.len()
            )));
        }

        tracing::debug!(
            samples = input.signal.len(),
            normalize = alignment.normalize_signal,
            "repeat finder: aligning trace"
        );
        let signal: Cow<'_, [f64]> = if alignment.normalize_signal {
            Cow::Owned(normalize_signal(&input.signal))
        } else {
            Cow::Borrowed(input.signal.as_slice())
        };

        align_with_stages(
            &signal,
            &input.predictions,
            alignment,
            log_path,
            self.segmenter.as_ref(),
            self.scorer.as_ref(),
        )
    }
}

/// Zero-mean, unit-variance copy of `samples`.
pub fn normalize_signal(samples: &[f64]) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let var = samples
        .iter()
        .map(|&x| {
            let d = x - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let std = var.sqrt().max(1e-7);
    samples.iter().map(|&x| (x - mean) / std).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocalAlignmentConfig;
    use crate::pipeline::builder::RepeatFinderBuilder;

    #[test]
    fn normalize_signal_is_zero_mean_unit_variance() {
        let normalized = normalize_signal(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mean = normalized.iter().sum::<f64>() / normalized.len() as f64;
        let var = normalized.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>()
            / normalized.len() as f64;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_constant_signal_stays_finite() {
        let normalized = normalize_signal(&[3.0; 8]);
        assert!(normalized.iter().all(|x| x.is_finite() && *x == 0.0));
        assert!(normalize_signal(&[]).is_empty());
    }

    #[test]
    fn mismatched_lengths_fail_fast() {
        let finder = RepeatFinderBuilder::new(RepeatFinderConfig::default())
            .build()
            .expect("default config");
        let input = AlignmentInput {
            signal: vec![0.0; 10],
            predictions: vec![vec![1.0]; 9],
        };
        let err = finder.find_repeats(&input).unwrap_err();
        assert!(matches!(err, RepeatError::InvalidInput { .. }));
    }

    #[test]
    fn empty_input_yields_no_paths() {
        let finder = RepeatFinderBuilder::new(RepeatFinderConfig {
            alignment: LocalAlignmentConfig::default(),
            traceback_log_path: None,
        })
        .build()
        .expect("default config");
        let input = AlignmentInput {
            signal: Vec::new(),
            predictions: Vec::new(),
        };
        let output = finder.find_repeats(&input).expect("empty input is fine");
        assert!(output.paths.is_empty());
    }
}
