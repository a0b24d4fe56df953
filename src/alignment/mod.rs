pub mod band;
pub mod banded_matrix;
pub mod dp;
pub mod events;
mod greedy;
pub mod predictions;
pub mod repeat_map;
pub mod report;
pub mod scoring;
pub mod step_back;
pub mod traceback_log;

use std::path::Path;

use crate::alignment::band::BandSchedule;
use crate::alignment::dp::DpSweep;
use crate::alignment::greedy::GreedyExtractor;
use crate::alignment::predictions::validate_predictions;
use crate::alignment::scoring::TransitionScorer;
use crate::alignment::step_back::StepBackLimits;
use crate::alignment::traceback_log::write_traceback_log;
use crate::config::LocalAlignmentConfig;
use crate::error::RepeatError;
use crate::pipeline::defaults::{SameDifferentScorer, ThresholdSegmenter};
use crate::pipeline::traits::{EventSegmenter, PairScorer};
use crate::types::{AlignmentOutput, AlignmentStats};

/// Finds non-overlapping self-alignments between `signal` and its
/// per-sample `predictions` using the default segmenter and scorer.
///
/// When `log_path` is given, the band layout, the trace and all committed
/// traceback pointers are written there before paths are extracted.
pub fn local_alignment(
    signal: &[f64],
    predictions: &[Vec<f32>],
    config: &LocalAlignmentConfig,
    log_path: Option<&Path>,
) -> Result<AlignmentOutput, RepeatError> {
    align_with_stages(
        signal,
        predictions,
        config,
        log_path,
        &ThresholdSegmenter,
        &SameDifferentScorer::default(),
    )
}

pub fn align_with_stages(
    signal: &[f64],
    predictions: &[Vec<f32>],
    config: &LocalAlignmentConfig,
    log_path: Option<&Path>,
    segmenter: &dyn EventSegmenter,
    scorer: &dyn PairScorer,
) -> Result<AlignmentOutput, RepeatError> {
    config.validate()?;
    if let Some(index) = signal.iter().position(|x| !x.is_finite()) {
        return Err(RepeatError::invalid_input(format!(
            "signal sample {index} is not finite"
        )));
    }
    validate_predictions(signal.len(), predictions)?;
    if signal.is_empty() {
        return Ok(AlignmentOutput {
            paths: Vec::new(),
            stats: AlignmentStats::default(),
        });
    }

    let events = segmenter.segment(signal, 2.0 * config.event_threshold);
    if events.signal_len() != signal.len() || events.event_count() == 0 {
        return Err(RepeatError::invariant(
            "event segmentation",
            format!(
                "boundaries end at {} for a trace of {} samples",
                events.signal_len(),
                signal.len()
            ),
        ));
    }
    let band = BandSchedule::build(
        &events,
        config.min_events_distance,
        config.max_events_distance,
    );
    let limits = StepBackLimits::compute(
        signal,
        &band,
        config.event_threshold,
        config.max_speed_ratio,
    );
    let radius = limits.radius();
    tracing::debug!(
        events = events.event_count(),
        band_cells = band.cell_count(),
        step_back_radius = radius,
        "local alignment: band and step-back limits computed"
    );
    if config.min_lookahead <= radius {
        return Err(RepeatError::invalid_input(format!(
            "min_lookahead ({}) must exceed the step-back radius ({radius}); \
             committed traceback pointers would be unreliable",
            config.min_lookahead
        )));
    }

    let transitions = TransitionScorer::new(predictions, scorer, config.score_for_moving);
    let mut matrices = DpSweep::new(&band, &limits, &transitions).fill(config.min_lookahead)?;
    tracing::debug!("local alignment: sweep done");

    let clamped_log_deltas = match log_path {
        Some(path) => write_traceback_log(path, &band, signal, &matrices.traceback)?,
        None => 0,
    };

    let extraction =
        GreedyExtractor::new(&band, &transitions, config.repeats_only).extract(&mut matrices)?;
    tracing::debug!(
        paths = extraction.paths.len(),
        rejected_forward_paths = extraction.rejected_forward_paths,
        "local alignment: greedy extraction done"
    );

    Ok(AlignmentOutput {
        paths: extraction.paths,
        stats: AlignmentStats {
            event_count: events.event_count(),
            band_cells: band.cell_count(),
            step_back_radius: radius,
            clamped_log_deltas,
            rejected_forward_paths: extraction.rejected_forward_paths,
        },
    })
}
