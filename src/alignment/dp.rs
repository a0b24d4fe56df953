//! Windowed anti-diagonal sweep filling the score and traceback matrices.
//!
//! Cells are visited by increasing `row + column`. The sweep advances in
//! overlapping windows of `2 * lookahead` anti-diagonals, stepping by
//! `lookahead`. Scores inside a window are always recomputed, but a cell's
//! predecessor is only committed once the cell sits in the second half of
//! the window (or in the very first window), so every transition that can
//! reach it has been seen. This holds only while `lookahead` exceeds the
//! step-back radius; the caller checks that before sweeping.

use crate::alignment::band::BandSchedule;
use crate::alignment::banded_matrix::BandedMatrix;
use crate::alignment::scoring::TransitionScorer;
use crate::alignment::step_back::StepBackLimits;
use crate::error::RepeatError;
use crate::types::Cell;

pub type Traceback = Option<Cell>;

#[derive(Debug, Clone)]
pub struct DpMatrices {
    pub score: BandedMatrix<f64>,
    pub traceback: BandedMatrix<Traceback>,
}

impl DpMatrices {
    pub fn new(band: &BandSchedule) -> Self {
        Self {
            score: BandedMatrix::new("score matrix", band, 0.0),
            traceback: BandedMatrix::new("traceback matrix", band, None),
        }
    }
}

/// One step of the sweep: the anti-diagonals it recomputes and the ones whose
/// predecessors it may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SweepWindow {
    start: usize,
    lookahead: usize,
    first: bool,
}

impl SweepWindow {
    fn sums(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.start + 2 * self.lookahead
    }

    fn commits(&self, sum: usize) -> bool {
        self.first || sum >= self.start + self.lookahead
    }
}

fn windows(min_sum: usize, max_sum: usize, lookahead: usize) -> impl Iterator<Item = SweepWindow> {
    let mut start = min_sum;
    let mut first = true;
    std::iter::from_fn(move || {
        if !first && start + lookahead > max_sum {
            return None;
        }
        let window = SweepWindow {
            start,
            lookahead,
            first,
        };
        first = false;
        start += lookahead;
        Some(window)
    })
}

pub(crate) struct DpSweep<'a> {
    band: &'a BandSchedule,
    limits: &'a StepBackLimits,
    transitions: &'a TransitionScorer<'a>,
}

impl<'a> DpSweep<'a> {
    pub(crate) fn new(
        band: &'a BandSchedule,
        limits: &'a StepBackLimits,
        transitions: &'a TransitionScorer<'a>,
    ) -> Self {
        Self {
            band,
            limits,
            transitions,
        }
    }

    pub(crate) fn fill(&self, lookahead: usize) -> Result<DpMatrices, RepeatError> {
        let mut matrices = DpMatrices::new(self.band);
        let (min_sum, max_sum) = (self.band.min_sum(), self.band.max_sum());
        for window in windows(min_sum, max_sum, lookahead) {
            tracing::debug!(window_start = window.start, max_sum, "dp: sweeping window");
            for sum in window.sums() {
                let commit = window.commits(sum);
                for cell in self.band.cells_on_antidiagonal(sum) {
                    let (best, origin) = self.best_incoming(&matrices.score, cell, window.start)?;
                    matrices.score.set(cell, best)?;
                    if commit {
                        if let Some(origin) = origin {
                            matrices.traceback.set(cell, Some(origin))?;
                        }
                    }
                }
            }
        }
        Ok(matrices)
    }

    /// Best local-alignment score reaching `cell` from predecessors whose
    /// anti-diagonal is not before `window_start`. Scores never drop below
    /// zero; `None` means the cell starts a fresh alignment.
    fn best_incoming(
        &self,
        score: &BandedMatrix<f64>,
        (row, column): Cell,
        window_start: usize,
    ) -> Result<(f64, Traceback), RepeatError> {
        let band = self.band;
        let moving = self.transitions.score_for_moving();
        let mut best = 0.0f64;
        let mut origin = None;

        // Advance one column, stepping back one or more rows.
        if column >= 1 && column - 1 >= band.row_start(row) {
            let from_col = column - 1;
            let mut step_score = moving;
            for row_step in 1..=self.limits.at(row).min(row) {
                let from_row = row - row_step;
                if band.row_end(from_row) <= column || from_row + from_col < window_start {
                    break;
                }
                step_score += self.transitions.step_gain(from_row, from_col);
                let proposed = score.at((from_row, from_col))? + step_score;
                if proposed > best {
                    best = proposed;
                    origin = Some((from_row, from_col));
                }
            }
        }

        // Advance one row, stepping back one or more columns.
        if row >= 1 && band.row_end(row - 1) > column {
            let from_row = row - 1;
            let mut step_score = moving;
            for col_step in 1..=self.limits.at(column).min(column) {
                let from_col = column - col_step;
                if from_col < band.row_start(row) || from_row + from_col < window_start {
                    break;
                }
                step_score += self.transitions.step_gain(from_row, from_col);
                let proposed = score.at((from_row, from_col))? + step_score;
                if proposed > best {
                    best = proposed;
                    origin = Some((from_row, from_col));
                }
            }
        }

        Ok((best, origin))
    }
}
