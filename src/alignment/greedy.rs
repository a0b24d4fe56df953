use std::collections::VecDeque;

use crate::alignment::band::BandSchedule;
use crate::alignment::dp::DpMatrices;
use crate::alignment::scoring::TransitionScorer;
use crate::error::RepeatError;
use crate::types::{Cell, RepeatPath};

/// Inclusive range of anti-diagonal sums not yet claimed by any path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SumInterval {
    low: usize,
    high: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Extraction {
    pub paths: Vec<RepeatPath>,
    pub rejected_forward_paths: usize,
}

pub(crate) struct GreedyExtractor<'a> {
    band: &'a BandSchedule,
    transitions: &'a TransitionScorer<'a>,
    repeats_only: bool,
}

impl<'a> GreedyExtractor<'a> {
    pub(crate) fn new(
        band: &'a BandSchedule,
        transitions: &'a TransitionScorer<'a>,
        repeats_only: bool,
    ) -> Self {
        Self {
            band,
            transitions,
            repeats_only,
        }
    }

    /// Repeatedly pulls the best-scoring chain out of the unclaimed sum
    /// intervals, in FIFO order, until no interval holds a positive cell.
    pub(crate) fn extract(&self, matrices: &mut DpMatrices) -> Result<Extraction, RepeatError> {
        let mut extraction = Extraction::default();
        let mut queue = VecDeque::from([SumInterval {
            low: self.band.min_sum(),
            high: self.band.max_sum(),
        }]);

        while let Some(interval) = queue.pop_front() {
            let Some((best_score, terminus)) = self.rescore_interval(matrices, interval)? else {
                continue;
            };

            let mut cells = vec![terminus];
            let mut position = terminus;
            while let Some(from) = matrices.traceback.at(position)? {
                cells.push(from);
                position = from;
            }
            cells.reverse();

            let low_sum = position.0 + position.1;
            let high_sum = terminus.0 + terminus.1;
            self.clear_sums(matrices, low_sum, high_sum)?;
            if interval.low < low_sum {
                queue.push_back(SumInterval {
                    low: interval.low,
                    high: low_sum - 1,
                });
            }
            if high_sum < interval.high {
                queue.push_back(SumInterval {
                    low: high_sum + 1,
                    high: interval.high,
                });
            }

            let path = RepeatPath {
                cells,
                score: best_score,
            };
            tracing::debug!(
                start = ?path.first(),
                end = ?path.last(),
                low_sum,
                high_sum,
                score = best_score,
                "greedy: extracted path, removing its sum interval from play"
            );
            if !self.repeats_only || path.is_self_alignment() {
                extraction.paths.push(path);
            } else {
                extraction.rejected_forward_paths += 1;
            }
        }
        Ok(extraction)
    }

    /// Replays the transition formula along committed pointers for every
    /// cell in `interval` and returns the best positive terminus. Pointers
    /// leaving the interval are dropped so paths never cross into claimed
    /// anti-diagonals.
    fn rescore_interval(
        &self,
        matrices: &mut DpMatrices,
        interval: SumInterval,
    ) -> Result<Option<(f64, Cell)>, RepeatError> {
        let mut best: Option<(f64, Cell)> = None;
        for sum in interval.low..=interval.high {
            for cell in self.band.cells_on_antidiagonal(sum) {
                let score = match matrices.traceback.at(cell)? {
                    Some(from) if from.0 + from.1 >= interval.low => {
                        matrices.score.at(from)? + self.transitions.span_score(from, cell)
                    }
                    Some(_) => {
                        matrices.traceback.set(cell, None)?;
                        0.0
                    }
                    None => 0.0,
                };
                matrices.score.set(cell, score)?;
                let better = match best {
                    None => true,
                    Some((best_score, best_cell)) => {
                        score > best_score || (score == best_score && cell > best_cell)
                    }
                };
                if better {
                    best = Some((score, cell));
                }
            }
        }
        Ok(best.filter(|&(score, _)| score > 0.0))
    }

    fn clear_sums(
        &self,
        matrices: &mut DpMatrices,
        low_sum: usize,
        high_sum: usize,
    ) -> Result<(), RepeatError> {
        for sum in low_sum..=high_sum {
            for cell in self.band.cells_on_antidiagonal(sum) {
                matrices.traceback.set(cell, None)?;
                matrices.score.set(cell, 0.0)?;
            }
        }
        Ok(())
    }
}
