use crate::pipeline::traits::PairScorer;
use crate::types::Cell;

/// Probability that two positions emitting the same symbol are reported as
/// the same by the classifier comparison.
pub const P_SAME: f64 = 0.99;

/// Negative log-likelihood that two categorical predictions stem from the
/// same symbol under a same/different mixture with `p_same` confidence.
pub fn same_symbol_penalty(first: &[f32], second: &[f32], p_same: f64) -> f64 {
    let product: f64 = first
        .iter()
        .zip(second)
        .map(|(&a, &b)| f64::from(a) * f64::from(b))
        .sum();
    -(product * (2.0 * p_same - 1.0) + (1.0 - p_same)).ln()
}

/// Transition gains over one prediction sequence, shared by the sweep and
/// the greedy rescoring so both agree on every step's value.
pub(crate) struct TransitionScorer<'a> {
    predictions: &'a [Vec<f32>],
    scorer: &'a dyn PairScorer,
    score_for_moving: f64,
}

impl<'a> TransitionScorer<'a> {
    pub(crate) fn new(
        predictions: &'a [Vec<f32>],
        scorer: &'a dyn PairScorer,
        score_for_moving: f64,
    ) -> Self {
        Self {
            predictions,
            scorer,
            score_for_moving,
        }
    }

    pub(crate) fn score_for_moving(&self) -> f64 {
        self.score_for_moving
    }

    /// Gain of comparing trace position `row` against prediction `column`.
    pub(crate) fn step_gain(&self, row: usize, column: usize) -> f64 {
        self.score_for_moving
            - self
                .scorer
                .penalty(&self.predictions[row], &self.predictions[column])
    }

    /// Full score of jumping from `from` to `to`: the flat bonus plus the
    /// gain of every comparison in the skipped rectangle.
    pub(crate) fn span_score(&self, from: Cell, to: Cell) -> f64 {
        let mut score = self.score_for_moving;
        for row in from.0..to.0 {
            for column in from.1..to.1 {
                score += self.step_gain(row, column);
            }
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::defaults::SameDifferentScorer;

    #[test]
    fn identical_one_hot_predictions_are_cheap() {
        let a = [0.0f32, 1.0, 0.0, 0.0, 0.0];
        let penalty = same_symbol_penalty(&a, &a, P_SAME);
        assert!((penalty - (-(0.99f64).ln())).abs() < 1e-9);
    }

    #[test]
    fn disjoint_one_hot_predictions_are_expensive() {
        let a = [1.0f32, 0.0, 0.0, 0.0, 0.0];
        let b = [0.0f32, 0.0, 0.0, 0.0, 1.0];
        let penalty = same_symbol_penalty(&a, &b, P_SAME);
        assert!((penalty - (-(0.01f64).ln())).abs() < 1e-9);
    }

    #[test]
    fn span_score_sums_every_skipped_comparison() {
        let predictions = vec![
            vec![1.0f32, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
        ];
        let scorer = SameDifferentScorer::default();
        let transitions = TransitionScorer::new(&predictions, &scorer, 0.2);
        let expected = 0.2 + transitions.step_gain(0, 2) + transitions.step_gain(1, 2);
        assert!((transitions.span_score((0, 2), (2, 3)) - expected).abs() < 1e-12);
        let single = 0.2 + transitions.step_gain(1, 2);
        assert!((transitions.span_score((1, 2), (2, 3)) - single).abs() < 1e-12);
    }
}
