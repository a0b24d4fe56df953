use crate::alignment::events::EventBoundaries;
use crate::alignment::scoring::{same_symbol_penalty, P_SAME};
use crate::pipeline::traits::{EventSegmenter, PairScorer};

pub struct ThresholdSegmenter;

impl EventSegmenter for ThresholdSegmenter {
    fn segment(&self, signal: &[f64], tolerance: f64) -> EventBoundaries {
        EventBoundaries::segment(signal, tolerance)
    }
}

/// Same/different mixture: `-ln(dot(p, q) * (2 p_same - 1) + (1 - p_same))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SameDifferentScorer {
    pub p_same: f64,
}

impl Default for SameDifferentScorer {
    fn default() -> Self {
        Self { p_same: P_SAME }
    }
}

impl PairScorer for SameDifferentScorer {
    fn penalty(&self, first: &[f32], second: &[f32]) -> f64 {
        same_symbol_penalty(first, second, self.p_same)
    }
}
