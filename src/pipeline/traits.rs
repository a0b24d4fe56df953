use crate::alignment::events::EventBoundaries;

pub trait EventSegmenter: Send + Sync {
    /// Splits `signal` into events whose value range stays within `tolerance`.
    /// Boundaries must start at 0 and end at `signal.len()`.
    fn segment(&self, signal: &[f64], tolerance: f64) -> EventBoundaries;
}

pub trait PairScorer: Send + Sync {
    /// Cost of pairing two prediction vectors; lower means more alike.
    fn penalty(&self, first: &[f32], second: &[f32]) -> f64;
}
