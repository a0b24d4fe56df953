/// Longest run of samples one event may span before it is force-closed.
pub const MAX_EVENT_LENGTH: usize = 15;

/// Strictly increasing indices into the trace, starting at 0 and ending at
/// the trace length. Event `i` covers `[bounds[i], bounds[i + 1])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBoundaries {
    bounds: Vec<usize>,
}

impl EventBoundaries {
    /// Splits `signal` into events whose value range stays within `tolerance`.
    /// A new event starts at the first sample that would push the running
    /// range past `tolerance`, or once the current event spans
    /// [`MAX_EVENT_LENGTH`] samples.
    pub fn segment(signal: &[f64], tolerance: f64) -> Self {
        let mut bounds = vec![0usize];
        let mut max_val = f64::MIN;
        let mut min_val = f64::MAX;
        for (i, &value) in signal.iter().enumerate() {
            max_val = max_val.max(value);
            min_val = min_val.min(value);
            let event_start = bounds.last().copied().unwrap_or(0);
            if max_val - min_val > tolerance || i >= event_start + MAX_EVENT_LENGTH {
                bounds.push(i);
                min_val = value;
                max_val = value;
            }
        }
        if !signal.is_empty() {
            bounds.push(signal.len());
        }
        Self { bounds }
    }

    /// Wraps externally produced boundaries, checking the structural invariant.
    pub fn from_bounds(bounds: Vec<usize>, signal_len: usize) -> Option<Self> {
        let well_formed = bounds.len() >= 2
            && bounds.first() == Some(&0)
            && bounds.last() == Some(&signal_len)
            && bounds.windows(2).all(|w| w[0] < w[1]);
        well_formed.then_some(Self { bounds })
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.bounds
    }

    pub fn event_count(&self) -> usize {
        self.bounds.len().saturating_sub(1)
    }

    pub fn signal_len(&self) -> usize {
        self.bounds.last().copied().unwrap_or(0)
    }

    pub fn events(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.bounds.windows(2).map(|w| (w[0], w[1]))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    #[test]
    fn step_signal_splits_at_each_level() {
        let signal = [0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 10.0, 10.0, 10.0];
        // event_threshold = 2 is applied as a tolerance of 2 * 2.
        let events = EventBoundaries::segment(&signal, 4.0);
        assert_eq!(events.as_slice(), &[0, 3, 6, 9]);
        assert_eq!(events.event_count(), 3);
    }

    #[test]
    fn flat_signal_is_capped_by_max_length() {
        let signal = vec![1.0; 40];
        let events = EventBoundaries::segment(&signal, 0.5);
        assert_eq!(events.as_slice(), &[0, 15, 30, 40]);
    }

    #[test]
    fn single_sample_is_one_event() {
        let events = EventBoundaries::segment(&[3.0], 1.0);
        assert_eq!(events.as_slice(), &[0, 1]);
    }

    #[test]
    fn random_signals_respect_range_or_length_cap() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let len = rng.gen_range(1..300);
            let signal: Vec<f64> = (0..len).map(|_| rng.gen_range(-3.0..3.0)).collect();
            let tolerance = rng.gen_range(0.1..2.0);
            let events = EventBoundaries::segment(&signal, tolerance);
            let bounds = events.as_slice();
            assert_eq!(bounds.first(), Some(&0));
            assert_eq!(bounds.last(), Some(&len));
            assert!(bounds.windows(2).all(|w| w[0] < w[1]));
            for (a, b) in events.events() {
                let slice = &signal[a..b];
                let max = slice.iter().copied().fold(f64::MIN, f64::max);
                let min = slice.iter().copied().fold(f64::MAX, f64::min);
                assert!(max - min <= tolerance || b - a == MAX_EVENT_LENGTH);
                assert!(b - a <= MAX_EVENT_LENGTH);
            }
        }
    }

    #[test]
    fn from_bounds_rejects_malformed_input() {
        assert!(EventBoundaries::from_bounds(vec![0, 3, 3, 5], 5).is_none());
        assert!(EventBoundaries::from_bounds(vec![1, 5], 5).is_none());
        assert!(EventBoundaries::from_bounds(vec![0, 4], 5).is_none());
        assert!(EventBoundaries::from_bounds(vec![0, 2, 5], 5).is_some());
    }
}
