use crate::alignment::band::BandSchedule;

/// Per-row bound on how many rows (or columns) a single transition may skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepBackLimits {
    limits: Vec<usize>,
}

impl StepBackLimits {
    /// For every row `i >= 1`, counts how many samples before `i` stay
    /// within `event_threshold` of each other, walking back while the
    /// earlier sample is still admissible for row `i`. The count is clamped
    /// to `[1, min(max_speed_ratio, i)]`; row 0 has no predecessor.
    pub fn compute(
        signal: &[f64],
        band: &BandSchedule,
        event_threshold: f64,
        max_speed_ratio: usize,
    ) -> Self {
        let mut limits = vec![0usize; signal.len() + 1];
        for i in 1..=signal.len() {
            let reachable_from = band.first_row_for_column(i);
            let mut min_val = signal[i - 1];
            let mut max_val = signal[i - 1];
            let mut steps = 1usize;
            for j in (0..i - 1).rev() {
                let admissible =
                    j >= band.row_start(i) || reachable_from.is_some_and(|first| j >= first);
                if !admissible {
                    break;
                }
                min_val = min_val.min(signal[j]);
                max_val = max_val.max(signal[j]);
                if max_val - min_val > event_threshold {
                    break;
                }
                steps += 1;
            }
            limits[i] = steps.min(max_speed_ratio.min(i)).max(1);
        }
        Self { limits }
    }

    pub fn at(&self, index: usize) -> usize {
        self.limits.get(index).copied().unwrap_or(0)
    }

    /// Largest skip any transition can take.
    pub fn radius(&self) -> usize {
        self.limits.iter().copied().max().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::events::EventBoundaries;

    fn limits_for(signal: &[f64], threshold: f64, cap: usize, min_d: usize) -> StepBackLimits {
        let events = EventBoundaries::segment(signal, 2.0 * threshold);
        let band = BandSchedule::build(&events, min_d, min_d + 3);
        StepBackLimits::compute(signal, &band, threshold, cap)
    }

    #[test]
    fn flat_signal_saturates_at_speed_cap() {
        let signal = vec![1.0; 30];
        let limits = limits_for(&signal, 0.5, 4, 0);
        assert_eq!(limits.at(0), 0);
        assert_eq!(limits.at(1), 1);
        assert_eq!(limits.at(2), 2);
        assert_eq!(limits.at(3), 3);
        assert!(limits.as_slice()[4..].iter().all(|&l| l == 4));
        assert_eq!(limits.radius(), 4);
    }

    #[test]
    fn alternating_signal_never_skips() {
        let signal: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 0.0 } else { 3.0 }).collect();
        let limits = limits_for(&signal, 0.5, 6, 0);
        assert!(limits.as_slice()[1..].iter().all(|&l| l == 1));
        assert_eq!(limits.radius(), 1);
    }

    #[test]
    fn limits_stay_within_clamp() {
        let signal: Vec<f64> = (0..60).map(|i| ((i / 7) as f64) * 0.3).collect();
        let cap = 3;
        let limits = limits_for(&signal, 0.4, cap, 1);
        for (row, &limit) in limits.as_slice().iter().enumerate().skip(1) {
            assert!(limit >= 1);
            assert!(limit <= cap.min(row));
        }
    }
}
