//! Admissible column interval per row, derived from event granularity.
//!
//! Row `r` may only pair with columns lying between `min_events_distance`
//! and `max_events_distance` events ahead of the event row `r` sits in, so
//! the band width follows the trace's own local variability instead of a
//! fixed diagonal radius.

use crate::alignment::events::EventBoundaries;
use crate::types::Cell;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandSchedule {
    row_starts: Vec<usize>,
    row_ends: Vec<usize>,
    /// Smallest row whose band contains a given anti-diagonal sum.
    first_row_for_sum: Vec<Option<usize>>,
    /// Smallest row whose band contains a given column.
    first_row_for_column: Vec<Option<usize>>,
}

impl BandSchedule {
    /// Builds the schedule for the `signal_len + 1` rows of the alignment
    /// matrix. Callers guarantee `min_events_distance <= max_events_distance`
    /// and a non-empty trace.
    pub fn build(
        events: &EventBoundaries,
        min_events_distance: usize,
        max_events_distance: usize,
    ) -> Self {
        let bounds = events.as_slice();
        let last_event = events.event_count();
        let signal_len = events.signal_len();
        let rows = signal_len + 1;

        let mut row_starts = Vec::with_capacity(rows);
        let mut row_ends = Vec::with_capacity(rows);
        let mut first_row_for_sum = vec![None; 2 * signal_len + 1];
        let mut first_row_for_column = vec![None; rows];
        let mut next_sum = 0usize;
        let mut next_column = 0usize;
        let mut event = 0usize;

        for row in 0..rows {
            let start = bounds[event.saturating_add(min_events_distance).min(last_event)];
            let end = bounds[event.saturating_add(max_events_distance).min(last_event)] + 1;

            for sum in (row + start).max(next_sum)..row + end {
                first_row_for_sum[sum] = Some(row);
                next_sum = sum + 1;
            }
            for column in start.max(next_column)..end {
                first_row_for_column[column] = Some(row);
                next_column = column + 1;
            }
            // Row r belongs to the event holding sample r - 1.
            if event < last_event && bounds[event + 1] == row {
                event += 1;
            }

            row_starts.push(start);
            row_ends.push(end);
        }

        Self {
            row_starts,
            row_ends,
            first_row_for_sum,
            first_row_for_column,
        }
    }

    pub fn rows(&self) -> usize {
        self.row_starts.len()
    }

    pub fn row_start(&self, row: usize) -> usize {
        self.row_starts[row]
    }

    /// Exclusive end of the admissible columns of `row`.
    pub fn row_end(&self, row: usize) -> usize {
        self.row_ends[row]
    }

    pub fn row_starts(&self) -> &[usize] {
        &self.row_starts
    }

    pub fn row_ends(&self) -> &[usize] {
        &self.row_ends
    }

    pub fn contains(&self, row: usize, column: usize) -> bool {
        row < self.rows() && column >= self.row_starts[row] && column < self.row_ends[row]
    }

    pub fn cell_count(&self) -> usize {
        self.row_starts
            .iter()
            .zip(&self.row_ends)
            .map(|(start, end)| end - start)
            .sum()
    }

    pub fn min_sum(&self) -> usize {
        self.row_starts.first().copied().unwrap_or(0)
    }

    pub fn max_sum(&self) -> usize {
        match self.row_ends.last() {
            Some(&end) => self.rows() - 1 + end - 1,
            None => 0,
        }
    }

    pub fn first_row_for_sum(&self, sum: usize) -> Option<usize> {
        self.first_row_for_sum.get(sum).copied().flatten()
    }

    pub fn first_row_for_column(&self, column: usize) -> Option<usize> {
        self.first_row_for_column.get(column).copied().flatten()
    }

    /// In-band cells on anti-diagonal `sum`, by ascending row. Empty when no
    /// row's band reaches `sum`.
    pub fn cells_on_antidiagonal(&self, sum: usize) -> impl Iterator<Item = Cell> + '_ {
        let first = self.first_row_for_sum(sum).unwrap_or(self.rows());
        (first..self.rows())
            .take_while(move |&row| row + self.row_starts[row] <= sum)
            .map(move |row| (row, sum - row))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn step_events() -> EventBoundaries {
        EventBoundaries::segment(&[0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 10.0, 10.0, 10.0], 4.0)
    }

    #[test]
    fn rows_follow_event_granularity() {
        let band = BandSchedule::build(&step_events(), 1, 2);
        assert_eq!(band.rows(), 10);
        // bounds = [0, 3, 6, 9]; row r uses the event holding sample r - 1.
        assert_eq!(band.row_starts(), &[3, 3, 3, 3, 6, 6, 6, 9, 9, 9]);
        assert_eq!(band.row_ends(), &[7, 7, 7, 7, 10, 10, 10, 10, 10, 10]);
    }

    #[test]
    fn distances_saturate_at_last_event() {
        let band = BandSchedule::build(&step_events(), 5, 9);
        assert!(band.row_starts().iter().all(|&s| s == 9));
        assert!(band.row_ends().iter().all(|&e| e == 10));
    }

    #[test]
    fn unbounded_max_distance_reaches_trace_end() {
        let band = BandSchedule::build(&step_events(), 1, usize::MAX);
        assert_eq!(band.row_starts(), &[3, 3, 3, 3, 6, 6, 6, 9, 9, 9]);
        assert!(band.row_ends().iter().all(|&e| e == 10));

        let pinned = BandSchedule::build(&step_events(), usize::MAX, usize::MAX);
        assert!(pinned.row_starts().iter().all(|&s| s == 9));
    }

    #[test]
    fn antidiagonal_cells_are_all_in_band() {
        let band = BandSchedule::build(&step_events(), 0, 1);
        let mut visited = 0;
        for sum in band.min_sum()..=band.max_sum() {
            for (row, column) in band.cells_on_antidiagonal(sum) {
                assert_eq!(row + column, sum);
                assert!(band.contains(row, column));
                visited += 1;
            }
        }
        assert_eq!(visited, band.cell_count());
    }

    #[test]
    fn first_row_tables_point_at_first_covering_row() {
        let band = BandSchedule::build(&step_events(), 1, 2);
        assert_eq!(band.first_row_for_column(3), Some(0));
        assert_eq!(band.first_row_for_column(7), Some(4));
        assert_eq!(band.first_row_for_column(0), None);
        assert_eq!(band.first_row_for_sum(3), Some(0));
        assert_eq!(band.first_row_for_sum(band.max_sum()), Some(9));
        assert_eq!(band.first_row_for_sum(band.max_sum() + 1), None);
    }

    #[test]
    fn random_schedules_are_monotone_and_non_empty() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..40 {
            let len = rng.gen_range(1..200);
            let signal: Vec<f64> = (0..len).map(|_| rng.gen_range(-2.0..2.0)).collect();
            let events = EventBoundaries::segment(&signal, rng.gen_range(0.2..1.5));
            let min_d = rng.gen_range(0..5);
            let max_d = min_d + rng.gen_range(0..10);
            let band = BandSchedule::build(&events, min_d, max_d);
            assert_eq!(band.rows(), len + 1);
            for row in 0..band.rows() {
                assert!(band.row_end(row) > band.row_start(row));
                assert!(band.row_end(row) <= len + 1);
            }
            assert!(band.row_starts().windows(2).all(|w| w[0] <= w[1]));
            assert!(band.row_ends().windows(2).all(|w| w[0] <= w[1]));

            let visited: usize = (band.min_sum()..=band.max_sum())
                .map(|sum| band.cells_on_antidiagonal(sum).count())
                .sum();
            assert_eq!(visited, band.cell_count());
        }
    }
}
