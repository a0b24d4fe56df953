use crate::alignment::band::BandSchedule;
use crate::error::RepeatError;
use crate::types::Cell;

/// Row-limited matrix storing only each row's admissible column interval.
///
/// Access outside the band is never serviced: `get`/`get_mut` return `None`,
/// and the `at`/`set` helpers turn it into [`RepeatError::Invariant`].
#[derive(Debug, Clone)]
pub struct BandedMatrix<T> {
    name: &'static str,
    row_starts: Vec<usize>,
    rows: Vec<Vec<T>>,
}

impl<T: Clone> BandedMatrix<T> {
    pub fn new(name: &'static str, band: &BandSchedule, default_value: T) -> Self {
        let rows = band
            .row_starts()
            .iter()
            .zip(band.row_ends())
            .map(|(&start, &end)| vec![default_value.clone(); end - start])
            .collect();
        Self {
            name,
            row_starts: band.row_starts().to_vec(),
            rows,
        }
    }
}

impl<T> BandedMatrix<T> {
    pub fn get(&self, row: usize, column: usize) -> Option<&T> {
        let start = *self.row_starts.get(row)?;
        let offset = column.checked_sub(start)?;
        self.rows.get(row)?.get(offset)
    }

    pub fn get_mut(&mut self, row: usize, column: usize) -> Option<&mut T> {
        let start = *self.row_starts.get(row)?;
        let offset = column.checked_sub(start)?;
        self.rows.get_mut(row)?.get_mut(offset)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Admissible cells of `row` paired with their column index.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, &T)> + '_ {
        let start = self.row_starts.get(row).copied().unwrap_or(0);
        self.rows
            .get(row)
            .map(|values| values.as_slice())
            .unwrap_or(&[])
            .iter()
            .enumerate()
            .map(move |(offset, value)| (start + offset, value))
    }

    fn out_of_band(&self, (row, column): Cell) -> RepeatError {
        RepeatError::invariant(
            self.name,
            format!("cell ({row}, {column}) lies outside the admissible band"),
        )
    }
}

impl<T: Copy> BandedMatrix<T> {
    pub fn at(&self, cell: Cell) -> Result<T, RepeatError> {
        self.get(cell.0, cell.1)
            .copied()
            .ok_or_else(|| self.out_of_band(cell))
    }

    pub fn set(&mut self, cell: Cell, value: T) -> Result<(), RepeatError> {
        match self.get_mut(cell.0, cell.1) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(self.out_of_band(cell)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::events::EventBoundaries;

    fn small_band() -> BandSchedule {
        let events = EventBoundaries::segment(&[0.0, 0.0, 0.0, 5.0, 5.0, 5.0], 1.0);
        BandSchedule::build(&events, 0, 1)
    }

    #[test]
    fn rows_are_sized_to_the_band() {
        let band = small_band();
        let matrix = BandedMatrix::new("test", &band, 0.0f64);
        assert_eq!(matrix.row_count(), band.rows());
        for row in 0..band.rows() {
            assert_eq!(matrix.row(row).count(), band.row_end(row) - band.row_start(row));
        }
    }

    #[test]
    fn in_band_writes_are_visible() {
        let band = small_band();
        let mut matrix = BandedMatrix::new("test", &band, 0.0f64);
        let cell = (4, band.row_start(4));
        matrix.set(cell, 2.5).expect("in band");
        assert_eq!(matrix.at(cell).expect("in band"), 2.5);
    }

    #[test]
    fn out_of_band_access_is_reported_not_aliased() {
        let band = small_band();
        let mut matrix = BandedMatrix::new("score", &band, 0.0f64);
        let below = (4, band.row_start(4) - 1);
        let past_end = (0, band.row_end(0));
        assert!(matrix.get(below.0, below.1).is_none());
        assert!(matrix.get(band.rows(), 0).is_none());
        let err = matrix.set(past_end, 9.0).unwrap_err();
        assert!(matches!(err, RepeatError::Invariant { context: "score", .. }));
        // A rejected write must not leak into any other cell.
        assert!(matrix.row(0).all(|(_, &v)| v == 0.0));
        assert!(matrix.at(below).is_err());
    }
}
