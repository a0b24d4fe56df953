use serde::Serialize;

/// `(row, column)`: row indexes the trace, column indexes the prediction sequence.
pub type Cell = (usize, usize);

#[derive(Debug, Clone)]
pub struct AlignmentInput {
    pub signal: Vec<f64>,
    /// One categorical distribution per trace position.
    pub predictions: Vec<Vec<f32>>,
}

/// A monotone chain of cells recovered from the traceback matrix,
/// ordered from its first (rootmost) cell to its terminus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatPath {
    pub cells: Vec<Cell>,
    pub score: f64,
}

impl RepeatPath {
    pub fn first(&self) -> Option<Cell> {
        self.cells.first().copied()
    }

    pub fn last(&self) -> Option<Cell> {
        self.cells.last().copied()
    }

    /// Inclusive anti-diagonal span `(low_sum, high_sum)` covered by the path.
    pub fn antidiagonal_span(&self) -> Option<(usize, usize)> {
        let (first_row, first_col) = self.first()?;
        let (last_row, last_col) = self.last()?;
        Some((first_row + first_col, last_row + last_col))
    }

    /// The end of the path reaches back over the trace region its start came from.
    pub fn is_self_alignment(&self) -> bool {
        match (self.first(), self.last()) {
            (Some((_, first_col)), Some((last_row, _))) => last_row >= first_col,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentOutput {
    /// Paths in extraction order.
    pub paths: Vec<RepeatPath>,
    pub stats: AlignmentStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlignmentStats {
    pub event_count: usize,
    pub band_cells: usize,
    pub step_back_radius: usize,
    /// Traceback deltas that did not fit the one-byte log encoding.
    pub clamped_log_deltas: usize,
    /// Positive-scoring paths dropped because they were not self-alignments.
    pub rejected_forward_paths: usize,
}
