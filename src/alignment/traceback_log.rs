//! Diagnostic dump of the band layout, the trace and every committed
//! traceback pointer, for external inspection.
//!
//! Layout:
//! 1. `rows\n` (trace length + 1)
//! 2. one `row_start row_end\n` line per row
//! 3. every sample followed by a space, then `\n`
//! 4. per row, per admissible column ascending: two signed bytes
//!    `(column_delta, row_delta)`; `(-1, -1)` marks a cell without predecessor.
//!
//! Deltas are never negative, so only the upper side needs clamping; values
//! past `i8::MAX` are written as `i8::MAX` and counted.

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use crate::alignment::band::BandSchedule;
use crate::alignment::banded_matrix::BandedMatrix;
use crate::alignment::dp::Traceback;
use crate::error::RepeatError;
use crate::types::Cell;

const NO_PREDECESSOR: i8 = -1;

/// Writes the log to `path`, returning how many deltas were clamped.
pub fn write_traceback_log(
    path: &Path,
    band: &BandSchedule,
    signal: &[f64],
    traceback: &BandedMatrix<Traceback>,
) -> Result<usize, RepeatError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| RepeatError::io("create traceback log directory", e))?;
    }
    let file = File::create(path).map_err(|e| RepeatError::io("create traceback log", e))?;
    let mut out = BufWriter::new(file);
    let clamped = encode_traceback_log(&mut out, band, signal, traceback)?;
    out.flush()
        .map_err(|e| RepeatError::io("flush traceback log", e))?;
    Ok(clamped)
}

pub fn encode_traceback_log<W: Write>(
    out: &mut W,
    band: &BandSchedule,
    signal: &[f64],
    traceback: &BandedMatrix<Traceback>,
) -> Result<usize, RepeatError> {
    let io_err = |e| RepeatError::io("write traceback log", e);
    writeln!(out, "{}", band.rows()).map_err(io_err)?;
    for row in 0..band.rows() {
        writeln!(out, "{} {}", band.row_start(row), band.row_end(row)).map_err(io_err)?;
    }
    for sample in signal {
        write!(out, "{sample} ").map_err(io_err)?;
    }
    writeln!(out).map_err(io_err)?;

    let mut clamped = 0usize;
    let mut bytes = Vec::new();
    for row in 0..band.rows() {
        bytes.clear();
        for (column, &from) in traceback.row(row) {
            let (column_delta, row_delta) = match from {
                None => (NO_PREDECESSOR, NO_PREDECESSOR),
                Some((from_row, from_col)) => (
                    encode_delta(column - from_col, &mut clamped),
                    encode_delta(row - from_row, &mut clamped),
                ),
            };
            bytes.push(column_delta as u8);
            bytes.push(row_delta as u8);
        }
        out.write_all(&bytes).map_err(io_err)?;
    }

    if clamped > 0 {
        tracing::warn!(
            clamped,
            "traceback log: steps too long for one-byte encoding were truncated"
        );
    }
    Ok(clamped)
}

fn encode_delta(delta: usize, clamped: &mut usize) -> i8 {
    i8::try_from(delta).unwrap_or_else(|_| {
        *clamped += 1;
        i8::MAX
    })
}

/// Decoded traceback log.
#[derive(Debug, Clone, PartialEq)]
pub struct TracebackLog {
    pub row_starts: Vec<usize>,
    pub row_ends: Vec<usize>,
    pub signal: Vec<f64>,
    /// Per row, one `(column_delta, row_delta)` pair per admissible column.
    pub deltas: Vec<Vec<(i8, i8)>>,
}

impl TracebackLog {
    pub fn read_from_path(path: &Path) -> Result<Self, RepeatError> {
        let file = File::open(path).map_err(|e| RepeatError::io("open traceback log", e))?;
        Self::decode(&mut std::io::BufReader::new(file))
    }

    pub fn decode<R: BufRead>(input: &mut R) -> Result<Self, RepeatError> {
        let rows: usize = parse_field(&read_line(input)?, "row count")?;
        let mut row_starts = Vec::with_capacity(rows);
        let mut row_ends = Vec::with_capacity(rows);
        for _ in 0..rows {
            let line = read_line(input)?;
            let mut fields = line.split_whitespace();
            let start: usize = parse_field(fields.next().unwrap_or(""), "row start")?;
            let end: usize = parse_field(fields.next().unwrap_or(""), "row end")?;
            if end <= start {
                return Err(RepeatError::parse(
                    "decode traceback log",
                    format!("empty band [{start}, {end})"),
                ));
            }
            row_starts.push(start);
            row_ends.push(end);
        }
        let signal = read_line(input)?
            .split_whitespace()
            .map(|token| parse_field(token, "signal sample"))
            .collect::<Result<Vec<f64>, _>>()?;

        let mut deltas = Vec::with_capacity(rows);
        for (&start, &end) in row_starts.iter().zip(&row_ends) {
            let mut raw = vec![0u8; 2 * (end - start)];
            input
                .read_exact(&mut raw)
                .map_err(|e| RepeatError::io("read traceback deltas", e))?;
            deltas.push(
                raw.chunks_exact(2)
                    .map(|pair| (pair[0] as i8, pair[1] as i8))
                    .collect(),
            );
        }
        Ok(Self {
            row_starts,
            row_ends,
            signal,
            deltas,
        })
    }

    /// Predecessor of `(row, column)` reconstructed from the stored deltas.
    pub fn predecessor(&self, (row, column): Cell) -> Option<Cell> {
        let start = *self.row_starts.get(row)?;
        let &(column_delta, row_delta) = self.deltas.get(row)?.get(column.checked_sub(start)?)?;
        if column_delta == NO_PREDECESSOR && row_delta == NO_PREDECESSOR {
            return None;
        }
        let from_row = row.checked_sub(usize::try_from(row_delta).ok()?)?;
        let from_col = column.checked_sub(usize::try_from(column_delta).ok()?)?;
        Some((from_row, from_col))
    }
}

fn read_line<R: BufRead>(input: &mut R) -> Result<String, RepeatError> {
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|e| RepeatError::io("read traceback log", e))?;
    if read == 0 {
        return Err(RepeatError::parse(
            "decode traceback log",
            "unexpected end of file",
        ));
    }
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

fn parse_field<T: std::str::FromStr>(token: &str, what: &str) -> Result<T, RepeatError> {
    token.trim().parse().map_err(|_| {
        RepeatError::parse("decode traceback log", format!("bad {what}: {token:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::events::EventBoundaries;

    fn fixture() -> (BandSchedule, Vec<f64>, BandedMatrix<Traceback>) {
        let signal = vec![0.25, -1.5, 3.0, 3.125, 0.1];
        let events = EventBoundaries::segment(&signal, 1.0);
        let band = BandSchedule::build(&events, 0, 2);
        let mut traceback = BandedMatrix::new("traceback matrix", &band, None);
        let cell = (3, band.row_end(3) - 1);
        let from = (2, band.row_start(2));
        traceback.set(cell, Some(from)).expect("in band");
        (band, signal, traceback)
    }

    #[test]
    fn log_round_trips_band_signal_and_pointers() {
        let (band, signal, traceback) = fixture();
        let mut buffer = Vec::new();
        let clamped = encode_traceback_log(&mut buffer, &band, &signal, &traceback)
            .expect("encode to memory");
        assert_eq!(clamped, 0);

        let log = TracebackLog::decode(&mut buffer.as_slice()).expect("decode");
        assert_eq!(log.row_starts, band.row_starts());
        assert_eq!(log.row_ends, band.row_ends());
        assert_eq!(log.signal, signal);
        for row in 0..band.rows() {
            for (column, &from) in traceback.row(row) {
                assert_eq!(log.predecessor((row, column)), from);
            }
        }
    }

    #[test]
    fn long_steps_are_clamped_and_counted() {
        assert_eq!(encode_delta(5, &mut 0), 5);
        let mut clamped = 0;
        assert_eq!(encode_delta(400, &mut clamped), i8::MAX);
        assert_eq!(encode_delta(128, &mut clamped), i8::MAX);
        assert_eq!(encode_delta(127, &mut clamped), 127);
        assert_eq!(clamped, 2);
    }

    #[test]
    fn truncated_log_is_an_error() {
        let (band, signal, traceback) = fixture();
        let mut buffer = Vec::new();
        encode_traceback_log(&mut buffer, &band, &signal, &traceback).expect("encode");
        buffer.truncate(buffer.len() - 1);
        assert!(TracebackLog::decode(&mut buffer.as_slice()).is_err());
    }

    #[test]
    fn write_creates_the_file() {
        let (band, signal, traceback) = fixture();
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("logs").join("read.tb");
        write_traceback_log(&path, &band, &signal, &traceback).expect("write log");
        let log = TracebackLog::read_from_path(&path).expect("read log");
        assert_eq!(log.row_starts.len(), band.rows());
    }
}
