//! Per-sample repeat masks: building them from extracted paths, projecting
//! reference-level repeat annotations onto a read, and scoring one mask
//! against another.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::RepeatError;
use crate::types::RepeatPath;

/// Marks `[first.row, last.col)` of every path, clamped to `len`.
pub fn repeat_mask(len: usize, paths: &[RepeatPath]) -> Vec<bool> {
    let mut mask = vec![false; len];
    for path in paths {
        let (Some((start, _)), Some((_, end))) = (path.first(), path.last()) else {
            continue;
        };
        let end = end.min(len);
        if start < end {
            mask[start..end].fill(true);
        }
    }
    mask
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatInterval {
    pub contig: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedEvent {
    pub reference_position: usize,
    pub event_start: usize,
    pub event_end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventAlignment {
    pub contig: String,
    pub events: Vec<AlignedEvent>,
}

impl EventAlignment {
    /// Smallest event start and largest event end, if any event exists.
    pub fn aligned_region(&self) -> Option<(usize, usize)> {
        let start = self.events.iter().map(|e| e.event_start).min()?;
        let end = self.events.iter().map(|e| e.event_end).max()?;
        Some((start, end))
    }
}

/// Builds one boolean mask per contig from annotated repeat intervals.
pub fn reference_masks(
    contig_lengths: &HashMap<String, usize>,
    intervals: &[RepeatInterval],
) -> Result<HashMap<String, Vec<bool>>, RepeatError> {
    let mut masks: HashMap<String, Vec<bool>> = contig_lengths
        .iter()
        .map(|(name, &len)| (name.clone(), vec![false; len]))
        .collect();
    for interval in intervals {
        let mask = masks.get_mut(&interval.contig).ok_or_else(|| {
            RepeatError::invalid_input(format!(
                "repeat interval on unknown contig '{}'",
                interval.contig
            ))
        })?;
        let end = interval.end.min(mask.len());
        if interval.start < end {
            mask[interval.start..end].fill(true);
        }
    }
    Ok(masks)
}

/// Projects a reference repeat mask onto read samples through an event
/// alignment. Unaligned gaps before an event inside a repeat are filled too.
pub fn project_reference_repeats(
    reference_mask: &[bool],
    events: &[AlignedEvent],
    read_len: usize,
) -> Result<Vec<bool>, RepeatError> {
    let mut read_mask = vec![false; read_len];
    let mut last_event_end: Option<usize> = None;
    for event in events {
        let value = *reference_mask
            .get(event.reference_position)
            .ok_or_else(|| {
                RepeatError::invalid_input(format!(
                    "reference position {} outside contig of length {}",
                    event.reference_position,
                    reference_mask.len()
                ))
            })?;
        let start = event.event_start.min(read_len);
        let end = event.event_end.min(read_len);
        if start < end {
            read_mask[start..end].fill(value);
        }
        if let Some(previous_end) = last_event_end {
            if value && previous_end < start {
                read_mask[previous_end..start].fill(true);
            }
        }
        last_event_end = Some(end);
    }
    Ok(read_mask)
}

/// Agreement between a computed repeat mask and a ground-truth mask.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlapMetrics {
    pub length: usize,
    pub ground_truth_count: usize,
    pub computed_count: usize,
    pub intersection: usize,
    pub union: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iou: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specificity: Option<f64>,
}

impl OverlapMetrics {
    pub fn compare(computed: &[bool], ground_truth: &[bool]) -> Result<Self, RepeatError> {
        if computed.len() != ground_truth.len() {
            return Err(RepeatError::invalid_input(format!(
                "computed mask covers {} samples, ground truth covers {}",
                computed.len(),
                ground_truth.len()
            )));
        }
        let mut metrics = Self {
            length: computed.len(),
            ..Self::default()
        };
        for (&c, &g) in computed.iter().zip(ground_truth) {
            metrics.computed_count += usize::from(c);
            metrics.ground_truth_count += usize::from(g);
            metrics.intersection += usize::from(c && g);
            metrics.union += usize::from(c || g);
        }
        Ok(metrics.with_ratios())
    }

    /// Sums counts over several reads and recomputes the ratios.
    pub fn accumulate<'a>(items: impl IntoIterator<Item = &'a OverlapMetrics>) -> Self {
        let mut total = Self::default();
        for item in items {
            total.length += item.length;
            total.ground_truth_count += item.ground_truth_count;
            total.computed_count += item.computed_count;
            total.intersection += item.intersection;
            total.union += item.union;
        }
        total.with_ratios()
    }

    fn with_ratios(mut self) -> Self {
        self.iou = ratio(self.intersection, self.union);
        self.sensitivity = ratio(self.intersection, self.ground_truth_count);
        self.specificity = ratio(
            self.length - self.union,
            self.length - self.ground_truth_count,
        );
        self
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

pub fn parse_signal(text: &str) -> Result<Vec<f64>, RepeatError> {
    text.split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| RepeatError::parse("parse signal", format!("bad sample {token:?}")))
        })
        .collect()
}

/// One whitespace-separated row of classifier logits per non-empty line.
pub fn parse_logits(text: &str) -> Result<Vec<Vec<f64>>, RepeatError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            line.split_whitespace()
                .map(|token| {
                    token.parse::<f64>().map_err(|_| {
                        RepeatError::parse(
                            "parse logits",
                            format!("line {}: bad value {token:?}", index + 1),
                        )
                    })
                })
                .collect()
        })
        .collect()
}

/// One `0`/`1` per line.
pub fn parse_repeat_map(text: &str) -> Result<Vec<bool>, RepeatError> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.parse::<i64>() {
            Ok(value) => Ok(value != 0),
            Err(_) => Err(RepeatError::parse(
                "parse repeat map",
                format!("bad entry {line:?}"),
            )),
        })
        .collect()
}

pub fn format_repeat_map(mask: &[bool]) -> String {
    let mut out = String::with_capacity(mask.len() * 2);
    for &value in mask {
        out.push(if value { '1' } else { '0' });
        out.push('\n');
    }
    out
}

/// One `0`/`1` character per sample on a single line, without a newline.
pub fn format_bitstring(mask: &[bool]) -> String {
    mask.iter().map(|&value| if value { '1' } else { '0' }).collect()
}

/// `contig start end` per line; extra columns are ignored.
pub fn parse_repeat_intervals(text: &str) -> Result<Vec<RepeatInterval>, RepeatError> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut fields = line.split_whitespace();
            let bad = || RepeatError::parse("parse repeat intervals", format!("bad line {line:?}"));
            let contig = fields.next().ok_or_else(bad)?.to_string();
            let start = fields
                .next()
                .and_then(|f| f.parse().ok())
                .ok_or_else(bad)?;
            let end = fields
                .next()
                .and_then(|f| f.parse().ok())
                .ok_or_else(bad)?;
            Ok(RepeatInterval { contig, start, end })
        })
        .collect()
}

/// Contig name on the first line, a header line, then
/// `reference_position event_start event_end` triples.
pub fn parse_event_alignment(text: &str) -> Result<EventAlignment, RepeatError> {
    let mut lines = text.lines();
    let contig = lines
        .next()
        .map(|line| line.trim_end().to_string())
        .filter(|contig| !contig.is_empty())
        .ok_or_else(|| RepeatError::parse("parse event alignment", "missing contig line"))?;
    lines.next();

    let mut events = Vec::new();
    for line in lines.filter(|line| !line.trim().is_empty()) {
        let values = line
            .split_whitespace()
            .map(str::parse::<usize>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| {
                RepeatError::parse("parse event alignment", format!("bad line {line:?}"))
            })?;
        let [reference_position, event_start, event_end] = values[..] else {
            return Err(RepeatError::parse(
                "parse event alignment",
                format!("expected three columns in {line:?}"),
            ));
        };
        events.push(AlignedEvent {
            reference_position,
            event_start,
            event_end,
        });
    }
    Ok(EventAlignment { contig, events })
}

/// Sequence length per FASTA record, keyed by the full header text.
pub fn parse_fasta_lengths(text: &str) -> Result<HashMap<String, usize>, RepeatError> {
    let mut lengths = HashMap::new();
    let mut current: Option<(String, usize)> = None;
    for line in text.lines() {
        let line = line.trim_end();
        if let Some(name) = line.strip_prefix('>') {
            if let Some((name, len)) = current.take() {
                lengths.insert(name, len);
            }
            current = Some((name.to_string(), 0));
        } else if let Some((_, len)) = current.as_mut() {
            *len += line.len();
        } else if !line.is_empty() {
            return Err(RepeatError::parse(
                "parse reference FASTA",
                "sequence data before the first header",
            ));
        }
    }
    if let Some((name, len)) = current {
        lengths.insert(name, len);
    }
    Ok(lengths)
}
