use std::cmp::Ordering;

use serde::Serialize;

use crate::alignment::repeat_map::{repeat_mask, OverlapMetrics};
use crate::config::LocalAlignmentConfig;
use crate::types::{AlignmentOutput, AlignmentStats, Cell, RepeatPath};

const OUTLIER_TOP_N: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub schema_version: u32,
    pub meta: Meta,
    pub reads: Vec<ReadReport>,
    pub aggregates: AggregateReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub generated_at: String,
    pub config: LocalAlignmentConfig,
    pub read_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadReport {
    pub id: String,
    pub signal_length: usize,
    pub stats: AlignmentStats,
    pub repeats: Vec<RepeatSpan>,
    pub computed_repeat_samples: usize,
    /// Sample range the overlap was measured on; the whole trace when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scored_region: Option<(usize, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlap: Option<OverlapMetrics>,
    pub notes: Vec<String>,
}

/// Endpoints of one extracted path. `repeat_start..repeat_end` is the span a
/// repeat mask marks for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatSpan {
    pub first: Cell,
    pub last: Cell,
    pub cell_count: usize,
    pub score: f64,
    pub repeat_start: usize,
    pub repeat_end: usize,
}

impl RepeatSpan {
    fn from_path(path: &RepeatPath) -> Option<Self> {
        let first = path.first()?;
        let last = path.last()?;
        Some(Self {
            first,
            last,
            cell_count: path.cells.len(),
            score: path.score,
            repeat_start: first.0,
            repeat_end: last.1,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub counts: AggregateCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cumulative: Option<OverlapMetrics>,
    pub per_read: AggregateMetrics,
    pub outliers: Vec<OutlierEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateCounts {
    pub total: u32,
    pub with_ground_truth: u32,
    pub without_ground_truth: u32,
    pub repeats: u32,
    pub rejected_forward_paths: u32,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct AggregateMetrics {
    pub iou: Option<MetricDistribution>,
    pub sensitivity: Option<MetricDistribution>,
    pub specificity: Option<MetricDistribution>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricDistribution {
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierEntry {
    pub id: String,
    pub iou: f64,
}

/// Summarizes one read. Overlap with the ground truth is measured only
/// inside `aligned_region` when one is given, so unaligned flanks count
/// neither way. A ground-truth mask whose length differs from the signal is
/// recorded as a note instead of failing the whole report.
pub fn compute_read_report(
    id: &str,
    signal_length: usize,
    output: &AlignmentOutput,
    ground_truth: Option<&[bool]>,
    aligned_region: Option<(usize, usize)>,
) -> ReadReport {
    let mut notes = Vec::new();
    let repeats: Vec<RepeatSpan> = output
        .paths
        .iter()
        .filter_map(RepeatSpan::from_path)
        .collect();
    if repeats.is_empty() {
        notes.push("no_repeats".to_string());
    }
    if output.stats.rejected_forward_paths > 0 {
        notes.push(format!(
            "rejected_forward_paths={}",
            output.stats.rejected_forward_paths
        ));
    }
    if output.stats.clamped_log_deltas > 0 {
        notes.push(format!(
            "clamped_log_deltas={}",
            output.stats.clamped_log_deltas
        ));
    }

    let mask = repeat_mask(signal_length, &output.paths);
    let computed_repeat_samples = mask.iter().filter(|&&marked| marked).count();

    let overlap = match ground_truth {
        None => {
            notes.push("ground_truth_missing".to_string());
            None
        }
        Some(truth) => match OverlapMetrics::compare(
            crop_to_region(&mask, aligned_region),
            crop_to_region(truth, aligned_region),
        ) {
            Ok(metrics) => Some(metrics),
            Err(_) => {
                notes.push(format!(
                    "ground_truth_length_mismatch:signal={} truth={}",
                    signal_length,
                    truth.len()
                ));
                None
            }
        },
    };

    ReadReport {
        id: id.to_string(),
        signal_length,
        stats: output.stats.clone(),
        repeats,
        computed_repeat_samples,
        scored_region: aligned_region,
        overlap,
        notes,
    }
}

/// The part of `mask` inside `[start, end)`, clamped to the mask length.
pub fn crop_to_region(mask: &[bool], region: Option<(usize, usize)>) -> &[bool] {
    match region {
        None => mask,
        Some((start, end)) => {
            let end = end.min(mask.len());
            &mask[start.min(end)..end]
        }
    }
}

pub fn aggregate_reports(reads: &[ReadReport]) -> AggregateReport {
    let with_truth: Vec<(&ReadReport, &OverlapMetrics)> = reads
        .iter()
        .filter_map(|read| read.overlap.as_ref().map(|overlap| (read, overlap)))
        .collect();

    let cumulative = (!with_truth.is_empty())
        .then(|| OverlapMetrics::accumulate(with_truth.iter().map(|(_, overlap)| *overlap)));

    let per_read = AggregateMetrics {
        iou: distribution_or_none(with_truth.iter().filter_map(|(_, o)| o.iou)),
        sensitivity: distribution_or_none(with_truth.iter().filter_map(|(_, o)| o.sensitivity)),
        specificity: distribution_or_none(with_truth.iter().filter_map(|(_, o)| o.specificity)),
    };

    AggregateReport {
        counts: AggregateCounts {
            total: to_u32(reads.len()),
            with_ground_truth: to_u32(with_truth.len()),
            without_ground_truth: to_u32(reads.len().saturating_sub(with_truth.len())),
            repeats: to_u32(reads.iter().map(|read| read.repeats.len()).sum()),
            rejected_forward_paths: to_u32(
                reads
                    .iter()
                    .map(|read| read.stats.rejected_forward_paths)
                    .sum(),
            ),
        },
        cumulative,
        per_read,
        outliers: worst_iou(&with_truth, OUTLIER_TOP_N),
    }
}

fn worst_iou(reads: &[(&ReadReport, &OverlapMetrics)], top_n: usize) -> Vec<OutlierEntry> {
    let mut entries: Vec<OutlierEntry> = reads
        .iter()
        .filter_map(|(read, overlap)| {
            overlap.iou.map(|iou| OutlierEntry {
                id: read.id.clone(),
                iou,
            })
        })
        .collect();
    entries.sort_by(|a, b| {
        a.iou
            .partial_cmp(&b.iou)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    entries.truncate(top_n);
    entries
}

fn distribution_or_none(values: impl Iterator<Item = f64>) -> Option<MetricDistribution> {
    let mut sorted: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Some(MetricDistribution {
        mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
        p50: percentile_sorted(&sorted, 0.5),
        p90: percentile_sorted(&sorted, 0.9),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
    })
}

fn percentile_sorted(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.len() == 1 {
        return sorted_values[0];
    }
    let max_index = (sorted_values.len() - 1) as f64;
    let rank = percentile.clamp(0.0, 1.0) * max_index;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = rank - lower as f64;
        sorted_values[lower] * (1.0 - weight) + sorted_values[upper] * weight
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
