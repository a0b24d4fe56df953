use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use signal_repeats::alignment::repeat_map::{
    format_bitstring, parse_event_alignment, parse_logits, parse_repeat_map, parse_signal,
};
use signal_repeats::{
    aggregate_reports, compute_read_report, crop_to_region, predictions_from_logits, AlignmentInput,
    repeat_mask, LocalAlignmentConfig, Meta, ReadReport, RepeatFinderBuilder, RepeatFinderConfig,
    Report,
};
use tracing_subscriber::EnvFilter;

#[path = "repeat_report/json_report_formatter.rs"]
mod json_report_formatter;

const SIGNAL_EXTENSION: &str = "txt";
const PREDICTIONS_EXTENSION: &str = "signal";
const GROUND_TRUTH_EXTENSION: &str = "txt";
const LOG_EXTENSION: &str = "bin";
const ALIGNMENT_EXTENSION: &str = "txt";
const MASK_EXTENSION: &str = "txt";

#[derive(Debug, Parser)]
#[command(about = "Find repeats in raw reads and write a JSON report")]
struct Args {
    /// Directory of `<id>.txt` signal files.
    #[arg(long, env = "SIGNAL_REPEATS_READS_DIR")]
    reads_dir: PathBuf,
    /// Directory of `<id>.signal` classifier logits, one row per sample.
    #[arg(long, env = "SIGNAL_REPEATS_PREDICTIONS_DIR")]
    predictions_dir: PathBuf,
    /// Directory of `<id>.txt` 0/1 ground-truth maps.
    #[arg(long, env = "SIGNAL_REPEATS_GROUND_TRUTH_DIR")]
    ground_truth_dir: Option<PathBuf>,
    /// Directory of `<id>.txt` event alignments. When present, overlap is
    /// scored only between the first and last aligned event.
    #[arg(long, env = "SIGNAL_REPEATS_ALIGNMENTS_DIR")]
    alignments_dir: Option<PathBuf>,
    /// Write `<id>.txt` per read with the ground-truth and computed masks as
    /// two `0`/`1` lines over the scored region.
    #[arg(long, env = "SIGNAL_REPEATS_MASKS_DIR")]
    masks_dir: Option<PathBuf>,
    /// Write one `<id>.bin` traceback log per read here.
    #[arg(long, env = "SIGNAL_REPEATS_LOG_DIR")]
    log_dir: Option<PathBuf>,
    /// JSON alignment config; defaults are used when absent.
    #[arg(long, env = "SIGNAL_REPEATS_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "SIGNAL_REPEATS_OUT", default_value = "repeat-report.json")]
    out: PathBuf,
    #[arg(long, env = "SIGNAL_REPEATS_LIMIT")]
    limit: Option<usize>,
    #[arg(long, env = "SIGNAL_REPEATS_OFFSET", default_value_t = 0)]
    offset: usize,
    #[arg(long)]
    min_events_distance: Option<usize>,
    #[arg(long)]
    max_events_distance: Option<usize>,
    #[arg(long)]
    score_for_moving: Option<f64>,
    #[arg(long)]
    max_speed_ratio: Option<usize>,
    #[arg(long)]
    event_threshold: Option<f64>,
    #[arg(long)]
    min_lookahead: Option<usize>,
    /// Keep forward alignments as well as self-alignments.
    #[arg(long, default_value_t = false)]
    keep_forward: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let mut read_ids = collect_read_ids(&args.reads_dir)?;
    if args.offset > 0 {
        read_ids = read_ids.into_iter().skip(args.offset).collect();
    }
    if let Some(limit) = args.limit {
        read_ids.truncate(limit);
    }
    if read_ids.is_empty() {
        return Err("No reads selected after applying offset/limit.".to_string());
    }

    let finder = RepeatFinderBuilder::new(RepeatFinderConfig {
        alignment: config.clone(),
        traceback_log_path: None,
    })
    .build()
    .map_err(|err| format!("Invalid alignment config: {err}"))?;

    let progress = ProgressBar::new(read_ids.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    progress.set_message("starting...");

    if let Some(dir) = args.masks_dir.as_ref() {
        fs::create_dir_all(dir).map_err(|err| {
            format!("Failed to create masks directory '{}': {err}", dir.display())
        })?;
    }

    let started = Instant::now();
    let mut reads: Vec<ReadReport> = Vec::with_capacity(read_ids.len());
    for id in &read_ids {
        progress.set_message(id.clone());
        let input = load_input(&args, id)?;
        let ground_truth = load_ground_truth(args.ground_truth_dir.as_deref(), id)?;
        let aligned_region = load_aligned_region(args.alignments_dir.as_deref(), id)?;
        let log_path = args
            .log_dir
            .as_ref()
            .map(|dir| dir.join(format!("{id}.{LOG_EXTENSION}")));

        let output = finder
            .find_repeats_with_log(&input, log_path.as_deref())
            .map_err(|err| format!("Read '{id}' failed: {err}"))?;
        tracing::debug!(read = %id, repeats = output.paths.len(), "read aligned");
        let report = compute_read_report(
            id,
            input.signal.len(),
            &output,
            ground_truth.as_deref(),
            aligned_region,
        );
        if let (Some(dir), Some(truth)) = (args.masks_dir.as_ref(), ground_truth.as_deref()) {
            let computed = repeat_mask(input.signal.len(), &output.paths);
            write_masks(dir, id, truth, &computed, aligned_region)?;
        }
        reads.push(report);
        progress.inc(1);
    }
    progress.finish_with_message("repeat search complete");
    tracing::info!(
        reads = reads.len(),
        elapsed_s = started.elapsed().as_secs_f64(),
        "alignment pass complete"
    );

    let aggregates = aggregate_reports(&reads);
    if let Some(cumulative) = aggregates.cumulative.as_ref() {
        tracing::info!(
            iou = ?cumulative.iou,
            sensitivity = ?cumulative.sensitivity,
            specificity = ?cumulative.specificity,
            "cumulative overlap with ground truth"
        );
    }

    let report = Report {
        schema_version: 1,
        meta: Meta {
            generated_at: Utc::now().to_rfc3339(),
            config,
            read_count: reads.len(),
        },
        reads,
        aggregates,
    };
    json_report_formatter::write_report(&args.out, &report)?;
    println!("{}", args.out.display());
    Ok(())
}

fn load_config(args: &Args) -> Result<LocalAlignmentConfig, String> {
    let mut config = match args.config.as_ref() {
        Some(path) => LocalAlignmentConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => LocalAlignmentConfig::default(),
    };
    if let Some(value) = args.min_events_distance {
        config.min_events_distance = value;
    }
    if let Some(value) = args.max_events_distance {
        config.max_events_distance = value;
    }
    if let Some(value) = args.score_for_moving {
        config.score_for_moving = value;
    }
    if let Some(value) = args.max_speed_ratio {
        config.max_speed_ratio = value;
    }
    if let Some(value) = args.event_threshold {
        config.event_threshold = value;
    }
    if let Some(value) = args.min_lookahead {
        config.min_lookahead = value;
    }
    if args.keep_forward {
        config.repeats_only = false;
    }
    Ok(config)
}

fn collect_read_ids(reads_dir: &Path) -> Result<Vec<String>, String> {
    let entries = fs::read_dir(reads_dir).map_err(|err| {
        format!(
            "Failed to read reads directory '{}': {err}",
            reads_dir.display()
        )
    })?;
    let mut ids = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| format!("Failed to list '{}': {err}", reads_dir.display()))?
            .path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(SIGNAL_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            ids.push(stem.to_string());
        }
    }
    ids.sort();
    Ok(ids)
}

fn load_input(args: &Args, id: &str) -> Result<AlignmentInput, String> {
    let signal_path = args.reads_dir.join(format!("{id}.{SIGNAL_EXTENSION}"));
    let signal = parse_signal(&read_text(&signal_path)?)
        .map_err(|err| format!("{}: {err}", signal_path.display()))?;

    let predictions_path = args
        .predictions_dir
        .join(format!("{id}.{PREDICTIONS_EXTENSION}"));
    let logits = parse_logits(&read_text(&predictions_path)?)
        .map_err(|err| format!("{}: {err}", predictions_path.display()))?;

    Ok(AlignmentInput {
        signal,
        predictions: predictions_from_logits(&logits),
    })
}

fn load_ground_truth(dir: Option<&Path>, id: &str) -> Result<Option<Vec<bool>>, String> {
    let Some(dir) = dir else {
        return Ok(None);
    };
    let path = dir.join(format!("{id}.{GROUND_TRUTH_EXTENSION}"));
    if !path.is_file() {
        tracing::warn!(read = %id, path = %path.display(), "no ground-truth map");
        return Ok(None);
    }
    parse_repeat_map(&read_text(&path)?)
        .map(Some)
        .map_err(|err| format!("{}: {err}", path.display()))
}

fn load_aligned_region(dir: Option<&Path>, id: &str) -> Result<Option<(usize, usize)>, String> {
    let Some(dir) = dir else {
        return Ok(None);
    };
    let path = dir.join(format!("{id}.{ALIGNMENT_EXTENSION}"));
    if !path.is_file() {
        tracing::warn!(
            read = %id,
            path = %path.display(),
            "no event alignment, scoring whole read"
        );
        return Ok(None);
    }
    let alignment = parse_event_alignment(&read_text(&path)?)
        .map_err(|err| format!("{}: {err}", path.display()))?;
    Ok(alignment.aligned_region())
}

fn write_masks(
    dir: &Path,
    id: &str,
    truth: &[bool],
    computed: &[bool],
    region: Option<(usize, usize)>,
) -> Result<(), String> {
    let path = dir.join(format!("{id}.{MASK_EXTENSION}"));
    let text = format!(
        "{}\n{}\n",
        format_bitstring(crop_to_region(truth, region)),
        format_bitstring(crop_to_region(computed, region))
    );
    fs::write(&path, text).map_err(|err| format!("Failed to write '{}': {err}", path.display()))
}

fn read_text(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("Failed to read '{}': {err}", path.display()))
}
