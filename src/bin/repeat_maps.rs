use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use signal_repeats::alignment::repeat_map::{
    format_repeat_map, parse_event_alignment, parse_fasta_lengths, parse_repeat_intervals,
    parse_signal, reference_masks,
};
use signal_repeats::project_reference_repeats;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(about = "Project annotated reference repeats onto reads as 0/1 maps")]
struct Args {
    /// Reference FASTA; only record names and lengths are used.
    #[arg(long, env = "SIGNAL_REPEATS_REFERENCE")]
    reference: PathBuf,
    /// `contig start end` repeat annotations.
    #[arg(long, env = "SIGNAL_REPEATS_INTERVALS")]
    intervals: PathBuf,
    /// Directory of per-read event alignments, named `<id>.<anything>`.
    #[arg(long, env = "SIGNAL_REPEATS_ALIGNMENTS_DIR")]
    alignments_dir: PathBuf,
    /// Directory of `<id>.txt` signals used to size each map. Without it a map
    /// ends at the last aligned event.
    #[arg(long, env = "SIGNAL_REPEATS_READS_DIR")]
    reads_dir: Option<PathBuf>,
    #[arg(long, env = "SIGNAL_REPEATS_MAPS_OUT")]
    out_dir: PathBuf,
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

    let contig_lengths = parse_fasta_lengths(&read_text(&args.reference)?)
        .map_err(|err| format!("{}: {err}", args.reference.display()))?;
    let intervals = parse_repeat_intervals(&read_text(&args.intervals)?)
        .map_err(|err| format!("{}: {err}", args.intervals.display()))?;
    let masks = reference_masks(&contig_lengths, &intervals).map_err(|err| err.to_string())?;
    tracing::info!(
        contigs = masks.len(),
        intervals = intervals.len(),
        "reference repeat masks built"
    );

    let alignment_files = collect_files(&args.alignments_dir)?;
    fs::create_dir_all(&args.out_dir).map_err(|err| {
        format!(
            "Failed to create output directory '{}': {err}",
            args.out_dir.display()
        )
    })?;

    let progress = ProgressBar::new(alignment_files.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );

    let mut written = 0usize;
    for path in &alignment_files {
        let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
            progress.inc(1);
            continue;
        };
        progress.set_message(id.to_string());

        let alignment = parse_event_alignment(&read_text(path)?)
            .map_err(|err| format!("{}: {err}", path.display()))?;
        let Some(reference_mask) = masks.get(&alignment.contig) else {
            tracing::warn!(read = %id, contig = %alignment.contig, "contig missing from reference");
            progress.inc(1);
            continue;
        };

        let read_len = match args.reads_dir.as_ref() {
            Some(dir) => {
                let signal_path = dir.join(format!("{id}.txt"));
                parse_signal(&read_text(&signal_path)?)
                    .map_err(|err| format!("{}: {err}", signal_path.display()))?
                    .len()
            }
            None => alignment.aligned_region().map_or(0, |(_, end)| end),
        };

        let map = project_reference_repeats(reference_mask, &alignment.events, read_len)
            .map_err(|err| format!("{}: {err}", path.display()))?;
        let out_path = args.out_dir.join(format!("{id}.txt"));
        fs::write(&out_path, format_repeat_map(&map))
            .map_err(|err| format!("Failed to write '{}': {err}", out_path.display()))?;
        written += 1;
        progress.inc(1);
    }
    progress.finish_with_message("maps written");
    println!("Wrote {written} repeat map(s) to {}", args.out_dir.display());
    Ok(())
}

fn collect_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let entries = fs::read_dir(dir)
        .map_err(|err| format!("Failed to read directory '{}': {err}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| format!("Failed to list '{}': {err}", dir.display()))?
            .path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_text(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("Failed to read '{}': {err}", path.display()))
}
