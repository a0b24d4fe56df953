pub mod alignment;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

pub use alignment::predictions::predictions_from_logits;
pub use alignment::repeat_map::{project_reference_repeats, repeat_mask, OverlapMetrics};
pub use alignment::report::{
    aggregate_reports, compute_read_report, crop_to_region, Meta, ReadReport, Report,
};
pub use alignment::traceback_log::TracebackLog;
pub use alignment::{align_with_stages, local_alignment};
pub use config::{LocalAlignmentConfig, RepeatFinderConfig};
pub use error::RepeatError;
pub use pipeline::builder::RepeatFinderBuilder;
pub use pipeline::runtime::{normalize_signal, RepeatFinder};
pub use pipeline::traits::{EventSegmenter, PairScorer};
pub use types::{AlignmentInput, AlignmentOutput, AlignmentStats, Cell, RepeatPath};
