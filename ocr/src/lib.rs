//! OCR post-processing: turns raw Tesseract tokens into clean word or row
//! detections.
//!
//! [`filter_tokens`] drops empty and low-confidence tokens, [`merge_rows`]
//! rebuilds text rows from the surviving words. Both are pure; the only I/O
//! lives behind [`TokenSource`], implemented for the `tesseract` CLI by
//! [`TesseractEngine`].

mod config;
mod engine;
mod error;
mod filter;
mod result;
mod rows;

pub use config::{
    DEFAULT_MAX_GAP, DetectionOptions, Granularity, MAX_CONFIDENCE, MAX_GAP_LIMIT,
    TesseractConfig, TrailingRow, clamp_max_gap, clamp_min_confidence,
};
pub use engine::{TesseractEngine, TokenSource, detect_text, parse_tsv, postprocess};
pub use error::OcrError;
pub use filter::filter_tokens;
pub use result::{Detection, RawToken};
pub use rows::{RowMerger, merge_rows};

/// Crate-wide result type.
pub type OcrResult<T> = Result<T, OcrError>;
