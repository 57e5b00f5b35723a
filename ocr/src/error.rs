use std::path::PathBuf;

use thiserror::Error;

/// Failures of the OCR engine boundary. The post-processing core itself
/// cannot fail.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to run {program:?} (is Tesseract installed?)")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("tesseract exited with {status}: {stderr}")]
    EngineFailed { status: String, stderr: String },

    #[error("tesseract output is missing the TSV header")]
    MissingHeader,

    #[error("image not found: {0}")]
    ImageNotFound(PathBuf),
}
