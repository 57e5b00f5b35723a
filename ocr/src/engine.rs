use std::path::Path;
use std::process::Command;

use tracing::{debug, instrument};

use crate::OcrResult;
use crate::config::{DetectionOptions, Granularity, TesseractConfig};
use crate::error::OcrError;
use crate::filter::filter_tokens;
use crate::result::{Detection, RawToken};
use crate::rows::RowMerger;

/// Anything that can turn an image on disk into raw OCR tokens.
pub trait TokenSource {
    fn extract_tokens(&self, image_path: &Path) -> OcrResult<Vec<RawToken>>;
}

/// Runs the `tesseract` executable in TSV mode.
///
/// Every TSV row becomes one [`RawToken`], including the page, block,
/// paragraph and line rows; those have empty text and are removed by the
/// filter.
#[derive(Debug, Clone, Default)]
pub struct TesseractEngine {
    config: TesseractConfig,
}

impl TesseractEngine {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    fn command(&self, image_path: &Path) -> Command {
        let mut cmd = Command::new(self.config.executable());
        cmd.arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(self.config.language());
        if let Some(psm) = self.config.page_segmentation_mode() {
            cmd.arg("--psm").arg(psm.to_string());
        }
        cmd.arg("tsv");
        cmd
    }
}

impl TokenSource for TesseractEngine {
    #[instrument(skip(self), fields(language = self.config.language()))]
    fn extract_tokens(&self, image_path: &Path) -> OcrResult<Vec<RawToken>> {
        if !image_path.is_file() {
            return Err(OcrError::ImageNotFound(image_path.to_path_buf()));
        }

        let mut cmd = self.command(image_path);
        debug!(command = ?cmd, "running tesseract");
        let output = cmd.output().map_err(|source| OcrError::Spawn {
            program: self.config.executable().to_path_buf(),
            source,
        })?;

        if !output.status.success() {
            return Err(OcrError::EngineFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_tsv(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Column positions taken from the TSV header line.
struct TsvLayout {
    left: usize,
    top: usize,
    width: usize,
    height: usize,
    conf: usize,
    text: usize,
}

impl TsvLayout {
    fn from_header(header: &str) -> Option<Self> {
        let names: Vec<&str> = header.trim_end_matches('\r').split('\t').collect();
        let find = |name: &str| names.iter().position(|n| *n == name);
        Some(Self {
            left: find("left")?,
            top: find("top")?,
            width: find("width")?,
            height: find("height")?,
            conf: find("conf")?,
            text: find("text")?,
        })
    }

    fn token(&self, row: &str) -> Option<RawToken> {
        let cols: Vec<&str> = row.trim_end_matches('\r').split('\t').collect();
        let coord = |idx: usize| -> Option<u32> {
            let value: i64 = cols.get(idx)?.trim().parse().ok()?;
            Some(value.clamp(0, u32::MAX as i64) as u32)
        };
        // Tesseract 4+ prints fractional confidences; truncate toward zero.
        // `inf`/`nan` parse as floats but are not confidences.
        let confidence = cols.get(self.conf)?.trim().parse::<f64>().ok()?;
        if !confidence.is_finite() {
            return None;
        }
        let confidence = confidence.trunc().clamp(i32::MIN as f64, i32::MAX as f64) as i32;

        Some(RawToken {
            text: cols.get(self.text).copied().unwrap_or_default().to_string(),
            confidence,
            top: coord(self.top)?,
            left: coord(self.left)?,
            width: coord(self.width)?,
            height: coord(self.height)?,
        })
    }
}

/// Parse Tesseract TSV output into tokens, in emission order.
///
/// Rows whose numeric columns do not parse are skipped.
pub fn parse_tsv(tsv: &str) -> OcrResult<Vec<RawToken>> {
    let mut lines = tsv.lines();
    let layout = lines
        .next()
        .and_then(TsvLayout::from_header)
        .ok_or(OcrError::MissingHeader)?;

    let mut skipped = 0usize;
    let tokens: Vec<RawToken> = lines
        .filter(|row| !row.trim().is_empty())
        .filter_map(|row| {
            let token = layout.token(row);
            if token.is_none() {
                skipped += 1;
            }
            token
        })
        .collect();

    debug!(tokens = tokens.len(), skipped, "parsed tesseract TSV");
    Ok(tokens)
}

/// Filter raw tokens and, for row granularity, merge them into rows.
pub fn postprocess(tokens: &[RawToken], options: DetectionOptions) -> Vec<Detection> {
    let words = filter_tokens(tokens, options.min_confidence());
    match options.granularity() {
        Granularity::Word => words,
        Granularity::Row => RowMerger::from(&options).merge(&words),
    }
}

/// Run OCR on an image and post-process the result in one call.
pub fn detect_text(
    source: &impl TokenSource,
    image_path: impl AsRef<Path>,
    options: DetectionOptions,
) -> OcrResult<Vec<Detection>> {
    let tokens = source.extract_tokens(image_path.as_ref())?;
    Ok(postprocess(&tokens, options))
}
