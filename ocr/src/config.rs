use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

/// Upper bound for confidence thresholds (Tesseract reports 0–100).
pub const MAX_CONFIDENCE: i32 = 100;
/// Upper bound accepted for the horizontal row gap.
pub const MAX_GAP_LIMIT: i32 = 20;
/// Horizontal gap used when none is configured.
pub const DEFAULT_MAX_GAP: i32 = 10;

/// Clamp a confidence threshold into `0..=100`.
pub fn clamp_min_confidence(value: i64) -> i32 {
    value.clamp(0, MAX_CONFIDENCE as i64) as i32
}

/// Clamp a horizontal gap into `0..=20`.
pub fn clamp_max_gap(value: i64) -> i32 {
    value.clamp(0, MAX_GAP_LIMIT as i64) as i32
}

/// Whether results are reported per word or per reconstructed row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Word,
    Row,
}

/// What happens to the row still being accumulated when the input runs out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingRow {
    /// Emit it like any other row.
    #[default]
    Emit,
    /// Discard it. Older tooling behaved this way and lost the last row of
    /// every image; only use this to reproduce those outputs.
    Drop,
}

/// Post-processing parameters, validated once and then passed by value.
///
/// Out-of-range numbers are clamped rather than rejected, both by the
/// constructors and when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionOptions {
    #[serde(deserialize_with = "de_min_confidence")]
    min_confidence: i32,
    granularity: Granularity,
    #[serde(deserialize_with = "de_max_gap")]
    max_gap: i32,
    #[serde(deserialize_with = "de_row_tolerance")]
    row_tolerance: u32,
    trailing_row: TrailingRow,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            min_confidence: 0,
            granularity: Granularity::Word,
            max_gap: DEFAULT_MAX_GAP,
            row_tolerance: 0,
            trailing_row: TrailingRow::Emit,
        }
    }
}

impl DetectionOptions {
    /// Word-level output with the given threshold.
    pub fn words(min_confidence: i64) -> Self {
        Self::default().with_min_confidence(min_confidence)
    }

    /// Row-level output with the given threshold and gap.
    pub fn rows(min_confidence: i64, max_gap: i64) -> Self {
        Self::default()
            .with_granularity(Granularity::Row)
            .with_min_confidence(min_confidence)
            .with_max_gap(max_gap)
    }

    pub fn with_min_confidence(mut self, value: i64) -> Self {
        self.min_confidence = clamp_min_confidence(value);
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_max_gap(mut self, value: i64) -> Self {
        self.max_gap = clamp_max_gap(value);
        self
    }

    /// Allow `top` coordinates within `pixels` of the row start to join the row.
    pub fn with_row_tolerance(mut self, pixels: u32) -> Self {
        self.row_tolerance = pixels;
        self
    }

    pub fn with_trailing_row(mut self, policy: TrailingRow) -> Self {
        self.trailing_row = policy;
        self
    }

    /// Minimum confidence a token needs to survive filtering.
    pub fn min_confidence(&self) -> i32 {
        self.min_confidence
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Tokens merge only while their gap is strictly smaller than this.
    pub fn max_gap(&self) -> i32 {
        self.max_gap
    }

    pub fn row_tolerance(&self) -> u32 {
        self.row_tolerance
    }

    pub fn trailing_row(&self) -> TrailingRow {
        self.trailing_row
    }
}

fn de_min_confidence<'de, D: Deserializer<'de>>(de: D) -> Result<i32, D::Error> {
    i64::deserialize(de).map(clamp_min_confidence)
}

fn de_max_gap<'de, D: Deserializer<'de>>(de: D) -> Result<i32, D::Error> {
    i64::deserialize(de).map(clamp_max_gap)
}

fn de_row_tolerance<'de, D: Deserializer<'de>>(de: D) -> Result<u32, D::Error> {
    i64::deserialize(de).map(|v| v.clamp(0, u32::MAX as i64) as u32)
}

/// How to invoke the Tesseract executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractConfig {
    executable: PathBuf,
    language: String,
    page_segmentation_mode: Option<u32>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            page_segmentation_mode: None,
        }
    }
}

impl TesseractConfig {
    /// Use a specific binary instead of `tesseract` from `PATH`.
    pub fn with_executable(mut self, executable: impl AsRef<Path>) -> Self {
        self.executable = executable.as_ref().to_path_buf();
        self
    }

    /// Language codes passed to `-l` (e.g. `eng`, `eng+deu`).
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Page segmentation mode passed to `--psm`; Tesseract's default when unset.
    pub fn with_page_segmentation_mode(mut self, psm: u32) -> Self {
        self.page_segmentation_mode = Some(psm);
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn page_segmentation_mode(&self) -> Option<u32> {
        self.page_segmentation_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let opts = DetectionOptions::default();
        assert_eq!(opts.min_confidence(), 0);
        assert_eq!(opts.max_gap(), 10);
        assert_eq!(opts.granularity(), Granularity::Word);
        assert_eq!(opts.row_tolerance(), 0);
        assert_eq!(opts.trailing_row(), TrailingRow::Emit);
    }

    #[test]
    fn numbers_are_clamped_not_rejected() {
        let opts = DetectionOptions::rows(-5, 99);
        assert_eq!(opts.min_confidence(), 0);
        assert_eq!(opts.max_gap(), 20);

        let opts = DetectionOptions::rows(250, -3);
        assert_eq!(opts.min_confidence(), 100);
        assert_eq!(opts.max_gap(), 0);
        assert_eq!(opts.granularity(), Granularity::Row);
    }

    #[test]
    fn deserializing_clamps_and_fills_defaults() {
        let opts: DetectionOptions =
            serde_json::from_str(r#"{"min_confidence": 140, "granularity": "row"}"#).unwrap();
        assert_eq!(opts.min_confidence(), 100);
        assert_eq!(opts.granularity(), Granularity::Row);
        assert_eq!(opts.max_gap(), DEFAULT_MAX_GAP);

        let opts: DetectionOptions =
            serde_json::from_str(r#"{"max_gap": -1, "trailing_row": "drop"}"#).unwrap();
        assert_eq!(opts.max_gap(), 0);
        assert_eq!(opts.trailing_row(), TrailingRow::Drop);
    }

    #[test]
    fn tesseract_config_builder() {
        let cfg = TesseractConfig::default()
            .with_language("eng+deu")
            .with_page_segmentation_mode(6)
            .with_executable("/opt/tess/bin/tesseract");
        assert_eq!(cfg.language(), "eng+deu");
        assert_eq!(cfg.page_segmentation_mode(), Some(6));
        assert_eq!(cfg.executable(), Path::new("/opt/tess/bin/tesseract"));
    }
}
