use serde::Serialize;

/// One token exactly as the OCR engine reported it.
///
/// The text is untrimmed and the confidence may be negative (Tesseract uses
/// `-1` for block, paragraph and line entries that carry no text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub text: String,
    pub confidence: i32,
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

impl RawToken {
    pub fn new(
        text: impl Into<String>,
        confidence: i32,
        top: u32,
        left: u32,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            text: text.into(),
            confidence,
            top,
            left,
            width,
            height,
        }
    }
}

/// A filtered word or a synthesized text row.
///
/// Word detections carry the engine confidence (always within `0..=100`);
/// rows built by [`merge_rows`](crate::merge_rows) drop it. Field order is the
/// serialized column order for word output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<i32>,
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

impl Detection {
    /// A word-level detection.
    pub fn word(
        text: impl Into<String>,
        confidence: i32,
        top: u32,
        left: u32,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            text: text.into(),
            confidence: Some(confidence),
            top,
            left,
            width,
            height,
        }
    }

    /// A row-level detection, which has no confidence of its own.
    pub fn row(text: impl Into<String>, top: u32, left: u32, width: u32, height: u32) -> Self {
        Self {
            text: text.into(),
            confidence: None,
            top,
            left,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        self.left as u64 + self.width as u64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        self.top as u64 + self.height as u64
    }
}
