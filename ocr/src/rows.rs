//! Reconstruction of text rows from word detections.
//!
//! Words are merged greedily in input order: a word joins the row being built
//! when it sits on the same `top` coordinate and its left edge is closer than
//! `max_gap` pixels to the row's right edge. The input is never reordered, so
//! callers must pass detections in reading order (which is what Tesseract
//! emits).

use tracing::debug;

use crate::config::{DetectionOptions, TrailingRow};
use crate::result::Detection;

/// Row merging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMerger {
    /// A word joins the row only while its gap is strictly below this.
    pub max_gap: i32,
    /// Maximum `|top - row.top|` for a word to count as the same row.
    pub row_tolerance: u32,
    pub trailing_row: TrailingRow,
}

impl RowMerger {
    /// Exact `top` matching, trailing row emitted.
    pub fn new(max_gap: i32) -> Self {
        Self {
            max_gap,
            row_tolerance: 0,
            trailing_row: TrailingRow::Emit,
        }
    }

    pub fn merge(&self, detections: &[Detection]) -> Vec<Detection> {
        let (pending, mut rows) = detections.iter().fold(
            (None::<RowAccumulator>, Vec::new()),
            |(pending, mut rows), detection| match pending {
                None => (Some(RowAccumulator::seed(detection)), rows),
                Some(mut acc) => {
                    let gap = acc.gap_to(detection);
                    let joins = acc.shares_row(detection, self.row_tolerance)
                        && gap < self.max_gap as i64;
                    if joins {
                        acc.extend(detection, gap);
                        (Some(acc), rows)
                    } else {
                        rows.push(acc.finish());
                        (Some(RowAccumulator::seed(detection)), rows)
                    }
                }
            },
        );

        match (pending, self.trailing_row) {
            (Some(acc), TrailingRow::Emit) => rows.push(acc.finish()),
            (Some(acc), TrailingRow::Drop) => {
                debug!(words = acc.words.len(), "dropping trailing row");
            }
            (None, _) => {}
        }

        debug!(
            words = detections.len(),
            rows = rows.len(),
            max_gap = self.max_gap,
            "merged detections into rows"
        );
        rows
    }
}

impl From<&DetectionOptions> for RowMerger {
    fn from(options: &DetectionOptions) -> Self {
        Self {
            max_gap: options.max_gap(),
            row_tolerance: options.row_tolerance(),
            trailing_row: options.trailing_row(),
        }
    }
}

/// Merge consecutive same-row detections using exact `top` matching.
pub fn merge_rows(detections: &[Detection], max_gap: i32) -> Vec<Detection> {
    RowMerger::new(max_gap).merge(detections)
}

/// Partial row. Width is signed because overlapping words shrink the gap
/// below zero and the running sum must not wrap.
struct RowAccumulator {
    top: u32,
    left: u32,
    width: i64,
    height: u32,
    words: Vec<String>,
}

impl RowAccumulator {
    fn seed(detection: &Detection) -> Self {
        Self {
            top: detection.top,
            left: detection.left,
            width: detection.width as i64,
            height: detection.height,
            words: vec![detection.text.clone()],
        }
    }

    fn gap_to(&self, detection: &Detection) -> i64 {
        detection.left as i64 - (self.left as i64 + self.width)
    }

    fn shares_row(&self, detection: &Detection, tolerance: u32) -> bool {
        (detection.top as i64 - self.top as i64).unsigned_abs() <= tolerance as u64
    }

    fn extend(&mut self, detection: &Detection, gap: i64) {
        self.width += detection.width as i64 + gap;
        self.words.push(detection.text.clone());
    }

    fn finish(self) -> Detection {
        let width = self.width.clamp(0, u32::MAX as i64) as u32;
        Detection::row(self.words.join(" "), self.top, self.left, width, self.height)
    }
}
