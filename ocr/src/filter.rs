use tracing::debug;

use crate::config::{MAX_CONFIDENCE, clamp_min_confidence};
use crate::result::{Detection, RawToken};

/// Drop tokens whose trimmed text is empty or whose confidence is below
/// `min_confidence`. Survivors keep their relative order.
///
/// The threshold is clamped into `0..=100` first, so negative engine
/// confidences never pass. Confidences above 100 are not valid engine output
/// and are dropped as well.
pub fn filter_tokens(tokens: &[RawToken], min_confidence: i32) -> Vec<Detection> {
    let threshold = clamp_min_confidence(min_confidence as i64);

    let kept: Vec<Detection> = tokens
        .iter()
        .filter_map(|token| {
            let text = token.text.trim();
            if text.is_empty()
                || token.confidence < threshold
                || token.confidence > MAX_CONFIDENCE
            {
                return None;
            }
            Some(Detection::word(
                text,
                token.confidence,
                token.top,
                token.left,
                token.width,
                token.height,
            ))
        })
        .collect();

    debug!(
        total = tokens.len(),
        kept = kept.len(),
        threshold,
        "filtered OCR tokens"
    );
    kept
}
