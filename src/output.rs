//! Result types returned by the scan pipeline.
//!
//! [`ScanOutput::json`] is the extracted JSON substring **verbatim** — not
//! re-serialized, not pretty-printed, not validated. That is deliberate: the
//! pipeline's contract is to persist exactly what the extraction scanner
//! found, and leave schema questions to the consumer. Callers that do want a
//! typed view can opt in via [`ScanOutput::record`], which parses the
//! substring into a [`ReceiptRecord`] on demand.

use serde::{Deserialize, Serialize};

/// Full result of a receipt scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutput {
    /// The extracted JSON object substring, exactly as it appeared in the
    /// model's reply. This is what [`crate::scan_to_file`] writes to disk.
    pub json: String,

    /// Raw OCR transcription the model was given. May be empty or garbled —
    /// OCR quality is not assessed by the pipeline.
    pub raw_text: String,

    /// The model's complete reply, including any prose surrounding the
    /// extracted object. Useful for debugging extraction behaviour.
    pub reply: String,

    /// Timing and usage statistics for the run.
    pub stats: ScanStats,
}

impl ScanOutput {
    /// Parse the extracted substring into a typed [`ReceiptRecord`].
    ///
    /// This is the only place the crate interprets the model's output, and
    /// it runs only when the caller asks for it — the pipeline itself never
    /// validates the JSON before writing it.
    pub fn record(&self) -> Result<ReceiptRecord, serde_json::Error> {
        serde_json::from_str(&self.json)
    }
}

/// Statistics for a single scan run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// Width of the decoded input image in pixels.
    pub image_width: u32,
    /// Height of the decoded input image in pixels.
    pub image_height: u32,
    /// Otsu threshold selected for this image (recomputed per image).
    pub threshold: u8,
    /// Character count of the OCR transcription.
    pub raw_text_chars: usize,
    /// Tokens consumed by the prompt.
    pub input_tokens: usize,
    /// Tokens generated in the reply.
    pub output_tokens: usize,
    /// LLM attempts beyond the first.
    pub retries: u32,
    /// Wall-clock time spent binarizing.
    pub binarize_duration_ms: u64,
    /// Wall-clock time spent in the OCR engine.
    pub ocr_duration_ms: u64,
    /// Wall-clock time spent on the LLM request (including retries).
    pub llm_duration_ms: u64,
    /// Total wall-clock time for the run.
    pub total_duration_ms: u64,
}

/// Result of [`crate::ocr_only`]: the OCR transcription without any LLM call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrText {
    /// Raw transcription from the OCR engine.
    pub text: String,
    /// Width of the decoded input image in pixels.
    pub image_width: u32,
    /// Height of the decoded input image in pixels.
    pub image_height: u32,
    /// Otsu threshold selected for this image.
    pub threshold: u8,
    /// Wall-clock time for binarize + OCR.
    pub duration_ms: u64,
}

/// Typed view of the record the model is asked to produce.
///
/// Prices are integers counting cents (1.00 = 100), matching the prompt's
/// instruction. `quantity` is an `f64` because receipts sell by weight as
/// well as by count and models return both shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    /// Grand total in cents.
    pub total: i64,
    /// Business name as printed on the receipt.
    pub business: String,
    /// Line items in receipt order.
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// Purchase timestamp as printed, or empty when not visible.
    #[serde(default)]
    pub transaction_timestamp: String,
}

/// One purchased item on the receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub title: String,
    #[serde(default)]
    pub quantity: f64,
    /// Unit price in cents.
    pub price: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_output(json: &str) -> ScanOutput {
        ScanOutput {
            json: json.to_string(),
            raw_text: String::new(),
            reply: json.to_string(),
            stats: ScanStats::default(),
        }
    }

    #[test]
    fn record_parses_full_shape() {
        let out = sample_output(
            r#"{"total":500,"business":"Cafe","items":[{"title":"Espresso","quantity":2,"price":250}],"transaction_timestamp":"2024-01-01T10:00:00"}"#,
        );
        let record = out.record().expect("valid record");
        assert_eq!(record.total, 500);
        assert_eq!(record.business, "Cafe");
        assert_eq!(record.items.len(), 1);
        assert_eq!(record.items[0].price, 250);
        assert_eq!(record.transaction_timestamp, "2024-01-01T10:00:00");
    }

    #[test]
    fn record_tolerates_missing_optional_fields() {
        let out = sample_output(r#"{"total":1250,"business":"Corner Shop"}"#);
        let record = out.record().expect("items and timestamp default");
        assert!(record.items.is_empty());
        assert!(record.transaction_timestamp.is_empty());
    }

    #[test]
    fn record_rejects_malformed_json() {
        let out = sample_output("{not json");
        assert!(out.record().is_err());
    }

    #[test]
    fn fractional_quantity_parses() {
        let out = sample_output(
            r#"{"total":437,"business":"Deli","items":[{"title":"Ham","quantity":0.25,"price":437}]}"#,
        );
        let record = out.record().unwrap();
        assert!((record.items[0].quantity - 0.25).abs() < f64::EPSILON);
    }
}
