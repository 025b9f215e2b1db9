//! Progress-callback trait for per-stage scan events.
//!
//! Inject an [`Arc<dyn ScanProgressCallback>`] via
//! [`crate::config::ScanConfigBuilder::progress_callback`] to receive events
//! as the pipeline moves through its stages. The callback approach is the
//! least-invasive integration point: callers can forward events to a
//! terminal spinner, a log, or a UI without the library knowing anything
//! about how the host application communicates.
//!
//! The pipeline is sequential, so events for a single scan always arrive in
//! order; the trait is still `Send + Sync` so one callback can serve scans
//! running on different tasks.

use std::sync::Arc;

/// The three transformation stages of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Decode + grayscale + Otsu threshold.
    Binarize,
    /// OCR engine transcription.
    Ocr,
    /// LLM request + JSON extraction.
    Parse,
}

impl Stage {
    /// Human-readable stage label for progress displays.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Binarize => "binarize",
            Stage::Ocr => "ocr",
            Stage::Parse => "parse",
        }
    }
}

/// Called by the scan pipeline as it enters and leaves each stage.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ScanProgressCallback: Send + Sync {
    /// Called once before the first stage runs.
    fn on_scan_start(&self) {}

    /// Called just before a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    ///
    /// # Arguments
    /// * `stage`       — the stage that completed
    /// * `duration_ms` — wall-clock time the stage took
    fn on_stage_complete(&self, stage: Stage, duration_ms: u64) {
        let _ = (stage, duration_ms);
    }

    /// Called once after the pipeline finishes, whether or not it succeeded.
    fn on_scan_complete(&self, success: bool) {
        let _ = success;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ScanProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ScanConfig`].
pub type ProgressCallback = Arc<dyn ScanProgressCallback>;
