//! Error types for the receipt2json library.
//!
//! Every external call the pipeline makes — image decode, OCR engine spawn,
//! LLM request, output write — is converted into an explicit [`ScanError`]
//! variant rather than propagating as an unhandled fault. The variants are
//! grouped by pipeline stage so callers can decide per-stage whether to
//! abort, report, or surface a hint to the user.
//!
//! Notably, "no JSON object in the model's reply" is a *loud* error here
//! ([`ScanError::NoJsonObject`]): callers can always distinguish "a JSON
//! object was written" from "extraction found nothing", instead of receiving
//! a silently mis-sliced output file.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the receipt2json library.
#[derive(Debug, Error)]
pub enum ScanError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Receipt image not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but its magic bytes match no supported
    /// raster format.
    #[error("File is not a supported image: '{path}'\nFirst bytes: {magic:?}\nSupported: JPEG, PNG, GIF, BMP, WebP, TIFF.")]
    NotAnImage { path: PathBuf, magic: [u8; 4] },

    // ── Binarizer errors ──────────────────────────────────────────────────
    /// The decoding library rejected the file contents.
    #[error("Failed to decode image '{path}': {detail}")]
    DecodeFailed { path: PathBuf, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine binary could not be spawned at all.
    #[error(
        "OCR engine '{binary}' could not be started: {detail}\n\
         Install tesseract and make sure it is on PATH, or point --ocr-binary at it."
    )]
    OcrEngineNotFound { binary: String, detail: String },

    /// The OCR engine ran but exited with a non-zero status.
    #[error("OCR engine exited with {status}: {stderr}")]
    OcrFailed { status: String, stderr: String },

    /// The OCR engine produced bytes that are not valid UTF-8.
    #[error("OCR engine produced non-UTF-8 output: {detail}")]
    OcrOutputNotUtf8 { detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM call failed after all retries were exhausted.
    #[error("LLM request failed after {retries} retries: {detail}")]
    LlmFailed { retries: u32, detail: String },

    /// A single LLM attempt exceeded the configured timeout.
    #[error("LLM request timed out after {secs}s\nIncrease --api-timeout for slow models.")]
    ApiTimeout { secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The model's reply contains no JSON object at all.
    #[error("No JSON object found in the model reply.\nReply started with: {reply_preview:?}")]
    NoJsonObject { reply_preview: String },

    /// An object opened in the reply but never closed.
    #[error("JSON object in the model reply is unbalanced (opened at byte {open_offset}, never closed)")]
    UnbalancedJson { open_offset: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
