//! # receipt2json
//!
//! Convert photographs of store receipts into structured JSON records using
//! OCR and a hosted language model.
//!
//! ## Why this crate?
//!
//! Receipt photos are hostile to naive OCR: crumpled thermal paper, uneven
//! lighting, and low-contrast dot-matrix print produce transcriptions no
//! regex template can parse reliably. This crate binarizes the photo first
//! (per-image Otsu threshold, so exposure differences stop mattering), lets
//! tesseract transcribe the cleaned image, and then hands the messy raw text
//! to a language model that extracts the fields a receipt actually carries.
//!
//! ## Pipeline Overview
//!
//! ```text
//! receipt photo
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Binarize  grayscale + Otsu threshold (CPU-bound, spawn_blocking)
//!  ├─ 3. OCR       tesseract, default parameters, stdout capture
//!  ├─ 4. Parse     single-turn chat-completion with a fixed instruction
//!  └─ 5. Extract   first balanced JSON object in the reply → output file
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use receipt2json::{scan, ScanConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = ScanConfig::default();
//!     let output = scan("receipt.jpg", &config).await?;
//!     println!("{}", output.json);
//!     eprintln!("tokens: {} in / {} out",
//!         output.stats.input_tokens,
//!         output.stats.output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! The JSON the model is asked to produce has the shape:
//!
//! ```json
//! {"total": 1250, "business": "Corner Shop",
//!  "items": [{"title": "Milk", "quantity": 1, "price": 249}],
//!  "transaction_timestamp": "2024-01-01T10:00:00"}
//! ```
//!
//! with all prices as integer cents. The pipeline writes the model's object
//! verbatim and performs no schema validation; [`ScanOutput::record`] offers
//! an opt-in typed view.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `receipt2json` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! receipt2json = { version = "0.1", default-features = false }
//! ```
//!
//! ## Host requirements
//!
//! The `tesseract` binary must be installed and discoverable on PATH (or
//! named via [`ScanConfig::ocr_binary`]), and an API key for the model
//! provider must be present in the environment.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod scan;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ScanConfig, ScanConfigBuilder};
pub use error::ScanError;
pub use output::{LineItem, OcrText, ReceiptRecord, ScanOutput, ScanStats};
pub use pipeline::extract::extract_json_object;
pub use progress::{NoopProgressCallback, ProgressCallback, ScanProgressCallback, Stage};
pub use scan::{ocr_only, scan, scan_sync, scan_to_file};
