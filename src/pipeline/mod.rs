//! Pipeline stages for receipt-to-JSON conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different OCR engine) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ binarize ──▶ ocr ──▶ llm ──▶ extract
//! (URL/path)  (Otsu)   (tesseract) (chat)  (JSON object)
//! ```
//!
//! 1. [`input`]    — canonicalise the user-supplied path or URL to a local file
//! 2. [`binarize`] — grayscale + Otsu threshold; runs in `spawn_blocking`
//!    because decoding and thresholding are CPU-bound
//! 3. [`ocr`]      — hand the two-tone image to the tesseract binary and
//!    capture its transcription
//! 4. [`llm`]      — drive the chat-completion call with retry/backoff; the
//!    only stage with network I/O
//! 5. [`extract`]  — find the first complete, balanced JSON object in the
//!    model's reply

pub mod binarize;
pub mod extract;
pub mod input;
pub mod llm;
pub mod ocr;
