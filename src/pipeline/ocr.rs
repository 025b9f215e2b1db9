//! Text extraction: run the OCR engine over the binarized image.
//!
//! The tesseract binary reads from disk, so the two-tone image is written as
//! a PNG into a `TempDir` that is cleaned up when this function returns. The
//! engine is invoked with default parameters — no layout hints, no
//! confidence filtering — with at most a language hint when the caller
//! configured one.
//!
//! Empty output is a valid result: a blank or unreadable receipt transcribes
//! to an empty string, and the decision about what to do with it belongs to
//! the parsing stage, not here.

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::pipeline::binarize::BinarizedImage;
use std::io::Cursor;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

/// Run the OCR engine over a binarized image and return its transcription.
pub async fn extract_text(
    binary: &BinarizedImage,
    config: &ScanConfig,
) -> Result<String, ScanError> {
    let temp_dir =
        tempfile::TempDir::new().map_err(|e| ScanError::Internal(e.to_string()))?;
    let image_path = temp_dir.path().join("binarized.png");

    // Encode in memory, write through tokio::fs — the image is two-tone and
    // compresses to a few kilobytes.
    let mut buf = Vec::new();
    binary
        .image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| ScanError::Internal(format!("PNG encode failed: {}", e)))?;
    tokio::fs::write(&image_path, &buf)
        .await
        .map_err(|e| ScanError::Internal(format!("Failed to write temp image: {}", e)))?;

    run_engine(&config.ocr_binary, &image_path, config.ocr_language.as_deref()).await
}

/// Build the engine's argument list: `<input> stdout [-l <lang>]`.
fn ocr_args(image_path: &Path, language: Option<&str>) -> Vec<String> {
    let mut args = vec![
        image_path.to_string_lossy().into_owned(),
        "stdout".to_string(),
    ];
    if let Some(lang) = language {
        args.push("-l".to_string());
        args.push(lang.to_string());
    }
    args
}

/// Spawn the OCR binary and capture its stdout.
async fn run_engine(
    binary: &str,
    image_path: &Path,
    language: Option<&str>,
) -> Result<String, ScanError> {
    let args = ocr_args(image_path, language);
    debug!("Running OCR engine: {} {:?}", binary, args);

    let output = Command::new(binary)
        .args(&args)
        .output()
        .await
        .map_err(|e| ScanError::OcrEngineNotFound {
            binary: binary.to_string(),
            detail: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(ScanError::OcrFailed {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let text = String::from_utf8(output.stdout)
        .map_err(|e| ScanError::OcrOutputNotUtf8 {
            detail: e.to_string(),
        })?
        .trim()
        .to_string();

    if text.is_empty() {
        warn!("OCR engine found no recognizable text");
    } else {
        debug!("OCR produced {} chars", text.chars().count());
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn args_default_configuration() {
        let args = ocr_args(Path::new("/tmp/binarized.png"), None);
        assert_eq!(args, vec!["/tmp/binarized.png", "stdout"]);
    }

    #[test]
    fn args_with_language_hint() {
        let args = ocr_args(Path::new("/tmp/binarized.png"), Some("deu"));
        assert_eq!(args, vec!["/tmp/binarized.png", "stdout", "-l", "deu"]);
    }

    #[tokio::test]
    async fn missing_engine_is_explicit_error() {
        let result = run_engine(
            "definitely-not-a-real-ocr-engine",
            &PathBuf::from("/tmp/nothing.png"),
            None,
        )
        .await;
        match result {
            Err(ScanError::OcrEngineNotFound { binary, .. }) => {
                assert_eq!(binary, "definitely-not-a-real-ocr-engine");
            }
            other => panic!("expected OcrEngineNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn engine_stdout_is_captured_and_trimmed() {
        // Stand-in engine: `echo` prints its arguments, which is enough to
        // exercise the capture and trim path without tesseract installed.
        let text = run_engine("echo", &PathBuf::from("TOTAL 12.50"), None)
            .await
            .expect("echo should run everywhere");
        assert_eq!(text, "TOTAL 12.50 stdout");
    }

    #[tokio::test]
    async fn nonzero_exit_is_ocr_failure() {
        let result = run_engine("false", &PathBuf::from("x.png"), None).await;
        assert!(matches!(result, Err(ScanError::OcrFailed { .. })));
    }
}
