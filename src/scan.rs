//! Pipeline entry points.
//!
//! The pipeline is fully sequential: each stage blocks until its predecessor
//! completes, and nothing is shared across stages except the provider
//! handle. The only operation with externally-variable latency is the LLM
//! request, which carries its own timeout and retry budget inside
//! [`crate::pipeline::llm`].

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::output::{OcrText, ScanOutput, ScanStats};
use crate::pipeline::{binarize, extract, input, llm, ocr};
use crate::progress::Stage;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Model used when neither config nor environment names one.
const DEFAULT_MODEL: &str = "gpt-4o";

/// Scan a receipt image (local path or URL) into a structured JSON record.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input` — Local file path or HTTP/HTTPS URL to a receipt photo
/// * `config` — Scan configuration
///
/// # Errors
/// Any stage failure aborts the run: unreadable input, OCR engine missing
/// or crashing, the LLM request failing after retries, or the reply
/// containing no JSON object. Empty OCR text is *not* an error — the prompt
/// is sent regardless and the model decides what it can recover.
pub async fn scan(input: impl AsRef<str>, config: &ScanConfig) -> Result<ScanOutput, ScanError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_scan_start();
    }
    let result = scan_inner(input.as_ref(), config).await;
    if let Some(ref cb) = config.progress_callback {
        cb.on_scan_complete(result.is_ok());
    }
    result
}

async fn scan_inner(input_str: &str, config: &ScanConfig) -> Result<ScanOutput, ScanError> {
    let total_start = Instant::now();
    info!("Starting scan: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;

    // ── Step 2: Resolve provider ─────────────────────────────────────────
    // Done before any pixel work so a missing API key fails fast.
    let provider = resolve_provider(config)?;

    // ── Step 3: Binarize ─────────────────────────────────────────────────
    stage_start(config, Stage::Binarize);
    let binarize_start = Instant::now();
    let binary = binarize::binarize(resolved.path()).await?;
    let binarize_duration_ms = binarize_start.elapsed().as_millis() as u64;
    stage_complete(config, Stage::Binarize, binarize_duration_ms);
    info!(
        "Binarized {}x{} px at threshold {} in {}ms",
        binary.width(),
        binary.height(),
        binary.threshold,
        binarize_duration_ms
    );

    // ── Step 4: OCR ──────────────────────────────────────────────────────
    stage_start(config, Stage::Ocr);
    let ocr_start = Instant::now();
    let raw_text = ocr::extract_text(&binary, config).await?;
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
    stage_complete(config, Stage::Ocr, ocr_duration_ms);
    info!(
        "OCR produced {} chars in {}ms",
        raw_text.chars().count(),
        ocr_duration_ms
    );

    // ── Step 5: LLM parse + extraction ───────────────────────────────────
    stage_start(config, Stage::Parse);
    let llm_start = Instant::now();
    let reply = llm::parse_receipt(&provider, &raw_text, config).await?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;
    let json = extract::extract_json_object(&reply.content)?.to_string();
    stage_complete(config, Stage::Parse, llm_duration_ms);
    debug!("Extracted {} bytes of JSON", json.len());

    let stats = ScanStats {
        image_width: binary.width(),
        image_height: binary.height(),
        threshold: binary.threshold,
        raw_text_chars: raw_text.chars().count(),
        input_tokens: reply.prompt_tokens,
        output_tokens: reply.completion_tokens,
        retries: reply.retries,
        binarize_duration_ms,
        ocr_duration_ms,
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!("Scan complete in {}ms", stats.total_duration_ms);

    Ok(ScanOutput {
        json,
        raw_text,
        reply: reply.content,
        stats,
    })
}

/// Scan a receipt and write the extracted JSON directly to a file.
///
/// The extracted substring is written **verbatim** — not re-serialized, not
/// pretty-printed. Uses atomic write (temp file + rename) so a failure never
/// leaves a partial output file behind.
pub async fn scan_to_file(
    input: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ScanConfig,
) -> Result<ScanStats, ScanError> {
    let output = scan(input, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ScanError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &output.json)
        .await
        .map_err(|e| ScanError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ScanError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    info!("Wrote {} bytes to {}", output.json.len(), path.display());
    Ok(output.stats)
}

/// Synchronous wrapper around [`scan`].
///
/// Creates a temporary tokio runtime internally.
pub fn scan_sync(
    input: impl AsRef<str>,
    config: &ScanConfig,
) -> Result<ScanOutput, ScanError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ScanError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(scan(input, config))
}

/// Binarize and OCR a receipt image without calling any LLM.
///
/// Does not require an API key; useful for checking what the OCR engine can
/// read before spending a model call on it.
pub async fn ocr_only(
    input: impl AsRef<str>,
    config: &ScanConfig,
) -> Result<OcrText, ScanError> {
    let start = Instant::now();
    let resolved = input::resolve_input(input.as_ref(), config.download_timeout_secs).await?;
    let binary = binarize::binarize(resolved.path()).await?;
    let text = ocr::extract_text(&binary, config).await?;

    Ok(OcrText {
        image_width: binary.width(),
        image_height: binary.height(),
        threshold: binary.threshold,
        duration_ms: start.elapsed().as_millis() as u64,
        text,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn stage_start(config: &ScanConfig, stage: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

fn stage_complete(config: &ScanConfig, stage: Stage, duration_ms: u64) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, duration_ms);
    }
}

/// Instantiate a named provider with the given model.
fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ScanError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ScanError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// The fallback chain lets library users and CLI users each set exactly as
/// much as they need:
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed
///    the provider entirely; used as-is. This is also the test seam: a mock
///    provider goes here.
///
/// 2. **Named provider + model** (`config.provider_name`) — reads the
///    corresponding API key (`OPENAI_API_KEY`, etc.) from the environment.
///
/// 3. **Environment pair** (`RECEIPT2JSON_LLM_PROVIDER` +
///    `RECEIPT2JSON_MODEL`) — provider and model chosen at the execution
///    environment level (shell profile, CI). Checked before auto-detection
///    so the choice is honoured even when multiple API keys are present.
///
/// 4. **Auto-detection** — OpenAI preferred when `OPENAI_API_KEY` is set
///    (the original service ran against it), otherwise
///    `ProviderFactory::from_env` scans all known key variables.
///
/// The credential itself never passes through this crate: the factory reads
/// it from the environment and it lives inside the provider handle.
fn resolve_provider(config: &ScanConfig) -> Result<Arc<dyn LLMProvider>, ScanError> {
    // 1) User-provided provider takes priority
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    // 2) Provider name + model
    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    // 3) Environment pair
    if let (Ok(prov), Ok(model)) = (
        std::env::var("RECEIPT2JSON_LLM_PROVIDER"),
        std::env::var("RECEIPT2JSON_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    // 4) Prefer OpenAI when its key is present, else full auto-detection
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ScanError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
