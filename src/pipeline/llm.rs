//! LLM interaction: build the parsing prompt and call the provider.
//!
//! This module converts raw OCR text into a chat-completion call and returns
//! the model's reply. It is intentionally thin — the instruction template
//! lives in [`crate::prompts`] so it can be changed without touching retry
//! or error-handling logic here.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient. Exponential backoff
//! (`retry_backoff_ms * 2^attempt`) gives the endpoint room to recover: with
//! 500 ms base and 3 retries the wait sequence is 500 ms → 1 s → 2 s. Each
//! attempt is additionally bounded by `api_timeout_secs`, because a stalled
//! connection on the single network call of this pipeline would otherwise
//! hang the whole run.

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::prompts::{build_prompt, DEFAULT_PROMPT_TEMPLATE};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// The model's reply plus usage accounting.
pub struct LlmReply {
    /// Free-form reply text. Expected, but not guaranteed, to contain one
    /// JSON object.
    pub content: String,
    /// Tokens consumed by the prompt.
    pub prompt_tokens: usize,
    /// Tokens generated in the reply.
    pub completion_tokens: usize,
    /// Attempts beyond the first that were needed.
    pub retries: u32,
}

/// Submit the raw OCR text to the model as a single-turn request.
///
/// The request contains exactly one user message: the instruction template
/// (built-in or caller override) with the raw text appended. No system
/// message, no history — one turn in, one reply out.
pub async fn parse_receipt(
    provider: &Arc<dyn LLMProvider>,
    raw_text: &str,
    config: &ScanConfig,
) -> Result<LlmReply, ScanError> {
    let template = config
        .prompt_template
        .as_deref()
        .unwrap_or(DEFAULT_PROMPT_TEMPLATE);
    let prompt = build_prompt(template, raw_text);

    let messages = vec![ChatMessage::user(prompt)];
    let options = build_options(config);
    let attempt_budget = Duration::from_secs(config.api_timeout_secs);

    let mut last_err: Option<String> = None;
    let mut last_was_timeout = false;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "LLM retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let start = Instant::now();
        match timeout(attempt_budget, provider.chat(&messages, Some(&options))).await {
            Ok(Ok(response)) => {
                debug!(
                    "LLM reply: {} input tokens, {} output tokens, {:?}",
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                return Ok(LlmReply {
                    content: response.content,
                    prompt_tokens: response.prompt_tokens as usize,
                    completion_tokens: response.completion_tokens as usize,
                    retries: attempt,
                });
            }
            Ok(Err(e)) => {
                let err_msg = format!("{}", e);
                warn!("LLM attempt {} failed — {}", attempt + 1, err_msg);
                last_err = Some(err_msg);
                last_was_timeout = false;
            }
            Err(_elapsed) => {
                warn!(
                    "LLM attempt {} timed out after {}s",
                    attempt + 1,
                    config.api_timeout_secs
                );
                last_err = Some(format!("timed out after {}s", config.api_timeout_secs));
                last_was_timeout = true;
            }
        }
    }

    if last_was_timeout {
        return Err(ScanError::ApiTimeout {
            secs: config.api_timeout_secs,
        });
    }

    Err(ScanError::LlmFailed {
        retries: config.max_retries,
        detail: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Build `CompletionOptions` from the scan config.
fn build_options(config: &ScanConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
