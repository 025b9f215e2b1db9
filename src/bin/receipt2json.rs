//! CLI binary for receipt2json.
//!
//! A thin shim over the library crate that maps CLI flags to `ScanConfig`
//! and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use receipt2json::{
    ocr_only, scan, scan_to_file, ScanConfig, ScanProgressCallback, Stage,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a single spinner that names the stage the
/// pipeline is currently in and logs a tick line as each stage completes.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Scanning");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ScanProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        let msg = match stage {
            Stage::Binarize => "binarizing image…",
            Stage::Ocr => "running OCR…",
            Stage::Parse => "asking the model…",
        };
        self.bar.set_message(msg);
    }

    fn on_stage_complete(&self, stage: Stage, duration_ms: u64) {
        self.bar.println(format!(
            "  {} {:<8}  {}",
            green("✓"),
            stage.label(),
            dim(&format!("{:.1}s", duration_ms as f64 / 1000.0)),
        ));
    }

    fn on_scan_complete(&self, success: bool) {
        self.bar.finish_and_clear();
        if !success {
            eprintln!("{} scan failed", red("✗"));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Default run: reads ./receipt.jpg, writes ./receipt.json
  receipt2json

  # Explicit paths
  receipt2json photos/IMG_2041.jpg -o parsed/receipt.json

  # Print to stdout instead of writing a file
  receipt2json receipt.jpg --stdout

  # Scan a receipt from a URL
  receipt2json https://example.com/receipt.jpg

  # Check what the OCR engine sees (no API key needed)
  receipt2json --ocr-only receipt.jpg

  # Use a specific model
  receipt2json --model gpt-4o --provider openai receipt.jpg

  # Non-English receipt
  receipt2json --ocr-lang deu kassenbon.jpg

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY              OpenAI API key (preferred when set)
  ANTHROPIC_API_KEY           Anthropic API key
  GEMINI_API_KEY              Google Gemini API key
  RECEIPT2JSON_LLM_PROVIDER   Override provider (openai, anthropic, gemini, ollama)
  RECEIPT2JSON_MODEL          Override model ID

SETUP:
  1. Install tesseract:  apt install tesseract-ocr  (or brew install tesseract)
  2. Set API key:        export OPENAI_API_KEY=sk-...
  3. Scan:               receipt2json receipt.jpg
"#;

/// Convert a receipt photo to a structured JSON record.
#[derive(Parser, Debug)]
#[command(
    name = "receipt2json",
    version,
    about = "Convert receipt photos to structured JSON using OCR and LLMs",
    long_about = "Convert a photograph of a store receipt (local file or URL) into a structured \
JSON record (total, business, line items, timestamp). The image is binarized with a per-image \
Otsu threshold, transcribed with tesseract, and parsed by a hosted language model.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Receipt image: local file path or HTTP/HTTPS URL.
    #[arg(default_value = "receipt.jpg")]
    input: String,

    /// Write the extracted JSON to this file.
    #[arg(short, long, env = "RECEIPT2JSON_OUTPUT", default_value = "receipt.json")]
    output: PathBuf,

    /// Print the extracted JSON to stdout instead of writing a file.
    #[arg(long)]
    stdout: bool,

    /// LLM model ID (e.g. gpt-4o, claude-sonnet-4-20250514).
    #[arg(long, env = "RECEIPT2JSON_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama.
    /// Auto-detected from API key env vars if not set.
    #[arg(long, env = "RECEIPT2JSON_PROVIDER")]
    provider: Option<String>,

    /// OCR engine executable.
    #[arg(long, env = "RECEIPT2JSON_OCR_BINARY", default_value = "tesseract")]
    ocr_binary: String,

    /// Language hint for the OCR engine (tesseract -l code, e.g. deu, fra).
    #[arg(long, env = "RECEIPT2JSON_OCR_LANG")]
    ocr_lang: Option<String>,

    /// Path to a text file containing a custom instruction template.
    #[arg(long, env = "RECEIPT2JSON_PROMPT")]
    prompt_file: Option<PathBuf>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "RECEIPT2JSON_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "RECEIPT2JSON_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// Retries on LLM failure.
    #[arg(long, env = "RECEIPT2JSON_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-LLM-attempt timeout in seconds.
    #[arg(long, env = "RECEIPT2JSON_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds (URL inputs).
    #[arg(long, env = "RECEIPT2JSON_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Run binarize + OCR only and print the raw text. No API key needed.
    #[arg(long)]
    ocr_only: bool,

    /// Output the full scan result (JSON, raw text, stats) as pretty JSON.
    #[arg(long, env = "RECEIPT2JSON_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "RECEIPT2JSON_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RECEIPT2JSON_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "RECEIPT2JSON_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli, show_progress).await?;

    // ── OCR-only mode ────────────────────────────────────────────────────
    if cli.ocr_only {
        let ocr = ocr_only(&cli.input, &config)
            .await
            .context("OCR failed")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&ocr).context("Failed to serialize OCR result")?
            );
        } else {
            println!("{}", ocr.text);
            if !cli.quiet {
                eprintln!(
                    "{}",
                    dim(&format!(
                        "{}x{} px, threshold {}, {}ms",
                        ocr.image_width, ocr.image_height, ocr.threshold, ocr.duration_ms
                    ))
                );
            }
        }
        return Ok(());
    }

    // ── Full scan ────────────────────────────────────────────────────────
    if cli.stdout || cli.json {
        let output = scan(&cli.input, &config).await.context("Scan failed")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&output).context("Failed to serialize output")?
            );
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(output.json.as_bytes())
                .context("Failed to write to stdout")?;
            if !output.json.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }

        if !cli.quiet && !cli.json {
            eprintln!(
                "   {} tokens in  /  {} tokens out  —  {}ms total",
                dim(&output.stats.input_tokens.to_string()),
                dim(&output.stats.output_tokens.to_string()),
                output.stats.total_duration_ms,
            );
        }
    } else {
        let stats = scan_to_file(&cli.input, &cli.output, &config)
            .await
            .context("Scan failed")?;

        if !cli.quiet {
            eprintln!(
                "{}  {}ms  →  {}",
                green("✔"),
                stats.total_duration_ms,
                bold(&cli.output.display().to_string()),
            );
            eprintln!(
                "   {} tokens in  /  {} tokens out",
                dim(&stats.input_tokens.to_string()),
                dim(&stats.output_tokens.to_string()),
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ScanConfig`.
async fn build_config(cli: &Cli, show_progress: bool) -> Result<ScanConfig> {
    let prompt_template = if let Some(ref path) = cli.prompt_file {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read prompt template from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ScanConfig::builder()
        .ocr_binary(cli.ocr_binary.as_str())
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.as_str());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.as_str());
    }
    if let Some(ref lang) = cli.ocr_lang {
        builder = builder.ocr_language(lang.as_str());
    }
    if let Some(template) = prompt_template {
        builder = builder.prompt_template(template);
    }
    if show_progress && !cli.ocr_only {
        builder = builder.progress_callback(CliProgressCallback::new());
    }

    builder.build().context("Invalid configuration")
}
