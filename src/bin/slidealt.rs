//! CLI binary for slidealt.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `AnnotationConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use slidealt::{
    annotate_bytes, inspect, AnnotationConfig, AnnotationProgressCallback, FailurePolicy,
    ProgressCallback,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live per-slide progress bar plus one log
/// line per picture. Picture events within a slide may arrive out of order
/// (concurrent captioning); the bar only advances on slide completion, so it
/// is always an honest fraction.
struct CliProgressCallback {
    bar: ProgressBar,
    fixed: AtomicUsize,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set by `on_run_start`
    /// (called after the deck has been parsed and the credential verified).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_run_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening deck…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            fixed: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} slides  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Annotating");
        self.bar.reset_eta();
    }
}

impl AnnotationProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_slides: usize) {
        self.activate_bar(total_slides);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Annotating {total_slides} slides…"))
        ));
    }

    fn on_picture_complete(&self, slide_num: usize, total: usize, alt_len: usize) {
        self.fixed.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Slide {:>3}/{:<3}  {}",
            green("✓"),
            slide_num,
            total,
            dim(&format!("{alt_len:>4} chars")),
        ));
    }

    fn on_picture_error(&self, slide_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            let cut = error
                .char_indices()
                .take_while(|(i, _)| *i < 79)
                .last()
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            format!("{}\u{2026}", &error[..cut])
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Slide {:>3}/{:<3}  {}",
            red("✗"),
            slide_num,
            total,
            red(&msg),
        ));
    }

    fn on_slide_complete(&self, _slide_num: usize, _total: usize) {
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _total_slides: usize, fixed: usize, failed: usize) {
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pictures annotated successfully",
                green("✔"),
                bold(&fixed.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pictures annotated  ({} failed)",
                if fixed == 0 { red("✘") } else { cyan("⚠") },
                bold(&fixed.to_string()),
                fixed + failed,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Annotate a deck (writes Fixed_deck.pptx next to the input)
  slidealt deck.pptx

  # Choose the output path
  slidealt deck.pptx -o accessible/deck.pptx

  # Use a specific model or endpoint
  slidealt --model gpt-4o deck.pptx
  slidealt --api-base http://localhost:8000/v1 deck.pptx

  # Make failures visible inside the deck instead of skipping them
  slidealt --embed-errors deck.pptx

  # Count slides and pictures, no API key needed
  slidealt --inspect-only deck.pptx

  # Machine-readable run report on stdout
  slidealt --json deck.pptx > report.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY       API key for the captioning endpoint
  SLIDEALT_MODEL       Override the vision model ID
  SLIDEALT_API_BASE    Override the API base URL

SETUP:
  1. Set API key:   export OPENAI_API_KEY=sk-...
  2. Annotate:      slidealt deck.pptx

Any OpenAI-compatible endpoint with a vision model works (vLLM, LiteLLM,
Ollama) via --api-base.
"#;

/// Add accessibility alt text to PowerPoint decks using vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "slidealt",
    version,
    about = "Add accessibility alt text to PowerPoint decks using vision LLMs",
    long_about = "Scan a .pptx for embedded images, generate a concise description for each via a \
vision language model, and write the result into the picture's accessibility attributes. \
Works with OpenAI and any OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local .pptx file path.
    input: PathBuf,

    /// Output path. Default: Fixed_<input filename> in the input's directory.
    #[arg(short, long, env = "SLIDEALT_OUTPUT")]
    output: Option<PathBuf>,

    /// Vision model ID.
    #[arg(long, env = "SLIDEALT_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// API key (falls back to OPENAI_API_KEY).
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API.
    #[arg(long, env = "SLIDEALT_API_BASE")]
    api_base: Option<String>,

    /// Custom captioning instruction (replaces the built-in prompt).
    #[arg(long, env = "SLIDEALT_PROMPT")]
    prompt: Option<String>,

    /// Max output tokens per caption.
    #[arg(long, env = "SLIDEALT_MAX_TOKENS", default_value_t = 100)]
    max_tokens: u32,

    /// Number of concurrent caption calls within one slide.
    #[arg(short, long, env = "SLIDEALT_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Largest image dimension sent to the API, in pixels.
    #[arg(long, env = "SLIDEALT_MAX_IMAGE_DIM", default_value_t = 1024)]
    max_image_dim: u32,

    /// Write the failure text into the deck when a caption fails,
    /// instead of leaving the existing description untouched.
    #[arg(long, env = "SLIDEALT_EMBED_ERRORS")]
    embed_errors: bool,

    /// Per-caption-call API timeout in seconds.
    #[arg(long, env = "SLIDEALT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Output a structured JSON run report on stdout.
    #[arg(long, env = "SLIDEALT_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "SLIDEALT_NO_PROGRESS")]
    no_progress: bool,

    /// Print deck statistics only, no captioning.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SLIDEALT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SLIDEALT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
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

    let bytes = tokio::fs::read(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let summary = inspect(&bytes).context("Failed to inspect deck")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
            );
        } else {
            println!("File:              {}", cli.input.display());
            println!("Slides:            {}", summary.slide_count);
            println!("Pictures:          {}", summary.picture_count);
            println!("Missing alt text:  {}", summary.pictures_missing_alt);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn AnnotationProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run annotation ───────────────────────────────────────────────────
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    let output = annotate_bytes(&bytes, &config)
        .await
        .context("Annotation failed")?;

    // Atomic write: temp file next to the target, then rename.
    let tmp_path = output_path.with_extension("pptx.tmp");
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    tokio::fs::write(&tmp_path, &output.pptx)
        .await
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    tokio::fs::rename(&tmp_path, &output_path)
        .await
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    if cli.json {
        let report = serde_json::json!({
            "output": output_path,
            "stats": output.stats,
            "pictures": output.pictures,
        });
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(json.as_bytes())
            .and_then(|_| handle.write_all(b"\n"))
            .context("Failed to write to stdout")?;
    }

    // Summary line (the callback already printed the per-picture log).
    if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {} fixed / {} failed  {}ms  →  {}",
            if stats.pictures_failed == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.pictures_fixed,
            stats.pictures_failed,
            stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
    }

    // The progress callback already logged each failure; without it, list
    // them here so a partial success is never silent.
    if output.stats.pictures_failed > 0 && !show_progress && !cli.quiet {
        for p in &output.pictures {
            if let Some(ref e) = p.error {
                eprintln!("   {} {}", red("✗"), e);
            }
        }
    }

    Ok(())
}

/// Map CLI args to `AnnotationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnnotationConfig> {
    let mut builder = AnnotationConfig::builder()
        .model(&cli.model)
        .max_tokens(cli.max_tokens)
        .concurrency(cli.concurrency)
        .max_image_dim(cli.max_image_dim)
        .api_timeout_secs(cli.api_timeout)
        .failure_policy(if cli.embed_errors {
            FailurePolicy::Embed
        } else {
            FailurePolicy::Skip
        });

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref base) = cli.api_base {
        builder = builder.api_base(base);
    }
    if let Some(ref prompt) = cli.prompt {
        builder = builder.prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `deck.pptx` → `Fixed_deck.pptx`, in the same directory.
fn default_output_path(input: &Path) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "deck.pptx".to_string());
    input.with_file_name(format!("Fixed_{file_name}"))
}
