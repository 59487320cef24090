//! CLI binary for edgequake-pdfdigest.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, drives a `Session` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdfdigest::pipeline::extract::Extractor;
use edgequake_pdfdigest::pipeline::input::{default_output_path, load_input};
use edgequake_pdfdigest::pipeline::pdfium::PdfiumBackend;
use edgequake_pdfdigest::{
    translate_stream, ActionKind, PipelineConfig, PipelineProgressCallback, ProcessingResult,
    ProgressCallback, Session, SummaryModel, TargetLanguage,
};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the PDF is parsed or a model
/// loads, then a chunk bar once the action knows its chunk count.
struct CliProgressCallback {
    bar: ProgressBar,
    chunk_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading input…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            chunk_started: Mutex::new(None),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, action: ActionKind, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} chunks  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(progress_style);
        self.bar.set_prefix(match action {
            ActionKind::Translate => "Translating",
            ActionKind::Summarize => "Summarizing",
        });
        self.bar.reset_eta();
    }

    fn chunk_elapsed(&self) -> f64 {
        self.chunk_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, byte_len: usize) {
        self.bar.set_prefix("Extracting");
        self.bar.set_message(format!("{} KiB", byte_len / 1024));
    }

    fn on_extraction_complete(&self, char_count: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("{char_count} characters extracted"))
        ));
    }

    fn on_model_loading(&self, model: &str) {
        self.bar.set_prefix("Loading");
        self.bar.set_message(format!("model {model}…"));
    }

    fn on_action_start(&self, action: ActionKind, total_chunks: usize) {
        self.activate_bar(action, total_chunks);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Starting {action} of {total_chunks} chunks…"))
        ));
    }

    fn on_chunk_start(&self, chunk: usize, _total: usize) {
        if let Ok(mut t) = self.chunk_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("chunk {chunk}"));
    }

    fn on_chunk_complete(&self, chunk: usize, total: usize, output_len: usize) {
        let secs = self.chunk_elapsed();
        self.bar.println(format!(
            "  {} Chunk {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            chunk,
            total,
            dim(&format!("{output_len:>5} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_chunk_error(&self, chunk: usize, total: usize, error: &str) {
        let secs = self.chunk_elapsed();
        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Chunk {:>3}/{:<3}  {}  {}",
            red("✗"),
            chunk,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_action_complete(&self, action: ActionKind, total_chunks: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} complete  ({} chunks)",
            green("✔"),
            bold(&action.to_string()),
            total_chunks
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Show how much text a PDF holds (no API key needed)
  pdfdigest extract paper.pdf

  # Print the extracted text
  pdfdigest extract --show-text paper.pdf

  # Translate into Portuguese (default) and print to stdout
  pdfdigest translate paper.pdf

  # Translate into German and write next to the input (paper.de.txt)
  pdfdigest translate --lang de --save paper.pdf

  # Print translated chunks as they arrive
  pdfdigest translate --lang en --stream https://arxiv.org/pdf/1706.03762

  # Summarize with the high-quality preset
  pdfdigest summarize --model quality paper.pdf -o summary.txt

SUMMARY PRESETS:
  fast          gpt-4.1-nano (default)
  quality       gpt-4.1
  multilingual  gpt-4.1-mini
  Any other value is passed to the provider as a model id.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override translation model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)

SETUP:
  1. Install pdfium (https://github.com/bblanchon/pdfium-binaries) and
     set PDFIUM_LIB_PATH, or place libpdfium next to the binary.
  2. Set an API key:  export OPENAI_API_KEY=sk-...
  3. Run:             pdfdigest translate document.pdf
"#;

/// Extract, translate and summarize the text of PDF files.
#[derive(Parser, Debug)]
#[command(
    name = "pdfdigest",
    version,
    about = "Extract, translate and summarize the text of PDF files",
    long_about = "Extract the text layer of a PDF (local file or URL), then translate it into \
one of five languages or summarize it with an LLM. Supports OpenAI, Anthropic, Google Gemini \
and any provider known to edgequake-llm.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Model ID used for translation.
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    translation_model: Option<String>,

    /// Per-chunk LLM call timeout in seconds.
    #[arg(long, global = true, env = "PDFDIGEST_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, global = true, env = "PDFDIGEST_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, global = true, env = "PDFDIGEST_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFDIGEST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "PDFDIGEST_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the text of a PDF and report its size.
    Extract {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Print the full extracted text.
        #[arg(long)]
        show_text: bool,

        /// Output JSON (name, pages, characters, text) instead of plain text.
        #[arg(long, env = "PDFDIGEST_JSON")]
        json: bool,
    },

    /// Translate the text of a PDF.
    Translate {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Target language: pt, en, es, fr, de (or its name).
        #[arg(short, long, env = "PDFDIGEST_LANG", default_value = "pt")]
        lang: String,

        /// Print chunks as they are translated.
        #[arg(long, conflicts_with = "json")]
        stream: bool,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Summarize the text of a PDF.
    Summarize {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Preset (fast, quality, multilingual) or a provider model ID.
        #[arg(short, long, env = "PDFDIGEST_SUMMARY_MODEL")]
        model: Option<String>,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// List supported target languages.
    Languages,

    /// List summary model presets.
    Models,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Write the result to this file instead of stdout.
    #[arg(short, long, env = "PDFDIGEST_OUTPUT")]
    output: Option<PathBuf>,

    /// Write the result next to the input as `<name>.<lang|summary>.txt`.
    #[arg(long, conflicts_with = "output")]
    save: bool,

    /// Output the result as JSON (action, text, stats).
    #[arg(long, env = "PDFDIGEST_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let g = &cli.global;

    let json = matches!(
        cli.command,
        Command::Extract { json: true, .. }
            | Command::Translate { out: OutputArgs { json: true, .. }, .. }
            | Command::Summarize { out: OutputArgs { json: true, .. }, .. }
    );

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !g.quiet && !g.no_progress && !json;
    let filter = if g.verbose {
        "debug"
    } else if g.quiet || show_progress {
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

    match &cli.command {
        Command::Languages => {
            for lang in TargetLanguage::ALL {
                println!("{:<4} {}", lang.code(), lang.name());
            }
            Ok(())
        }
        Command::Models => {
            for preset in SummaryModel::ALL {
                println!(
                    "{:<14} {:<14} {}",
                    preset.name(),
                    preset.model_id(),
                    dim(preset.description())
                );
            }
            Ok(())
        }
        Command::Extract {
            input,
            show_text,
            json,
        } => run_extract(g, input, *show_text, *json, show_progress).await,
        Command::Translate {
            input,
            lang,
            stream,
            out,
        } => {
            let language: TargetLanguage = lang.parse()?;
            let progress = show_progress.then(CliProgressCallback::new);
            let config = build_config(g, progress.clone())?;
            let mut session = open_session(config, g, input, progress.as_deref()).await?;

            if *stream {
                let streamed = run_translate_stream(&session, language, out, input).await;
                finish(progress.as_deref());
                return streamed;
            }
            let started = Instant::now();
            let result = session.translate(language).await;
            finish(progress.as_deref());
            let result = result.context("Translation failed")?;
            emit(result, out, input, language.code(), g.quiet, started)
        }
        Command::Summarize { input, model, out } => {
            let progress = show_progress.then(CliProgressCallback::new);
            let config = build_config(g, progress.clone())?;
            let mut session = open_session(config, g, input, progress.as_deref()).await?;

            let started = Instant::now();
            let result = session.summarize(model.as_deref()).await;
            finish(progress.as_deref());
            let result = result.context("Summarization failed")?;
            emit(result, out, input, "summary", g.quiet, started)
        }
    }
}

/// `extract`: no LLM provider is needed, so the extractor is used directly.
async fn run_extract(
    g: &GlobalArgs,
    input: &str,
    show_text: bool,
    json: bool,
    show_progress: bool,
) -> Result<()> {
    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(g, progress.clone())?;
    let loaded = load_input(input, g.download_timeout)
        .await
        .with_context(|| format!("Failed to read {input}"))?;

    let extractor = Extractor::new(Arc::new(PdfiumBackend::new()), &config);
    let extraction = extractor.extract(loaded.bytes.into()).await;
    finish(progress.as_deref());
    let extraction = extraction.context("Extraction failed")?;

    if json {
        let value = serde_json::json!({
            "name": loaded.name,
            "pages": extraction.page_count,
            "characters": extraction.char_count(),
            "text": extraction.text,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("Failed to serialise output")?
        );
        return Ok(());
    }

    eprintln!(
        "{}  {}  {} pages  {} characters",
        green("✔"),
        bold(&loaded.name),
        extraction.page_count,
        extraction.char_count()
    );
    if show_text {
        write_stdout(&extraction.text)?;
    }
    Ok(())
}

async fn run_translate_stream(
    session: &Session,
    language: TargetLanguage,
    out: &OutputArgs,
    input: &str,
) -> Result<()> {
    let text = session.extracted_text().unwrap_or_default();
    let mut chunks = translate_stream(session.translator(), text, language, session.config());

    let target = output_target(out, input, language.code());
    let mut sink: Box<dyn Write> = match target {
        Some(ref path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    while let Some(item) = chunks.next().await {
        let chunk = item.context("Translation failed")?;
        sink.write_all(chunk.text.as_bytes())
            .context("Failed to write output")?;
        sink.flush().ok();
    }
    if target.is_none() {
        sink.write_all(b"\n").ok();
    }
    Ok(())
}

/// Load the input and upload it into a fresh session.
async fn open_session(
    config: PipelineConfig,
    g: &GlobalArgs,
    input: &str,
    progress: Option<&CliProgressCallback>,
) -> Result<Session> {
    let mut session = Session::from_env(config).context("Failed to initialise LLM provider")?;
    let loaded = load_input(input, g.download_timeout)
        .await
        .with_context(|| format!("Failed to read {input}"))?;

    if let Err(e) = session.upload(loaded.name, loaded.bytes).await {
        finish(progress);
        return Err(anyhow::Error::new(e).context("Extraction failed"));
    }
    Ok(session)
}

fn finish(progress: Option<&CliProgressCallback>) {
    if let Some(p) = progress {
        p.finish();
    }
}

/// Print or save an action result.
fn emit(
    result: &ProcessingResult,
    out: &OutputArgs,
    input: &str,
    suffix: &str,
    quiet: bool,
    started: Instant,
) -> Result<()> {
    if out.json {
        let json = serde_json::to_string_pretty(result).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    match output_target(out, input, suffix) {
        Some(path) => {
            write_file(&path, &result.text)?;
            if !quiet {
                eprintln!(
                    "{}  {} chunks  {}ms  →  {}",
                    green("✔"),
                    result.stats.chunks,
                    started.elapsed().as_millis(),
                    bold(&path.display().to_string()),
                );
            }
        }
        None => write_stdout(&result.text)?,
    }
    Ok(())
}

fn output_target(out: &OutputArgs, input: &str, suffix: &str) -> Option<PathBuf> {
    if out.save {
        Some(default_output_path(input, suffix))
    } else {
        out.output.clone()
    }
}

fn write_file(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    // Ensure a trailing newline on stdout.
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(
    g: &GlobalArgs,
    progress: Option<Arc<CliProgressCallback>>,
) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .api_timeout_secs(g.api_timeout)
        .download_timeout_secs(g.download_timeout);

    if let Some(ref provider) = g.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref model) = g.translation_model {
        builder = builder.translation_model(model);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb as ProgressCallback);
    }

    builder.build().context("Invalid configuration")
}
