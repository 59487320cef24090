//! # edgequake-pdfdigest
//!
//! Extract the text of a PDF, then translate or summarize it with an LLM.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Extract    pdfium text per page, concatenated (spawn_blocking, memoized by content)
//!  ├─ 2. Chunk      fixed-size character chunks, no overlap
//!  ├─ 3a. Translate one call per 4500-char chunk, results appended in order
//!  ├─ 3b. Summarize one call per 1024-char chunk, parts joined with a space
//!  └─ 4. Session    current document + current result, explicit transitions
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfdigest::{PipelineConfig, Session, TargetLanguage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let mut session = Session::from_env(PipelineConfig::default())?;
//!     let bytes = std::fs::read("paper.pdf")?;
//!     let extraction = session.upload("paper.pdf", bytes).await?;
//!     eprintln!("{} characters extracted", extraction.char_count());
//!
//!     let result = session.translate(TargetLanguage::Portuguese).await?;
//!     println!("{}", result.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfdigest` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdfdigest = { version = "0.1", default-features = false }
//! ```
//!
//! ## Summary Models
//!
//! | Preset | Model | Best for |
//! |--------|-------|----------|
//! | `fast` | `gpt-4.1-nano` | Default, cheap and quick |
//! | `quality` | `gpt-4.1` | Highest quality |
//! | `multilingual` | `gpt-4.1-mini` | Non-English sources |
//!
//! Any other model id is passed to the provider as-is.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationParams, PipelineConfig, PipelineConfigBuilder, SummaryModel, TargetLanguage};
pub use error::{PipelineError, ProviderError, SummaryStage};
pub use output::{Action, ActionKind, ActionStats, Extraction, ProcessingResult};
pub use pipeline::chunk::chunk_text;
pub use pipeline::extract::{BackendFailure, Extractor, PdfBackend};
pub use pipeline::summarize::{ModelLoader, SummarizationModel, Summarizer, SummaryOutput};
pub use pipeline::translate::{translate_text, Translator};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use session::{Document, DocumentState, Session};
pub use stream::{translate_stream, TranslatedChunk, TranslationStream};
