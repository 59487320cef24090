//! Error types for the edgequake-pdfdigest library.
//!
//! Two distinct error types reflect two distinct failure sources:
//!
//! * [`PipelineError`]: the triggering action (extract, translate, summarize)
//!   cannot complete. Returned as `Err(PipelineError)` from the pipeline and
//!   session functions. It never invalidates the document a
//!   [`crate::session::Session`] already holds, so the user may retry.
//!
//! * [`ProviderError`]: an external collaborator (translation backend,
//!   summarization model) failed a single call. Adapters wrap it into the
//!   matching [`PipelineError`] variant together with the chunk position.
//!
//! No automatic retries happen anywhere: every failure surfaces once.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors that abort a pipeline action.
///
/// `Clone` so extraction outcomes, failures included, can be memoized.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    // ── Extraction errors ─────────────────────────────────────────────────
    /// The PDF requires a password or cannot be parsed at all. The user must
    /// supply an unprotected, well-formed file.
    #[error("This PDF is password-protected or damaged and cannot be read.\nSupply an unprotected copy, e.g. qpdf --decrypt input.pdf output.pdf")]
    EncryptedDocument,

    /// The PDF parsed but holds no text (image-only or empty pages).
    #[error("The PDF appears to contain only images or is empty. No text was extracted.")]
    NoExtractableText,

    /// Any other parse failure, with the backend message passed through.
    #[error("Unexpected error while processing the PDF: {detail}")]
    ExtractionFailed { detail: String },

    // ── Transformation errors ─────────────────────────────────────────────
    /// The translation backend failed on a chunk. Chunks are 1-indexed.
    #[error("Translation failed on chunk {chunk} of {total}: {detail}")]
    TranslationFailed {
        chunk: usize,
        total: usize,
        detail: String,
    },

    /// The summarization model failed to load or to summarize a chunk.
    #[error("Summarization with model '{model}' failed {stage}: {detail}")]
    SummarizationFailed {
        model: String,
        stage: SummaryStage,
        detail: String,
    },

    // ── Session errors ────────────────────────────────────────────────────
    /// An action was requested before any document was uploaded.
    #[error("No document loaded. Upload a PDF first.")]
    NoDocument,

    /// An action was requested but the current document failed extraction.
    #[error("The current document has no text to process: {message}")]
    DocumentNotReady { message: String },

    /// The requested target language is not one of the supported set.
    #[error("Unsupported target language '{input}'. Supported: pt, en, es, fr, de")]
    UnsupportedLanguage { input: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Config / environment errors ───────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The LLM provider could not be created (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium and either:\n\
  • place it next to the binary, or\n\
  • set PDFIUM_LIB_PATH=/path/to/libpdfium.\n\
Pre-built libraries: https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Where a summarization failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryStage {
    /// The model could not be loaded.
    ModelLoad,
    /// The model failed on a chunk (1-indexed).
    Chunk { index: usize, total: usize },
}

impl fmt::Display for SummaryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryStage::ModelLoad => write!(f, "while loading the model"),
            SummaryStage::Chunk { index, total } => write!(f, "on chunk {index} of {total}"),
        }
    }
}

/// A single failed call to an external collaborator.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum ProviderError {
    /// The provider returned an error.
    #[error("provider error: {message}")]
    Api { message: String },

    /// The call did not finish within the configured timeout.
    #[error("call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The named model is unknown to the provider or could not be created.
    #[error("model '{model}' is unavailable: {detail}")]
    ModelUnavailable { model: String, detail: String },
}

impl ProviderError {
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }
}
