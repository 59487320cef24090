//! The session: one current document, one current result.
//!
//! [`Session`] replaces the ambient globals of a UI script with an explicit
//! object. Every transition is a method:
//!
//! ```text
//!            upload(name, bytes)
//!  Empty ───────────────────────────▶ Ready(text) ──translate/summarize──▶ result
//!    ▲                 │                  │  ▲                               │
//!    │                 ▼                  │  └──────── clear_result ─────────┘
//!    └── close ── Failed(message) ◀───────┘ (upload of another name)
//! ```
//!
//! Actions take `&mut self`, so at most one runs at a time per session. An
//! action that fails returns its error and leaves the document and the
//! previous result exactly as they were.

use crate::config::{PipelineConfig, SummaryModel, TargetLanguage};
use crate::error::PipelineError;
use crate::output::{Action, ActionStats, Extraction, ProcessingResult};
use crate::pipeline::chunk::chunk_count;
use crate::pipeline::extract::{Extractor, PdfBackend};
use crate::pipeline::llm::{LlmModelLoader, LlmTranslator};
use crate::pipeline::pdfium::PdfiumBackend;
use crate::pipeline::summarize::{ModelLoader, Summarizer};
use crate::pipeline::translate::{translate_text, Translator};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extraction outcome held for the current document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentState {
    Ready(Arc<Extraction>),
    Failed(PipelineError),
}

/// The uploaded PDF, identified by its file name.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub bytes: Arc<[u8]>,
    pub state: DocumentState,
}

impl Document {
    /// Extracted text, when extraction succeeded.
    pub fn text(&self) -> Option<&str> {
        match &self.state {
            DocumentState::Ready(extraction) => Some(&extraction.text),
            DocumentState::Failed(_) => None,
        }
    }

    /// Human-readable extraction error, when extraction failed.
    pub fn error_message(&self) -> Option<String> {
        match &self.state {
            DocumentState::Ready(_) => None,
            DocumentState::Failed(e) => Some(e.to_string()),
        }
    }
}

/// Holds the current document and result and runs actions against them.
pub struct Session {
    extractor: Extractor,
    translator: Arc<dyn Translator>,
    summarizer: Summarizer,
    config: PipelineConfig,
    document: Option<Document>,
    result: Option<ProcessingResult>,
}

impl Session {
    pub fn new(
        config: PipelineConfig,
        backend: Arc<dyn PdfBackend>,
        translator: Arc<dyn Translator>,
        loader: Arc<dyn ModelLoader>,
    ) -> Self {
        Self {
            extractor: Extractor::new(backend, &config),
            translator,
            summarizer: Summarizer::new(loader),
            config,
            document: None,
            result: None,
        }
    }

    /// Build a session on pdfium and the LLM provider found in `config` or
    /// the environment.
    pub fn from_env(config: PipelineConfig) -> Result<Self, PipelineError> {
        let translator = LlmTranslator::from_config(&config)?;
        let loader = LlmModelLoader::from_config(&config);
        Ok(Self::new(
            config,
            Arc::new(PdfiumBackend::new()),
            Arc::new(translator),
            Arc::new(loader),
        ))
    }

    // ── Transitions ──────────────────────────────────────────────────────

    /// Make `bytes` the current document and extract its text.
    ///
    /// Uploading under the current document's name is a no-op that reports
    /// the existing extraction outcome. Any other name replaces the
    /// document, clears the result and extracts. An extraction failure is
    /// returned and also recorded as the document's state.
    pub async fn upload(
        &mut self,
        name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<Arc<Extraction>, PipelineError> {
        let name = name.into();
        if let Some(doc) = self.document.as_ref().filter(|d| d.name == name) {
            debug!("'{}' is already the current document", name);
            return match &doc.state {
                DocumentState::Ready(extraction) => Ok(Arc::clone(extraction)),
                DocumentState::Failed(e) => Err(e.clone()),
            };
        }

        let bytes: Arc<[u8]> = bytes.into();
        info!("Uploading '{}' ({} bytes)", name, bytes.len());
        self.result = None;

        let outcome = self.extractor.extract(Arc::clone(&bytes)).await;
        let state = match &outcome {
            Ok(extraction) => DocumentState::Ready(Arc::clone(extraction)),
            Err(e) => DocumentState::Failed(e.clone()),
        };
        self.document = Some(Document { name, bytes, state });
        outcome
    }

    /// Translate the extracted text into `language`.
    pub async fn translate(
        &mut self,
        language: TargetLanguage,
    ) -> Result<&ProcessingResult, PipelineError> {
        let extraction = self.ready_extraction()?;
        let text = extraction.text.as_str();
        let start = Instant::now();
        let translated =
            translate_text(self.translator.as_ref(), text, language, &self.config).await?;

        let stats = ActionStats {
            chunks: chunk_count(text, self.config.translation_chunk_chars),
            input_chars: text.chars().count(),
            output_chars: translated.chars().count(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        Ok(self.store(Action::Translate { language }, translated, stats))
    }

    /// Summarize the extracted text with `model`, or the configured default.
    ///
    /// Preset names (`fast`, `quality`, `multilingual`) resolve to model ids;
    /// anything else is passed to the provider unchanged.
    pub async fn summarize(&mut self, model: Option<&str>) -> Result<&ProcessingResult, PipelineError> {
        let extraction = self.ready_extraction()?;
        let text = extraction.text.as_str();
        let model = match model {
            Some(name) => SummaryModel::resolve(name),
            None => self.config.default_summary_model.clone(),
        };

        let start = Instant::now();
        let summary = self.summarizer.summarize(text, &model, &self.config).await?;

        let stats = ActionStats {
            chunks: chunk_count(text, self.config.summary_chunk_chars),
            input_chars: text.chars().count(),
            output_chars: summary.chars().count(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        Ok(self.store(Action::Summarize { model }, summary, stats))
    }

    /// Drop the current result; the extracted text is kept.
    pub fn clear_result(&mut self) {
        self.result = None;
    }

    /// Discard the document and the result.
    pub fn close(&mut self) {
        if let Some(doc) = self.document.take() {
            debug!("Closing '{}'", doc.name);
        }
        self.result = None;
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn state(&self) -> Option<&DocumentState> {
        self.document.as_ref().map(|d| &d.state)
    }

    pub fn extracted_text(&self) -> Option<&str> {
        self.document.as_ref().and_then(Document::text)
    }

    /// Characters of extracted text, as shown to the user.
    pub fn char_count(&self) -> Option<usize> {
        match self.state()? {
            DocumentState::Ready(extraction) => Some(extraction.char_count()),
            DocumentState::Failed(_) => None,
        }
    }

    pub fn result(&self) -> Option<&ProcessingResult> {
        self.result.as_ref()
    }

    /// Whether translate and summarize are enabled.
    pub fn can_run_actions(&self) -> bool {
        matches!(self.state(), Some(DocumentState::Ready(_)))
    }

    /// Summarization models loaded so far in this session.
    pub async fn loaded_models(&self) -> Vec<String> {
        self.summarizer.loaded_models().await
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The translation collaborator, for use with [`crate::stream::translate_stream`].
    pub fn translator(&self) -> Arc<dyn Translator> {
        Arc::clone(&self.translator)
    }

    // ── Internals ────────────────────────────────────────────────────────

    /// Clone the extraction handle so the text outlives the `&mut self`
    /// borrow taken when the result is stored.
    fn ready_extraction(&self) -> Result<Arc<Extraction>, PipelineError> {
        let doc = self.document.as_ref().ok_or(PipelineError::NoDocument)?;
        match &doc.state {
            DocumentState::Ready(extraction) => Ok(Arc::clone(extraction)),
            DocumentState::Failed(e) => Err(PipelineError::DocumentNotReady {
                message: e.to_string(),
            }),
        }
    }

    fn store(&mut self, action: Action, text: String, stats: ActionStats) -> &ProcessingResult {
        info!(
            "{} complete: {} chunks, {} → {} chars in {}ms",
            action.kind(),
            stats.chunks,
            stats.input_chars,
            stats.output_chars,
            stats.duration_ms
        );
        self.result.insert(ProcessingResult {
            action,
            text,
            stats,
        })
    }
}
