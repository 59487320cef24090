//! Configuration types for the extraction → translation/summarization pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs between the session, the adapters and the CLI.

use crate::error::PipelineError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chunk bound for the translation backend.
pub const DEFAULT_TRANSLATION_CHUNK_CHARS: usize = 4500;

/// Chunk bound matching the typical input limit of summarization models.
pub const DEFAULT_SUMMARY_CHUNK_CHARS: usize = 1024;

/// Configuration for a [`crate::session::Session`] and the pipeline adapters.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdfdigest::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .translation_chunk_chars(4000)
///     .summary_max_length(200)
///     .build()
///     .unwrap();
/// assert_eq!(config.summary_chunk_chars, 1024);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Maximum characters per translation request. Default: 4500.
    ///
    /// Translation backends reject oversized payloads; 4500 stays under the
    /// 5000-character limit common to public translation endpoints.
    pub translation_chunk_chars: usize,

    /// Maximum characters per summarization request. Default: 1024.
    pub summary_chunk_chars: usize,

    /// Upper bound on the length of each partial summary. Default: 150.
    pub summary_max_length: usize,

    /// Lower bound on the length of each partial summary. Default: 30.
    pub summary_min_length: usize,

    /// Sample during generation. Default: false (deterministic output).
    pub summary_do_sample: bool,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Model used by the LLM translator. If None, `gpt-4.1-nano`, or the
    /// provider default when the provider itself is auto-detected.
    pub translation_model: Option<String>,

    /// Summarization model used when the caller does not choose one.
    pub default_summary_model: String,

    /// Per-call timeout for translation and summarization in seconds. Default: 60.
    ///
    /// An expired call is reported like any other provider failure.
    pub api_timeout_secs: u64,

    /// Maximum memoized extraction results. Default: 16. Zero disables the cache.
    pub extraction_cache_capacity: usize,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Receives extraction, model-load and per-chunk events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            translation_chunk_chars: DEFAULT_TRANSLATION_CHUNK_CHARS,
            summary_chunk_chars: DEFAULT_SUMMARY_CHUNK_CHARS,
            summary_max_length: 150,
            summary_min_length: 30,
            summary_do_sample: false,
            provider_name: None,
            translation_model: None,
            default_summary_model: SummaryModel::default().model_id().to_string(),
            api_timeout_secs: 60,
            extraction_cache_capacity: 16,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("translation_chunk_chars", &self.translation_chunk_chars)
            .field("summary_chunk_chars", &self.summary_chunk_chars)
            .field("summary_max_length", &self.summary_max_length)
            .field("summary_min_length", &self.summary_min_length)
            .field("summary_do_sample", &self.summary_do_sample)
            .field("provider_name", &self.provider_name)
            .field("translation_model", &self.translation_model)
            .field("default_summary_model", &self.default_summary_model)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("extraction_cache_capacity", &self.extraction_cache_capacity)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Generation parameters passed to every summarization call.
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_length: self.summary_max_length,
            min_length: self.summary_min_length,
            do_sample: self.summary_do_sample,
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn translation_chunk_chars(mut self, n: usize) -> Self {
        self.config.translation_chunk_chars = n;
        self
    }

    pub fn summary_chunk_chars(mut self, n: usize) -> Self {
        self.config.summary_chunk_chars = n;
        self
    }

    pub fn summary_max_length(mut self, n: usize) -> Self {
        self.config.summary_max_length = n;
        self
    }

    pub fn summary_min_length(mut self, n: usize) -> Self {
        self.config.summary_min_length = n;
        self
    }

    pub fn summary_do_sample(mut self, v: bool) -> Self {
        self.config.summary_do_sample = v;
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn translation_model(mut self, model: impl Into<String>) -> Self {
        self.config.translation_model = Some(model.into());
        self
    }

    pub fn default_summary_model(mut self, model: impl Into<String>) -> Self {
        self.config.default_summary_model = model.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn extraction_cache_capacity(mut self, n: usize) -> Self {
        self.config.extraction_cache_capacity = n;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        let c = &self.config;
        if c.translation_chunk_chars == 0 {
            return Err(PipelineError::InvalidConfig(
                "translation chunk size must be ≥ 1".into(),
            ));
        }
        if c.summary_chunk_chars == 0 {
            return Err(PipelineError::InvalidConfig(
                "summary chunk size must be ≥ 1".into(),
            ));
        }
        if c.summary_min_length > c.summary_max_length {
            return Err(PipelineError::InvalidConfig(format!(
                "summary min length ({}) exceeds max length ({})",
                c.summary_min_length, c.summary_max_length
            )));
        }
        if c.default_summary_model.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "default summary model must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Fixed generation parameters for each summarization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_length: usize,
    pub min_length: usize,
    pub do_sample: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        PipelineConfig::default().generation_params()
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Target languages offered for translation.
///
/// The source language is always detected by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLanguage {
    #[default]
    Portuguese,
    English,
    Spanish,
    French,
    German,
}

impl TargetLanguage {
    /// Every supported target, in menu order.
    pub const ALL: [TargetLanguage; 5] = [
        TargetLanguage::Portuguese,
        TargetLanguage::English,
        TargetLanguage::Spanish,
        TargetLanguage::French,
        TargetLanguage::German,
    ];

    /// Two-letter code sent to the backend.
    pub fn code(self) -> &'static str {
        match self {
            TargetLanguage::Portuguese => "pt",
            TargetLanguage::English => "en",
            TargetLanguage::Spanish => "es",
            TargetLanguage::French => "fr",
            TargetLanguage::German => "de",
        }
    }

    /// English display name.
    pub fn name(self) -> &'static str {
        match self {
            TargetLanguage::Portuguese => "Portuguese",
            TargetLanguage::English => "English",
            TargetLanguage::Spanish => "Spanish",
            TargetLanguage::French => "French",
            TargetLanguage::German => "German",
        }
    }

    fn native_label(self) -> &'static str {
        match self {
            TargetLanguage::Portuguese => "português",
            TargetLanguage::English => "inglês",
            TargetLanguage::Spanish => "espanhol",
            TargetLanguage::French => "francês",
            TargetLanguage::German => "alemão",
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

impl FromStr for TargetLanguage {
    type Err = PipelineError;

    /// Accepts the code (`de`), the English name (`german`) or the
    /// Portuguese menu label (`alemão`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        TargetLanguage::ALL
            .into_iter()
            .find(|lang| {
                needle == lang.code()
                    || needle == lang.name().to_lowercase()
                    || needle == lang.native_label()
            })
            .ok_or_else(|| PipelineError::UnsupportedLanguage {
                input: s.to_string(),
            })
    }
}

/// Summarization model presets.
///
/// The set is configuration: any other model id can be passed as a plain
/// string and is only rejected by the provider when it is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryModel {
    /// Small and fast. (default)
    #[default]
    Fast,
    /// Large, highest quality, slowest.
    Quality,
    /// Handles non-English documents best.
    Multilingual,
}

impl SummaryModel {
    pub const ALL: [SummaryModel; 3] = [
        SummaryModel::Fast,
        SummaryModel::Quality,
        SummaryModel::Multilingual,
    ];

    /// Preset name accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            SummaryModel::Fast => "fast",
            SummaryModel::Quality => "quality",
            SummaryModel::Multilingual => "multilingual",
        }
    }

    /// Model identifier handed to the provider.
    pub fn model_id(self) -> &'static str {
        match self {
            SummaryModel::Fast => "gpt-4.1-nano",
            SummaryModel::Quality => "gpt-4.1",
            SummaryModel::Multilingual => "gpt-4.1-mini",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SummaryModel::Fast => "small and fast, good for short documents",
            SummaryModel::Quality => "large model, best summaries, slower and pricier",
            SummaryModel::Multilingual => "balanced model for non-English sources",
        }
    }

    /// Resolve a preset name (`fast`, `quality`, `multilingual`) to its id,
    /// passing any other string through as a raw model id.
    pub fn resolve(name: &str) -> String {
        let lower = name.trim().to_lowercase();
        SummaryModel::ALL
            .into_iter()
            .find(|m| m.name() == lower)
            .map(|m| m.model_id().to_string())
            .unwrap_or_else(|| name.trim().to_string())
    }
}
