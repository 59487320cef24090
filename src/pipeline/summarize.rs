//! Chunked summarization over lazily loaded, cached models.
//!
//! A [`ModelLoader`] turns a model name into a [`SummarizationModel`]. Loads
//! are expensive, so [`Summarizer`] keeps every loaded model for the life of
//! the process and loads each name at most once.
//!
//! The input is cut at `summary_chunk_chars`; each chunk is summarized with
//! the fixed [`GenerationParams`], the first output of each call is trimmed,
//! and the non-empty partial summaries are joined with single spaces. Model-load
//! failures and chunk failures both surface as
//! [`PipelineError::SummarizationFailed`]; nothing is dropped silently.

use crate::config::{GenerationParams, PipelineConfig};
use crate::error::{PipelineError, ProviderError, SummaryStage};
use crate::output::ActionKind;
use crate::pipeline::chunk::chunk_text;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// One generated summary, as returned by summarization pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOutput {
    pub summary_text: String,
}

/// A loaded summarization model.
#[async_trait]
pub trait SummarizationModel: Send + Sync {
    /// Summarize one chunk. Implementations return one output per call;
    /// an empty list means the model produced nothing for this chunk.
    async fn summarize(
        &self,
        text: &str,
        params: &GenerationParams,
    ) -> Result<Vec<SummaryOutput>, ProviderError>;
}

/// Loads a summarization model by name.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, model_name: &str) -> Result<Arc<dyn SummarizationModel>, ProviderError>;
}

/// Name-keyed model cache plus the chunked summarize operation.
pub struct Summarizer {
    loader: Arc<dyn ModelLoader>,
    models: Mutex<HashMap<String, Arc<dyn SummarizationModel>>>,
}

impl Summarizer {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            models: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached model for `model_name`, loading it on first use.
    ///
    /// The cache lock is held across the load so two callers asking for the
    /// same name never trigger two loads.
    pub async fn model(
        &self,
        model_name: &str,
        config: &PipelineConfig,
    ) -> Result<Arc<dyn SummarizationModel>, PipelineError> {
        let mut models = self.models.lock().await;
        if let Some(model) = models.get(model_name) {
            debug!("Model cache hit: {}", model_name);
            return Ok(Arc::clone(model));
        }

        info!("Loading summarization model '{}'", model_name);
        if let Some(ref cb) = config.progress_callback {
            cb.on_model_loading(model_name);
        }
        let model = self.loader.load(model_name).await.map_err(|e| {
            warn!("Model '{}' failed to load — {}", model_name, e);
            PipelineError::SummarizationFailed {
                model: model_name.to_string(),
                stage: SummaryStage::ModelLoad,
                detail: e.to_string(),
            }
        })?;
        models.insert(model_name.to_string(), Arc::clone(&model));
        Ok(model)
    }

    /// Names of the models loaded so far.
    pub async fn loaded_models(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Summarize `text` with `model_name`.
    ///
    /// Empty input returns an empty summary; the model is still loaded so an
    /// unknown name is reported.
    pub async fn summarize(
        &self,
        text: &str,
        model_name: &str,
        config: &PipelineConfig,
    ) -> Result<String, PipelineError> {
        let model = self.model(model_name, config).await?;
        summarize_chunks(model.as_ref(), model_name, text, config).await
    }
}

/// Summarize `text` with an already loaded model.
pub async fn summarize_chunks(
    model: &dyn SummarizationModel,
    model_name: &str,
    text: &str,
    config: &PipelineConfig,
) -> Result<String, PipelineError> {
    let chunks = chunk_text(text, config.summary_chunk_chars);
    let total = chunks.len();
    let params = config.generation_params();

    info!("Summarizing {} chunks with '{}'", total, model_name);
    if let Some(ref cb) = config.progress_callback {
        cb.on_action_start(ActionKind::Summarize, total);
    }

    let mut summary = String::new();
    for (idx, chunk) in chunks.into_iter().enumerate() {
        let chunk_num = idx + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_chunk_start(chunk_num, total);
        }

        let outputs = match model.summarize(chunk, &params).await {
            Ok(outputs) => outputs,
            Err(e) => {
                let detail = e.to_string();
                warn!("Chunk {}/{}: summarization failed — {}", chunk_num, total, detail);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_chunk_error(chunk_num, total, &detail);
                }
                return Err(PipelineError::SummarizationFailed {
                    model: model_name.to_string(),
                    stage: SummaryStage::Chunk {
                        index: chunk_num,
                        total,
                    },
                    detail,
                });
            }
        };

        let part = outputs
            .first()
            .map(|o| o.summary_text.trim())
            .unwrap_or_default();
        if !part.is_empty() {
            summary.push_str(part);
            summary.push(' ');
        }
        debug!("Chunk {}/{}: {} chars of summary", chunk_num, total, part.len());
        if let Some(ref cb) = config.progress_callback {
            cb.on_chunk_complete(chunk_num, total, part.chars().count());
        }
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_action_complete(ActionKind::Summarize, total);
    }
    Ok(summary.trim_end().to_string())
}
