//! Chunked translation over an external [`Translator`].
//!
//! The text is cut with [`chunk_text`] at `translation_chunk_chars`, each
//! chunk is translated in order, and non-empty results are appended to the
//! output. An empty translation contributes nothing and is not an error.
//!
//! ## Failure policy: fail-fast
//!
//! The first failing chunk aborts the action with
//! [`PipelineError::TranslationFailed`]; chunks already translated are
//! discarded. Nothing is retried.

use crate::config::{PipelineConfig, TargetLanguage};
use crate::error::{PipelineError, ProviderError};
use crate::output::ActionKind;
use crate::pipeline::chunk::chunk_text;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// External translation capability.
///
/// Receives one chunk at a time; the source language is detected by the
/// implementation.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Translate `text` into `target`.
    async fn translate(&self, text: &str, target: TargetLanguage) -> Result<String, ProviderError>;
}

/// Translate `text` chunk by chunk, preserving chunk order.
///
/// Empty input returns an empty string without calling `translator`.
pub async fn translate_text(
    translator: &dyn Translator,
    text: &str,
    target: TargetLanguage,
    config: &PipelineConfig,
) -> Result<String, PipelineError> {
    let chunks = chunk_text(text, config.translation_chunk_chars);
    let total = chunks.len();
    if total == 0 {
        debug!("Nothing to translate");
        return Ok(String::new());
    }

    info!(
        "Translating {} chunks into {} with {}",
        total,
        target.code(),
        translator.name()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_action_start(ActionKind::Translate, total);
    }

    let mut translated = String::with_capacity(text.len());
    for (idx, chunk) in chunks.into_iter().enumerate() {
        let chunk_num = idx + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_chunk_start(chunk_num, total);
        }

        match translator.translate(chunk, target).await {
            Ok(part) => {
                let added = part.chars().count();
                if !part.is_empty() {
                    translated.push_str(&part);
                }
                debug!("Chunk {}/{}: {} chars translated", chunk_num, total, added);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_chunk_complete(chunk_num, total, added);
                }
            }
            Err(e) => {
                let detail = e.to_string();
                warn!("Chunk {}/{}: translation failed — {}", chunk_num, total, detail);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_chunk_error(chunk_num, total, &detail);
                }
                return Err(PipelineError::TranslationFailed {
                    chunk: chunk_num,
                    total,
                    detail,
                });
            }
        }
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_action_complete(ActionKind::Translate, total);
    }
    Ok(translated)
}
