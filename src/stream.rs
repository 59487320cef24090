//! Streaming translation API: emit chunks as they are translated.
//!
//! [`crate::pipeline::translate::translate_text`] returns only after the
//! last chunk. [`translate_stream`] yields each [`TranslatedChunk`] as soon
//! as it is ready, so callers can show partial output or write it out
//! incrementally.
//!
//! Chunks are translated one at a time and arrive in chunk order. The
//! stream is fail-fast like the eager API: after the first error item it
//! ends without touching the remaining chunks.

use crate::config::{PipelineConfig, TargetLanguage};
use crate::error::PipelineError;
use crate::output::ActionKind;
use crate::pipeline::chunk::chunk_text;
use crate::pipeline::translate::Translator;
use futures::stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::{info, warn};

/// One translated chunk. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedChunk {
    pub index: usize,
    pub total: usize,
    pub text: String,
}

/// A boxed stream of translated chunks.
pub type TranslationStream =
    Pin<Box<dyn Stream<Item = Result<TranslatedChunk, PipelineError>> + Send>>;

struct StreamState {
    translator: Arc<dyn Translator>,
    chunks: std::vec::IntoIter<String>,
    next: usize,
    total: usize,
    target: TargetLanguage,
    config: PipelineConfig,
    done: bool,
}

/// Translate `text` into `target`, streaming chunks in order.
///
/// Empty input produces an empty stream and no translator calls.
pub fn translate_stream(
    translator: Arc<dyn Translator>,
    text: &str,
    target: TargetLanguage,
    config: &PipelineConfig,
) -> TranslationStream {
    let chunks: Vec<String> = chunk_text(text, config.translation_chunk_chars)
        .into_iter()
        .map(str::to_owned)
        .collect();
    let total = chunks.len();
    info!(
        "Starting streaming translation: {} chunks into {}",
        total,
        target.code()
    );
    if total > 0 {
        if let Some(ref cb) = config.progress_callback {
            cb.on_action_start(ActionKind::Translate, total);
        }
    }

    let state = StreamState {
        translator,
        chunks: chunks.into_iter(),
        next: 1,
        total,
        target,
        config: config.clone(),
        done: false,
    };

    let s = stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }
        let chunk = st.chunks.next()?;
        let index = st.next;
        st.next += 1;

        if let Some(ref cb) = st.config.progress_callback {
            cb.on_chunk_start(index, st.total);
        }
        let item = match st.translator.translate(&chunk, st.target).await {
            Ok(text) => {
                if let Some(ref cb) = st.config.progress_callback {
                    cb.on_chunk_complete(index, st.total, text.chars().count());
                    if index == st.total {
                        cb.on_action_complete(ActionKind::Translate, st.total);
                    }
                }
                Ok(TranslatedChunk {
                    index,
                    total: st.total,
                    text,
                })
            }
            Err(e) => {
                let detail = e.to_string();
                warn!("Chunk {}/{}: translation failed — {}", index, st.total, detail);
                if let Some(ref cb) = st.config.progress_callback {
                    cb.on_chunk_error(index, st.total, &detail);
                }
                st.done = true;
                Err(PipelineError::TranslationFailed {
                    chunk: index,
                    total: st.total,
                    detail,
                })
            }
        };
        Some((item, st))
    });

    Box::pin(s)
}
