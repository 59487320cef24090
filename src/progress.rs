//! Progress-callback trait for extraction and per-chunk pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events while a document is extracted, a model is loaded, or a text is
//! translated or summarized chunk by chunk.
//!
//! Callbacks are a side channel: the pipeline itself stays sequential and
//! every action still runs to completion before returning. Callers can
//! forward events to a terminal progress bar, a channel or a log without the
//! library knowing anything about how the host application communicates.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfdigest::{PipelineConfig, PipelineProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_chunk_complete(&self, chunk: usize, total: usize, _output_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("chunk {chunk} of {total}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::ActionKind;
use std::sync::Arc;

/// Called by the pipeline as it extracts text and processes each chunk.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Chunk numbers are 1-indexed.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called before a PDF is parsed (not called on a cache hit).
    fn on_extraction_start(&self, byte_len: usize) {
        let _ = byte_len;
    }

    /// Called after text was extracted successfully.
    fn on_extraction_complete(&self, char_count: usize) {
        let _ = char_count;
    }

    /// Called before a summarization model is loaded (not called on a cache hit).
    fn on_model_loading(&self, model: &str) {
        let _ = model;
    }

    /// Called once the text has been chunked, before the first request.
    fn on_action_start(&self, action: ActionKind, total_chunks: usize) {
        let _ = (action, total_chunks);
    }

    /// Called just before a chunk is sent to the external service.
    fn on_chunk_start(&self, chunk: usize, total_chunks: usize) {
        let _ = (chunk, total_chunks);
    }

    /// Called when a chunk finished.
    ///
    /// # Arguments
    /// * `chunk`       : 1-indexed chunk number
    /// * `total_chunks`: total chunks for this action
    /// * `output_len`  : characters contributed by this chunk
    fn on_chunk_complete(&self, chunk: usize, total_chunks: usize, output_len: usize) {
        let _ = (chunk, total_chunks, output_len);
    }

    /// Called when a chunk failed. The action aborts right after.
    fn on_chunk_error(&self, chunk: usize, total_chunks: usize, error: &str) {
        let _ = (chunk, total_chunks, error);
    }

    /// Called once after every chunk succeeded.
    fn on_action_complete(&self, action: ActionKind, total_chunks: usize) {
        let _ = (action, total_chunks);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        announced_total: AtomicUsize,
    }

    impl PipelineProgressCallback for TrackingCallback {
        fn on_action_start(&self, _action: ActionKind, total_chunks: usize) {
            self.announced_total.store(total_chunks, Ordering::SeqCst);
        }

        fn on_chunk_start(&self, _chunk: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_chunk_complete(&self, _chunk: usize, _total: usize, _len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_chunk_error(&self, _chunk: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(1024);
        cb.on_extraction_complete(300);
        cb.on_model_loading("gpt-4.1-nano");
        cb.on_action_start(ActionKind::Translate, 2);
        cb.on_chunk_start(1, 2);
        cb.on_chunk_complete(1, 2, 42);
        cb.on_chunk_error(2, 2, "some error");
        cb.on_action_complete(ActionKind::Translate, 2);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_action_start(ActionKind::Summarize, 3);
        tracker.on_chunk_start(1, 3);
        tracker.on_chunk_complete(1, 3, 100);
        tracker.on_chunk_start(2, 3);
        tracker.on_chunk_error(2, 3, "timeout");

        assert_eq!(tracker.announced_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_action_start(ActionKind::Translate, 10);
        cb.on_chunk_complete(1, 10, 512);
    }
}
