//! Text extraction: PDF bytes → concatenated page text, or a typed failure.
//!
//! The [`Extractor`] owns classification and memoization; the actual parsing
//! sits behind the [`PdfBackend`] trait so the rules below can be exercised
//! without a pdfium library on the machine.
//!
//! ## Failure classification (first match wins)
//!
//! 1. The bytes cannot be opened as a PDF at all (no `%PDF` header in the
//!    first 1024 bytes, a malformed file, or a password / security-handler
//!    failure) →
//!    [`PipelineError::EncryptedDocument`].
//! 2. Opened, but the text is empty or whitespace-only →
//!    [`PipelineError::NoExtractableText`].
//! 3. Any other failure, such as a page whose text cannot be read →
//!    [`PipelineError::ExtractionFailed`] with the backend message.
//!
//! ## Memoization
//!
//! Outcomes are cached by content (byte length plus a 64-bit hash), never by
//! filename, so re-uploading the same bytes under any name skips parsing.
//! Failures are cached too: a corrupt file stays corrupt. The cache is
//! bounded; the oldest entry is evicted first.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::output::Extraction;
use crate::progress::ProgressCallback;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Header marker of every PDF file.
const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// PDF readers accept a header that starts anywhere in this leading window.
const MAGIC_SEARCH_WINDOW: usize = 1024;

/// Why a [`PdfBackend`] could not produce page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendFailure {
    /// The parsing library itself is unavailable.
    Unavailable(String),
    /// The document could not be opened.
    Open(String),
    /// A page was opened but its text could not be read. 1-indexed.
    Page { page: usize, detail: String },
}

/// Something that can turn PDF bytes into per-page text.
///
/// Implementations must release every document handle before returning,
/// on success and on failure alike.
pub trait PdfBackend: Send + Sync {
    /// Text of every page, in page order.
    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, BackendFailure>;
}

/// Memoizing front end over a [`PdfBackend`].
pub struct Extractor {
    backend: Arc<dyn PdfBackend>,
    cache: Mutex<ExtractionCache>,
    progress: Option<ProgressCallback>,
}

impl Extractor {
    pub fn new(backend: Arc<dyn PdfBackend>, config: &PipelineConfig) -> Self {
        Self {
            backend,
            cache: Mutex::new(ExtractionCache::new(config.extraction_cache_capacity)),
            progress: config.progress_callback.clone(),
        }
    }

    /// Extract the text of `bytes`, parsing on a blocking thread.
    ///
    /// pdfium is not async-safe, so parsing runs in `spawn_blocking`.
    pub async fn extract(&self, bytes: Arc<[u8]>) -> Result<Arc<Extraction>, PipelineError> {
        check_magic(&bytes)?;
        let key = ContentKey::of(&bytes);
        if let Some(hit) = self.lock_cache().get(&key) {
            debug!("Extraction cache hit ({} bytes)", key.len);
            return hit;
        }

        self.notify_start(bytes.len());
        let backend = Arc::clone(&self.backend);
        let parsed = tokio::task::spawn_blocking(move || backend.page_texts(&bytes))
            .await
            .map_err(|e| PipelineError::Internal(format!("Extraction task panicked: {e}")))?;

        self.finish(key, parsed)
    }

    /// Synchronous variant of [`Extractor::extract`] for callers outside a runtime.
    pub fn extract_blocking(&self, bytes: &[u8]) -> Result<Arc<Extraction>, PipelineError> {
        check_magic(bytes)?;
        let key = ContentKey::of(bytes);
        if let Some(hit) = self.lock_cache().get(&key) {
            debug!("Extraction cache hit ({} bytes)", key.len);
            return hit;
        }

        self.notify_start(bytes.len());
        let parsed = self.backend.page_texts(bytes);
        self.finish(key, parsed)
    }

    /// Number of memoized outcomes.
    pub fn cached_entries(&self) -> usize {
        self.lock_cache().len()
    }

    fn notify_start(&self, byte_len: usize) {
        info!("Extracting text from {} bytes", byte_len);
        if let Some(ref cb) = self.progress {
            cb.on_extraction_start(byte_len);
        }
    }

    fn finish(
        &self,
        key: ContentKey,
        parsed: Result<Vec<String>, BackendFailure>,
    ) -> Result<Arc<Extraction>, PipelineError> {
        let outcome = classify(parsed).map(Arc::new);
        match &outcome {
            Ok(extraction) => {
                let chars = extraction.char_count();
                info!(
                    "Extracted {} characters from {} pages",
                    chars, extraction.page_count
                );
                if let Some(ref cb) = self.progress {
                    cb.on_extraction_complete(chars);
                }
            }
            Err(e) => warn!("Extraction failed: {}", e),
        }

        // Binding failures depend on the machine, not on the bytes.
        if !matches!(
            outcome,
            Err(PipelineError::PdfiumBindingFailed(_)) | Err(PipelineError::Internal(_))
        ) {
            self.lock_cache().insert(key, outcome.clone());
        }
        outcome
    }

    fn lock_cache(&self) -> MutexGuard<'_, ExtractionCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn check_magic(bytes: &[u8]) -> Result<(), PipelineError> {
    let window = &bytes[..bytes.len().min(MAGIC_SEARCH_WINDOW)];
    if !window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
        let head = &bytes[..bytes.len().min(PDF_MAGIC.len())];
        debug!("Not a PDF file (first bytes: {:?})", head);
        return Err(PipelineError::EncryptedDocument);
    }
    Ok(())
}

/// Map a backend outcome onto the extraction error taxonomy.
fn classify(parsed: Result<Vec<String>, BackendFailure>) -> Result<Extraction, PipelineError> {
    let pages = match parsed {
        Ok(pages) => pages,
        Err(BackendFailure::Unavailable(detail)) => {
            return Err(PipelineError::PdfiumBindingFailed(detail))
        }
        Err(BackendFailure::Open(detail)) => {
            if mentions_password(&detail) {
                debug!("Document is password-protected: {}", detail);
            } else {
                debug!("Document could not be parsed: {}", detail);
            }
            return Err(PipelineError::EncryptedDocument);
        }
        Err(BackendFailure::Page { page, detail }) => {
            return Err(PipelineError::ExtractionFailed {
                detail: format!("page {page}: {detail}"),
            })
        }
    };

    let page_count = pages.len();
    let text = pages.concat();
    if text.trim().is_empty() {
        return Err(PipelineError::NoExtractableText);
    }
    Ok(Extraction { text, page_count })
}

fn mentions_password(detail: &str) -> bool {
    let lower = detail.to_lowercase();
    ["password", "security", "encrypt"]
        .iter()
        .any(|needle| lower.contains(needle))
}

// ── Content-keyed cache ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ContentKey {
    len: usize,
    hash: u64,
}

impl ContentKey {
    fn of(bytes: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Self {
            len: bytes.len(),
            hash: hasher.finish(),
        }
    }
}

type Outcome = Result<Arc<Extraction>, PipelineError>;

struct ExtractionCache {
    capacity: usize,
    entries: HashMap<ContentKey, Outcome>,
    order: VecDeque<ContentKey>,
}

impl ExtractionCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: &ContentKey) -> Option<Outcome> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: ContentKey, outcome: Outcome) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key, outcome).is_none() {
            self.order.push_back(key);
        }
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeBackend {
        calls: AtomicUsize,
        outcome: Result<Vec<String>, BackendFailure>,
    }

    impl FakeBackend {
        fn new(outcome: Result<Vec<String>, BackendFailure>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                outcome,
            })
        }

        fn pages(pages: &[&str]) -> Arc<Self> {
            Self::new(Ok(pages.iter().map(|p| p.to_string()).collect()))
        }
    }

    impl PdfBackend for FakeBackend {
        fn page_texts(&self, _bytes: &[u8]) -> Result<Vec<String>, BackendFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn pdf(body: &str) -> Vec<u8> {
        format!("%PDF-1.7\n{body}").into_bytes()
    }

    fn extractor(backend: Arc<FakeBackend>) -> Extractor {
        Extractor::new(backend, &PipelineConfig::default())
    }

    #[test]
    fn pages_concatenate_in_order() {
        let ex = extractor(FakeBackend::pages(&["one ", "two ", "three"]));
        let out = ex.extract_blocking(&pdf("a")).unwrap();
        assert_eq!(out.text, "one two three");
        assert_eq!(out.page_count, 3);
    }

    #[test]
    fn whitespace_only_is_no_text() {
        let ex = extractor(FakeBackend::pages(&["  \n", "\t"]));
        assert_eq!(
            ex.extract_blocking(&pdf("scan")).unwrap_err(),
            PipelineError::NoExtractableText
        );
    }

    #[test]
    fn zero_pages_is_no_text() {
        let ex = extractor(FakeBackend::pages(&[]));
        assert_eq!(
            ex.extract_blocking(&pdf("empty")).unwrap_err(),
            PipelineError::NoExtractableText
        );
    }

    #[test]
    fn password_failure_is_encrypted() {
        let ex = extractor(FakeBackend::new(Err(BackendFailure::Open(
            "PdfiumLibraryInternalError(PasswordError)".into(),
        ))));
        assert_eq!(
            ex.extract_blocking(&pdf("locked")).unwrap_err(),
            PipelineError::EncryptedDocument
        );
    }

    #[test]
    fn unparseable_document_is_reported_as_unreadable() {
        let ex = extractor(FakeBackend::new(Err(BackendFailure::Open(
            "PdfiumLibraryInternalError(FormatError)".into(),
        ))));
        assert_eq!(
            ex.extract_blocking(&pdf("broken")).unwrap_err(),
            PipelineError::EncryptedDocument
        );
    }

    #[test]
    fn page_failure_passes_message_through() {
        let ex = extractor(FakeBackend::new(Err(BackendFailure::Page {
            page: 2,
            detail: "PdfiumLibraryInternalError(PageError)".into(),
        })));
        match ex.extract_blocking(&pdf("torn")).unwrap_err() {
            PipelineError::ExtractionFailed { detail } => {
                assert!(detail.starts_with("page 2:"));
                assert!(detail.contains("PageError"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_magic_never_reaches_backend() {
        let backend = FakeBackend::pages(&["text"]);
        let ex = extractor(Arc::clone(&backend));
        let err = ex.extract_blocking(b"PK\x03\x04zip").unwrap_err();
        assert_eq!(err, PipelineError::EncryptedDocument);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn header_after_leading_junk_is_accepted() {
        let backend = FakeBackend::pages(&["body"]);
        let ex = extractor(Arc::clone(&backend));

        let mut bom = b"\xEF\xBB\xBF".to_vec();
        bom.extend(pdf("bom"));
        assert_eq!(ex.extract_blocking(&bom).unwrap().text, "body");

        let mut mail = b"From: scanner@example.org\r\n\r\n".to_vec();
        mail.extend(pdf("mail"));
        ex.extract_blocking(&mail).unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn header_beyond_search_window_is_rejected() {
        let backend = FakeBackend::pages(&["body"]);
        let ex = extractor(Arc::clone(&backend));
        let mut late = vec![b' '; MAGIC_SEARCH_WINDOW];
        late.extend(pdf("late"));
        assert_eq!(
            ex.extract_blocking(&late).unwrap_err(),
            PipelineError::EncryptedDocument
        );
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn identical_bytes_are_parsed_once() {
        let backend = FakeBackend::pages(&["cached"]);
        let ex = extractor(Arc::clone(&backend));
        let first = ex.extract_blocking(&pdf("same")).unwrap();
        let second = ex.extract_blocking(&pdf("same")).unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        ex.extract_blocking(&pdf("different")).unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failures_are_memoized_but_binding_errors_are_not() {
        let encrypted = FakeBackend::new(Err(BackendFailure::Open("password required".into())));
        let ex = extractor(Arc::clone(&encrypted));
        ex.extract_blocking(&pdf("x")).unwrap_err();
        ex.extract_blocking(&pdf("x")).unwrap_err();
        assert_eq!(encrypted.calls.load(Ordering::SeqCst), 1);

        let unbound = FakeBackend::new(Err(BackendFailure::Unavailable("no lib".into())));
        let ex = extractor(Arc::clone(&unbound));
        ex.extract_blocking(&pdf("x")).unwrap_err();
        ex.extract_blocking(&pdf("x")).unwrap_err();
        assert_eq!(unbound.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cache_evicts_oldest_first() {
        let backend = FakeBackend::pages(&["t"]);
        let config = PipelineConfig::builder()
            .extraction_cache_capacity(2)
            .build()
            .unwrap();
        let ex = Extractor::new(Arc::clone(&backend) as Arc<dyn PdfBackend>, &config);
        ex.extract_blocking(&pdf("a")).unwrap();
        ex.extract_blocking(&pdf("b")).unwrap();
        ex.extract_blocking(&pdf("c")).unwrap();
        assert_eq!(ex.cached_entries(), 2);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);

        // "a" was evicted, "c" is still cached.
        ex.extract_blocking(&pdf("c")).unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
        ex.extract_blocking(&pdf("a")).unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn zero_capacity_disables_cache() {
        let backend = FakeBackend::pages(&["t"]);
        let config = PipelineConfig::builder()
            .extraction_cache_capacity(0)
            .build()
            .unwrap();
        let ex = Extractor::new(Arc::clone(&backend) as Arc<dyn PdfBackend>, &config);
        ex.extract_blocking(&pdf("a")).unwrap();
        ex.extract_blocking(&pdf("a")).unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(ex.cached_entries(), 0);
    }

    #[tokio::test]
    async fn async_extract_uses_blocking_pool_and_cache() {
        let backend = FakeBackend::pages(&["async ", "text"]);
        let ex = extractor(Arc::clone(&backend));
        let bytes: Arc<[u8]> = pdf("async").into();
        let out = ex.extract(Arc::clone(&bytes)).await.unwrap();
        assert_eq!(out.text, "async text");
        ex.extract(bytes).await.unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }
}
