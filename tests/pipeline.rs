//! Integration tests over the public API with in-process fakes.
//!
//! No pdfium library or API key is needed: the PDF backend, translator and
//! model loader are replaced by small recording fakes.

use async_trait::async_trait;
use edgequake_pdfdigest::{
    chunk_text, translate_text, Action, ActionKind, BackendFailure, DocumentState,
    GenerationParams, ModelLoader, PdfBackend, PipelineConfig, PipelineError,
    PipelineProgressCallback, ProgressCallback, ProviderError, Session, SummarizationModel,
    Summarizer, SummaryOutput, SummaryStage, TargetLanguage, Translator,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Interprets the bytes after `%PDF` as page text separated by form feeds.
/// A body starting with `locked` behaves like a password-protected file.
#[derive(Default)]
struct FormFeedPdf {
    parses: AtomicUsize,
}

impl PdfBackend for FormFeedPdf {
    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, BackendFailure> {
        self.parses.fetch_add(1, Ordering::SeqCst);
        let body = String::from_utf8_lossy(&bytes[4..]).into_owned();
        if body.starts_with("locked") {
            return Err(BackendFailure::Open(
                "PdfiumLibraryInternalError(PasswordError)".into(),
            ));
        }
        Ok(body.split('\u{c}').map(str::to_owned).collect())
    }
}

fn pdf(pages: &[&str]) -> Vec<u8> {
    let mut bytes = b"%PDF".to_vec();
    bytes.extend_from_slice(pages.join("\u{c}").as_bytes());
    bytes
}

/// Records every chunk and answers with a tagged copy.
#[derive(Default)]
struct RecordingTranslator {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl Translator for RecordingTranslator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn translate(&self, text: &str, target: TargetLanguage) -> Result<String, ProviderError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(text.to_string());
        Ok(format!("<{}#{}>", target.code(), calls.len()))
    }
}

/// Returns "part-N" for the N-th call, with padding to be trimmed.
#[derive(Default)]
struct NumberedSummaries {
    calls: AtomicUsize,
}

#[async_trait]
impl SummarizationModel for NumberedSummaries {
    async fn summarize(
        &self,
        _text: &str,
        params: &GenerationParams,
    ) -> Result<Vec<SummaryOutput>, ProviderError> {
        assert_eq!(
            *params,
            GenerationParams {
                max_length: 150,
                min_length: 30,
                do_sample: false
            }
        );
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(vec![SummaryOutput {
            summary_text: format!("  part-{n} \n"),
        }])
    }
}

#[derive(Default)]
struct CountingLoader {
    loads: Mutex<Vec<String>>,
    model: Arc<NumberedSummaries>,
}

#[async_trait]
impl ModelLoader for CountingLoader {
    async fn load(&self, name: &str) -> Result<Arc<dyn SummarizationModel>, ProviderError> {
        self.loads.lock().unwrap().push(name.to_string());
        if name == "no-such-model" {
            return Err(ProviderError::ModelUnavailable {
                model: name.to_string(),
                detail: "model not found".into(),
            });
        }
        Ok(Arc::clone(&self.model) as Arc<dyn SummarizationModel>)
    }
}

struct Harness {
    backend: Arc<FormFeedPdf>,
    translator: Arc<RecordingTranslator>,
    loader: Arc<CountingLoader>,
    session: Session,
}

fn harness(config: PipelineConfig) -> Harness {
    let backend = Arc::new(FormFeedPdf::default());
    let translator = Arc::new(RecordingTranslator::default());
    let loader = Arc::new(CountingLoader::default());
    let session = Session::new(
        config,
        Arc::clone(&backend) as Arc<dyn PdfBackend>,
        Arc::clone(&translator) as Arc<dyn Translator>,
        Arc::clone(&loader) as Arc<dyn ModelLoader>,
    );
    Harness {
        backend,
        translator,
        loader,
        session,
    }
}

// ── Chunking ─────────────────────────────────────────────────────────────────

#[test]
fn chunks_reconstruct_source_for_many_limits() {
    let text = "Ünïcödé text — with multibyte 字符 and emoji 🦀 mixed in. ".repeat(40);
    for limit in [1, 2, 3, 7, 64, 1024, 4500, 100_000] {
        let chunks = chunk_text(&text, limit);
        assert_eq!(chunks.concat(), text, "limit {limit}");
        assert!(chunks.iter().all(|c| c.chars().count() <= limit));
        let (last, rest) = chunks.split_last().unwrap();
        assert!(rest.iter().all(|c| c.chars().count() == limit));
        assert!(!last.is_empty());
    }
}

#[test]
fn chunk_edge_cases() {
    assert!(chunk_text("", 10).is_empty());
    assert_eq!(chunk_text("short", 10), vec!["short"]);
    assert_eq!(chunk_text("exactly10!", 10), vec!["exactly10!"]);
}

// ── Extraction through the session ───────────────────────────────────────────

#[tokio::test]
async fn text_bearing_pdf_is_ready() {
    let mut h = harness(PipelineConfig::default());
    let extraction = h
        .session
        .upload("doc.pdf", pdf(&["Page one. ", "Page two."]))
        .await
        .unwrap();
    assert_eq!(extraction.text, "Page one. Page two.");
    assert_eq!(extraction.page_count, 2);
    assert_eq!(h.session.char_count(), Some(19));
    assert!(h.session.can_run_actions());
}

#[tokio::test]
async fn image_only_pdf_has_no_text() {
    let mut h = harness(PipelineConfig::default());
    let err = h
        .session
        .upload("scan.pdf", pdf(&["", " \n ", "\t"]))
        .await
        .unwrap_err();
    assert_eq!(err, PipelineError::NoExtractableText);
    assert!(matches!(
        h.session.state(),
        Some(DocumentState::Failed(PipelineError::NoExtractableText))
    ));
}

#[tokio::test]
async fn password_protected_pdf_is_encrypted() {
    let mut h = harness(PipelineConfig::default());
    let err = h
        .session
        .upload("secret.pdf", pdf(&["locked"]))
        .await
        .unwrap_err();
    assert_eq!(err, PipelineError::EncryptedDocument);
    assert!(!h.session.can_run_actions());
}

#[tokio::test]
async fn identical_bytes_under_new_name_are_not_reparsed() {
    let mut h = harness(PipelineConfig::default());
    h.session.upload("a.pdf", pdf(&["same"])).await.unwrap();
    h.session.upload("b.pdf", pdf(&["same"])).await.unwrap();
    assert_eq!(h.backend.parses.load(Ordering::SeqCst), 1);
    assert_eq!(h.session.document().unwrap().name, "b.pdf");
}

// ── Translation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn nine_thousand_chars_make_two_ordered_calls() {
    let mut h = harness(PipelineConfig::default());
    let text = format!("{}{}", "a".repeat(4500), "b".repeat(4500));
    h.session.upload("long.pdf", pdf(&[&text])).await.unwrap();

    let result = h.session.translate(TargetLanguage::English).await.unwrap();
    assert_eq!(result.text, "<en#1><en#2>");
    assert_eq!(
        result.action,
        Action::Translate {
            language: TargetLanguage::English
        }
    );
    assert_eq!(result.stats.chunks, 2);

    let calls = h.translator.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], "a".repeat(4500));
    assert_eq!(calls[1], "b".repeat(4500));
}

#[tokio::test]
async fn translating_empty_string_makes_no_calls() {
    let t = RecordingTranslator::default();
    let out = translate_text(&t, "", TargetLanguage::German, &PipelineConfig::default())
        .await
        .unwrap();
    assert_eq!(out, "");
    assert!(t.calls.lock().unwrap().is_empty());
}

// ── Summarization ────────────────────────────────────────────────────────────

#[tokio::test]
async fn two_thousand_chars_make_two_calls_joined_by_one_space() {
    let mut h = harness(PipelineConfig::default());
    h.session
        .upload("paper.pdf", pdf(&[&"x".repeat(2048)]))
        .await
        .unwrap();

    let result = h.session.summarize(Some("fast")).await.unwrap();
    assert_eq!(result.text, "part-1 part-2");
    assert_eq!(result.stats.chunks, 2);
    assert_eq!(h.loader.model.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn same_model_name_loads_once() {
    let loader = Arc::new(CountingLoader::default());
    let summarizer = Summarizer::new(Arc::clone(&loader) as Arc<dyn ModelLoader>);
    let config = PipelineConfig::default();

    summarizer.model("gpt-4.1-nano", &config).await.unwrap();
    summarizer.model("gpt-4.1-nano", &config).await.unwrap();
    assert_eq!(*loader.loads.lock().unwrap(), vec!["gpt-4.1-nano"]);
}

#[tokio::test]
async fn unknown_model_is_a_load_failure() {
    let mut h = harness(PipelineConfig::default());
    h.session.upload("doc.pdf", pdf(&["text"])).await.unwrap();
    let err = h.session.summarize(Some("no-such-model")).await.unwrap_err();
    match err {
        PipelineError::SummarizationFailed { model, stage, .. } => {
            assert_eq!(model, "no-such-model");
            assert_eq!(stage, SummaryStage::ModelLoad);
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(h.session.result().is_none());
    assert!(h.session.can_run_actions());
}

// ── Session transitions ──────────────────────────────────────────────────────

#[tokio::test]
async fn clear_result_keeps_extracted_text() {
    let mut h = harness(PipelineConfig::default());
    h.session.upload("doc.pdf", pdf(&["keep me"])).await.unwrap();
    h.session.translate(TargetLanguage::French).await.unwrap();
    assert!(h.session.result().is_some());

    h.session.clear_result();
    assert!(h.session.result().is_none());
    assert_eq!(h.session.extracted_text(), Some("keep me"));
    assert!(h.session.can_run_actions());
}

#[tokio::test]
async fn new_action_overwrites_result() {
    let mut h = harness(PipelineConfig::default());
    h.session.upload("doc.pdf", pdf(&["some text"])).await.unwrap();
    h.session.translate(TargetLanguage::Spanish).await.unwrap();
    h.session.summarize(None).await.unwrap();
    assert_eq!(h.session.result().unwrap().action.kind(), ActionKind::Summarize);
}

#[tokio::test]
async fn uploading_another_document_resets_result() {
    let mut h = harness(PipelineConfig::default());
    h.session.upload("one.pdf", pdf(&["first"])).await.unwrap();
    h.session.translate(TargetLanguage::Portuguese).await.unwrap();

    h.session.upload("two.pdf", pdf(&["second"])).await.unwrap();
    assert!(h.session.result().is_none());
    assert_eq!(h.session.extracted_text(), Some("second"));
}

// ── Progress events ──────────────────────────────────────────────────────────

#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<String>>,
}

impl PipelineProgressCallback for EventLog {
    fn on_extraction_complete(&self, char_count: usize) {
        self.events.lock().unwrap().push(format!("extracted {char_count}"));
    }

    fn on_action_start(&self, action: ActionKind, total_chunks: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("start {action} {total_chunks}"));
    }

    fn on_chunk_complete(&self, chunk: usize, total_chunks: usize, _output_len: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("chunk {chunk} of {total_chunks}"));
    }

    fn on_action_complete(&self, action: ActionKind, _total_chunks: usize) {
        self.events.lock().unwrap().push(format!("done {action}"));
    }
}

#[tokio::test]
async fn progress_reports_chunk_i_of_n() {
    let log = Arc::new(EventLog::default());
    let config = PipelineConfig::builder()
        .translation_chunk_chars(4)
        .progress_callback(Arc::clone(&log) as ProgressCallback)
        .build()
        .unwrap();
    let mut h = harness(config);
    h.session.upload("doc.pdf", pdf(&["abcdefghij"])).await.unwrap();
    h.session.translate(TargetLanguage::German).await.unwrap();

    assert_eq!(
        *log.events.lock().unwrap(),
        vec![
            "extracted 10",
            "start translation 3",
            "chunk 1 of 3",
            "chunk 2 of 3",
            "chunk 3 of 3",
            "done translation",
        ]
    );
}
