//! System prompts for LLM-backed translation and summarization.
//!
//! Centralising every prompt here keeps the adapters free of prompt text and
//! lets unit tests inspect prompts without a live provider.

use crate::config::{GenerationParams, TargetLanguage};

/// System prompt for translating one chunk into `language`.
///
/// The source language is left to the model to detect.
pub fn translation_prompt(language: TargetLanguage) -> String {
    format!(
        r#"You are a professional translator.

Detect the language of the text you receive and translate it into {name} (ISO code "{code}").

Rules:
- Output ONLY the translated text. No preamble, no notes, no quotes.
- Preserve line breaks, numbering and punctuation.
- Keep proper nouns, code, URLs and numbers unchanged.
- If the text is already in {name}, return it unchanged.
- The text may start or end mid-sentence; translate exactly what is given."#,
        name = language.name(),
        code = language.code(),
    )
}

/// System prompt for summarizing one chunk with the given length bounds.
pub fn summary_prompt(params: &GenerationParams) -> String {
    format!(
        r#"You are a summarization model.

Write a concise summary of the text you receive, between {min} and {max} tokens long.

Rules:
- Output ONLY the summary as plain prose. No headings, no bullet points, no preamble.
- Keep the language of the source text.
- Keep the key facts, names and figures; drop examples and repetition.
- The text may be an excerpt that starts or ends mid-sentence."#,
        min = params.min_length,
        max = params.max_length,
    )
}
