//! LLM-backed collaborators: a [`Translator`] and a [`ModelLoader`] built on
//! `edgequake-llm` providers.
//!
//! All prompt text lives in [`crate::prompts`]; responses are cleaned with
//! [`postprocess::clean_response`]. Every call is bounded by
//! `api_timeout_secs` and an expired call is an ordinary
//! [`ProviderError::Timeout`]. Nothing is retried.
//!
//! ## Provider resolution
//!
//! From most-specific to least-specific:
//!
//! 1. `config.provider_name`
//! 2. `EDGEQUAKE_LLM_PROVIDER`
//! 3. the first provider whose API key is set (`OPENAI_API_KEY`,
//!    `ANTHROPIC_API_KEY`, `GEMINI_API_KEY`)
//!
//! The translator additionally falls back to `ProviderFactory::from_env()`,
//! which picks a model on its own; summarization always needs an explicit
//! model name, so the loader stops at step 3.

use crate::config::{GenerationParams, PipelineConfig, TargetLanguage};
use crate::error::{PipelineError, ProviderError};
use crate::pipeline::postprocess;
use crate::pipeline::summarize::{ModelLoader, SummarizationModel, SummaryOutput};
use crate::pipeline::translate::Translator;
use crate::prompts::{summary_prompt, translation_prompt};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Model used for translation when none is configured.
pub const DEFAULT_TRANSLATION_MODEL: &str = "gpt-4.1-nano";

/// API-key variables checked, in order, when no provider is named.
const PROVIDER_KEYS: [(&str, &str); 3] = [
    ("OPENAI_API_KEY", "openai"),
    ("ANTHROPIC_API_KEY", "anthropic"),
    ("GEMINI_API_KEY", "gemini"),
];

// ── Translation ──────────────────────────────────────────────────────────

/// Translates chunks through a chat completion.
pub struct LlmTranslator {
    provider: Arc<dyn LLMProvider>,
    label: String,
    timeout_secs: u64,
}

impl LlmTranslator {
    /// Wrap a pre-built provider. Useful in tests or with custom middleware.
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>, config: &PipelineConfig) -> Self {
        Self {
            provider,
            label: label.into(),
            timeout_secs: config.api_timeout_secs,
        }
    }

    /// Resolve the provider from config and environment.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let model = config
            .translation_model
            .as_deref()
            .unwrap_or(DEFAULT_TRANSLATION_MODEL);

        if let Some(name) = resolve_provider_name(config) {
            let provider = create_provider(&name, model).map_err(|detail| {
                PipelineError::ProviderNotConfigured {
                    provider: name.clone(),
                    hint: detail,
                }
            })?;
            return Ok(Self::new(provider, format!("{name}/{model}"), config));
        }

        let (provider, _embedding) =
            ProviderFactory::from_env().map_err(|e| PipelineError::ProviderNotConfigured {
                provider: "auto".to_string(),
                hint: format!(
                    "No LLM provider could be auto-detected from environment.\n\
                    Set OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY, or pass --provider.\n\
                    Error: {}",
                    e
                ),
            })?;
        Ok(Self::new(provider, "auto", config))
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    fn name(&self) -> &str {
        &self.label
    }

    async fn translate(&self, text: &str, target: TargetLanguage) -> Result<String, ProviderError> {
        let messages = vec![
            ChatMessage::system(translation_prompt(target)),
            ChatMessage::user(text),
        ];
        let options = CompletionOptions {
            temperature: Some(0.0),
            ..Default::default()
        };
        let raw = chat(&self.provider, &messages, &options, self.timeout_secs).await?;
        Ok(postprocess::clean_response(&raw, text))
    }
}

// ── Summarization ────────────────────────────────────────────────────────

/// Creates one [`LlmSummarizer`] per model name.
pub struct LlmModelLoader {
    provider_name: Option<String>,
    timeout_secs: u64,
}

impl LlmModelLoader {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            provider_name: resolve_provider_name(config),
            timeout_secs: config.api_timeout_secs,
        }
    }
}

#[async_trait]
impl ModelLoader for LlmModelLoader {
    /// Create the provider for `model_name` and send one tiny probe request,
    /// so an unknown model is reported at load time rather than on the
    /// first chunk.
    async fn load(&self, model_name: &str) -> Result<Arc<dyn SummarizationModel>, ProviderError> {
        let unavailable = |detail: String| ProviderError::ModelUnavailable {
            model: model_name.to_string(),
            detail,
        };

        let provider_name = self.provider_name.as_deref().ok_or_else(|| {
            unavailable(
                "no LLM provider configured; set OPENAI_API_KEY, ANTHROPIC_API_KEY, \
                 GEMINI_API_KEY or EDGEQUAKE_LLM_PROVIDER"
                    .to_string(),
            )
        })?;
        let provider = create_provider(provider_name, model_name).map_err(unavailable)?;

        let probe = [ChatMessage::user("Reply with OK.")];
        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(8),
            ..Default::default()
        };
        chat(&provider, &probe, &options, self.timeout_secs)
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        Ok(Arc::new(LlmSummarizer {
            provider,
            timeout_secs: self.timeout_secs,
        }))
    }
}

/// A loaded chat model used as a summarizer.
pub struct LlmSummarizer {
    provider: Arc<dyn LLMProvider>,
    timeout_secs: u64,
}

#[async_trait]
impl SummarizationModel for LlmSummarizer {
    async fn summarize(
        &self,
        text: &str,
        params: &GenerationParams,
    ) -> Result<Vec<SummaryOutput>, ProviderError> {
        let messages = vec![
            ChatMessage::system(summary_prompt(params)),
            ChatMessage::user(text),
        ];
        let options = build_summary_options(params);
        let raw = chat(&self.provider, &messages, &options, self.timeout_secs).await?;
        Ok(vec![SummaryOutput {
            summary_text: postprocess::clean_response(&raw, text),
        }])
    }
}

/// Map generation parameters onto completion options.
///
/// Sampling off means temperature 0; the max length caps output tokens.
fn build_summary_options(params: &GenerationParams) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(if params.do_sample { 0.7 } else { 0.0 }),
        max_tokens: Some(params.max_length),
        ..Default::default()
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn chat(
    provider: &Arc<dyn LLMProvider>,
    messages: &[ChatMessage],
    options: &CompletionOptions,
    timeout_secs: u64,
) -> Result<String, ProviderError> {
    let start = Instant::now();
    let response = timeout(
        Duration::from_secs(timeout_secs),
        provider.chat(messages, Some(options)),
    )
    .await
    .map_err(|_| ProviderError::Timeout { secs: timeout_secs })?
    .map_err(|e| ProviderError::api(format!("{}", e)))?;

    debug!(
        "{} input tokens, {} output tokens, {:?}",
        response.prompt_tokens,
        response.completion_tokens,
        start.elapsed()
    );
    Ok(response.content)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, String> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| format!("{e}"))
}

/// Pick a provider name from config, then environment.
fn resolve_provider_name(config: &PipelineConfig) -> Option<String> {
    if let Some(ref name) = config.provider_name {
        return Some(name.clone());
    }
    provider_name_from_env(|key| std::env::var(key).ok())
}

fn provider_name_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    let set = |key: &str| lookup(key).filter(|v| !v.is_empty());
    if let Some(name) = set("EDGEQUAKE_LLM_PROVIDER") {
        return Some(name);
    }
    PROVIDER_KEYS
        .iter()
        .find(|(key, _)| set(key).is_some())
        .map(|(_, name)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn explicit_provider_env_wins() {
        let lookup = env(&[
            ("EDGEQUAKE_LLM_PROVIDER", "ollama"),
            ("OPENAI_API_KEY", "sk-test"),
        ]);
        assert_eq!(provider_name_from_env(lookup).as_deref(), Some("ollama"));
    }

    #[test]
    fn first_api_key_picks_provider() {
        let lookup = env(&[("GEMINI_API_KEY", "g"), ("ANTHROPIC_API_KEY", "a")]);
        assert_eq!(provider_name_from_env(lookup).as_deref(), Some("anthropic"));
    }

    #[test]
    fn empty_values_are_ignored() {
        let lookup = env(&[("OPENAI_API_KEY", ""), ("EDGEQUAKE_LLM_PROVIDER", "")]);
        assert_eq!(provider_name_from_env(lookup), None);
    }

    #[test]
    fn config_provider_overrides_environment() {
        let config = PipelineConfig::builder()
            .provider_name("anthropic")
            .build()
            .unwrap();
        assert_eq!(resolve_provider_name(&config).as_deref(), Some("anthropic"));
    }

    #[test]
    fn summary_options_are_deterministic_by_default() {
        let opts = build_summary_options(&GenerationParams::default());
        assert_eq!(opts.temperature, Some(0.0));
        assert_eq!(opts.max_tokens, Some(150));
    }

    #[tokio::test]
    async fn loader_without_provider_reports_model_unavailable() {
        let loader = LlmModelLoader {
            provider_name: None,
            timeout_secs: 1,
        };
        match loader.load("gpt-4.1-nano").await {
            Err(ProviderError::ModelUnavailable { model, .. }) => assert_eq!(model, "gpt-4.1-nano"),
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("load should fail without a provider"),
        }
    }
}
