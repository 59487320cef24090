//! Result types produced by the pipeline and held by the session.

use crate::config::TargetLanguage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Plain text extracted from a PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Every page's text concatenated in page order.
    pub text: String,
    /// Number of pages read.
    pub page_count: usize,
}

impl Extraction {
    /// Length in Unicode scalar values, the unit the chunker counts in.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Which transformation an action runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Translate,
    Summarize,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Translate => f.write_str("translation"),
            ActionKind::Summarize => f.write_str("summary"),
        }
    }
}

/// The action that produced a [`ProcessingResult`], with its parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    Translate { language: TargetLanguage },
    Summarize { model: String },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Translate { .. } => ActionKind::Translate,
            Action::Summarize { .. } => ActionKind::Summarize,
        }
    }
}

/// Output of the most recently completed translate or summarize action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub action: Action,
    pub text: String,
    pub stats: ActionStats,
}

/// Per-action bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStats {
    /// Chunks sent to the external service.
    pub chunks: usize,
    /// Characters of input text.
    pub input_chars: usize,
    /// Characters of output text.
    pub output_chars: usize,
    /// Wall-clock time of the action.
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_count_counts_scalars_not_bytes() {
        let e = Extraction {
            text: "ação".into(),
            page_count: 1,
        };
        assert_eq!(e.char_count(), 4);
        assert_eq!(e.text.len(), 6);
    }

    #[test]
    fn action_serialises_with_tag() {
        let a = Action::Translate {
            language: TargetLanguage::German,
        };
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"{"action":"translate","language":"german"}"#);
        assert_eq!(a.kind(), ActionKind::Translate);
    }
}
