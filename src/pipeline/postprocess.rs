//! Post-processing: deterministic cleanup of LLM translation and summary text.
//!
//! Even well-prompted models occasionally wrap their answer in artefacts the
//! prompt forbids:
//!
//! - Wrapping output in ` ``` ... ``` ` fences
//! - Opening with a preamble such as "Here is the translation:"
//! - Windows-style `\r\n` line endings
//! - Zero-width characters and byte-order marks
//!
//! The rules here remove those without touching the content. They run only
//! inside the LLM-backed collaborators in [`crate::pipeline::llm`], never on
//! output from other backends.
//!
//! Fences and a leading heading are only artefacts when the source chunk did
//! not have them. A source that is itself a fenced block, or that opens with
//! a short `Heading:` line, keeps the corresponding part of the response.
//!
//! ## Rule Order
//!
//! Fences are stripped before the preamble check so a preamble inside the
//! fence is still found; invisible characters go last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a raw model response for the chunk `source`.
///
/// Rules (applied in order):
/// 1. Strip outer code fences, unless `source` is fenced too
/// 2. Normalise line endings (CRLF → LF)
/// 3. Drop a leading "Here is the translation:"-style preamble line, unless
///    `source` opens with a heading line of its own
/// 4. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
pub fn clean_response(input: &str, source: &str) -> String {
    let s = if is_fenced(source) {
        input.to_string()
    } else {
        strip_outer_fences(input)
    };
    let s = normalise_line_endings(&s);
    let s = if opens_with_heading(source) {
        s
    } else {
        strip_preamble(&s)
    };
    remove_invisible_chars(&s)
}

fn is_fenced(source: &str) -> bool {
    source.trim_start().starts_with("```")
}

/// Longest first line still treated as a heading.
const MAX_HEADING_CHARS: usize = 80;

/// Whether the first non-blank line of `source` is a short `Label:` line.
fn opens_with_heading(source: &str) -> bool {
    source
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.ends_with(':') && line.chars().count() <= MAX_HEADING_CHARS)
}

// ── Rule 1: Strip outer fences ───────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*\r?\n(.*?)\r?\n```\s*$").unwrap());

fn strip_outer_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Strip preamble ───────────────────────────────────────────────────
//
// Matches a short first line that only announces the answer, e.g.
// "Here is the translation:", "Here's a summary of the text:", "Translation:",
// "Summary:". The line must end with a colon so real content that happens to
// start with "Here is" survives.

static RE_PREAMBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:sure[,!.]?\s*)?here(?:'s|’s| is)\s+(?:the|a|your)\s+[^\n:]{0,60}|translation|translated text|summary)\s*:[ \t]*\n+",
    )
    .unwrap()
});

fn strip_preamble(input: &str) -> String {
    RE_PREAMBLE.replace(input, "").to_string()
}

// ── Rule 4: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Tests ────────────────────────────────────────────────────────────────────
