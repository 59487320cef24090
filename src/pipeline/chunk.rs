//! Fixed-size text chunking ahead of the translation and summarization calls.
//!
//! Both external services cap their input size, so text is cut into
//! consecutive, non-overlapping slices of at most `max_chars` characters.
//! Characters are Unicode scalar values and slices always fall on `char`
//! boundaries, so concatenating the chunks in order yields the input exactly.

/// Split `text` into consecutive slices of at most `max_chars` characters.
///
/// * Empty input yields no chunks.
/// * Input of `max_chars` characters or fewer yields one chunk, the whole text.
/// * Only the last chunk may be shorter than `max_chars`.
///
/// A `max_chars` of zero is treated as one; configs are validated upstream.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<&str> {
    Chunks::new(text, max_chars).collect()
}

/// Lazy iterator behind [`chunk_text`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    max_chars: usize,
}

impl<'a> Chunks<'a> {
    pub fn new(text: &'a str, max_chars: usize) -> Self {
        Self {
            rest: text,
            max_chars: max_chars.max(1),
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let split_at = self
            .rest
            .char_indices()
            .nth(self.max_chars)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.rest.len());
        let (head, tail) = self.rest.split_at(split_at);
        self.rest = tail;
        Some(head)
    }
}

/// Number of chunks [`chunk_text`] would produce, without slicing.
pub fn chunk_count(text: &str, max_chars: usize) -> usize {
    text.chars().count().div_ceil(max_chars.max(1))
}
