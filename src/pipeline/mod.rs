//! Pipeline stages for extracting, translating and summarizing PDF text.
//!
//! Each submodule implements one step. External services sit behind traits
//! ([`extract::PdfBackend`], [`translate::Translator`],
//! [`summarize::ModelLoader`]) so every stage can be tested with fakes.
//!
//! ## Data Flow
//!
//! ```text
//!                              ┌──▶ translate ──┐
//! input ──▶ extract ──▶ chunk ─┤                ├──▶ result
//! (path/URL) (pdfium)          └──▶ summarize ──┘
//!                                    (llm + postprocess)
//! ```
//!
//! 1. [`input`]: read a local path or download a URL into memory
//! 2. [`extract`]: bytes to plain text with a content-hash cache; the
//!    pdfium work runs in `spawn_blocking`
//! 3. [`chunk`]: fixed-size character chunks, no overlap
//! 4. [`translate`] / [`summarize`]: chunk loops over the external
//!    collaborators, fail-fast
//! 5. [`llm`]: `edgequake-llm` implementations of those collaborators;
//!    responses go through [`postprocess`]

pub mod chunk;
pub mod extract;
pub mod input;
pub mod llm;
pub mod pdfium;
pub mod postprocess;
pub mod summarize;
pub mod translate;
