//! pdfium-backed [`PdfBackend`].
//!
//! A `Pdfium` handle is neither `Send` nor `Sync`, so each call binds its
//! own inside the blocking task that runs [`PdfiumBackend::page_texts`].
//! Lookup order:
//!
//! 1. `PDFIUM_LIB_PATH`: a library file or the directory that holds it
//! 2. the current directory
//! 3. the system library search path
//!
//! Documents are opened straight from the uploaded bytes. Each
//! `PdfDocument` is dropped at the end of [`PdfiumBackend::page_texts`],
//! which closes the pdfium handle on every return path.

use crate::pipeline::extract::{BackendFailure, PdfBackend};
use pdfium_render::prelude::*;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable pointing at an existing libpdfium.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Text extraction through the pdfium C++ library.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumBackend;

impl PdfiumBackend {
    pub fn new() -> Self {
        Self
    }

    /// Bind pdfium once without opening a document, surfacing a missing
    /// library before any upload.
    pub fn preload(&self) -> Result<(), BackendFailure> {
        bind_pdfium().map(|_| ())
    }
}

impl PdfBackend for PdfiumBackend {
    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, BackendFailure> {
        let pdfium = bind_pdfium()?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| BackendFailure::Open(format!("{:?}", e)))?;

        let pages = document.pages();
        debug!("PDF opened: {} pages", pages.len());

        let mut texts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let text = page.text().map_err(|e| BackendFailure::Page {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;
            texts.push(text.all());
        }

        Ok(texts)
    }
}

fn bind_pdfium() -> Result<Pdfium, BackendFailure> {
    let bindings = bind_library(std::env::var_os(PDFIUM_LIB_PATH_ENV))?;
    debug!("pdfium library bound");
    Ok(Pdfium::new(bindings))
}

fn bind_library(
    lib_path: Option<OsString>,
) -> Result<Box<dyn PdfiumLibraryBindings>, BackendFailure> {
    if let Some(path) = lib_path.filter(|p| !p.is_empty()) {
        let path = PathBuf::from(path);
        let lib = if path.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(&path)
        } else {
            path
        };
        return Pdfium::bind_to_library(&lib).map_err(|e| {
            BackendFailure::Unavailable(format!(
                "{PDFIUM_LIB_PATH_ENV}={}: {:?}",
                lib.display(),
                e
            ))
        });
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| BackendFailure::Unavailable(format!("{:?}", e)))
}
