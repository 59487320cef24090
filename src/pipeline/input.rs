//! Input resolution: read a user-supplied path or URL into memory.
//!
//! Uploads are held as bytes, so a URL is downloaded straight into a buffer
//! and a local file is read whole. Whether the bytes are a readable PDF is
//! the extractor's call, not this module's.

use crate::error::PipelineError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A document read from disk or the network, ready for upload.
#[derive(Debug, Clone)]
pub struct LoadedInput {
    /// File name shown to the user and used as the document identity.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load `input`, downloading it first when it is a URL.
pub async fn load_input(input: &str, timeout_secs: u64) -> Result<LoadedInput, PipelineError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        load_local(Path::new(input)).await
    }
}

async fn load_local(path: &Path) -> Result<LoadedInput, PipelineError> {
    let not_found = || PipelineError::InputNotFound {
        path: path.to_path_buf(),
    };
    if !path.is_file() {
        return Err(not_found());
    }

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => not_found(),
        _ => PipelineError::Internal(format!("Failed to read '{}': {}", path.display(), e)),
    })?;

    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(LoadedInput {
        name: file_name(path),
        bytes,
    })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<LoadedInput, PipelineError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PipelineError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let map_send_err = |e: reqwest::Error| {
        if e.is_timeout() {
            PipelineError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            PipelineError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(map_send_err)?;
    if !response.status().is_success() {
        return Err(PipelineError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(map_send_err)?;
    info!("Downloaded {} bytes", bytes.len());

    Ok(LoadedInput {
        name: filename_from_url(url),
        bytes: bytes.to_vec(),
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Last path segment of `url` when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

/// Default output path for an action result: `<stem>.<suffix>.txt` next to
/// the input, or in the current directory for URLs.
pub fn default_output_path(input: &str, suffix: &str) -> PathBuf {
    let name = if is_url(input) {
        filename_from_url(input)
    } else {
        file_name(Path::new(input))
    };
    let stem = Path::new(&name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let file = format!("{stem}.{suffix}.txt");

    match Path::new(input).parent() {
        Some(dir) if !is_url(input) && !dir.as_os_str().is_empty() => dir.join(file),
        _ => PathBuf::from(file),
    }
}
