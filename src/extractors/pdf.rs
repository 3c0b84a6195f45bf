// src/extractors/pdf.rs
use crate::utils::error::ExtractError;
use pdf_extract::OutputError;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Turns a document on disk into plain text.
pub trait DocumentText: Send + Sync {
    fn text_of(&self, path: &Path) -> Result<String, ExtractError>;
}

/// `DocumentText` backed by the `pdf-extract` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfText;

impl PdfText {
    pub fn new() -> Self {
        Self
    }

    /// Extracts the text of an in-memory PDF, one page after another.
    ///
    /// `pdf_extract` panics on some malformed inputs instead of returning an
    /// error, so the call runs behind `catch_unwind`.
    pub fn text_from_bytes(bytes: &[u8]) -> Result<String, ExtractError> {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        }));

        let pages = match result {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => return Err(classify_pdf_error(&e)),
            Err(_) => {
                return Err(ExtractError::Malformed(
                    "PDF parser panicked on this document".to_string(),
                ))
            }
        };

        for (i, page) in pages.iter().enumerate() {
            tracing::debug!("Page {} yielded {} bytes of text", i + 1, page.len());
        }

        // Pages are joined on a newline so the last row of one page never
        // runs into the first row of the next
        Ok(pages.join("\n"))
    }
}

impl DocumentText for PdfText {
    fn text_of(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = std::fs::read(path)?;
        tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());
        Self::text_from_bytes(&bytes)
    }
}

fn classify_pdf_error(err: &OutputError) -> ExtractError {
    match err {
        // Wrong or missing password, unsupported security handler, broken /Encrypt
        OutputError::PdfError(pdf_extract::Error::Decryption(_)) => ExtractError::Encrypted,
        other => ExtractError::Unreadable(other.to_string()),
    }
}

/// Runs `source` on the blocking pool, giving up after `timeout`.
///
/// Each parse holds one of `permits` while it runs, and time spent waiting
/// for a permit counts against `timeout`. On timeout the blocking
/// task is left to finish on its own, still holding its permit; its result is
/// discarded.
pub async fn text_with_timeout(
    source: Arc<dyn DocumentText>,
    path: PathBuf,
    timeout: Duration,
    permits: Arc<Semaphore>,
) -> Result<String, ExtractError> {
    let run = async move {
        let permit = permits
            .acquire_owned()
            .await
            .map_err(|e| ExtractError::Task(e.to_string()))?;

        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            source.text_of(&path)
        });

        match task.await {
            Ok(result) => result,
            Err(join_err) => Err(ExtractError::Task(join_err.to_string())),
        }
    };

    match tokio::time::timeout(timeout, run).await {
        Ok(result) => result,
        Err(_) => Err(ExtractError::Timeout(timeout)),
    }
}
