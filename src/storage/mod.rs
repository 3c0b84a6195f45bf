// src/storage/mod.rs
use crate::utils::error::StorageError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const FALLBACK_FILENAME: &str = "upload.pdf";

static UNSAFE_CHARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9._-]").expect("Failed to compile UNSAFE_CHARS_RE")
});

// Distinguishes uploads that arrive within the same millisecond
static STAGE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Reduces a client-supplied filename to a safe single path component.
pub fn sanitize_filename(filename: &str) -> String {
    // Only the last path segment counts, whichever separator the client used
    let base = filename.rsplit(['/', '\\']).next().unwrap_or("");
    let spaced: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    let cleaned = UNSAFE_CHARS_RE.replace_all(&spaced, "");
    let trimmed = cleaned.trim_start_matches(['.', '_']);

    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Owns the upload directory. Uploads are written here only for the duration
/// of one extraction.
#[derive(Debug, Clone)]
pub struct UploadStaging {
    base_dir: PathBuf,
}

impl UploadStaging {
    /// Creates a new UploadStaging, creating the directory if it doesn't exist
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
            tracing::info!("Created upload directory {}", base_path.display());
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Writes `bytes` to a fresh file in the upload directory. The file is
    /// removed when the returned guard is dropped.
    pub fn stage(&self, filename: &str, bytes: &[u8]) -> Result<StagedUpload, StorageError> {
        let seq = STAGE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let unique = format!(
            "{}_{}_{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%3f"),
            seq,
            sanitize_filename(filename)
        );
        let path = self.base_dir.join(unique);

        fs::write(&path, bytes).map_err(StorageError::IoError)?;
        tracing::debug!("Staged {} bytes at {}", bytes.len(), path.display());

        Ok(StagedUpload { path })
    }
}

/// A staged upload on disk. Dropping it deletes the file.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Removed staged upload {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove staged upload {}: {}", self.path.display(), e),
        }
    }
}
