// src/config.rs
use crate::extractors::report::KeywordFilter;
use crate::utils::error::AppError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024; // 16 MiB
pub const DEFAULT_EXTRACT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_CONCURRENT_PARSES: usize = 4;
pub const ALLOWED_EXTENSIONS: [&str; 1] = ["pdf"];

/// Runtime settings for the upload service, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub extract_timeout: Duration,
    // Abandoned (timed-out) parses keep their slot until they finish
    pub max_concurrent_parses: usize,
    pub keywords: KeywordFilter,
    pub allowed_extensions: Vec<String>,
}

impl ServerConfig {
    pub fn new(
        bind: SocketAddr,
        upload_dir: PathBuf,
        max_upload_bytes: usize,
        extract_timeout_secs: u64,
        max_concurrent_parses: usize,
    ) -> Result<Self, AppError> {
        if max_upload_bytes == 0 {
            return Err(AppError::Config("max upload size must be greater than zero".to_string()));
        }
        if extract_timeout_secs == 0 {
            return Err(AppError::Config("extraction timeout must be at least one second".to_string()));
        }
        if max_concurrent_parses == 0 {
            return Err(AppError::Config("at least one concurrent parse must be allowed".to_string()));
        }
        if upload_dir.as_os_str().is_empty() {
            return Err(AppError::Config("upload directory must not be empty".to_string()));
        }

        Ok(Self {
            bind,
            upload_dir,
            max_upload_bytes,
            extract_timeout: Duration::from_secs(extract_timeout_secs),
            max_concurrent_parses,
            ..Self::default()
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            extract_timeout: Duration::from_secs(DEFAULT_EXTRACT_TIMEOUT_SECS),
            max_concurrent_parses: DEFAULT_MAX_CONCURRENT_PARSES,
            keywords: KeywordFilter::default(),
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}
