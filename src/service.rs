// src/service.rs
use crate::config::ServerConfig;
use crate::extractors::pdf::{text_with_timeout, DocumentText};
use crate::extractors::report::{Record, ReportExtractor};
use crate::storage::UploadStaging;
use crate::utils::error::{StorageError, UploadError, ValidationError};
use crate::utils::validation::validate_upload;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Validate, stage, read and extract one uploaded report.
///
/// Shared by the HTTP handler and the `extract` command.
pub struct ReportService {
    extractor: ReportExtractor,
    source: Arc<dyn DocumentText>,
    staging: UploadStaging,
    allowed_extensions: Vec<String>,
    extract_timeout: Duration,
    parse_permits: Arc<Semaphore>,
}

impl ReportService {
    /// Creates the upload directory if needed; call once at startup.
    pub fn new(config: &ServerConfig, source: Arc<dyn DocumentText>) -> Result<Self, StorageError> {
        let staging = UploadStaging::new(&config.upload_dir)?;
        tracing::debug!(
            "Staging uploads in {}, keywords {:?}, up to {} parses at once",
            staging.base_dir().display(),
            config.keywords.keywords(),
            config.max_concurrent_parses
        );

        Ok(Self {
            extractor: ReportExtractor::new(config.keywords.clone()),
            source,
            staging,
            allowed_extensions: config.allowed_extensions.clone(),
            extract_timeout: config.extract_timeout,
            parse_permits: Arc::new(Semaphore::new(config.max_concurrent_parses)),
        })
    }

    pub fn validate<'a>(&self, filename: Option<&'a str>) -> Result<&'a str, ValidationError> {
        validate_upload(filename, &self.allowed_extensions).map_err(|e| {
            tracing::warn!("Rejected upload {:?}: {:?}", filename, e);
            e
        })
    }

    /// Runs extraction over an already validated upload. The staged copy is
    /// removed before this returns, whatever the outcome.
    pub async fn process(&self, filename: &str, bytes: &[u8]) -> Result<Vec<Record>, UploadError> {
        let staged = self.staging.stage(filename, bytes)?;

        let text = text_with_timeout(
            Arc::clone(&self.source),
            staged.path().to_path_buf(),
            self.extract_timeout,
            Arc::clone(&self.parse_permits),
        )
        .await?;
        tracing::debug!("Extracted {} characters of text from {}", text.chars().count(), filename);

        let records = self.extractor.extract(&text);
        tracing::info!("Found {} matching records in {}", records.len(), filename);

        Ok(records)
    }
}
