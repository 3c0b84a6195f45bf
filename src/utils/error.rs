// src/utils/error.rs
#![allow(dead_code)]
use axum::http::StatusCode;
use thiserror::Error;

// Define specific error types for different parts of the application

/// Upload rejected before any document content is read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No file part")]
    MissingFile,

    #[error("No selected file")]
    EmptyFilename,

    // The rejected filename is kept for server-side logs only
    #[error("File type not allowed")]
    DisallowedExtension(String),
}

/// The document could not be turned into text.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unreadable document: {0}")]
    Unreadable(String),

    #[error("Document is encrypted and cannot be read")]
    Encrypted,

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Text extraction timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Text extraction task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Everything that can go wrong while serving `POST /upload`.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Error processing file: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Error processing file: {0}")]
    Storage(#[from] StorageError),

    // Multipart decoding or body-limit failures raised by the transport
    #[error("{message}")]
    Transport { status: StatusCode, message: String },
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::Validation(_) => StatusCode::BAD_REQUEST,
            UploadError::Extraction(_) | UploadError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            UploadError::Transport { status, .. } => *status,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Invalid upload: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Upload(#[from] UploadError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
