// src/server/mod.rs
use crate::config::ServerConfig;
use crate::extractors::pdf::PdfText;
use crate::extractors::report::Record;
use crate::service::ReportService;
use crate::utils::error::{AppError, UploadError, ValidationError};
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, State};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Multipart field that carries the report.
const FILE_FIELD: &str = "file";

/// Builds the application router around a ready service.
pub fn router(service: Arc<ReportService>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Binds `config.bind` and serves until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), AppError> {
    // Upload directory is created here, once, before the first request
    let service = ReportService::new(&config, Arc::new(PdfText::new()))?;
    let app = router(Arc::new(service), config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(
        "Listening on http://{} (uploads staged in {}, limit {} bytes)",
        listener.local_addr()?,
        config.upload_dir.display(),
        config.max_upload_bytes
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

/// `POST /upload`: validate the `file` part by name before reading its bytes,
/// then extract the matching lab records.
async fn upload(
    State(service): State<Arc<ReportService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<Record>>, UploadError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::warn!("Upload is not a multipart request: {}", rejection.body_text());
        UploadError::from(ValidationError::MissingFile)
    })?;

    while let Some(field) = multipart.next_field().await.map_err(transport_error)? {
        // A part without a filename is a plain form value, not a file
        if field.name() != Some(FILE_FIELD) || field.file_name().is_none() {
            continue;
        }

        let filename = service.validate(field.file_name())?.to_string();
        let bytes = field.bytes().await.map_err(transport_error)?;
        tracing::info!("Received upload {} ({} bytes)", filename, bytes.len());

        let records = service.process(&filename, &bytes).await?;
        return Ok(Json(records));
    }

    // No part named "file" carried a filename
    Err(ValidationError::MissingFile.into())
}

fn transport_error(err: MultipartError) -> UploadError {
    UploadError::Transport {
        status: err.status(),
        message: err.body_text(),
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            // Full detail stays in the server log; the client only gets the message
            tracing::error!("Error processing file: {:?}", self);
        } else {
            tracing::warn!("Upload rejected with {}: {}", status, self);
        }

        let body = Json(serde_json::json!({ "message": self.to_string() }));
        (status, body).into_response()
    }
}
