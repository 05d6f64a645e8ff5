//! HTTP surface: upload and URL endpoints over a shared [`ReportService`].
//!
//! | Route | Body | Success |
//! |-------|------|---------|
//! | `POST /api/upload` | multipart, field `file` | `{summary, report_path}` |
//! | `POST /api/url-to-report` | JSON `{url}` | `{summary, report_path}` |
//! | `GET /health` | — | `{status: "ok"}` |
//!
//! Every failure answers `{error}` with a status derived from
//! [`ReportError::kind`].

use crate::error::{FailureKind, ReportError};
use crate::output::ReportOutput;
use crate::summarize::ReportService;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

impl ReportError {
    /// HTTP status reported for this failure.
    pub fn status_code(&self) -> StatusCode {
        match (self.kind(), self) {
            (_, ReportError::UnsupportedFormat { .. }) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            (FailureKind::Rejected, _) => StatusCode::BAD_REQUEST,
            (FailureKind::Fetch, _) | (FailureKind::Upstream, _) => StatusCode::BAD_GATEWAY,
            (FailureKind::Internal, _) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_expected() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Build the application router.
pub fn router(service: Arc<ReportService>) -> Router {
    let upload_limit = service.config().max_upload_bytes;

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/upload",
            post(upload_handler).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/url-to-report", post(url_handler))
        .layer(trace_layer)
        .with_state(service)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(service: Arc<ReportService>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

#[tracing::instrument(skip(service, multipart))]
async fn upload_handler(
    State(service): State<Arc<ReportService>>,
    mut multipart: Multipart,
) -> Result<Json<ReportOutput>, ReportError> {
    let (file_name, data) = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ReportError::InvalidRequest(format!("Failed to read multipart: {}", e)))?
            .ok_or_else(|| ReportError::InvalidRequest("No file part".into()))?;
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ReportError::InvalidRequest(format!("Failed to read file: {}", e)))?;
        break (file_name, data);
    };

    tracing::debug!(file_name = %file_name, bytes = data.len(), "File received");
    let output = service.summarize_upload(&file_name, &data).await?;
    Ok(Json(output))
}

#[tracing::instrument(skip(service, payload))]
async fn url_handler(
    State(service): State<Arc<ReportService>>,
    payload: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<ReportOutput>, ReportError> {
    let Json(request) =
        payload.map_err(|e| ReportError::InvalidRequest(e.body_text()))?;
    tracing::debug!(url = %request.url, "URL received");
    let output = service.summarize_url(&request.url).await?;
    Ok(Json(output))
}
