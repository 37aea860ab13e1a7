//! HTTP server for the report transformer.
//!
//! The browser UI is a thin client over these endpoints; all processing
//! and archive state lives here.
//!
//! # API Endpoints
//!
//! | Method | Path                | Description                           |
//! |--------|---------------------|---------------------------------------|
//! | GET    | `/health`           | Health check                          |
//! | POST   | `/api/upload`       | Upload a billing export, get a report |
//! | GET    | `/api/files`        | List archived reports (newest first)  |
//! | GET    | `/api/files/{name}` | Download an archived report           |
//! | DELETE | `/api/files/{name}` | Delete a report (`?confirmed=true`)   |
//! | GET    | `/api/logs`         | SSE stream of processing logs         |

use axum::{
    extract::{Multipart, Path as UrlPath, Query},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, FilesResponse, UploadResponse};
use crate::error::{PipelineError, ReportError};
use crate::storage::{DeleteOutcome, ReportStore};
use crate::transform::pipeline::{process_bytes, ReportOptions};

/// Start the HTTP server.
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    // Permissive CORS: the review UI is served separately during development.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload_export))
        .route("/api/files", get(list_files))
        .route("/api/files/{name}", get(download_file).delete(delete_file))
        .route("/api/logs", get(sse_logs))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Trunkreport server running on http://localhost:{}", port);
    println!("   POST   /api/upload       - Upload billing export");
    println!("   GET    /api/files        - List archived reports");
    println!("   GET    /api/files/:name  - Download a report");
    println!("   DELETE /api/files/:name  - Delete a report");
    println!("   GET    /api/logs         - SSE log stream");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "trunkreport",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// SSE endpoint for real-time log streaming.
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint: runs the pipeline and archives the result.
async fn upload_export(
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, Json<Value>)> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        bad_request(format!("Multipart error: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            file_name = field.file_name().map(|s| s.to_string());
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("Read error: {}", e)))?
                    .to_vec(),
            );
        }
    }

    let bytes = file_data.ok_or_else(|| bad_request("No file provided".to_string()))?;
    let source_name = file_name.unwrap_or_else(|| "export.csv".to_string());

    println!("\n📄 NEW UPLOAD: {} ({} bytes)", source_name, bytes.len());

    let options = ReportOptions::from_env();

    let result = process_bytes(&bytes, &options).map_err(pipeline_status)?;

    let store = ReportStore::from_env();
    let stored = store
        .write(&result.rows, options.include_profit_percent, &source_name)
        .map_err(pipeline_status)?;

    println!("💾 Saved: {}", stored.name);

    Ok(Json(UploadResponse::from_outcome(result, stored)))
}

/// Archive listing, newest first.
async fn list_files() -> Result<Json<FilesResponse>, (StatusCode, Json<Value>)> {
    let store = ReportStore::from_env();
    let files = store
        .list()
        .map_err(|e| internal(format!("Cannot list output directory: {}", e)))?;
    Ok(Json(FilesResponse { files }))
}

/// Download one archived report.
async fn download_file(
    UrlPath(name): UrlPath<String>,
) -> Result<(HeaderMap, Vec<u8>), (StatusCode, Json<Value>)> {
    let store = ReportStore::from_env();
    let path = store
        .resolve(&name)
        .ok_or_else(|| not_found(&name))?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| internal(format!("Cannot read '{}': {}", name, e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", name))
        .map_err(|e| internal(format!("Invalid file name header: {}", e)))?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((headers, bytes))
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    #[serde(default)]
    confirmed: bool,
}

/// Guarded delete of one archived report.
async fn delete_file(
    UrlPath(name): UrlPath<String>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let store = ReportStore::from_env();
    let outcome = store
        .delete(&name, params.confirmed)
        .map_err(|e| internal(format!("Cannot delete '{}': {}", name, e)))?;

    match outcome {
        DeleteOutcome::Deleted => Ok(Json(json!({
            "status": "deleted",
            "message": format!("File '{}' deleted successfully.", name),
        }))),
        DeleteOutcome::NotConfirmed => Err(bad_request(
            "Deletion cancelled. Please confirm to delete.".to_string(),
        )),
        DeleteOutcome::NotFound => Err(not_found(&name)),
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Pipeline failures keep their message verbatim; business-rule errors are
/// the client's fault, everything else is ours.
fn pipeline_status(err: PipelineError) -> (StatusCode, Json<Value>) {
    let status = match &err {
        PipelineError::Report(ReportError::MissingColumns { .. })
        | PipelineError::Report(ReportError::EmptyAfterFilter) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::Csv(_) => StatusCode::BAD_REQUEST,
        PipelineError::Io(_) | PipelineError::Output(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    super::logs::log_error(err.to_string());
    (status, Json(error_response(&err.to_string())))
}

fn bad_request(message: String) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(error_response(&message)))
}

fn not_found(name: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(error_response(&format!("File not found: {}", name))),
    )
}

fn internal(message: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(error_response(&message)),
    )
}
