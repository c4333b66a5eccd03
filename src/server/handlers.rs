//! HTTP endpoint handlers.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::AppState;
use crate::error::ServiceError;

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServiceError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::IngestFailed(_) => StatusCode::BAD_GATEWAY,
            ServiceError::DocumentNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::OcrTimeout => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::OcrJobFailed(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Internal(err) => {
                // Full detail to the logs, generic message to the caller.
                tracing::error!("internal error: {:#}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

fn bad_request(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": { "kind": "bad_request", "message": message }
        })),
    )
        .into_response()
}

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    doc_id: String,
    message: &'static str,
}

/// Accept a multipart upload and start its OCR job.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut file: Option<(String, String, Vec<u8>)> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => file = Some((filename, content_type, bytes.to_vec())),
                    Err(err) => return bad_request(format!("unreadable file field: {}", err)),
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(err) => return bad_request(format!("invalid multipart body: {}", err)),
        }
    }

    let Some((filename, content_type, bytes)) = file else {
        return bad_request("missing \"file\" field".to_string());
    };

    match state.ingest.submit(&bytes, &filename, &content_type).await {
        Ok(doc_id) => Json(UploadResponse {
            doc_id,
            message: "Uploaded. OCR started.",
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ProcessParams {
    pub doc_id: String,
}

#[derive(Debug, Serialize)]
struct ProcessResponse {
    ok: bool,
    pages: usize,
}

/// Collect OCR results for a document and mark it ready.
///
/// Runs the aggregator's polling loop inline, so the response can take
/// up to the polling bound. The trigger is expected to retry on
/// failure; re-processing a ready document is a no-op rewrite.
pub async fn process_document(
    State(state): State<AppState>,
    Query(params): Query<ProcessParams>,
) -> Response {
    match state.ingest.finalize(&params.doc_id).await {
        Ok(pages) => Json(ProcessResponse { ok: true, pages }).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct AskParams {
    #[serde(default)]
    pub q: String,
}

/// Answer a free-text query over ready documents. Never errors.
pub async fn ask(
    State(state): State<AppState>,
    Query(params): Query<AskParams>,
) -> impl IntoResponse {
    Json(state.search.rank(&params.q))
}

#[derive(Debug, Deserialize)]
pub struct FileParams {
    #[serde(default)]
    pub expires: u64,
    #[serde(default)]
    pub sig: String,
}

/// Serve a stored file behind a signed, expiring link.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<FileParams>,
) -> Response {
    if !state.signer.verify(&path, params.expires, &params.sig) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": { "kind": "forbidden", "message": "invalid or expired link" }
            })),
        )
            .into_response();
    }

    match state.blobs.get(&path) {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.essence_str().to_string())],
                bytes,
            )
                .into_response()
        }
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": { "kind": "not_found", "message": "no such file" }
            })),
        )
            .into_response(),
    }
}
