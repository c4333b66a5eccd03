//! Web server exposing the ingestion and query API.
//!
//! Endpoints:
//! - `POST /upload` - multipart upload, starts OCR
//! - `POST /process?doc_id=` - finalize a document's OCR results
//! - `GET /ask?q=` - rank pages against a free-text query
//! - `GET /files/*path` - serve a stored file behind a signed link
//! - `GET /health` - liveness probe

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::search::SearchEngine;
use crate::services::IngestService;
use crate::signer::UrlSigner;
use crate::storage::BlobStore;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestService>,
    pub search: Arc<SearchEngine>,
    pub blobs: Arc<BlobStore>,
    pub signer: Arc<UrlSigner>,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let repo = Arc::new(settings.repository()?);
        let blobs = Arc::new(settings.blob_store());
        let signer = Arc::new(settings.url_signer());
        let ocr = settings.ocr_client();
        let aggregator = settings.aggregator(ocr.clone());

        Ok(Self {
            ingest: Arc::new(IngestService::new(
                repo.clone(),
                blobs.clone(),
                ocr,
                aggregator,
            )),
            search: Arc::new(SearchEngine::new(repo, signer.clone())),
            blobs,
            signer,
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::models::{Document, DocumentStatus, Page};
    use crate::ocr::{JobPoll, JobStatus, LineBatch, OcrClient, OcrError};
    use crate::repository::Repository;
    use crate::search::SearchEngine;
    use crate::services::IngestService;

    struct IdleOcr;

    #[async_trait::async_trait]
    impl OcrClient for IdleOcr {
        async fn submit(&self, _blob_ref: &str) -> Result<String, OcrError> {
            Ok("job-1".to_string())
        }
        async fn poll_status(&self, _job_ref: &str) -> Result<JobPoll, OcrError> {
            Ok(JobPoll {
                status: JobStatus::Succeeded,
                message: None,
            })
        }
        async fn fetch_lines(
            &self,
            _job_ref: &str,
            _token: Option<&str>,
        ) -> Result<LineBatch, OcrError> {
            Ok(LineBatch {
                blocks: Vec::new(),
                next_token: None,
            })
        }
    }

    fn setup_test_app() -> (axum::Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let repo = Arc::new(Repository::open(&dir.path().join("test.db")).unwrap());
        let blobs = Arc::new(BlobStore::new(dir.path().join("blobs")));
        let signer = Arc::new(UrlSigner::new("test-secret", "http://localhost:8000"));
        let ocr: Arc<dyn OcrClient> = Arc::new(IdleOcr);
        let aggregator = crate::ocr::Aggregator::new(ocr.clone(), Duration::from_millis(1), 3);

        let state = AppState {
            ingest: Arc::new(IngestService::new(
                repo.clone(),
                blobs.clone(),
                ocr,
                aggregator,
            )),
            search: Arc::new(SearchEngine::new(repo, signer.clone())),
            blobs,
            signer,
        };

        (create_router(state), dir)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = setup_test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_ask_empty_corpus() {
        let (app, _dir) = setup_test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ask?q=what%20is%20osmosis")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["answer"], "No notes indexed yet.");
        assert_eq!(json["sources"].as_array().unwrap().len(), 0);
    }

    fn multipart_upload(content_type: &str, payload: &[u8]) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notes.pdf\"\r\nContent-Type: {}\r\n\r\n",
                boundary, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_type() {
        let (app, _dir) = setup_test_app();
        let response = app
            .oneshot(multipart_upload("text/html", b"<html></html>"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let json = body_json(response).await;
        assert_eq!(json["error"]["kind"], "unsupported_media_type");
    }

    #[tokio::test]
    async fn test_upload_accepts_pdf() {
        let (app, _dir) = setup_test_app();
        let response = app
            .oneshot(multipart_upload("application/pdf", b"%PDF-1.4 fake"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["doc_id"].as_str().unwrap().len() > 10);
        assert_eq!(json["message"], "Uploaded. OCR started.");
    }

    #[tokio::test]
    async fn test_process_unknown_document() {
        let (app, _dir) = setup_test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/process?doc_id=nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["kind"], "document_not_found");
    }

    #[tokio::test]
    async fn test_files_route_requires_valid_signature() {
        let (app, dir) = setup_test_app();
        let blobs = BlobStore::new(dir.path().join("blobs"));
        blobs.put("viewable/d1_notes.pdf", b"pdf bytes").unwrap();

        // Bad signature: forbidden.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/files/viewable/d1_notes.pdf?expires=99999999999&sig=bogus")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Signed link from the engine's signer: served.
        let signer = UrlSigner::new("test-secret", "http://localhost:8000");
        let url = signer.sign("viewable/d1_notes.pdf", 60, 1);
        let path_and_query = url
            .strip_prefix("http://localhost:8000")
            .unwrap()
            .split('#')
            .next()
            .unwrap()
            .to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .uri(path_and_query)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"]
                .to_str()
                .unwrap(),
            "application/pdf"
        );
    }

    #[tokio::test]
    async fn test_ask_returns_ranked_sources() {
        let (app, dir) = setup_test_app();
        let repo = Repository::open(&dir.path().join("test.db")).unwrap();
        let mut doc = Document::new(
            "d1".to_string(),
            "bio.pdf".to_string(),
            "viewable/d1_bio.pdf".to_string(),
        );
        doc.start_ocr("job-1".to_string());
        repo.insert_document(&doc).unwrap();
        repo.upsert_page(&Page::new(
            "d1".to_string(),
            1,
            "Osmosis moves water across a semipermeable membrane.".to_string(),
            92.0,
            doc.file_location.clone(),
        ))
        .unwrap();
        repo.advance_status("d1", DocumentStatus::Ready).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ask?q=what%20is%20osmosis")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let sources = json["sources"].as_array().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0]["page"], 1);
        assert!(sources[0]["url"]
            .as_str()
            .unwrap()
            .ends_with("#page=1"));
    }
}
