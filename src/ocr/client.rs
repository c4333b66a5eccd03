//! HTTP client for the external OCR service.
//!
//! Speaks a small job-oriented JSON API:
//! - `POST {endpoint}/jobs` with the stored document reference
//! - `GET {endpoint}/jobs/{id}` for status
//! - `GET {endpoint}/jobs/{id}/lines?nextToken=...` for paginated blocks

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{JobPoll, LineBatch, OcrClient, OcrError};

/// Configuration for the OCR service endpoint.
#[derive(Debug, Clone)]
pub struct HttpOcrConfig {
    /// Base URL of the service, without a trailing slash.
    pub endpoint: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
}

/// reqwest-backed OCR service client.
pub struct HttpOcrClient {
    config: HttpOcrConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    document: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    job_id: String,
}

impl HttpOcrClient {
    pub fn new(config: HttpOcrConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn job_url(&self, job_ref: &str) -> String {
        format!(
            "{}/jobs/{}",
            self.config.endpoint.trim_end_matches('/'),
            job_ref
        )
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, OcrError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(OcrError::Service(format!("HTTP {}", status)));
        }
        resp.json::<T>()
            .await
            .map_err(|e| OcrError::Service(format!("invalid response: {}", e)))
    }
}

#[async_trait]
impl OcrClient for HttpOcrClient {
    async fn submit(&self, blob_ref: &str) -> Result<String, OcrError> {
        let url = format!("{}/jobs", self.config.endpoint.trim_end_matches('/'));
        let resp = self
            .authorize(self.client.post(&url))
            .json(&SubmitRequest { document: blob_ref })
            .send()
            .await
            .map_err(|e| OcrError::Service(e.to_string()))?;

        let parsed: SubmitResponse = Self::read_json(resp).await?;
        debug!(job_id = %parsed.job_id, "OCR job submitted");
        Ok(parsed.job_id)
    }

    async fn poll_status(&self, job_ref: &str) -> Result<JobPoll, OcrError> {
        let resp = self
            .authorize(self.client.get(self.job_url(job_ref)))
            .send()
            .await
            .map_err(|e| OcrError::Service(e.to_string()))?;

        Self::read_json(resp).await
    }

    async fn fetch_lines(
        &self,
        job_ref: &str,
        token: Option<&str>,
    ) -> Result<LineBatch, OcrError> {
        let url = format!("{}/lines", self.job_url(job_ref));
        let mut req = self.authorize(self.client.get(&url));
        if let Some(token) = token {
            req = req.query(&[("nextToken", token)]);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| OcrError::Service(e.to_string()))?;

        Self::read_json(resp).await
    }
}
