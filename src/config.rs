//! Runtime configuration.
//!
//! Settings come from CLI flags and `NOTEDEX_*` environment variables
//! (a `.env` file is loaded at startup). Collaborators are built once
//! from the resolved settings and injected; nothing reconfigures
//! itself mid-process.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::ocr::{Aggregator, HttpOcrClient, HttpOcrConfig, OcrClient};
use crate::repository::Repository;
use crate::signer::UrlSigner;
use crate::storage::BlobStore;

/// Default OCR status poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
/// Default bound on OCR status polls (with the interval: ~5 minutes).
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;

const DEFAULT_DATA_DIR: &str = "notedex-data";
const DEFAULT_OCR_ENDPOINT: &str = "http://127.0.0.1:9090";
const DEFAULT_PUBLIC_URL: &str = "http://127.0.0.1:8000";

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root for the blob store and the database file.
    pub data_dir: PathBuf,
    /// Base URL of the external OCR service.
    pub ocr_endpoint: String,
    /// Optional bearer token for the OCR service.
    pub ocr_api_key: Option<String>,
    /// Externally reachable base URL of this service, used in links.
    pub public_url: String,
    /// Secret for signing file links.
    pub signing_secret: String,
    /// OCR status poll interval.
    pub poll_interval: Duration,
    /// Bound on OCR status polls.
    pub max_poll_attempts: u32,
}

impl Settings {
    /// Resolve settings from the optional CLI data-dir override and
    /// the environment.
    pub fn resolve(data_dir: Option<PathBuf>) -> Self {
        let data_dir = data_dir
            .or_else(|| std::env::var("NOTEDEX_DATA_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let signing_secret = match std::env::var("NOTEDEX_SIGNING_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!(
                    "NOTEDEX_SIGNING_SECRET not set; file links use an insecure default"
                );
                "insecure-dev-secret".to_string()
            }
        };

        Self {
            data_dir,
            ocr_endpoint: std::env::var("NOTEDEX_OCR_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_OCR_ENDPOINT.to_string()),
            ocr_api_key: std::env::var("NOTEDEX_OCR_API_KEY").ok(),
            public_url: std::env::var("NOTEDEX_PUBLIC_URL")
                .unwrap_or_else(|_| DEFAULT_PUBLIC_URL.to_string()),
            signing_secret,
            poll_interval: Duration::from_secs(
                env_u64("NOTEDEX_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS),
            ),
            max_poll_attempts: env_u64(
                "NOTEDEX_MAX_POLL_ATTEMPTS",
                DEFAULT_MAX_POLL_ATTEMPTS as u64,
            ) as u32,
        }
    }

    /// Path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("notedex.db")
    }

    /// Ensure the data directory exists and open the metadata store.
    pub fn repository(&self) -> anyhow::Result<Repository> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(Repository::open(&self.db_path())?)
    }

    pub fn blob_store(&self) -> BlobStore {
        BlobStore::new(self.data_dir.join("blobs"))
    }

    pub fn url_signer(&self) -> UrlSigner {
        UrlSigner::new(self.signing_secret.clone(), self.public_url.clone())
    }

    pub fn ocr_client(&self) -> Arc<dyn OcrClient> {
        Arc::new(HttpOcrClient::new(HttpOcrConfig {
            endpoint: self.ocr_endpoint.clone(),
            api_key: self.ocr_api_key.clone(),
        }))
    }

    pub fn aggregator(&self, client: Arc<dyn OcrClient>) -> Aggregator {
        Aggregator::new(client, self.poll_interval, self.max_poll_attempts)
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
