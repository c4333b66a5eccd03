//! Time-limited signed links to stored files.
//!
//! Result links must let a browser open the viewable copy without any
//! other authentication, but only for a bounded window. The signature
//! covers the blob key and the expiry timestamp; the file route
//! verifies it before serving. A `#page=N` fragment deep-links the
//! browser's PDF viewer to the matching page.

use chrono::Utc;
use sha2::{Digest, Sha256};

/// Signs and verifies expiring file URLs.
#[derive(Debug, Clone)]
pub struct UrlSigner {
    secret: String,
    public_url: String,
}

impl UrlSigner {
    /// `public_url` is the externally reachable base of this service,
    /// e.g. `http://localhost:8000`.
    pub fn new(secret: impl Into<String>, public_url: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            public_url: public_url.into(),
        }
    }

    /// Produce a signed URL for a stored file, valid for `expiry_secs`
    /// and deep-linked to `page`.
    pub fn sign(&self, file_location: &str, expiry_secs: u64, page: u32) -> String {
        let expires = Utc::now().timestamp() as u64 + expiry_secs;
        let sig = self.signature(file_location, expires);
        format!(
            "{}/files/{}?expires={}&sig={}#page={}",
            self.public_url.trim_end_matches('/'),
            file_location,
            expires,
            sig,
            page
        )
    }

    /// Check a signature produced by [`sign`](Self::sign) and that the
    /// link has not expired.
    pub fn verify(&self, file_location: &str, expires: u64, sig: &str) -> bool {
        if (Utc::now().timestamp() as u64) > expires {
            return false;
        }
        self.signature(file_location, expires) == sig
    }

    fn signature(&self, file_location: &str, expires: u64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b"|");
        hasher.update(file_location.as_bytes());
        hasher.update(b"|");
        hasher.update(expires.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}
