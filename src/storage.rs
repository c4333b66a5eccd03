//! Filesystem-backed blob store for document content.
//!
//! Keys are purpose-namespaced relative paths: the original upload
//! under `raw/`, the copy served to browsers under `viewable/`, and
//! per-page processed text under `text/`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Namespace for the processing copy handed to the OCR service.
pub const NS_RAW: &str = "raw";
/// Namespace for the viewable copy used in result links.
pub const NS_VIEWABLE: &str = "viewable";
/// Namespace for per-page processed text.
pub const NS_TEXT: &str = "text";

/// Blob store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store bytes under a namespaced key, creating parent directories.
    pub fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating blob directory for {}", key))?;
        }
        std::fs::write(&path, bytes).with_context(|| format!("writing blob {}", key))?;
        Ok(())
    }

    /// Read the bytes stored under a key.
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        std::fs::read(&path).with_context(|| format!("reading blob {}", key))
    }

    /// Whether a key currently exists.
    pub fn contains(&self, key: &str) -> bool {
        self.resolve(key).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Map a key to a path under the root, rejecting escapes.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            bail!("invalid blob key: {}", key);
        }
        Ok(self.root.join(relative))
    }
}

/// Build the stored object key for an uploaded document copy.
///
/// `{namespace}/{document_id}_{sanitized_filename}`
pub fn object_key(namespace: &str, document_id: &str, filename: &str) -> String {
    format!("{}/{}_{}", namespace, document_id, sanitize_filename(filename))
}

/// Build the stored object key for one page's processed text.
pub fn page_text_key(document_id: &str, page_number: u32) -> String {
    format!("{}/{}/page-{}.txt", NS_TEXT, document_id, page_number)
}

/// Replace path-hostile characters in a client-supplied filename.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
