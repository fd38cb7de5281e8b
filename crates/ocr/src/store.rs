use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error storing upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Where an uploaded image ended up.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoredUpload {
    /// SHA-256 of the uploaded bytes, lowercase hex.
    pub hash_hex: String,
    pub path: PathBuf,
}

/// Content-addressed store for uploaded label images.
/// Layout: `<root>/<first_2_hex_chars>/<full_hex>.<ext>`
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `data` under its content hash. Identical uploads map to the
    /// same path, so a repeat upload rewrites identical bytes.
    pub async fn save(&self, data: &[u8], ext: &str) -> Result<StoredUpload, StoreError> {
        let hash_hex = sha256_hex(data);
        let path = self.path_for(&hash_hex, ext);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        Ok(StoredUpload { hash_hex, path })
    }

    pub fn path_for(&self, hash_hex: &str, ext: &str) -> PathBuf {
        self.root
            .join(&hash_hex[..2])
            .join(format!("{hash_hex}.{ext}"))
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// File extension to store an upload under, taken from the client's
/// filename. Anything that is not a short alphanumeric suffix becomes `bin`.
pub fn upload_extension(filename: Option<&str>) -> String {
    filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string())
}
