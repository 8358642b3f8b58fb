//! Model download and on-disk cache.
//!
//! Models are cached under `~/.cache/live-detect/models/`, named by a hash
//! of their source URL. A configured SHA-256 digest is checked both on
//! fresh downloads and on cache hits.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

/// Default timeout for establishing a connection.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from fetching or verifying a model file.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model download from {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

/// On-disk model cache.
#[derive(Debug, Clone)]
pub struct ModelCache {
    cache_dir: PathBuf,
}

impl ModelCache {
    /// Does not create the directory; `store` paths are created on demand.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// `~/.cache/live-detect/models/` (or `./.cache/...` without a home).
    pub fn with_default_dir() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("live-detect")
            .join("models");
        Self::new(cache_dir)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where the model for `url` lives (whether or not it exists yet).
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.onnx", Self::hash_key(url)))
    }

    /// Cached model for `url`, if present.
    pub fn get(&self, url: &str) -> Option<PathBuf> {
        let path = self.path_for(url);
        path.is_file().then_some(path)
    }

    /// Deterministic 32-hex-char key (first 16 bytes of SHA-256).
    pub fn hash_key(url: &str) -> String {
        let digest = Sha256::digest(url.as_bytes());
        hex::encode(&digest[..16])
    }
}

/// SHA-256 of a file, hex encoded.
pub async fn sha256_file(path: &Path) -> Result<String, FetchError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Compare against an expected digest (case-insensitive hex).
fn check_digest(path: &Path, expected: &str, actual: &str) -> Result<(), FetchError> {
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(FetchError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.trim().to_lowercase(),
            actual: actual.to_string(),
        })
    }
}

/// Verify a file against an expected SHA-256.
pub async fn verify_sha256(path: &Path, expected: &str) -> Result<(), FetchError> {
    let actual = sha256_file(path).await?;
    check_digest(path, expected, &actual)
}

/// Downloads models into a [`ModelCache`].
#[derive(Debug, Clone)]
pub struct ModelFetcher {
    http_client: reqwest::Client,
    cache: ModelCache,
}

impl ModelFetcher {
    pub fn new(cache: ModelCache) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { http_client, cache })
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    /// Return a local path for the model at `url`, downloading if needed.
    ///
    /// A cached copy that fails verification is discarded and downloaded
    /// again; a fresh download that fails verification is deleted.
    pub async fn fetch(&self, url: &str, sha256: Option<&str>) -> Result<PathBuf, FetchError> {
        if let Some(cached) = self.cache.get(url) {
            match sha256 {
                None => {
                    log::debug!("model cache hit: {}", cached.display());
                    return Ok(cached);
                }
                Some(expected) => match verify_sha256(&cached, expected).await {
                    Ok(()) => {
                        log::debug!("model cache hit (verified): {}", cached.display());
                        return Ok(cached);
                    }
                    Err(e) => {
                        log::warn!("discarding cached model: {}", e);
                        tokio::fs::remove_file(&cached).await?;
                    }
                },
            }
        }

        let dest = self.cache.path_for(url);
        log::info!("downloading model from {}", url);
        let actual = self.download(url, &dest).await?;

        if let Some(expected) = sha256 {
            if let Err(e) = check_digest(&dest, expected, &actual) {
                let _ = tokio::fs::remove_file(&dest).await;
                return Err(e);
            }
        }

        log::info!("model stored at {}", dest.display());
        Ok(dest)
    }

    /// Stream `url` to `dest`, returning the SHA-256 of the bytes written.
    ///
    /// Bytes go to a `.part` file first, renamed into place on success.
    async fn download(&self, url: &str, dest: &Path) -> Result<String, FetchError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.http_client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let partial = dest.with_extension("onnx.part");
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut hasher = Sha256::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(&partial).await;
                    return Err(e.into());
                }
            };
            hasher.update(&chunk);
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&partial, dest).await?;
        Ok(hex::encode(hasher.finalize()))
    }
}
