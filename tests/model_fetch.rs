//! Integration tests for downloading models into the cache.
//!
//! Covers:
//! - First fetch downloads and stores the model
//! - Second fetch is served from the cache without a request
//! - Checksum mismatch deletes the downloaded file
//! - HTTP errors are reported with their status

use sha2::{Digest, Sha256};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use live_detect::model::{FetchError, ModelCache, ModelFetcher};

const MODEL_BYTES: &[u8] = b"not really an onnx graph";

async fn model_server(expected_requests: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/yolov8n.onnx"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(MODEL_BYTES))
        .expect(expected_requests)
        .mount(&server)
        .await;
    server
}

fn fetcher(dir: &TempDir) -> ModelFetcher {
    ModelFetcher::new(ModelCache::new(dir.path().join("models"))).unwrap()
}

fn digest() -> String {
    hex::encode(Sha256::digest(MODEL_BYTES))
}

#[tokio::test]
async fn test_download_then_cache_hit() {
    let server = model_server(1).await;
    let dir = TempDir::new().unwrap();
    let fetcher = fetcher(&dir);
    let url = format!("{}/yolov8n.onnx", server.uri());

    let first = fetcher.fetch(&url, Some(&digest())).await.unwrap();
    assert_eq!(std::fs::read(&first).unwrap(), MODEL_BYTES);
    assert_eq!(fetcher.cache().get(&url), Some(first.clone()));

    let second = fetcher.fetch(&url, Some(&digest())).await.unwrap();
    assert_eq!(first, second);
    // MockServer verifies the single-request expectation on drop
}

#[tokio::test]
async fn test_checksum_mismatch_removes_file() {
    let server = model_server(1).await;
    let dir = TempDir::new().unwrap();
    let fetcher = fetcher(&dir);
    let url = format!("{}/yolov8n.onnx", server.uri());

    let wrong = "0".repeat(64);
    let err = fetcher.fetch(&url, Some(&wrong)).await.unwrap_err();

    match err {
        FetchError::ChecksumMismatch {
            expected, actual, ..
        } => {
            assert_eq!(expected, wrong);
            assert_eq!(actual, digest());
        }
        other => panic!("expected checksum mismatch, got {:?}", other),
    }
    assert!(fetcher.cache().get(&url).is_none());
}

#[tokio::test]
async fn test_missing_model_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let fetcher = fetcher(&dir);
    let url = format!("{}/missing.onnx", server.uri());

    let err = fetcher.fetch(&url, None).await.unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 404, .. }));
    assert!(fetcher.cache().get(&url).is_none());
}

#[tokio::test]
async fn test_corrupt_cache_entry_is_replaced() {
    let server = model_server(1).await;
    let dir = TempDir::new().unwrap();
    let fetcher = fetcher(&dir);
    let url = format!("{}/yolov8n.onnx", server.uri());

    let stale = fetcher.cache().path_for(&url);
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, b"truncated").unwrap();

    let path = fetcher.fetch(&url, Some(&digest())).await.unwrap();
    assert_eq!(path, stale);
    assert_eq!(std::fs::read(&path).unwrap(), MODEL_BYTES);
}
