//! S3 upload against an in-process fake S3 endpoint (path-style)

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{head, put};
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use bulkflow_core::{FailurePolicy, PipelineConfig};
use bulkflow_s3::{BucketStatus, LocalFileSource, S3Error, S3Uploader, UploadFile};
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct FakeS3 {
    /// bucket -> CreateBucket request body
    buckets: Arc<Mutex<HashMap<String, String>>>,
    /// (bucket, key, body length)
    objects: Arc<Mutex<Vec<(String, String, usize)>>>,
}

impl FakeS3 {
    fn with_bucket(self, bucket: &str) -> Self {
        self.buckets
            .lock()
            .unwrap()
            .insert(bucket.to_string(), String::new());
        self
    }

    fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(b, _, _)| b == bucket)
            .map(|(_, k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

async fn head_bucket(State(s3): State<FakeS3>, Path(bucket): Path<String>) -> StatusCode {
    if bucket == "forbidden" {
        return StatusCode::FORBIDDEN;
    }
    if s3.buckets.lock().unwrap().contains_key(&bucket) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn create_bucket(
    State(s3): State<FakeS3>,
    Path(bucket): Path<String>,
    body: Bytes,
) -> StatusCode {
    s3.buckets
        .lock()
        .unwrap()
        .insert(bucket, String::from_utf8_lossy(&body).to_string());
    StatusCode::OK
}

async fn put_object(
    State(s3): State<FakeS3>,
    Path((bucket, key)): Path<(String, String)>,
    body: Bytes,
) -> StatusCode {
    if !s3.buckets.lock().unwrap().contains_key(&bucket) {
        return StatusCode::NOT_FOUND;
    }
    s3.objects.lock().unwrap().push((bucket, key, body.len()));
    StatusCode::OK
}

async fn spawn_fake(s3: FakeS3) -> String {
    let app = Router::new()
        .route("/{bucket}", head(head_bucket).put(create_bucket))
        .route("/{bucket}/", head(head_bucket).put(create_bucket))
        .route("/{bucket}/{*key}", put(put_object))
        .with_state(s3);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn uploader(endpoint: &str, bucket: &str, region: &str) -> S3Uploader {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(Credentials::new("test", "test", None, None, "static"))
        .endpoint_url(endpoint)
        .force_path_style(true)
        .build();
    S3Uploader::from_client(aws_sdk_s3::Client::from_conf(config), bucket, region)
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
    fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
    fs::create_dir(dir.path().join("img")).unwrap();
    fs::write(dir.path().join("img").join("logo.svg"), "<svg/>").unwrap();
    dir
}

#[tokio::test]
async fn test_existing_bucket_is_not_recreated() {
    let s3 = FakeS3::default().with_bucket("site");
    let endpoint = spawn_fake(s3.clone()).await;

    let status = uploader(&endpoint, "site", "sa-east-1")
        .ensure_bucket()
        .await
        .unwrap();

    assert_eq!(status, BucketStatus::Existing);
    assert_eq!(s3.buckets.lock().unwrap()["site"], "");
}

#[tokio::test]
async fn test_missing_bucket_is_created_in_region() {
    let s3 = FakeS3::default();
    let endpoint = spawn_fake(s3.clone()).await;

    let status = uploader(&endpoint, "site", "sa-east-1")
        .ensure_bucket()
        .await
        .unwrap();

    assert_eq!(status, BucketStatus::Created);
    let body = s3.buckets.lock().unwrap()["site"].clone();
    assert!(body.contains("<LocationConstraint>sa-east-1</LocationConstraint>"));
}

#[tokio::test]
async fn test_us_east_1_bucket_has_no_location_constraint() {
    let s3 = FakeS3::default();
    let endpoint = spawn_fake(s3.clone()).await;

    uploader(&endpoint, "site", "us-east-1")
        .ensure_bucket()
        .await
        .unwrap();

    let body = s3.buckets.lock().unwrap()["site"].clone();
    assert!(!body.contains("LocationConstraint"));
}

#[tokio::test]
async fn test_forbidden_bucket_is_fatal() {
    let endpoint = spawn_fake(FakeS3::default()).await;

    let err = uploader(&endpoint, "forbidden", "sa-east-1")
        .ensure_bucket()
        .await
        .unwrap_err();

    assert!(matches!(err, S3Error::HeadBucket { ref bucket, .. } if bucket == "forbidden"));
}

#[tokio::test]
async fn test_upload_directory() {
    let s3 = FakeS3::default().with_bucket("site");
    let endpoint = spawn_fake(s3.clone()).await;
    let dir = fixture();

    let source = LocalFileSource::new(dir.path());
    let action = UploadFile::new(Arc::new(uploader(&endpoint, "site", "sa-east-1")));
    let config = PipelineConfig::default()
        .with_workers(2)
        .with_policy(FailurePolicy::BestEffort);

    let result = bulkflow_core::run(source, action, &config).await.unwrap();

    assert_eq!(result.succeeded, 2);
    assert!(result.is_success());
    assert_eq!(s3.keys("site"), vec!["app.js", "index.html"]);
}

#[tokio::test]
async fn test_upload_recursive_with_prefix() {
    let s3 = FakeS3::default().with_bucket("site");
    let endpoint = spawn_fake(s3.clone()).await;
    let dir = fixture();

    let source = LocalFileSource::new(dir.path())
        .recursive(true)
        .with_prefix(Some("v2".to_string()));
    let action = UploadFile::new(Arc::new(uploader(&endpoint, "site", "sa-east-1")));

    let result = bulkflow_core::run(source, action, &PipelineConfig::default())
        .await
        .unwrap();

    assert_eq!(result.succeeded, 3);
    assert_eq!(
        s3.keys("site"),
        vec!["v2/app.js", "v2/img/logo.svg", "v2/index.html"]
    );
}

#[tokio::test]
async fn test_upload_into_missing_bucket_fails_per_item() {
    let endpoint = spawn_fake(FakeS3::default()).await;
    let dir = fixture();

    let source = LocalFileSource::new(dir.path());
    let action = UploadFile::new(Arc::new(uploader(&endpoint, "gone", "sa-east-1")));
    let config = PipelineConfig::default()
        .with_workers(1)
        .with_policy(FailurePolicy::BestEffort);

    let result = bulkflow_core::run(source, action, &config).await.unwrap();

    assert_eq!(result.failed, 2);
    assert!(result.failures[0].error.to_string().contains("Couldn't upload"));
}
