//! S3 client wrapper
//!
//! Wraps one `aws_sdk_s3::Client` bound to a single bucket. The client is
//! shared by every upload worker of a run.

use crate::error::{Result, S3Error};
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_REGION: &str = "sa-east-1";

/// Region where a bucket is created without a location constraint
const US_EAST_1: &str = "us-east-1";

/// Connection settings for [`S3Uploader::connect`]
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,

    /// Shared config profile (None = default credential chain)
    pub profile: Option<String>,

    /// Custom endpoint for S3-compatible stores
    pub endpoint_url: Option<String>,

    pub force_path_style: bool,
}

impl S3Config {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            profile: None,
            endpoint_url: None,
            force_path_style: false,
        }
    }

    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    /// Use a custom endpoint; path-style addressing is enabled with it
    pub fn with_endpoint_url(mut self, endpoint_url: Option<String>) -> Self {
        self.force_path_style = endpoint_url.is_some();
        self.endpoint_url = endpoint_url;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(S3Error::InvalidConfig(
                "bucket name must not be empty".to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(S3Error::InvalidConfig("region must not be empty".to_string()));
        }
        Ok(())
    }
}

/// What [`S3Uploader::ensure_bucket`] found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    Existing,
    Created,
}

/// Uploads objects into one bucket
#[derive(Debug, Clone)]
pub struct S3Uploader {
    client: aws_sdk_s3::Client,
    bucket: String,
    region: String,
}

impl S3Uploader {
    /// Resolve AWS configuration and build the client
    pub async fn connect(config: &S3Config) -> Result<Self> {
        config.validate()?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint_url) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        Ok(Self::from_client(
            aws_sdk_s3::Client::from_conf(s3_config),
            config.bucket.clone(),
            config.region.clone(),
        ))
    }

    /// Wrap an already configured client
    pub fn from_client(
        client: aws_sdk_s3::Client,
        bucket: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// `HeadBucket`: Ok(false) only when S3 answers NotFound
    pub async fn bucket_exists(&self) -> Result<bool> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let err = err.into_service_error();
                if err.is_not_found() {
                    return Ok(false);
                }
                Err(S3Error::HeadBucket {
                    bucket: self.bucket.clone(),
                    message: DisplayErrorContext(&err).to_string(),
                })
            }
        }
    }

    /// Create the bucket, constrained to the configured region
    pub async fn create_bucket(&self) -> Result<()> {
        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if self.region != US_EAST_1 {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        request.send().await.map_err(|err| S3Error::CreateBucket {
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            message: DisplayErrorContext(&err).to_string(),
        })?;
        Ok(())
    }

    /// Create the bucket unless it already exists
    pub async fn ensure_bucket(&self) -> Result<BucketStatus> {
        if self.bucket_exists().await? {
            info!(bucket = %self.bucket, "Bucket exists and you already own it");
            return Ok(BucketStatus::Existing);
        }

        info!(bucket = %self.bucket, region = %self.region, "Bucket is available, creating it");
        self.create_bucket().await.inspect_err(|e| {
            warn!(bucket = %self.bucket, error = %e, "Bucket creation failed");
        })?;
        info!(bucket = %self.bucket, "Bucket created");
        Ok(BucketStatus::Created)
    }

    /// Upload one local file as `key`
    pub async fn put_file(&self, key: &str, path: &Path) -> Result<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| S3Error::ReadFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|err| S3Error::PutObject {
                key: key.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            })?;
        Ok(())
    }
}
