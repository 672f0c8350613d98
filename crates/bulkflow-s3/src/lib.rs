//! S3 upload for BulkFlow
//!
//! Uploads a single file or every file of a directory into an S3 bucket
//! through the BulkFlow pipeline, creating the bucket first when it does
//! not exist.
//!
//! # Example
//!
//! ```ignore
//! use bulkflow_s3::{LocalFileSource, S3Config, S3Uploader, UploadFile};
//! use bulkflow_core::PipelineConfig;
//! use std::sync::Arc;
//!
//! let uploader = S3Uploader::connect(&S3Config::new("my-bucket", "sa-east-1")).await?;
//! uploader.ensure_bucket().await?;
//!
//! let source = LocalFileSource::new("./dist").recursive(true);
//! let action = UploadFile::new(Arc::new(uploader));
//! let result = bulkflow_core::run(source, action, &PipelineConfig::default()).await?;
//! ```

pub mod client;
pub mod error;
pub mod upload;

pub use client::{BucketStatus, DEFAULT_REGION, S3Config, S3Uploader};
pub use error::{Result, S3Error};
pub use upload::{LocalFile, LocalFileSource, UploadFile, collect_files};
