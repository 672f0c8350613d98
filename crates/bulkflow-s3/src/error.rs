//! S3 error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum S3Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Cannot access bucket {bucket}: {message}")]
    HeadBucket { bucket: String, message: String },

    #[error("Couldn't create bucket {bucket} in region {region}: {message}")]
    CreateBucket {
        bucket: String,
        region: String,
        message: String,
    },

    #[error("Couldn't read {path}: {message}")]
    ReadFile { path: PathBuf, message: String },

    #[error("Couldn't upload {key}: {message}")]
    PutObject { key: String, message: String },

    #[error("Couldn't list {path}: {message}")]
    ListDir { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, S3Error>;
