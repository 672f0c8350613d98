//! S3 upload: the local file source and the upload action

use crate::client::S3Uploader;
use crate::error::{Result, S3Error};
use async_trait::async_trait;
use bulkflow_core::{ActionError, ListingError, RemoteAction, WorkSource};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A local file and the object key it is uploaded as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub key: String,
}

impl fmt::Display for LocalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Object key for `relative`, joined with `/` and optionally prefixed
fn object_key(prefix: Option<&str>, relative: &Path) -> String {
    let key = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    match prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}/{}", prefix, key),
        None => key,
    }
}

/// Collect the files to upload from `path`
///
/// A single file yields itself, keyed by its file name. A directory yields
/// its regular files sorted by path, keyed by their path relative to the
/// directory; subdirectories are walked only when `recursive` is set.
/// Symlinks are followed. Entries that cannot be read (dangling links,
/// permission errors, link cycles) are skipped with a warning.
pub fn collect_files(path: &Path, recursive: bool, prefix: Option<&str>) -> Result<Vec<LocalFile>> {
    if !path.exists() {
        return Err(S3Error::PathNotFound(path.to_path_buf()));
    }
    let root = path.canonicalize().map_err(|e| S3Error::ListDir {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if !root.is_dir() {
        let name = root
            .file_name()
            .map(PathBuf::from)
            .ok_or_else(|| S3Error::InvalidConfig(format!("{} has no file name", root.display())))?;
        return Ok(vec![LocalFile {
            key: object_key(prefix, &name),
            path: root,
        }]);
    }

    let mut paths = walk(&root, recursive)?;
    paths.sort();

    Ok(paths
        .into_iter()
        .map(|path| {
            let relative = path.strip_prefix(&root).unwrap_or(&path).to_path_buf();
            LocalFile {
                key: object_key(prefix, &relative),
                path,
            }
        })
        .collect())
}

fn walk(root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut walker = WalkDir::new(root).min_depth(1).follow_links(true);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut paths = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // The root itself is unreadable
            Err(e) if e.depth() == 0 => {
                return Err(S3Error::ListDir {
                    path: root.to_path_buf(),
                    message: e.to_string(),
                });
            }
            Err(e) => {
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                match e.loop_ancestor() {
                    Some(ancestor) => warn!(
                        path = %path,
                        ancestor = %ancestor.display(),
                        "Skipping symlink loop"
                    ),
                    None => warn!(path = %path, error = %e, "Skipping unreadable entry"),
                }
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_file() {
            paths.push(entry.into_path());
        } else if file_type.is_dir() {
            if !recursive {
                debug!(path = %entry.path().display(), "Skipping subdirectory");
            }
        } else {
            warn!(path = %entry.path().display(), "Skipping non-regular file");
        }
    }
    Ok(paths)
}

/// Lists the files under a path, see [`collect_files`]
pub struct LocalFileSource {
    path: PathBuf,
    recursive: bool,
    prefix: Option<String>,
    listed: bool,
}

impl LocalFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: false,
            prefix: None,
            listed: false,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }
}

#[async_trait]
impl WorkSource for LocalFileSource {
    type Item = LocalFile;

    fn name(&self) -> &str {
        "local-files"
    }

    async fn next_page(&mut self) -> std::result::Result<Option<Vec<LocalFile>>, ListingError> {
        if self.listed {
            return Ok(None);
        }
        self.listed = true;

        let path = self.path.clone();
        let recursive = self.recursive;
        let prefix = self.prefix.clone();
        let files = tokio::task::spawn_blocking(move || {
            collect_files(&path, recursive, prefix.as_deref())
        })
        .await
        .map_err(|e| ListingError::Request(format!("file listing task failed: {}", e)))?
        .map_err(|e| ListingError::page(1, e))?;

        debug!(path = %self.path.display(), files = files.len(), "Listed local files");
        Ok(Some(files).filter(|files| !files.is_empty()))
    }
}

/// Uploads one file into the uploader's bucket
pub struct UploadFile {
    uploader: Arc<S3Uploader>,
}

impl UploadFile {
    pub fn new(uploader: Arc<S3Uploader>) -> Self {
        Self { uploader }
    }
}

#[async_trait]
impl RemoteAction<LocalFile> for UploadFile {
    async fn apply(&self, file: &LocalFile) -> std::result::Result<String, ActionError> {
        self.uploader.put_file(&file.key, &file.path).await?;
        Ok(format!(
            "{} uploaded to s3://{}/{}",
            file.path.display(),
            self.uploader.bucket(),
            file.key
        ))
    }
}
