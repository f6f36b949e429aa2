//! RemoteStore trait definition
//!
//! This trait defines the interface the mirroring engine needs from the
//! remote project-storage service. It allows the engine to be decoupled
//! from the HTTP client implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWrite;

use crate::error::Result;

/// Action links attached to a remote file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLinks {
    /// URL serving the file content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<String>,

    /// URL accepting a new version of the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<String>,

    /// URL deleting the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,
}

/// One file entry of a storage provider listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Service-side identifier
    pub id: String,

    /// Provider-relative path, possibly with a leading `/`
    pub path: String,

    /// Size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// MD5 checksum reported by the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,

    /// Action links
    #[serde(default)]
    pub links: FileLinks,
}

impl RemoteFile {
    /// Create a new RemoteFile with no size, checksum or links
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            size: None,
            md5: None,
            links: FileLinks::default(),
        }
    }
}

/// Trait for project-storage operations
///
/// Implemented by the OSF HTTP adapter and by in-memory fakes in tests.
/// Implementations must report a rejected login as
/// [`Error::Unauthorized`](crate::Error::Unauthorized).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Names of the storage providers attached to the project
    async fn list_providers(&self) -> Result<Vec<String>>;

    /// Every file stored in `provider`, recursively
    async fn list_files(&self, provider: &str) -> Result<Vec<RemoteFile>>;

    /// Stream the content of `file` into `writer`, returning the byte count
    async fn download(
        &self,
        file: &RemoteFile,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64>;

    /// Create `path` in `provider` from `source`.
    ///
    /// When the file already exists it is replaced only if `update` is set.
    async fn create_or_update(
        &self,
        provider: &str,
        path: &str,
        source: tokio::fs::File,
        update: bool,
    ) -> Result<()>;

    /// Delete a file
    async fn remove(&self, file: &RemoteFile) -> Result<()>;
}

/// Observer notified once per completed file transfer
#[cfg_attr(test, mockall::automock)]
pub trait TransferProgress {
    /// Record `delta` completed files
    fn inc(&self, delta: u64);
}

/// Progress sink that ignores every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl TransferProgress for NoProgress {
    fn inc(&self, _delta: u64) {}
}
