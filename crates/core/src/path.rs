//! Path normalization and storage selection
//!
//! Remote paths are `/`-separated and relative to a storage provider.
//! User-facing remote arguments have the format: [provider/]path
//! When the first segment is not a known provider, the default
//! provider (`osfstorage`) is assumed.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use crate::error::{Error, Result};

/// Provider used when a path carries no recognized provider prefix
pub const DEFAULT_PROVIDER: &str = "osfstorage";

/// Storage providers recognized as the first segment of a remote argument
pub const KNOWN_PROVIDERS: &[&str] = &["osfstorage", "github", "figshare", "googledrive", "owncloud"];

/// Normalize a path into canonical remote form.
///
/// Platform separators become `/` and the leading `/` is removed. Empty and
/// `.` segments are dropped so that normalizing twice yields the same value.
pub fn normalize(path: &str) -> String {
    let path = if MAIN_SEPARATOR == '/' {
        path.to_string()
    } else {
        path.replace(MAIN_SEPARATOR, "/")
    };

    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Join path parts with `/` and normalize the result
pub fn join_remote<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = parts
        .into_iter()
        .map(|p| p.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("/");
    normalize(&joined)
}

/// Map a remote path onto a local root directory.
///
/// Remote paths come from the service, so a `..` segment is rejected
/// rather than allowed to climb out of `root`.
pub fn to_local(root: &Path, remote: &str) -> Result<PathBuf> {
    let normalized = normalize(remote);
    if normalized.split('/').any(|segment| segment == "..") {
        return Err(Error::InvalidPath(format!(
            "Remote path {remote} points outside the destination directory"
        )));
    }

    Ok(normalized
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment)))
}

/// Final segment of a remote path (the file name)
pub fn file_name(remote: &str) -> &str {
    remote.rsplit('/').next().unwrap_or(remote)
}

/// A remote location split into storage provider and provider-relative path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSelector {
    /// Storage provider name
    pub provider: String,
    /// Normalized path inside the provider (empty for the provider root)
    pub path: String,
}

impl StorageSelector {
    /// Create a new StorageSelector, normalizing the path
    pub fn new(provider: impl Into<String>, path: &str) -> Self {
        Self {
            provider: provider.into(),
            path: normalize(path),
        }
    }
}

impl std::fmt::Display for StorageSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.provider)
        } else {
            write!(f, "{}/{}", self.provider, self.path)
        }
    }
}

/// Split a user-supplied remote path using the built-in provider names
pub fn split_storage(path: &str) -> StorageSelector {
    split_storage_with(path, KNOWN_PROVIDERS)
}

/// Split a user-supplied remote path into provider and remainder.
///
/// The first segment is taken as the provider when it matches one of
/// `providers`; otherwise the whole path belongs to [`DEFAULT_PROVIDER`].
pub fn split_storage_with(path: &str, providers: &[&str]) -> StorageSelector {
    let path = normalize(path);

    let (head, rest) = match path.split_once('/') {
        Some((head, rest)) => (head, rest),
        None => (path.as_str(), ""),
    };

    if providers.contains(&head) {
        StorageSelector::new(head, rest)
    } else {
        StorageSelector::new(DEFAULT_PROVIDER, &path)
    }
}
