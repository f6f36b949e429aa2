//! Tree mirroring between a local directory and project storage
//!
//! Each operation first enumerates [`TransferPair`]s from its source
//! (a local directory walk or a remote listing) and then copies them one
//! at a time. Transfers never overlap, and the first failing step ends the
//! whole operation.

use std::ffi::OsString;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::guard::{ensure_dir, ConflictGuard};
use crate::path::{file_name, join_remote, normalize, to_local, StorageSelector};
use crate::traits::{RemoteFile, RemoteStore, TransferProgress};

/// A source item together with the destination it is copied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPair<S, D> {
    /// Where the bytes come from
    pub source: S,
    /// Where the bytes go
    pub destination: D,
    /// Expected size, when the enumeration knows it
    pub size_hint: Option<u64>,
}

/// Totals reported after a mirroring pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    /// Number of files copied
    pub files: usize,
    /// Number of bytes copied
    pub bytes: u64,
}

impl TransferSummary {
    /// Count one transferred file of `bytes` bytes
    pub fn record(&mut self, bytes: u64) {
        self.files += 1;
        self.bytes += bytes;
    }
}

/// Enumerate every remote file of the project with its local destination.
///
/// Destinations are `local_root/<provider>/<path>`. Providers and files keep
/// the order in which the store returns them.
pub async fn plan_clone(
    store: &dyn RemoteStore,
    local_root: &Path,
) -> Result<Vec<TransferPair<RemoteFile, PathBuf>>> {
    let mut pairs = Vec::new();

    for provider in store.list_providers().await? {
        for file in store.list_files(&provider).await? {
            let destination = to_local(local_root, &join_remote([provider.as_str(), file.path.as_str()]))?;
            let size_hint = file.size;
            pairs.push(TransferPair {
                source: file,
                destination,
                size_hint,
            });
        }
    }

    Ok(pairs)
}

/// Download every file of every storage provider below `local_root`.
///
/// Existing local files are overwritten.
pub async fn clone_project(
    store: &dyn RemoteStore,
    local_root: &Path,
    progress: &dyn TransferProgress,
) -> Result<TransferSummary> {
    let pairs = plan_clone(store, local_root).await?;
    tracing::info!(files = pairs.len(), root = %local_root.display(), "cloning project");

    let mut summary = TransferSummary::default();
    for pair in pairs {
        if let Some(parent) = pair.destination.parent() {
            ensure_dir(parent)?;
        }
        let bytes = download_to(store, &pair.source, &pair.destination).await?;
        summary.record(bytes);
        progress.inc(1);
    }

    Ok(summary)
}

/// Download the first file of `selector.provider` whose normalized path
/// equals `selector.path` into `local`.
///
/// The local destination is checked before the listing is requested. An
/// existing file is only replaced when the guard is forced.
pub async fn fetch_file(
    store: &dyn RemoteStore,
    selector: &StorageSelector,
    local: &Path,
    guard: ConflictGuard,
) -> Result<u64> {
    guard.ensure_local(local)?;
    if let Some(parent) = local.parent() {
        ensure_dir(parent)?;
    }

    let files = store.list_files(&selector.provider).await?;
    let file = files
        .iter()
        .find(|f| normalize(&f.path) == selector.path)
        .ok_or_else(|| Error::NotFound(selector.to_string()))?;

    download_to(store, file, local).await
}

/// Local path `fetch` writes to when none is given: the remote file name
pub fn default_fetch_target(selector: &StorageSelector) -> PathBuf {
    PathBuf::from(file_name(&selector.path))
}

/// Remove every file of `selector.provider` whose normalized path equals
/// `selector.path`, returning how many were removed
pub async fn remove_file(store: &dyn RemoteStore, selector: &StorageSelector) -> Result<usize> {
    let files = store.list_files(&selector.provider).await?;

    let mut removed = 0;
    for file in files.iter().filter(|f| normalize(&f.path) == selector.path) {
        tracing::debug!(id = %file.id, path = %file.path, "removing remote file");
        store.remove(file).await?;
        removed += 1;
    }

    Ok(removed)
}

/// Every file of the project as `provider/path`
pub async fn list_files(store: &dyn RemoteStore) -> Result<Vec<String>> {
    let mut listing = Vec::new();
    for provider in store.list_providers().await? {
        for file in store.list_files(&provider).await? {
            listing.push(join_remote([provider.as_str(), file.path.as_str()]));
        }
    }
    Ok(listing)
}

/// Upload a single local file.
///
/// An empty destination path means "the provider root, under the source's
/// file name". Returns the remote path written.
pub async fn upload_file(
    store: &dyn RemoteStore,
    source: &Path,
    selector: &StorageSelector,
    guard: ConflictGuard,
) -> Result<String> {
    let destination = if selector.path.is_empty() {
        source
            .file_name()
            .map(|n| normalize(&n.to_string_lossy()))
            .ok_or_else(|| Error::InvalidPath(source.display().to_string()))?
    } else {
        selector.path.clone()
    };

    let file = tokio::fs::File::open(source).await?;
    store
        .create_or_update(
            &selector.provider,
            &destination,
            file,
            guard.check_remote().update_flag(),
        )
        .await?;

    Ok(destination)
}

/// Enumerate the regular files below `source` with their remote paths.
///
/// Destinations are `prefix/<base>/<subdirectory>/<file name>` where `base`
/// is the final component of `source`, or nothing when `source` ends with a
/// path separator. Symbolic links are neither followed nor uploaded.
pub fn plan_upload(source: &Path, prefix: &str) -> Result<Vec<TransferPair<PathBuf, String>>> {
    if !source.is_dir() {
        return Err(Error::NotADirectory(source.to_path_buf()));
    }

    let base = upload_base_name(source);
    let mut pairs = Vec::new();

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let subdir = relative
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = entry.file_name().to_string_lossy();

        pairs.push(TransferPair {
            source: entry.path().to_path_buf(),
            destination: join_remote([prefix, base.as_str(), normalize(&subdir).as_str(), &*name]),
            size_hint: entry.metadata().ok().map(|m| m.len()),
        });
    }

    Ok(pairs)
}

/// Upload a local directory tree, one file at a time
pub async fn upload_tree(
    store: &dyn RemoteStore,
    source: &Path,
    selector: &StorageSelector,
    guard: ConflictGuard,
    progress: &dyn TransferProgress,
) -> Result<TransferSummary> {
    let pairs = plan_upload(source, &selector.path)?;
    let update = guard.check_remote().update_flag();
    tracing::info!(files = pairs.len(), provider = %selector.provider, update, "uploading directory");

    let mut summary = TransferSummary::default();
    for pair in pairs {
        tracing::debug!(source = %pair.source.display(), destination = %pair.destination, "uploading");
        let file = tokio::fs::File::open(&pair.source).await?;
        store
            .create_or_update(&selector.provider, &pair.destination, file, update)
            .await?;
        summary.record(pair.size_hint.unwrap_or(0));
        progress.inc(1);
    }

    Ok(summary)
}

fn upload_base_name(source: &Path) -> String {
    let raw = source.as_os_str().to_string_lossy();
    if raw.ends_with('/') || raw.ends_with(MAIN_SEPARATOR) {
        return String::new();
    }
    source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Download into a sibling `.<name>.part` file and rename it over
/// `destination` once complete, so a failed transfer leaves any existing
/// file untouched.
async fn download_to(store: &dyn RemoteStore, file: &RemoteFile, destination: &Path) -> Result<u64> {
    tracing::debug!(path = %file.path, destination = %destination.display(), "downloading");
    let partial = partial_path(destination);

    let result = async {
        let mut out = tokio::fs::File::create(&partial).await?;
        let bytes = store.download(file, &mut out).await?;
        out.flush().await?;
        Ok::<_, Error>(bytes)
    }
    .await;

    match result {
        Ok(bytes) => {
            tokio::fs::rename(&partial, destination).await?;
            Ok(bytes)
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                tracing::debug!(error = %cleanup, path = %partial.display(), "could not remove partial download");
            }
            Err(e)
        }
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(destination.file_name().unwrap_or_default());
    name.push(".part");
    destination.with_file_name(name)
}
