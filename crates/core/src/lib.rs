//! osf-core: Core library for the osf CLI client
//!
//! This crate provides the core functionality for the osf CLI, including:
//! - Layered configuration (command line, environment, config file)
//! - Remote path normalization and storage provider selection
//! - Tree mirroring between local directories and project storage
//! - Overwrite arbitration and authorization failure reporting
//! - RemoteStore trait for project-storage operations
//!
//! This crate does not depend on any HTTP client, allowing the
//! mirroring engine to be tested against in-memory stores.

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod mirror;
pub mod path;
pub mod traits;

#[cfg(test)]
mod testing;

pub use auth::with_auth;
pub use config::{CliLayer, Config, ConfigManager, EnvLayer, ResolvedConfig};
pub use error::{Error, Result};
pub use guard::{ConflictDecision, ConflictGuard};
pub use mirror::{TransferPair, TransferSummary};
pub use path::{join_remote, normalize, split_storage, StorageSelector};
pub use traits::{FileLinks, NoProgress, RemoteFile, RemoteStore, TransferProgress};
