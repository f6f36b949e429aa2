//! Error types for osf-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for osf-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for osf-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (e.g. no project specified)
    #[error("{0}")]
    Config(String),

    /// Invalid path format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Upload or remove attempted without username and password
    #[error("{0}")]
    MissingCredentials(String),

    /// The remote service rejected our credentials (HTTP 401)
    #[error("Unauthorized")]
    Unauthorized,

    /// Terminal authorization message produced by [`crate::auth::with_auth`]
    #[error("{0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Destination exists and overwriting was not requested
    #[error("{0}")]
    Conflict(String),

    /// Recursive upload source is not a directory
    #[error("Expected source ({}) to be a directory when using recursive mode.", .0.display())]
    NotADirectory(PathBuf),

    /// Network error (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// The remote service answered with an unexpected status
    #[error("Remote error: {0}")]
    Remote(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error
    #[error("IO error: {0}")]
    Walk(#[from] walkdir::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) | Error::Config(_) | Error::NotADirectory(_) => 2, // UsageError
            Error::Network(_) => 3, // NetworkError
            Error::Unauthorized | Error::Auth(_) | Error::MissingCredentials(_) => 4, // AuthError
            Error::NotFound(_) => 5, // NotFound
            Error::Conflict(_) => 6, // Conflict
            _ => 1,                 // GeneralError
        }
    }
}
