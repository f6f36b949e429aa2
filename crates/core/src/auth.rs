//! Authorization failure reporting
//!
//! Every operation that talks to the remote service runs through
//! [`with_auth`]. A rejected login is turned into one of two terminal
//! messages depending on whether a username was configured. The
//! operation itself is never retried.

use std::future::Future;

use crate::config::ResolvedConfig;
use crate::error::{Error, Result};

/// Shown when the service rejects an anonymous request
pub const SET_USERNAME_MESSAGE: &str = "Please set a username (run `osf -h` for details).";

/// Shown when the service rejects the configured user
pub const NOT_AUTHORIZED_MESSAGE: &str = "You are not authorized to access this project.";

/// Run `op` once, classifying an authorization failure for the user
pub async fn with_auth<T, F>(config: &ResolvedConfig, op: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match op.await {
        Err(Error::Unauthorized) => Err(classify_unauthorized(config)),
        other => other,
    }
}

/// Build the terminal error for a rejected request
pub fn classify_unauthorized(config: &ResolvedConfig) -> Error {
    match config.username.as_deref() {
        None => {
            tracing::debug!("request rejected without a configured username");
            Error::Auth(SET_USERNAME_MESSAGE.to_string())
        }
        Some(user) => {
            tracing::debug!(user, "request rejected for configured user");
            Error::Auth(NOT_AUTHORIZED_MESSAGE.to_string())
        }
    }
}
