//! fetch command - Fetch an individual file from a project
//!
//! The first part of the remote path is interpreted as the name of the
//! storage provider. If there is no match the default (osfstorage) is used.
//! The local path defaults to the name of the remote file.

use std::path::PathBuf;

use clap::Args;
use osf_api::OsfClient;
use osf_core::mirror::{default_fetch_target, fetch_file};
use osf_core::{split_storage, with_auth, ConflictGuard, Result};
use serde::Serialize;

use super::{resolve_config, GlobalArgs};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Fetch an individual file from a project
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Remote path ([provider/]path/to/file)
    pub remote: String,

    /// Local destination (defaults to the remote file name)
    pub local: Option<PathBuf>,

    /// Overwrite the local file if it exists
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct FetchOutput {
    status: &'static str,
    source: String,
    target: String,
    size_bytes: u64,
    size_human: String,
}

/// Execute the fetch command
pub async fn execute(args: FetchArgs, global: &GlobalArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match run(&args, global).await {
        Ok(output) => {
            if formatter.is_json() {
                formatter.json(&output);
            } else {
                formatter.println(&format!(
                    "{} -> {} ({})",
                    output.source, output.target, output.size_human
                ));
            }
            ExitCode::Success
        }
        Err(e) => formatter.fail(&e),
    }
}

async fn run(args: &FetchArgs, global: &GlobalArgs) -> Result<FetchOutput> {
    let selector = split_storage(&args.remote);
    let local = args
        .local
        .clone()
        .unwrap_or_else(|| default_fetch_target(&selector));

    // Refuse before prompting for a password or contacting the service.
    let guard = ConflictGuard::new(args.force);
    guard.ensure_local(&local)?;

    let config = resolve_config(global)?;
    let bytes = with_auth(&config, async {
        let client = OsfClient::connect(&config).await?;
        fetch_file(&client, &selector, &local, guard).await
    })
    .await?;

    Ok(FetchOutput {
        status: "success",
        source: selector.to_string(),
        target: local.display().to_string(),
        size_bytes: bytes,
        size_human: humansize::format_size(bytes, humansize::BINARY),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use osf_core::Error;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fetch_refuses_existing_file_before_config() {
        let temp = TempDir::new().unwrap();
        let local = temp.path().join("x.txt");
        std::fs::write(&local, "mine").unwrap();

        let args = FetchArgs {
            remote: "osfstorage/x.txt".into(),
            local: Some(local.clone()),
            force: false,
        };
        let err = run(&args, &GlobalArgs::default()).await.err().unwrap();

        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(std::fs::read_to_string(&local).unwrap(), "mine");
    }
}
