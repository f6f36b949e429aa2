//! upload command - Upload a file or directory to a project
//!
//! The first part of the destination is interpreted as the name of the
//! storage provider. With `--recursive` the source directory is mirrored
//! below the destination. A source ending in a path separator uploads its
//! contents without the directory's own name. Uploading requires a
//! username and password.

use std::path::PathBuf;

use clap::Args;
use osf_api::OsfClient;
use osf_core::mirror::{upload_file, upload_tree};
use osf_core::{split_storage, with_auth, ConflictGuard, Error, Result, TransferSummary};
use serde::Serialize;

use super::{resolve_config, GlobalArgs};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

const NEED_CREDENTIALS: &str = "To upload a file you need to provide a username and password.";

/// Upload a file or directory to a project
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local file or directory
    pub source: PathBuf,

    /// Remote destination ([provider/]path)
    pub destination: String,

    /// Replace files that already exist remotely
    #[arg(short, long)]
    pub force: bool,

    /// Upload a directory and everything below it
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Debug, Serialize)]
struct UploadOutput {
    status: &'static str,
    destination: String,
    #[serde(flatten)]
    summary: TransferSummary,
    size_human: String,
}

/// Execute the upload command
pub async fn execute(args: UploadArgs, global: &GlobalArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match run(&args, global, &formatter).await {
        Ok((destination, summary)) => {
            let size_human = humansize::format_size(summary.bytes, humansize::BINARY);
            if formatter.is_json() {
                formatter.json(&UploadOutput {
                    status: "success",
                    destination,
                    summary,
                    size_human,
                });
            } else {
                formatter.success(&format!(
                    "Uploaded {} file(s) ({size_human}) to {destination}",
                    summary.files
                ));
            }
            ExitCode::Success
        }
        Err(e) => formatter.fail(&e),
    }
}

async fn run(
    args: &UploadArgs,
    global: &GlobalArgs,
    formatter: &Formatter,
) -> Result<(String, TransferSummary)> {
    if !args.recursive && args.source.is_dir() {
        return Err(Error::InvalidPath(format!(
            "{} is a directory, use --recursive to upload it",
            args.source.display()
        )));
    }

    let config = resolve_config(global)?;
    config.require_credentials(NEED_CREDENTIALS)?;

    let selector = split_storage(&args.destination);
    let guard = ConflictGuard::new(args.force);

    with_auth(&config, async {
        let client = OsfClient::connect(&config).await?;
        if args.recursive {
            let progress = ProgressBar::files(formatter.config(), "Uploading");
            let summary = upload_tree(&client, &args.source, &selector, guard, &progress).await?;
            Ok((selector.to_string(), summary))
        } else {
            let size = tokio::fs::metadata(&args.source).await?.len();
            let path = upload_file(&client, &args.source, &selector, guard).await?;
            let mut summary = TransferSummary::default();
            summary.record(size);
            Ok((format!("{}/{path}", selector.provider), summary))
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_directory_without_recursive_is_rejected() {
        let temp = TempDir::new().unwrap();
        let args = UploadArgs {
            source: temp.path().to_path_buf(),
            destination: "osfstorage/data".into(),
            force: false,
            recursive: false,
        };

        let err = run(&args, &GlobalArgs::default(), &Formatter::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidPath(_)));
    }
}
