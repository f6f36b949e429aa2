//! clone command - Copy all files from all storages of a project
//!
//! Files land in `<output>/<provider>/<path>`. The output directory
//! defaults to the project ID. Existing local files are overwritten.

use std::path::PathBuf;

use clap::Args;
use osf_api::OsfClient;
use osf_core::mirror::clone_project;
use osf_core::{with_auth, Result, TransferSummary};
use serde::Serialize;

use super::{resolve_config, GlobalArgs};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// Copy all files from all storages of a project
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// Write files to this directory (defaults to the project ID)
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CloneOutput {
    status: &'static str,
    output: String,
    #[serde(flatten)]
    summary: TransferSummary,
    size_human: String,
}

/// Execute the clone command
pub async fn execute(args: CloneArgs, global: &GlobalArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match run(&args, global, &formatter).await {
        Ok((root, summary)) => {
            let size_human = humansize::format_size(summary.bytes, humansize::BINARY);
            if formatter.is_json() {
                formatter.json(&CloneOutput {
                    status: "success",
                    output: root.display().to_string(),
                    summary,
                    size_human,
                });
            } else {
                formatter.success(&format!(
                    "Cloned {} file(s) ({size_human}) into {}.",
                    summary.files,
                    root.display()
                ));
            }
            ExitCode::Success
        }
        Err(e) => formatter.fail(&e),
    }
}

async fn run(
    args: &CloneArgs,
    global: &GlobalArgs,
    formatter: &Formatter,
) -> Result<(PathBuf, TransferSummary)> {
    let config = resolve_config(global)?;
    let project = config.require_project()?;
    let root = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(project));

    let summary = with_auth(&config, async {
        let client = OsfClient::connect(&config).await?;
        let progress = ProgressBar::files(formatter.config(), "Cloning");
        clone_project(&client, &root, &progress).await
    })
    .await?;

    Ok((root, summary))
}
