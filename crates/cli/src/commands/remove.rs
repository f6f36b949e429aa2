//! remove command - Remove a file from a project's storage
//!
//! Every file whose path matches the target is removed. Removing requires
//! a username and password.

use clap::Args;
use osf_api::OsfClient;
use osf_core::mirror::remove_file;
use osf_core::{split_storage, with_auth, Result};
use serde::Serialize;

use super::{resolve_config, GlobalArgs};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

const NEED_CREDENTIALS: &str = "To remove a file you need to provide a username and password.";

/// Remove a file from a project's storage
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Remote path ([provider/]path/to/file)
    pub target: String,
}

#[derive(Debug, Serialize)]
struct RemoveOutput {
    status: &'static str,
    target: String,
    removed: usize,
}

/// Execute the remove command
pub async fn execute(args: RemoveArgs, global: &GlobalArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match run(&args, global).await {
        Ok(output) => {
            if formatter.is_json() {
                formatter.json(&output);
            } else if output.removed == 0 {
                formatter.warning(&format!("No file matched {}, nothing removed.", output.target));
            } else {
                formatter.success(&format!("Removed {}", output.target));
            }
            ExitCode::Success
        }
        Err(e) => formatter.fail(&e),
    }
}

async fn run(args: &RemoveArgs, global: &GlobalArgs) -> Result<RemoveOutput> {
    let config = resolve_config(global)?;
    config.require_credentials(NEED_CREDENTIALS)?;

    let selector = split_storage(&args.target);
    let removed = with_auth(&config, async {
        let client = OsfClient::connect(&config).await?;
        remove_file(&client, &selector).await
    })
    .await?;

    if removed == 0 {
        tracing::warn!(path = %selector, "remove matched no file");
    }

    Ok(RemoveOutput {
        status: "success",
        target: selector.to_string(),
        removed,
    })
}
