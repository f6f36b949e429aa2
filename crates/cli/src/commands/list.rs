//! list command - List all files from all storages of a project
//!
//! Each file is printed as `provider/path`, one per line.

use osf_api::OsfClient;
use osf_core::mirror::list_files;
use osf_core::{with_auth, Result};
use serde::Serialize;

use super::{resolve_config, GlobalArgs};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

#[derive(Debug, Serialize)]
struct ListOutput {
    files: Vec<String>,
    total: usize,
}

/// Execute the list command
pub async fn execute(global: &GlobalArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match run(global).await {
        Ok(files) => {
            if formatter.is_json() {
                let total = files.len();
                formatter.json(&ListOutput { files, total });
            } else {
                for path in &files {
                    formatter.println(path);
                }
            }
            ExitCode::Success
        }
        Err(e) => formatter.fail(&e),
    }
}

async fn run(global: &GlobalArgs) -> Result<Vec<String>> {
    let config = resolve_config(global)?;
    with_auth(&config, async {
        let client = OsfClient::connect(&config).await?;
        list_files(&client).await
    })
    .await
}
