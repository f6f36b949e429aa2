//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.
//! Each command resolves its configuration once, runs a single top-level
//! operation and turns the outcome into one message and one exit code.

use clap::{Args, Parser, Subcommand};

use osf_core::{CliLayer, ConfigManager, EnvLayer, ResolvedConfig, Result};

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

pub mod clone;
pub mod fetch;
mod init;
pub mod list;
pub mod remove;
pub mod upload;

/// osf - command-line client for OSF project storage
///
/// Username and project are taken from the command line, then from the
/// OSF_USERNAME and OSF_PROJECT environment variables, then from
/// `.osfcli.toml` in the current directory. The password is read from
/// OSF_PASSWORD or prompted for when a username is set.
#[derive(Parser, Debug)]
#[command(name = "osf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Account and project selection shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// OSF username
    #[arg(short, long, global = true)]
    pub username: Option<String>,

    /// OSF project ID
    #[arg(short, long, global = true)]
    pub project: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up a config file for the current directory
    Init,

    /// Copy all files from all storages of a project
    Clone(clone::CloneArgs),

    /// Fetch an individual file from a project
    Fetch(fetch::FetchArgs),

    /// List all files from all storages of a project
    #[command(visible_alias = "ls")]
    List,

    /// Upload a file or directory to a project
    Upload(upload::UploadArgs),

    /// Remove a file from a project's storage
    #[command(visible_alias = "rm")]
    Remove(remove::RemoveArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Init => init::execute(output_config),
        Commands::Clone(args) => clone::execute(args, &cli.global, output_config).await,
        Commands::Fetch(args) => fetch::execute(args, &cli.global, output_config).await,
        Commands::List => list::execute(&cli.global, output_config).await,
        Commands::Upload(args) => upload::execute(args, &cli.global, output_config).await,
        Commands::Remove(args) => remove::execute(args, &cli.global, output_config).await,
    }
}

/// Merge command line, environment and config file into one configuration.
///
/// Fails when no project is known. When a username is known but no password
/// was supplied through the environment, the password is prompted for.
pub(crate) fn resolve_config(global: &GlobalArgs) -> Result<ResolvedConfig> {
    let mut config = merge_layers(&ConfigManager::new(), global, EnvLayer::from_env())?;

    if config.username.is_some() && config.password.is_none() {
        config.password = Some(rpassword::prompt_password("Please input your password: ")?);
    }

    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

fn merge_layers(manager: &ConfigManager, global: &GlobalArgs, env: EnvLayer) -> Result<ResolvedConfig> {
    let file = manager.load()?;
    let cli = CliLayer {
        username: global.username.clone(),
        project: global.project.clone(),
    };

    let config = ResolvedConfig::merge(cli, env, &file);
    if config.project.is_none() {
        return Err(manager.missing_project());
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use osf_core::config::{CONFIG_FILE_NAME, LEGACY_CONFIG_FILE_NAME};
    use osf_core::Error;
    use tempfile::TempDir;

    fn no_env() -> EnvLayer {
        EnvLayer::from_lookup(|_| None)
    }

    #[test]
    fn test_merge_layers_points_at_legacy_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(LEGACY_CONFIG_FILE_NAME), "[osf]\nproject = f3szh\n").unwrap();
        let manager = ConfigManager::with_path(temp.path().join(CONFIG_FILE_NAME));

        let err = merge_layers(&manager, &GlobalArgs::default(), no_env()).unwrap_err();
        match err {
            Error::Config(message) => assert!(message.contains(LEGACY_CONFIG_FILE_NAME)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_merge_layers_prefers_command_line_project() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join(CONFIG_FILE_NAME));
        let global = GlobalArgs {
            username: None,
            project: Some("f3szh".into()),
        };

        let config = merge_layers(&manager, &global, no_env()).unwrap();
        assert_eq!(config.project.as_deref(), Some("f3szh"));
        assert!(config.password.is_none());
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_args_after_subcommand() {
        let cli = Cli::parse_from(["osf", "list", "-p", "f3szh", "-u", "jane"]);
        assert_eq!(cli.global.project.as_deref(), Some("f3szh"));
        assert_eq!(cli.global.username.as_deref(), Some("jane"));
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_parse_aliases() {
        let cli = Cli::parse_from(["osf", "ls"]);
        assert!(matches!(cli.command, Commands::List));

        let cli = Cli::parse_from(["osf", "rm", "osfstorage/a.txt"]);
        match cli.command {
            Commands::Remove(args) => assert_eq!(args.target, "osfstorage/a.txt"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_upload_keeps_trailing_separator() {
        let cli = Cli::parse_from(["osf", "upload", "-r", "-f", "foo/", "bar"]);
        match cli.command {
            Commands::Upload(args) => {
                assert!(args.recursive);
                assert!(args.force);
                assert!(args.source.to_string_lossy().ends_with('/'));
                assert_eq!(args.destination, "bar");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_fetch_defaults() {
        let cli = Cli::parse_from(["osf", "fetch", "osfstorage/data/x.csv"]);
        match cli.command {
            Commands::Fetch(args) => {
                assert!(!args.force);
                assert!(args.local.is_none());
                assert_eq!(args.remote, "osfstorage/data/x.csv");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_clone_output() {
        let cli = Cli::parse_from(["osf", "--json", "clone", "out"]);
        assert!(cli.json);
        match cli.command {
            Commands::Clone(args) => assert_eq!(args.output.unwrap().to_string_lossy(), "out"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
