//! init command - Set up a config file for the current directory
//!
//! Asks for a username and a project ID. Pressing enter keeps the value
//! currently stored in `.osfcli.toml`.

use std::io::{self, BufRead, Write};

use osf_core::{Config, ConfigManager, Result};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Execute the init command
pub fn execute(output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let manager = ConfigManager::new();

    let stdin = io::stdin();
    match run(&manager, &mut stdin.lock()) {
        Ok(config) => {
            if formatter.is_json() {
                formatter.json(&config);
            } else {
                formatter.success(&format!(
                    "Wrote configuration to {}",
                    manager.config_path().display()
                ));
            }
            ExitCode::Success
        }
        Err(e) => formatter.fail(&e),
    }
}

fn run(manager: &ConfigManager, input: &mut impl BufRead) -> Result<Config> {
    let mut config = manager.load()?;

    let username = ask(
        input,
        &format!(
            "Provide a username for the config file [current username: {}]: ",
            config.osf.username.as_deref().unwrap_or("")
        ),
    )?;
    let project = ask(
        input,
        &format!(
            "Provide a project for the config file [current project: {}]: ",
            config.osf.project.as_deref().unwrap_or("")
        ),
    )?;

    apply_answers(&mut config, username, project);
    manager.save(&config)?;
    tracing::debug!(path = %manager.config_path().display(), "configuration saved");
    Ok(config)
}

fn ask(input: &mut impl BufRead, prompt: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt}")?;
    stdout.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Blank answers keep the current value
fn apply_answers(config: &mut Config, username: String, project: String) {
    if !username.is_empty() {
        config.osf.username = Some(username);
    }
    if !project.is_empty() {
        config.osf.project = Some(project);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_apply_answers_keeps_blank_values() {
        let mut config = Config::default();
        config.osf.username = Some("jane".into());
        config.osf.project = Some("f3szh".into());

        apply_answers(&mut config, String::new(), "abc12".into());

        assert_eq!(config.osf.username.as_deref(), Some("jane"));
        assert_eq!(config.osf.project.as_deref(), Some("abc12"));
    }

    #[test]
    fn test_run_writes_config() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join(".osfcli.toml"));
        let mut input = io::Cursor::new("jane@example.com\nf3szh\n");

        let config = run(&manager, &mut input).unwrap();
        assert_eq!(config.osf.username.as_deref(), Some("jane@example.com"));

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.osf.project.as_deref(), Some("f3szh"));
    }

    #[test]
    fn test_run_keeps_existing_on_empty_input() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join(".osfcli.toml"));
        let mut existing = Config::default();
        existing.osf.project = Some("f3szh".into());
        manager.save(&existing).unwrap();

        let mut input = io::Cursor::new("\n\n");
        let config = run(&manager, &mut input).unwrap();

        assert_eq!(config.osf.project.as_deref(), Some("f3szh"));
        assert!(config.osf.username.is_none());
    }
}
