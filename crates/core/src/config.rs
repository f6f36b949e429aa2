//! Configuration management
//!
//! Settings come from three layers, in decreasing precedence:
//! command-line arguments, environment variables and the project
//! configuration file `.osfcli.toml` in the current directory.
//! The layers are merged once per invocation into a [`ResolvedConfig`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = ".osfcli.toml";

/// Configuration file written by earlier osf clients; no longer read
pub const LEGACY_CONFIG_FILE_NAME: &str = ".osfcli.config";

/// Default OSF API endpoint
pub const DEFAULT_API_URL: &str = "https://api.osf.io/v2/";

/// Environment variable names
pub const ENV_USERNAME: &str = "OSF_USERNAME";
pub const ENV_PASSWORD: &str = "OSF_PASSWORD";
pub const ENV_PROJECT: &str = "OSF_PROJECT";
pub const ENV_API_URL: &str = "OSF_API_URL";

/// Message shown when no layer names a project
pub const MISSING_PROJECT_MESSAGE: &str = "You have to specify a project ID via the command line, configuration file or environment variable.";

/// Main configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Project settings
    #[serde(default)]
    pub osf: OsfSection,
}

/// The `[osf]` table of the configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsfSection {
    /// OSF account name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Project identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            osf: OsfSection::default(),
        }
    }
}

/// Configuration manager handles loading and saving the config file
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager for `.osfcli.toml` in the current directory
    pub fn new() -> Self {
        Self {
            config_path: PathBuf::from(CONFIG_FILE_NAME),
        }
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            if let Some(legacy) = self.legacy_path() {
                tracing::warn!(
                    legacy = %legacy.display(),
                    "ignoring legacy configuration file, run `osf init` to migrate"
                );
            }
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&content)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade osf.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }

    /// A legacy `.osfcli.config` next to the configuration file, reported
    /// only while the current configuration file is missing
    pub fn legacy_path(&self) -> Option<PathBuf> {
        if self.config_path.exists() {
            return None;
        }
        let legacy = self.config_path.with_file_name(LEGACY_CONFIG_FILE_NAME);
        legacy.exists().then_some(legacy)
    }

    /// Error for a configuration without a project, naming a legacy
    /// configuration file when one is present
    pub fn missing_project(&self) -> Error {
        match self.legacy_path() {
            Some(legacy) => Error::Config(format!(
                "{MISSING_PROJECT_MESSAGE} Found {}, which is no longer read; run `osf init` to create {CONFIG_FILE_NAME}.",
                legacy.display()
            )),
            None => Error::Config(MISSING_PROJECT_MESSAGE.to_string()),
        }
    }

    /// Save configuration to disk
    ///
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliLayer {
    pub username: Option<String>,
    pub project: Option<String>,
}

/// Values taken from the process environment
#[derive(Debug, Clone, Default)]
pub struct EnvLayer {
    pub username: Option<String>,
    pub password: Option<String>,
    pub project: Option<String>,
    pub api_url: Option<String>,
}

impl EnvLayer {
    /// Read the layer from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the layer through an arbitrary lookup function
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            username: lookup(ENV_USERNAME),
            password: lookup(ENV_PASSWORD),
            project: lookup(ENV_PROJECT),
            api_url: lookup(ENV_API_URL),
        }
    }
}

/// Settings for one invocation after merging every layer
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub project: Option<String>,
    pub api_url: String,
}

impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("project", &self.project)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl ResolvedConfig {
    /// Merge the layers: command line over environment over config file.
    ///
    /// Empty strings count as unset, since `osf init` writes blank values.
    pub fn merge(cli: CliLayer, env: EnvLayer, file: &Config) -> Self {
        let username = non_empty(cli.username)
            .or_else(|| non_empty(env.username))
            .or_else(|| non_empty(file.osf.username.clone()));
        let project = non_empty(cli.project)
            .or_else(|| non_empty(env.project))
            .or_else(|| non_empty(file.osf.project.clone()));

        Self {
            username,
            password: env.password,
            project,
            api_url: non_empty(env.api_url).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }

    /// The project identifier, or the configuration error shown to users
    pub fn require_project(&self) -> Result<&str> {
        self.project
            .as_deref()
            .ok_or_else(|| Error::Config(MISSING_PROJECT_MESSAGE.to_string()))
    }

    /// Username and password, when both are known
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }

    /// Fail with `message` unless both username and password are known
    pub fn require_credentials(&self, message: &str) -> Result<(&str, &str)> {
        self.credentials()
            .ok_or_else(|| Error::MissingCredentials(message.to_string()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn temp_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        let manager = ConfigManager::with_path(config_path);
        (manager, temp_dir)
    }

    fn file_config(username: Option<&str>, project: Option<&str>) -> Config {
        Config {
            schema_version: SCHEMA_VERSION,
            osf: OsfSection {
                username: username.map(String::from),
                project: project.map(String::from),
            },
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert!(config.osf.username.is_none());
        assert!(config.osf.project.is_none());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (manager, _temp_dir) = temp_config_manager();
        let config = manager.load().unwrap();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.osf, OsfSection::default());
    }

    #[test]
    fn test_legacy_config_is_named_in_missing_project_error() {
        let (manager, temp_dir) = temp_config_manager();
        assert!(manager.legacy_path().is_none());

        let legacy = temp_dir.path().join(LEGACY_CONFIG_FILE_NAME);
        std::fs::write(&legacy, "[osf]\nproject = f3szh\n").unwrap();
        assert_eq!(manager.legacy_path(), Some(legacy.clone()));
        assert_eq!(manager.load().unwrap().osf, OsfSection::default());

        let message = manager.missing_project().to_string();
        assert!(message.contains(MISSING_PROJECT_MESSAGE));
        assert!(message.contains(LEGACY_CONFIG_FILE_NAME));

        manager.save(&Config::default()).unwrap();
        assert!(manager.legacy_path().is_none());
        assert!(!manager.missing_project().to_string().contains(LEGACY_CONFIG_FILE_NAME));
    }

    #[test]
    fn test_save_and_load() {
        let (manager, _temp_dir) = temp_config_manager();

        let config = file_config(Some("jane@example.org"), Some("f3szh"));
        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(loaded.osf.username.as_deref(), Some("jane@example.org"));
        assert_eq!(loaded.osf.project.as_deref(), Some("f3szh"));
    }

    #[test]
    fn test_load_without_schema_version() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(manager.config_path(), "[osf]\nproject = \"abc12\"\n").unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.osf.project.as_deref(), Some("abc12"));
    }

    #[test]
    fn test_schema_version_too_new() {
        let (manager, _temp_dir) = temp_config_manager();

        let content = format!("schema_version = {}\n", SCHEMA_VERSION + 1);
        std::fs::write(manager.config_path(), content).unwrap();

        let result = manager.load();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("newer than supported"));
    }

    #[test]
    fn test_merge_precedence() {
        let file = file_config(Some("file-user"), Some("file-proj"));
        let env = EnvLayer {
            username: Some("env-user".into()),
            project: Some("env-proj".into()),
            ..Default::default()
        };
        let cli = CliLayer {
            username: Some("cli-user".into()),
            project: None,
        };

        let resolved = ResolvedConfig::merge(cli, env, &file);
        assert_eq!(resolved.username.as_deref(), Some("cli-user"));
        assert_eq!(resolved.project.as_deref(), Some("env-proj"));
        assert_eq!(resolved.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_merge_falls_back_to_file() {
        let file = file_config(Some("file-user"), Some("file-proj"));
        let resolved = ResolvedConfig::merge(CliLayer::default(), EnvLayer::default(), &file);
        assert_eq!(resolved.username.as_deref(), Some("file-user"));
        assert_eq!(resolved.project.as_deref(), Some("file-proj"));
        assert!(resolved.password.is_none());
    }

    #[test]
    fn test_merge_ignores_blank_values() {
        let file = file_config(Some(""), Some("file-proj"));
        let env = EnvLayer {
            project: Some("  ".into()),
            ..Default::default()
        };
        let resolved = ResolvedConfig::merge(CliLayer::default(), env, &file);
        assert!(resolved.username.is_none());
        assert_eq!(resolved.project.as_deref(), Some("file-proj"));
    }

    #[test]
    fn test_env_layer_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_USERNAME, "u"),
            (ENV_PASSWORD, "p"),
            (ENV_API_URL, "http://localhost:5000/v2/"),
        ]
        .into_iter()
        .collect();
        let env = EnvLayer::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(env.username.as_deref(), Some("u"));
        assert_eq!(env.password.as_deref(), Some("p"));
        assert!(env.project.is_none());

        let resolved = ResolvedConfig::merge(CliLayer::default(), env, &Config::default());
        assert_eq!(resolved.api_url, "http://localhost:5000/v2/");
        assert_eq!(resolved.credentials(), Some(("u", "p")));
    }

    #[test]
    fn test_require_project_message() {
        let resolved = ResolvedConfig::default();
        let err = resolved.require_project().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.to_string(), MISSING_PROJECT_MESSAGE);
    }

    #[test]
    fn test_require_credentials() {
        let resolved = ResolvedConfig {
            username: Some("u".into()),
            ..Default::default()
        };
        let err = resolved.require_credentials("need both").unwrap_err();
        assert!(matches!(err, Error::MissingCredentials(_)));
        assert_eq!(err.to_string(), "need both");
    }

    #[test]
    fn test_debug_redacts_password() {
        let resolved = ResolvedConfig {
            password: Some("hunter2".into()),
            ..Default::default()
        };
        let debug = format!("{resolved:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
