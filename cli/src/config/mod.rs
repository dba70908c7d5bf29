use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod app;
pub mod backend;
pub mod defaults;
pub mod limits;
pub mod sync;
pub mod validation;

pub use app::AppConfig;
pub use backend::{BackendConfig, BackendKind};
pub use defaults::default_config;
pub use sync::SyncConfig;
pub use validation::{ConfigLoadResult, ConfigValidationError};

use crate::error::{AppError, AppResult};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix for environment overrides, e.g. `THEME_SYNC_SYNC__POLL_INTERVAL_MS`
pub const ENV_PREFIX: &str = "THEME_SYNC";

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Load configuration from `path` (or `config.toml` when present) layered
/// under environment overrides, then validate it.
///
/// An explicit `path` must exist. The default file is optional.
pub fn load_config(path: Option<&Path>) -> ConfigLoadResult {
    dotenv::dotenv().ok();
    load_config_with_env(path, env_source())
}

pub(crate) fn load_config_with_env(path: Option<&Path>, env: Environment) -> ConfigLoadResult {
    let file_source = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let config = match Config::builder()
        .add_source(file_source)
        .add_source(env) // environment entries override file values
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            return ConfigLoadResult::LoadError(format!(
                "Configuration loading failed: {e}. Please check your config file and environment variables."
            ));
        }
    };

    let app_config = match config.try_deserialize::<AppConfig>() {
        Ok(app_config) => app_config,
        Err(e) => {
            return ConfigLoadResult::DeserializeError(format!(
                "Failed to deserialize config: {e}"
            ));
        }
    };

    match app_config.validate() {
        Ok(()) => ConfigLoadResult::Success(Box::new(app_config)),
        Err(errors) => ConfigLoadResult::ValidationError(errors),
    }
}

impl ConfigLoadResult {
    /// Collapse the load result into an [`AppResult`] with a user-facing message
    pub fn into_result(self) -> AppResult<AppConfig> {
        match self {
            ConfigLoadResult::Success(config) => Ok(*config),
            ConfigLoadResult::LoadError(msg) | ConfigLoadResult::DeserializeError(msg) => {
                Err(AppError::Config(msg))
            }
            ConfigLoadResult::ValidationError(errors) => {
                let messages: Vec<String> = errors.iter().map(|e| e.user_message()).collect();
                Err(AppError::Config(format!(
                    "Configuration validation failed:\n{}",
                    messages.join("\n\n")
                )))
            }
        }
    }
}

/// `[logging]` section
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct LoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
}

impl LoggingConfig {
    pub fn new(level: Option<&str>, file: Option<&str>) -> Self {
        Self {
            level: level.map(str::to_string),
            file: file.map(str::to_string),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(Some("info"), None)
    }

    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or("info")
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env() -> Environment {
        env_source().source(Some(config::Map::new()))
    }

    fn env_with(pairs: &[(&str, &str)]) -> Environment {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_source().source(Some(map))
    }

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_loads_file_values() {
        let file = write_config(
            "[sync]\npoll_interval_ms = 1500\n\n[backend]\nkind = \"memory\"\n\n[logging]\nlevel = \"debug\"\n",
        );
        let config = assert_ok!(load_config_with_env(Some(file.path()), no_env()).into_result());
        assert_eq!(config.sync().poll_interval_ms(), 1500);
        assert_eq!(config.logging().level(), "debug");
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_config("[sync]\npoll_interval_ms = 1500\n");
        let env = env_with(&[("THEME_SYNC_SYNC__POLL_INTERVAL_MS", "750")]);
        let config = assert_ok!(load_config_with_env(Some(file.path()), env).into_result());
        assert_eq!(config.sync().poll_interval_ms(), 750);
    }

    #[test]
    fn test_missing_explicit_file_is_load_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("absent.toml");
        let result = load_config_with_env(Some(&missing), no_env());
        assert_matches!(result, ConfigLoadResult::LoadError(_));
    }

    #[test]
    fn test_wrong_type_is_deserialize_error() {
        let file = write_config("[sync]\npoll_interval_ms = \"often\"\n");
        let result = load_config_with_env(Some(file.path()), no_env());
        assert_matches!(result, ConfigLoadResult::DeserializeError(_));
    }

    #[test]
    fn test_validation_errors_reported_together() {
        let file = write_config("[sync]\npoll_interval_ms = 1\ngrace_window_ms = 999999\n");
        let result = load_config_with_env(Some(file.path()), no_env());
        let ConfigLoadResult::ValidationError(errors) = result else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 2);

        let message = assert_err!(ConfigLoadResult::ValidationError(errors).into_result());
        assert_matches!(message, AppError::Config(msg) if msg.contains("grace_window_ms"));
    }

    #[test]
    fn test_logging_defaults() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.level(), "info");
        assert_none!(logging.file());
    }
}
