use super::{
    LoggingConfig,
    backend::{BackendConfig, BackendKind},
    limits::*,
    sync::SyncConfig,
    validation::ConfigValidationError,
};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    sync: SyncConfig,
    #[serde(default)]
    backend: BackendConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl AppConfig {
    /// Configuration with every documented default written out
    pub fn with_defaults() -> Self {
        Self {
            sync: SyncConfig::with_defaults(),
            backend: BackendConfig::with_defaults(),
            logging: LoggingConfig::with_defaults(),
        }
    }

    /// Validate the configuration against defined limits
    pub fn validate(&self) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        let poll_interval_ms = self.sync.poll_interval_ms();
        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&poll_interval_ms) {
            errors.push(ConfigValidationError::PollInterval {
                configured: poll_interval_ms,
                min_limit: MIN_POLL_INTERVAL_MS,
                max_limit: MAX_POLL_INTERVAL_MS,
            });
        }

        if self.sync.grace_window_ms() > MAX_GRACE_WINDOW_MS {
            errors.push(ConfigValidationError::GraceWindow {
                configured: self.sync.grace_window_ms(),
                limit: MAX_GRACE_WINDOW_MS,
            });
        }

        if self.sync.settings_key().trim().is_empty() {
            errors.push(ConfigValidationError::EmptyKey {
                field: "settings_key",
            });
        }
        if self.sync.cache_key().trim().is_empty() {
            errors.push(ConfigValidationError::EmptyKey { field: "cache_key" });
        }

        if self.backend.kind() == BackendKind::Rest {
            if self.backend.url().is_none() {
                errors.push(ConfigValidationError::MissingBackendSetting { field: "url" });
            }
            if self.backend.api_key().is_none() {
                errors.push(ConfigValidationError::MissingBackendSetting { field: "api_key" });
            }

            let timeout = self.backend.request_timeout_secs();
            if !(MIN_REQUEST_TIMEOUT_SECS..=MAX_REQUEST_TIMEOUT_SECS).contains(&timeout) {
                errors.push(ConfigValidationError::RequestTimeout {
                    configured: timeout,
                    min_limit: MIN_REQUEST_TIMEOUT_SECS,
                    max_limit: MAX_REQUEST_TIMEOUT_SECS,
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn sync(&self) -> &SyncConfig {
        &self.sync
    }

    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_text: &str) -> AppConfig {
        toml::from_str(toml_text).unwrap()
    }

    #[test]
    fn test_empty_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_poll_interval_bounds() {
        let too_fast = parse("[sync]\npoll_interval_ms = 10\n");
        let errors = too_fast.validate().unwrap_err();
        assert!(matches!(
            errors.as_slice(),
            [ConfigValidationError::PollInterval { configured: 10, .. }]
        ));

        let too_slow = parse("[sync]\npoll_interval_ms = 120000\n");
        assert!(too_slow.validate().is_err());

        let edge = parse("[sync]\npoll_interval_ms = 100\n");
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_zero_grace_window_allowed() {
        let config = parse("[sync]\ngrace_window_ms = 0\n");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rest_backend_collects_all_errors() {
        let config = parse("[backend]\nkind = \"rest\"\nrequest_timeout_secs = 0\n");
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ConfigValidationError::MissingBackendSetting { field: "url" }));
        assert!(errors.contains(&ConfigValidationError::MissingBackendSetting { field: "api_key" }));
    }

    #[test]
    fn test_memory_backend_ignores_rest_settings() {
        let config = parse("[backend]\nrequest_timeout_secs = 0\n");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_settings_key_rejected() {
        let config = parse("[sync]\nsettings_key = \"  \"\n");
        let errors = config.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigValidationError::EmptyKey {
                field: "settings_key"
            }]
        );
    }
}
