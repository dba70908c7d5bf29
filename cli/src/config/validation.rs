use super::app::AppConfig;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid poll_interval_ms: {configured} (min: {min_limit}, max: {max_limit})")]
    PollInterval {
        configured: u64,
        min_limit: u64,
        max_limit: u64,
    },
    #[error("Invalid grace_window_ms: {configured} (limit: {limit})")]
    GraceWindow { configured: u64, limit: u64 },
    #[error("Invalid request_timeout_secs: {configured} (min: {min_limit}, max: {max_limit})")]
    RequestTimeout {
        configured: u64,
        min_limit: u64,
        max_limit: u64,
    },
    #[error("Empty key: {field}")]
    EmptyKey { field: &'static str },
    #[error("Missing backend setting: {field}")]
    MissingBackendSetting { field: &'static str },
}

impl ConfigValidationError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigValidationError::PollInterval {
                configured,
                min_limit,
                max_limit,
            } => {
                format!(
                    "Poll interval out of range!\n\n\
                    Your configured value: {configured} ms\n\
                    Valid range: {min_limit} - {max_limit} ms\n\n\
                    Please update [sync] poll_interval_ms in config.toml."
                )
            }
            ConfigValidationError::GraceWindow { configured, limit } => {
                format!(
                    "Grace window too long!\n\n\
                    Your configured value: {configured} ms\n\
                    Maximum: {limit} ms\n\n\
                    Please update [sync] grace_window_ms in config.toml."
                )
            }
            ConfigValidationError::RequestTimeout {
                configured,
                min_limit,
                max_limit,
            } => {
                format!(
                    "Request timeout out of range!\n\n\
                    Your configured value: {configured} seconds\n\
                    Valid range: {min_limit} - {max_limit} seconds\n\n\
                    Please update [backend] request_timeout_secs in config.toml."
                )
            }
            ConfigValidationError::EmptyKey { field } => {
                format!(
                    "Key must not be empty!\n\n\
                    Please set [sync] {field} in config.toml or remove it to use the default."
                )
            }
            ConfigValidationError::MissingBackendSetting { field } => {
                format!(
                    "The rest backend needs [backend] {field}.\n\n\
                    Please set it in config.toml or via THEME_SYNC_BACKEND__{}.",
                    field.to_uppercase()
                )
            }
        }
    }
}

/// Configuration loading result
#[derive(Debug, Clone)]
pub enum ConfigLoadResult {
    Success(Box<AppConfig>),
    LoadError(String),
    DeserializeError(String),
    ValidationError(Vec<ConfigValidationError>),
}
