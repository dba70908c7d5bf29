use theme_sync::SyncError;

/// Application-wide error types for the `theme-sync` command-line host.
///
/// Library failures arrive as [`SyncError`] and are wrapped unchanged so the
/// caller can still tell a remote write failure from an invalid theme name.
/// Everything the host itself owns (configuration, logger installation, the
/// console) has its own variant.
///
/// # Exit Codes
///
/// [`AppError::exit_code`] maps each variant to the process exit status used
/// by `main`:
///
/// | Variant  | Code |
/// |----------|------|
/// | `Config` | 2    |
/// | `Sync`   | 1    |
/// | `Logger` | 1    |
/// | `Io`     | 1    |
///
/// Invalid theme input is reported as `Sync(InvalidCandidateValue)` and also
/// exits with 2, since it is a usage error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppError {
    /// Configuration loading or validation failed.
    ///
    /// The message is already formatted for the user, including every
    /// violated limit when validation collected more than one.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// A theme synchronization operation failed.
    #[error("Sync Error: {0}")]
    Sync(#[from] SyncError),

    /// The global logger could not be installed.
    #[error("Logger Error: {0}")]
    Logger(String),

    /// Console or file I/O failed.
    #[error("I/O Error: {0}")]
    Io(String),
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 2,
            AppError::Sync(SyncError::InvalidCandidateValue(_)) => 2,
            AppError::Sync(_) | AppError::Logger(_) | AppError::Io(_) => 1,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<log::SetLoggerError> for AppError {
    fn from(err: log::SetLoggerError) -> Self {
        AppError::Logger(err.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
