use thiserror::Error;

/// Errors surfaced by theme synchronization.
///
/// None of these variants are fatal to a mounted context. They exist so that
/// the boundary code (fetch, poll, push listener, manual set) can log them or
/// hand them back to the caller instead of letting them escape into rendering.
///
/// # Error Categories
///
/// ## Candidate Errors
/// - [`InvalidCandidateValue`] - A string that is not a member of the theme catalogue
///
/// ## Remote Settings Store Errors
/// - [`RemoteReadFailure`] - Fetch or poll failed; treated as "no new information"
/// - [`RemoteWriteFailure`] - Upsert after a manual set failed; local state is kept
/// - [`SubscriptionFailure`] - Push channel could not be established; poll-only mode
///
/// ## Local Errors
/// - [`LocalCache`] - Persisting the bootstrap value failed
/// - [`Configuration`] - Options or adapter configuration rejected
///
/// # Examples
///
/// ```no_run
/// use theme_sync::common::SyncError;
///
/// fn log_sync_error(error: &SyncError) {
///     match error {
///         SyncError::RemoteWriteFailure(reason) => {
///             log::warn!("Theme saved locally but not remotely: {reason}");
///         }
///         SyncError::SubscriptionFailure(_) => {
///             log::info!("Falling back to polling: {error}");
///         }
///         other => log::error!("{other}"),
///     }
/// }
/// ```
///
/// [`InvalidCandidateValue`]: SyncError::InvalidCandidateValue
/// [`RemoteReadFailure`]: SyncError::RemoteReadFailure
/// [`RemoteWriteFailure`]: SyncError::RemoteWriteFailure
/// [`SubscriptionFailure`]: SyncError::SubscriptionFailure
/// [`LocalCache`]: SyncError::LocalCache
/// [`Configuration`]: SyncError::Configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The candidate string is not one of the known theme slugs.
    ///
    /// Candidates arrive from the remote record, the push channel, the cross-tab
    /// bus and user input. Any of them can carry garbage; the value is dropped
    /// and the current theme stays as it was.
    #[error("Invalid theme value: '{0}'")]
    InvalidCandidateValue(String),

    /// Reading the remote settings record failed.
    ///
    /// # Recovery
    /// - Nothing to do: the next scheduled poll tries again
    #[error("Remote settings read failed: {0}")]
    RemoteReadFailure(String),

    /// Writing the remote settings record failed.
    ///
    /// Returned in [`SetThemeResult::error`](crate::context::SetThemeResult)
    /// alongside `success: true`, since the local change has already been
    /// applied and is never rolled back.
    #[error("Remote settings write failed: {0}")]
    RemoteWriteFailure(String),

    /// The push subscription could not be established.
    ///
    /// # Recovery
    /// - The context keeps running on the poll loop alone
    #[error("Settings subscription failed: {0}")]
    SubscriptionFailure(String),

    /// Reading or writing the local cache failed.
    #[error("Local cache error: {0}")]
    LocalCache(String),

    /// Invalid options or adapter configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SyncError {
    /// True for errors that originate from the remote settings store.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteReadFailure(_)
                | SyncError::RemoteWriteFailure(_)
                | SyncError::SubscriptionFailure(_)
        )
    }
}

/// Convenience alias used across the crate.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SyncError::InvalidCandidateValue("halloween".to_string());
        assert_eq!(error.to_string(), "Invalid theme value: 'halloween'");

        let error = SyncError::RemoteWriteFailure("503 Service Unavailable".to_string());
        assert!(error.to_string().contains("503"));
    }

    #[test]
    fn test_is_remote() {
        assert!(SyncError::RemoteReadFailure("timeout".into()).is_remote());
        assert!(SyncError::RemoteWriteFailure("timeout".into()).is_remote());
        assert!(SyncError::SubscriptionFailure("no channel".into()).is_remote());
        assert!(!SyncError::InvalidCandidateValue("x".into()).is_remote());
        assert!(!SyncError::LocalCache("disk full".into()).is_remote());
    }
}
