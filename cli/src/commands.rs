//! Command implementations behind the `theme-sync` binary.
//!
//! Each command writes its user-facing output to the supplied writer so it
//! can be exercised without a terminal.

use crate::config::{AppConfig, BackendConfig, BackendKind};
use crate::error::{AppError, AppResult};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use theme_sync::{
    CrossTabChannel, FileCache, InMemorySettingsStore, RestSettingsStore, SettingsStore,
    SyncError, ThemeContext, ThemeSyncDeps, ThemeValue,
};

/// Settings store selected by `[backend]`
pub fn build_store(backend: &BackendConfig) -> AppResult<Arc<dyn SettingsStore>> {
    match backend.kind() {
        BackendKind::Memory => {
            log::info!("Using in-memory settings store, changes stay in this process");
            Ok(Arc::new(InMemorySettingsStore::new()))
        }
        BackendKind::Rest => {
            let rest_config = backend.rest_config().ok_or_else(|| {
                AppError::Config("The rest backend requires url and api_key".to_string())
            })?;
            log::info!("Using REST settings store at {}", rest_config.base_url);
            Ok(Arc::new(RestSettingsStore::new(rest_config)?))
        }
    }
}

pub fn build_deps(config: &AppConfig, store: Arc<dyn SettingsStore>) -> AppResult<ThemeSyncDeps> {
    let cache_path = config.sync().cache_file()?;
    log::debug!("Local theme cache at {}", cache_path.display());

    Ok(ThemeSyncDeps::new(
        store,
        Arc::new(FileCache::new(cache_path)),
        CrossTabChannel::new().endpoint(),
    ))
}

async fn mount(config: &AppConfig, store: Arc<dyn SettingsStore>) -> AppResult<ThemeContext> {
    let deps = build_deps(config, store)?;
    Ok(ThemeContext::mount(deps, config.sync().to_options()).await?)
}

/// Print the theme catalogue
pub fn list(out: &mut dyn Write) -> AppResult<()> {
    for theme in ThemeValue::ALL {
        writeln!(
            out,
            "{} {:<12} {:<20} {}",
            theme.icon(),
            theme.slug(),
            theme.display_name(),
            theme.description()
        )?;
    }
    Ok(())
}

/// Print the remote record for the configured settings key
pub async fn get(
    config: &AppConfig,
    store: &dyn SettingsStore,
    out: &mut dyn Write,
) -> AppResult<()> {
    let key = config.sync().settings_key();
    match store.get(key).await? {
        Some(record) => {
            let validity = match record.theme() {
                Ok(_) => "",
                Err(_) => " (not a known theme)",
            };
            writeln!(
                out,
                "{} = {}{} (version {}, updated {})",
                record.key,
                record.value,
                validity,
                record.version,
                record.updated_at.to_rfc3339()
            )?;
        }
        None => writeln!(out, "{key} has no remote value")?,
    }
    Ok(())
}

/// Apply a manual theme change and persist it remotely
pub async fn set(
    config: &AppConfig,
    store: Arc<dyn SettingsStore>,
    input: &str,
    out: &mut dyn Write,
) -> AppResult<()> {
    // Reject unknown names before touching the cache or the backend
    let theme: ThemeValue = input.parse()?;

    let context = mount(config, store).await?;
    let result = context.set_theme(theme).await;
    context.shutdown().await;

    match result.error {
        None => {
            writeln!(out, "Theme set to {theme}")?;
            Ok(())
        }
        Some(error) => {
            writeln!(out, "Theme set to {theme} locally, but it was not saved remotely")?;
            Err(error.into())
        }
    }
}

/// Print every applied theme until Ctrl-C or until `duration` elapses
pub async fn watch(
    config: &AppConfig,
    store: Arc<dyn SettingsStore>,
    duration: Option<Duration>,
    out: &mut dyn Write,
) -> AppResult<()> {
    let context = mount(config, store).await?;
    let mut themes = context.subscribe();
    writeln!(out, "Current theme: {}", context.current_theme())?;

    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let outcome = loop {
        tokio::select! {
            changed = themes.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let theme = *themes.borrow_and_update();
                if let Err(e) = writeln!(out, "Theme changed: {theme}") {
                    break Err(AppError::from(e));
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    log::warn!("Failed to listen for Ctrl-C: {e}");
                }
                break Ok(());
            }
            () = &mut deadline => break Ok(()),
        }
    };

    context.shutdown().await;
    outcome
}

/// Whether an error should be shown with the usage hint
pub fn is_usage_error(error: &AppError) -> bool {
    matches!(
        error,
        AppError::Config(_) | AppError::Sync(SyncError::InvalidCandidateValue(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::*;
    use tempfile::TempDir;
    use theme_sync::theme::CURRENT_THEME_KEY;

    fn config_with_cache(dir: &TempDir) -> AppConfig {
        let toml_text = format!(
            "[sync]\npoll_interval_ms = 100\ncache_file = \"{}\"\n",
            dir.path().join("cache.json").display()
        );
        toml::from_str(&toml_text).unwrap()
    }

    #[test]
    fn test_list_prints_every_theme() {
        let mut out = Vec::new();
        assert_ok!(list(&mut out));
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), ThemeValue::ALL.len());
        for theme in ThemeValue::ALL {
            assert!(text.contains(theme.slug()));
        }
    }

    #[tokio::test]
    async fn test_get_reports_missing_record() {
        let dir = TempDir::new().unwrap();
        let config = config_with_cache(&dir);
        let store = InMemorySettingsStore::new();

        let mut out = Vec::new();
        assert_ok!(get(&config, &store, &mut out).await);
        assert_eq!(String::from_utf8(out).unwrap(), "current_theme has no remote value\n");
    }

    #[tokio::test]
    async fn test_get_flags_unknown_value() {
        let dir = TempDir::new().unwrap();
        let config = config_with_cache(&dir);
        let store = InMemorySettingsStore::seeded(CURRENT_THEME_KEY, "halloween").await;

        let mut out = Vec::new();
        assert_ok!(get(&config, &store, &mut out).await);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("current_theme = halloween (not a known theme) (version 1"));
    }

    #[tokio::test]
    async fn test_set_persists_remotely_and_locally() {
        let dir = TempDir::new().unwrap();
        let config = config_with_cache(&dir);
        let store = InMemorySettingsStore::new();

        let mut out = Vec::new();
        assert_ok!(set(&config, Arc::new(store.clone()), "diwali", &mut out).await);
        assert_eq!(String::from_utf8(out).unwrap(), "Theme set to diwali\n");

        let record = assert_some!(assert_ok!(store.get(CURRENT_THEME_KEY).await));
        assert_eq!(record.value, "diwali");
        let cached = std::fs::read_to_string(dir.path().join("cache.json")).unwrap();
        assert!(cached.contains("diwali"));
    }

    #[tokio::test]
    async fn test_set_rejects_unknown_theme() {
        let dir = TempDir::new().unwrap();
        let config = config_with_cache(&dir);
        let store = InMemorySettingsStore::new();

        let mut out = Vec::new();
        let error = assert_err!(set(&config, Arc::new(store.clone()), "halloween", &mut out).await);
        assert_eq!(
            error,
            AppError::Sync(SyncError::InvalidCandidateValue("halloween".to_string()))
        );
        assert!(is_usage_error(&error));
        assert!(out.is_empty());
        assert!(!dir.path().join("cache.json").exists());
    }

    #[tokio::test]
    async fn test_set_reports_remote_failure() {
        let dir = TempDir::new().unwrap();
        let config = config_with_cache(&dir);
        let store = InMemorySettingsStore::new();
        store.fail_writes(true);

        let mut out = Vec::new();
        let error = assert_err!(set(&config, Arc::new(store), "eid", &mut out).await);
        assert_matches!(error, AppError::Sync(SyncError::RemoteWriteFailure(_)));
        assert!(!is_usage_error(&error));
        assert!(String::from_utf8(out).unwrap().contains("not saved remotely"));
    }

    #[tokio::test]
    async fn test_watch_prints_remote_changes() {
        let dir = TempDir::new().unwrap();
        let config = config_with_cache(&dir);
        let store = InMemorySettingsStore::new();

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                store.upsert(CURRENT_THEME_KEY, "holi").await
            })
        };

        let mut out = Vec::new();
        assert_ok!(
            watch(
                &config,
                Arc::new(store),
                Some(Duration::from_millis(400)),
                &mut out
            )
            .await
        );
        assert_ok!(assert_ok!(writer.await));

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Current theme: default\n"));
        assert!(text.contains("Theme changed: holi"));
    }

    #[test]
    fn test_rest_backend_requires_credentials() {
        let backend: BackendConfig = toml::from_str("kind = \"rest\"\n").unwrap();
        let Err(error) = build_store(&backend) else {
            panic!("assertion failed, expected Err(..), got Ok(..)");
        };
        assert_matches!(error, AppError::Config(_));
    }
}
