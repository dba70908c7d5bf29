use claims::*;
use std::fs;
use tempfile::TempDir;
use theme_sync_cli::AppError;
use theme_sync_cli::config::{BackendKind, default_config, load_config};

mod helpers {
    use super::*;
    use std::path::PathBuf;

    pub fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }
}

#[test]
fn test_init_template_loads_as_config() {
    let dir = TempDir::new().unwrap();
    let path = helpers::write(&dir, "config.toml", &default_config().unwrap());

    let config = assert_ok!(load_config(Some(&path)).into_result());
    assert_eq!(config.backend().kind(), BackendKind::Memory);
    assert_eq!(config.sync().poll_interval_ms(), 3000);
    assert_eq!(config.sync().grace_window_ms(), 5000);
    assert_eq!(config.sync().settings_key(), "current_theme");
}

#[test]
fn test_rest_backend_config() {
    let dir = TempDir::new().unwrap();
    let path = helpers::write(
        &dir,
        "rest.toml",
        r#"
[sync]
poll_interval_ms = 2000
cache_file = "/var/tmp/theme-sync/cache.json"

[backend]
kind = "rest"
url = "https://shop.supabase.co"
api_key = "anon"
table = "settings"
"#,
    );

    let config = assert_ok!(load_config(Some(&path)).into_result());
    let rest = assert_some!(config.backend().rest_config());
    assert_eq!(rest.base_url, "https://shop.supabase.co");
    assert_eq!(
        assert_ok!(config.sync().cache_file()),
        std::path::PathBuf::from("/var/tmp/theme-sync/cache.json")
    );
}

#[test]
fn test_invalid_config_lists_every_problem() {
    let dir = TempDir::new().unwrap();
    let path = helpers::write(
        &dir,
        "bad.toml",
        "[sync]\npoll_interval_ms = 5\n\n[backend]\nkind = \"rest\"\n",
    );

    let error = assert_err!(load_config(Some(&path)).into_result());
    let AppError::Config(message) = &error else {
        panic!("expected a configuration error, got {error:?}");
    };
    assert!(message.contains("poll_interval_ms"));
    assert!(message.contains("[backend] url"));
    assert!(message.contains("[backend] api_key"));
    assert_eq!(error.exit_code(), 2);
}

#[test]
fn test_unknown_backend_kind_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = helpers::write(&dir, "kind.toml", "[backend]\nkind = \"firebase\"\n");

    let error = assert_err!(load_config(Some(&path)).into_result());
    assert_matches!(error, AppError::Config(msg) if msg.contains("deserialize"));
}
