use super::app::AppConfig;
use crate::error::{AppError, AppResult};

const HEADER: &str = "\
# theme-sync configuration
#
# Every value can be overridden from the environment, for example:
#   THEME_SYNC_SYNC__POLL_INTERVAL_MS=1000
#   THEME_SYNC_BACKEND__KIND=rest
#   THEME_SYNC_BACKEND__URL=https://your-project.supabase.co
#   THEME_SYNC_BACKEND__API_KEY=...
#
# [sync]     poll_interval_ms 100-60000, grace_window_ms 0-60000
# [backend]  kind = \"memory\" | \"rest\"; rest needs url and api_key
# [logging]  level = trace | debug | info | warn | error
";

/// Render the default `config.toml`, used by `theme-sync init`
pub fn default_config() -> AppResult<String> {
    let body = toml::to_string_pretty(&AppConfig::with_defaults())
        .map_err(|e| AppError::Config(format!("Failed to render default config: {e}")))?;
    Ok(format!("{HEADER}\n{body}"))
}
