use crate::config::LoggingConfig;
use crate::error::AppResult;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::fs::OpenOptions;

pub fn level_filter(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info, // Default to Info for any other value
    }
}

/// Install the global logger. Output goes to the configured file, or to
/// stderr when no file is set or it cannot be opened.
pub fn setup_logger(config: &LoggingConfig) -> AppResult<()> {
    let colors = ColoredLevelConfig::new()
        .trace(Color::BrightBlack)
        .debug(Color::BrightBlue)
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red);

    let base_config = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level_filter(config.level()))
        // Keep HTTP client internals out of the user's log
        .level_for("reqwest", LevelFilter::Warn)
        .level_for("hyper_util", LevelFilter::Warn);

    match config.file() {
        Some(file_path) => match OpenOptions::new().create(true).append(true).open(file_path) {
            Ok(file) => base_config.chain(file).apply()?,
            Err(e) => {
                eprintln!("Warning: Failed to open log file '{file_path}': {e}");
                eprintln!("Continuing with logging to stderr.");
                base_config.chain(std::io::stderr()).apply()?;
            }
        },
        None => base_config.chain(std::io::stderr()).apply()?,
    }

    log::debug!("Logger initialized with level: {}", config.level());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter_parsing() {
        assert_eq!(level_filter("TRACE"), LevelFilter::Trace);
        assert_eq!(level_filter("debug"), LevelFilter::Debug);
        assert_eq!(level_filter("Warn"), LevelFilter::Warn);
        assert_eq!(level_filter("error"), LevelFilter::Error);
        assert_eq!(level_filter("off"), LevelFilter::Off);
        assert_eq!(level_filter("verbose"), LevelFilter::Info);
    }
}
