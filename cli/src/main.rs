use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use theme_sync_cli::commands;
use theme_sync_cli::config::{self, AppConfig};
use theme_sync_cli::error::AppResult;
use theme_sync_cli::logger;

#[derive(Parser)]
#[command(name = "theme-sync", version, about = "Keep the storefront theme in sync")]
struct Cli {
    /// Configuration file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the available themes
    List,
    /// Show the remote theme record
    Get,
    /// Set the theme for every connected context
    Set {
        /// Theme slug, e.g. `christmas` or `mothers-day`
        theme: String,
    },
    /// Print theme changes as they are applied
    Watch {
        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// Print a default config.toml
    Init,
}

fn load(cli: &Cli) -> AppResult<AppConfig> {
    let config = config::load_config(cli.config.as_deref()).into_result()?;
    logger::setup_logger(config.logging())?;
    Ok(config)
}

async fn run(cli: Cli) -> AppResult<()> {
    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Command::List => commands::list(&mut stdout),
        Command::Init => {
            let template = config::default_config()?;
            write!(stdout, "{template}")?;
            Ok(())
        }
        Command::Get => {
            let config = load(&cli)?;
            let store = commands::build_store(config.backend())?;
            commands::get(&config, store.as_ref(), &mut stdout).await
        }
        Command::Set { theme } => {
            let config = load(&cli)?;
            let store = commands::build_store(config.backend())?;
            commands::set(&config, store, theme, &mut stdout).await
        }
        Command::Watch { seconds } => {
            let config = load(&cli)?;
            let store = commands::build_store(config.backend())?;
            let duration = seconds.map(Duration::from_secs);
            commands::watch(&config, store, duration, &mut stdout).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("{e}");
            if commands::is_usage_error(&e) {
                eprintln!("Run `theme-sync --help` for usage.");
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
