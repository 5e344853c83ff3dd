mod commands;
mod config;
mod logging;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use adminkit_auth::FileStorage;
use adminkit_sdk::AdminConsole;
use anyhow::{Context, Result};
use clap::Parser;

use crate::config::AppConfig;
use crate::output::Format;

/// Admin console for the back-office API
#[derive(Parser)]
#[command(name = "admin-console")]
#[command(version, about = "Admin console for the back-office API", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API base URL (overrides config)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<commands::Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config
        && !path.is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    logging::init(cli.verbose, cli.log_json);

    // defaults -> YAML -> env (ADMIN_CONSOLE__*) -> CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.base_url);

    if cli.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    let Some(command) = cli.command else {
        anyhow::bail!("no command given (see --help)");
    };

    tracing::debug!(
        base_url = %config.api.base_url,
        session = %config.session.store_path.display(),
        "starting"
    );
    let storage = Arc::new(FileStorage::new(config.session.store_path.clone()));
    let console = AdminConsole::connect(&config.api.base_url, &config.http_client_config()?, storage)
        .context("failed to set up the API client")?;

    let result = command.run(&console, Format::from_flag(cli.json)).await;
    console.close();
    result
}
