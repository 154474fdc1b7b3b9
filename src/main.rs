use anyhow::Context;
use clap::Parser;
use session_gate::cli::{self, Cli, Command};
use session_gate::config::AppConfig;
use session_gate::infrastructure::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = AppConfig::load().context("failed to load configuration")?;
    init_logging(&config.logging);

    match cli.command {
        Command::Serve => cli::serve::run(config).await,
        Command::Sessions(args) => cli::sessions::run(config, args).await,
    }
}
