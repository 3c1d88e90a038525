mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use projection::config::Config;
use projection::{Framework, observability};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let config = Config::load()?;
    observability::init(&config.telemetry.log_filter);

    let framework = Framework::new(config.storage_client()?).with_logger(observability::current());

    match cli.command {
        Commands::Convert(args) => commands::convert(&framework, args, &config.output).await?,
        Commands::Types => commands::types(&framework),
    }

    Ok(())
}
