//! CLI entry point - the composition root.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use evsub_cli::{Cli, CliConfig, Commands, handlers};

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = CliConfig::from_cli(&cli);
    let result = match cli.command {
        Commands::Watch(args) => handlers::watch::execute(&config, args).await,
    };

    if let Err(err) = result {
        tracing::debug!(error = ?err, "command failed");
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code());
    }

    Ok(())
}
