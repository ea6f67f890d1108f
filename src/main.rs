use clap::Parser;
use pricing_hub::cli::{Cli, Commands};
use pricing_hub::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration, falling back to defaults when the file is absent
    let config = Config::load_or_default(&cli.config)?;

    // Initialize telemetry
    pricing_hub::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Serve(args) => {
            tracing::info!(mode = ?config.feed.mode, port = config.server.port, "Starting pricing service");
            args.execute(config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
