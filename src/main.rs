//! Skriv CLI entry point.

use anyhow::Result;
use clap::Parser;
use skriv::cli::commands::{self, RunOptions};
use skriv::cli::{log_filter, Cli, Commands};
use skriv::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // API keys may live in a local env file
    dotenvy::dotenv().ok();
    dotenvy::from_filename("api_keys.env").ok();

    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            log_filter(cli.verbose, &settings.general.log_level)
        })))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Run {
            video,
            language,
            extraction_model,
            blog_model,
            output,
            format,
        } => {
            let options = RunOptions {
                video,
                language,
                extraction_model,
                blog_model,
                output,
                format,
            };
            commands::run_pipeline(options, settings).await?;
        }

        Commands::Transcript { video, language } => {
            commands::run_transcript(&video, language, settings).await?;
        }

        Commands::Ask { question, raw, model } => {
            commands::run_ask(&question, raw, model, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, config_path)?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, config_path)?;
        }
    }

    Ok(())
}
