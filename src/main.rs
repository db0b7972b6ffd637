//! Syllabus Tutor - chat with your course syllabus
//!
#![doc = "Syllabus Tutor - chat with your course syllabus"]
#![doc = "Main entry point for the syllabus tutor application."]

use anyhow::Result;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use syllabus_tutor::cli::{Cli, Commands};
use syllabus_tutor::commands;
use syllabus_tutor::config::Config;
use syllabus_tutor::credentials::CredentialPool;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path)?;

    // Validate configuration
    config.validate()?;

    // Credentials are loaded once and shared by every consumer
    let pool = Arc::new(CredentialPool::load(&config.credentials));

    match cli.command {
        Commands::Chat { file, prefer } => {
            if let Some(path) = &file {
                tracing::debug!("Uploading {} before the first prompt", path.display());
            }
            commands::chat::run_chat(config, pool, file, prefer).await?;
            Ok(())
        }
        Commands::Ask {
            file,
            prompt,
            prefer,
        } => {
            tracing::info!("Answering a single question about {}", file.display());
            commands::ask::run_ask(config, pool, file, prompt, prefer).await?;
            Ok(())
        }
        Commands::Topics { file, json } => {
            tracing::info!("Extracting topics from {}", file.display());
            commands::topics::run_topics(config, pool, file, json).await?;
            Ok(())
        }
        Commands::Keys => {
            commands::keys::show_keys(&config, &pool);
            Ok(())
        }
        Commands::Preferences => {
            commands::preferences::list_preferences();
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "syllabus_tutor=debug"
    } else {
        "syllabus_tutor=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
