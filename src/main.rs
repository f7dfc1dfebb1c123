//! StudioGear
//!
//! Main application entry point

use clap::Parser;
use tracing::{error, info};

use studio_gear::{
    config::Settings,
    handlers::{handle_command, Cli},
    services::ServiceFactory,
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::new()?,
    };
    settings.validate()?;

    // Initialize logging
    let _guard = logging::init_logging(&settings.logging)?;
    info!("Starting {}", studio_gear::info());

    // Initialize services
    let services = ServiceFactory::new(settings)?;

    if let Err(e) = handle_command(cli.command, services).await {
        error!(error = %e, "Command failed");
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }

    Ok(())
}
