use std::fs;

use anyhow::{Context, Result};
use clap::Parser;

mod models;
mod repositories;
mod services;
mod settings;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Overrides `http.listen` from the config file.
    #[arg(short, long)]
    listen: Option<String>,
    #[arg(long, default_value = "log4rs.yaml")]
    log4rs: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    let mut settings = settings::Settings::load(&args.config)?;
    if let Some(listen) = args.listen {
        settings.http.listen = listen;
    }

    init_logging(&args.log4rs)?;
    log::info!("Starting expense tracker.");

    let conn = repositories::database::connect(&settings.database).await?;
    repositories::database::init_schema(&conn).await?;
    log::info!("Database ready at {}", settings.database.url);

    services::start_services(conn, settings).await
}

/// Log files roll under `logs/`, which is created on first start.
fn init_logging(config_path: &str) -> Result<()> {
    fs::create_dir_all("logs").context("Could not create the logs directory")?;
    log4rs::init_file(config_path, Default::default())
        .with_context(|| format!("Could not initialize logging from {config_path}"))?;

    log::info!("Logging configured from {config_path}.");
    Ok(())
}
