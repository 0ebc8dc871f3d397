use std::process::ExitCode;
use std::sync::Arc;
use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info};
use crate::config::Config;
use crate::controller::AppState;
use crate::repositories::postgres_repo::PostgresConnectionRepo;

pub mod config;
pub mod controller;
pub mod helpers;
pub mod logging;
pub mod models;
pub mod repositories;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let config = Config::parse();
    logging::init(&config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Reservation service stopped: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let settings = config.database_settings()?;
    info!("Connecting to database: {}", settings.redacted_dsn());
    let postgres_repo = PostgresConnectionRepo::connect(&settings, config.pool_size()).await?;
    info!("Database connection established");

    let app_state = AppState {
        reservation_repo: Arc::new(postgres_repo),
        enforce_unique_plate: config.enforce_unique_plate,
    };

    controller::serve(app_state, &config).await
}
