use anyhow::Result;
use tracing::info;

mod car_scout;
mod config;
mod diff;
mod filter;
mod models;
mod scrapers;
mod state;
mod telegram;
mod traits;

use car_scout::CarScout;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = config::Config::from_env()?;
    info!(
        "car-scout: watching for {} {} around {}",
        config.search.make, config.search.model, config.search.postcode
    );

    let scout = CarScout::new(config)?;
    let summary = scout.run().await?;

    info!(
        "run complete: {} scraped, {} kept, {} previously seen, {} new, {} notified, {} failed",
        summary.scraped,
        summary.kept,
        summary.previously_seen,
        summary.new,
        summary.notified,
        summary.failed_notifications
    );
    Ok(())
}
