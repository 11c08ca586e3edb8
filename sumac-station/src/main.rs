use std::path::Path;
use sumac_station::{Station, StationConfig, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, logging)
    setup_environment()?;

    print_banner();

    tracing::info!("Sumac print station starting...");

    // 2. Configuration
    let config = StationConfig::from_env();

    // 3. Pipeline assembly and working directories
    let station = Station::initialize(&config).await?;

    // 4a. One-shot: print the order file given on the command line
    if let Some(order_file) = std::env::args().nth(1) {
        return station.print_file(Path::new(&order_file)).await;
    }

    // 4b. Watch the spool until interrupted
    if let Err(e) = station.run().await {
        tracing::error!("Station error: {}", e);
        return Err(e);
    }

    Ok(())
}
