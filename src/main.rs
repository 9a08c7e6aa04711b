//! Binary entry point for the dispatch decision engine.

use triage::api::RemoteClient;
use triage::catalog::Catalog;
use triage::config::EngineConfig;
use triage::engine::SimulationEngine;

#[tokio::main]
async fn main() {
    // Load .env before reading configuration; a missing file is fine.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "triage=debug,info".parse().expect("valid env filter")),
        )
        .init();

    if let Err(error) = run().await {
        eprintln!("triage run failed: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let config = EngineConfig::from_env().map_err(|error| error.to_string())?;

    let catalog = match &config.catalog_path {
        Some(path) => Some(
            Catalog::open(path)
                .map_err(|error| format!("failed to open catalog at {}: {error}", path.display()))?,
        ),
        None => None,
    };

    let client = RemoteClient::new(&config);
    let mut engine = SimulationEngine::new(client, config.home_county.clone(), catalog);
    let report = engine.run().await;

    tracing::info!(
        "run complete: {}/{} emergencies fully resolved, {} candidates remaining",
        report.events_resolved,
        report.events_handled,
        report.candidates_remaining
    );
    Ok(())
}
