// Procurement Radar - Web Server
// JSON API over Doffin notices and SSB classifications

use anyhow::{Context, Result};
use clap::Parser;
use procurement_radar::config::Args;
use procurement_radar::logging::init_tracing;
use procurement_radar::procurement::DoffinClient;
use procurement_radar::server::{build_router, AppState};
use procurement_radar::ssb::{refresh_scheme, ClassificationSource, SsbClient};
use procurement_radar::{ProcurementSearchService, PublishOutcome, Scheme, SchemeRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(&args.log_level);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("🌐 Procurement Radar - Web Server");

    // Classifications
    let ssb = SsbClient::new(&args.ssb_base_url, args.request_timeout())
        .context("Failed to build SSB client")?;
    let sources: Vec<(Scheme, ClassificationSource)> = Scheme::ALL
        .into_iter()
        .map(|scheme| (scheme, args.source(scheme, &ssb)))
        .collect();

    let registry = Arc::new(SchemeRegistry::new());
    for (scheme, source) in &sources {
        // A scheme that fails to load is reported as unavailable by the API
        if let Err(e) = refresh_scheme(&registry, *scheme, source).await {
            error!(scheme = %scheme, error = %e, "classification not loaded");
        }
    }

    // Doffin
    let mut state = AppState::new(Arc::clone(&registry));
    match args.doffin_api_key() {
        Some(key) => {
            let client = DoffinClient::new(key, &args.doffin_base_url, args.request_timeout())
                .context("Failed to build Doffin client")?;
            state = state.with_search(ProcurementSearchService::new(Arc::new(client)));
            info!(base_url = %args.doffin_base_url, "notice search enabled");
        }
        None => warn!("DOFFIN_API_KEY is not set, notice search is disabled"),
    }

    if let Some(period) = args.refresh_interval() {
        info!(every_secs = period.as_secs(), "classification refresh enabled");
        tokio::spawn(refresh_loop(Arc::clone(&registry), sources, period));
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", args.listen))?;

    info!("🚀 Server running on http://{}", args.listen);
    info!("   API: http://{}/api/health", args.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Refetch every scheme on a fixed period. Failures keep the live snapshot.
async fn refresh_loop(
    registry: Arc<SchemeRegistry>,
    sources: Vec<(Scheme, ClassificationSource)>,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately and startup already loaded everything
    ticker.tick().await;

    loop {
        ticker.tick().await;
        for (scheme, source) in &sources {
            match refresh_scheme(&registry, *scheme, source).await {
                Ok(PublishOutcome::Unchanged) => debug!(scheme = %scheme, "classification unchanged"),
                Ok(outcome) => info!(scheme = %scheme, ?outcome, "classification refreshed"),
                Err(e) => warn!(scheme = %scheme, error = %e, "refresh failed, keeping previous snapshot"),
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
