use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quarry_core::{
    load_config, validate_config, AlwaysOnline, AvailabilityGate, CampaignEngine, CampaignStore,
    ConnectivityProbe, EngineSettings, FsInventory, HttpJsonSource, HttpProbe, PoolDispatcher,
    ResultFilter, Scheduler, SourceRouter, SqliteCampaignStore, SqliteCandidateStore,
};
use quarry_server::{create_router, AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("QUARRY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded"
    );
    info!("Database path: {:?}", config.database.path);

    let campaigns = Arc::new(
        SqliteCampaignStore::new(&config.database.path)
            .context("Failed to create campaign store")?,
    );
    let candidates = Arc::new(
        SqliteCandidateStore::new(&config.database.path)
            .context("Failed to create candidate store")?,
    );
    info!(
        "Campaign store initialized ({} campaigns)",
        campaigns.count().unwrap_or(0)
    );

    let probe: Arc<dyn ConnectivityProbe> = match &config.gate.probe_url {
        Some(url) => {
            info!("Probing connectivity via {}", url);
            Arc::new(
                HttpProbe::new(url.clone(), Duration::from_secs(config.gate.probe_timeout_secs))
                    .context("Failed to create connectivity probe")?,
            )
        }
        None => {
            info!("No probe URL configured, assuming always online");
            Arc::new(AlwaysOnline)
        }
    };
    let gate = Arc::new(AvailabilityGate::from_config(probe, &config.gate));

    let pool = Arc::new(PoolDispatcher::new(config.scheduler.workers_limit));

    let scheduler = match &config.source {
        Some(source_config) if config.scheduler.enabled => {
            info!(
                "Initializing source {:?} at {}",
                source_config.name, source_config.url
            );
            let source = HttpJsonSource::new(source_config.clone())
                .context("Failed to create source client")?;

            let engine = Arc::new(CampaignEngine::new(
                campaigns.clone(),
                candidates,
                SourceRouter::uniform(Arc::new(source)),
                Arc::new(FsInventory::new(config.inventory.clone())),
                gate.clone(),
                ResultFilter::from_config(&config.filters)?,
                EngineSettings {
                    policy: config.policy.clone(),
                    continuation: config.continuation.clone(),
                    page_budget_max: config.scheduler.page_budget_max,
                },
            ));

            let scheduler = Arc::new(Scheduler::new(
                config.scheduler.clone(),
                engine,
                gate.clone(),
                pool.clone(),
            ));
            scheduler.start();
            info!("Scheduler started");
            Some(scheduler)
        }
        Some(_) => {
            info!("Scheduler disabled in config");
            None
        }
        None => {
            warn!("No source configured, scheduler not started");
            None
        }
    };

    let state = Arc::new(AppState::new(
        campaigns,
        gate,
        pool,
        scheduler.clone(),
    ));
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(scheduler) = &scheduler {
        info!("Stopping scheduler...");
        scheduler.stop();
    }
    info!("Server shut down");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
