//! Charmander scheduler binary.
//!
//! Runs the state publication loop against the configured key-value
//! store and serves the admin HTTP surface.

use std::sync::Arc;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use charmander_manager::InMemoryManager;
use charmander_scheduler::{api, SchedulerConfig};
use charmander_sync::StateReporter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("charmander_scheduler=info".parse()?)
                .add_directive("charmander_sync=info".parse()?),
        )
        .init();

    info!("charmander scheduler starting");

    // Load configuration
    let config: SchedulerConfig = Figment::new()
        .merge(Toml::file("charmander.toml"))
        .merge(Env::prefixed("CHARMANDER_").split("_"))
        .extract()?;

    info!(
        store = %config.store.address,
        interval_secs = config.sync.interval.as_secs(),
        "Configuration loaded"
    );

    // The manager is the embedding point for the wider scheduler; the
    // in-memory implementation carries the cluster view here.
    let manager = Arc::new(InMemoryManager::new(config.store.address.clone()));

    // Start the state publication loop
    let reporter = Arc::new(StateReporter::new(manager.clone(), config.sync.clone()));
    let cancel = CancellationToken::new();
    tokio::spawn({
        let reporter = reporter.clone();
        let cancel = cancel.clone();
        async move { reporter.run(cancel).await }
    });
    info!(interval_secs = config.sync.interval.as_secs(), "State reporter started");

    // Cancel the loop when the process is asked to stop
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            cancel.cancel();
        }
    });

    // Serve the admin API
    let state = Arc::new(api::AppState { reporter });
    let app = api::router(state);
    let listener = TcpListener::bind(&config.api.listen_addr).await?;
    info!(addr = %config.api.listen_addr, "Admin API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown({
            let cancel = cancel.clone();
            async move { cancel.cancelled().await }
        })
        .await?;

    Ok(())
}
