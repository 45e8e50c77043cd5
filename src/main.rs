//! Version Watch — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the store, registry, scheduler, and
//! static dashboard.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use version_watch::api::{create_router, AppState};
use version_watch::config::WatchConfig;
use version_watch::metrics::Metrics;
use version_watch::registry::AdapterRegistry;
use version_watch::scheduler::spawn_schedule;
use version_watch::source::load_sources;
use version_watch::store::VersionStore;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("version_watch=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = WatchConfig::load().context("loading configuration")?;

    let specs = load_sources(&cfg.sources_path)
        .with_context(|| format!("loading source catalog {}", cfg.sources_path.display()))?;
    let registry = Arc::new(
        AdapterRegistry::from_specs(&specs, &cfg.adapter_settings())
            .context("building adapter registry")?,
    );
    let store = Arc::new(
        VersionStore::open(&cfg.state_path)
            .with_context(|| format!("opening state at {}", cfg.state_path.display()))?,
    );
    tracing::info!(
        sources = registry.len(),
        known = store.len(),
        state = %cfg.state_path.display(),
        "version watcher starting"
    );

    let metrics = Metrics::init();

    spawn_schedule(registry.clone(), store.clone(), cfg.schedule_cfg());

    let state = AppState {
        store,
        registry,
        adapter_timeout: Duration::from_secs(cfg.adapter_timeout_secs),
    };
    let router = create_router(state, &cfg.public_dir).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, "listening");
    axum::serve(listener, router).await.context("http server")?;
    Ok(())
}
