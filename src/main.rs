//! Recordview server
//!
//! Serves a record collection through the cache, search session and
//! viewport renderer over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recordview::api::create_router;
use recordview::source::MemorySource;
use recordview::storage::{DurableStore, FileStore, MemoryStore};
use recordview::{spawn_cleanup_task, spawn_view_sync_task, AppState, Config};

/// Startup sequence: tracing, configuration, durable mirror, state,
/// background tasks, then the HTTP server until Ctrl+C or SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recordview=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recordview server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, default_ttl={}s, port={}, cleanup_interval={}s, search_limit={}",
        config.max_entries,
        config.default_ttl,
        config.server_port,
        config.cleanup_interval,
        config.search_limit
    );

    let durable: Arc<dyn DurableStore> = match &config.store_path {
        Some(path) => {
            let store = FileStore::open(path)
                .with_context(|| format!("opening durable store at {}", path.display()))?;
            info!("Durable mirror backed by {}", path.display());
            Arc::new(store)
        }
        None => {
            info!("Durable mirror kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let source = Arc::new(MemorySource::new());
    let state = AppState::new(&config, durable, source).context("building viewport renderer")?;

    let sync_handle = {
        let session = state.session.lock().await;
        spawn_view_sync_task(session.subscribe(), state.view.clone())
    };
    if let Err(e) = state.session.lock().await.load().await {
        warn!(error = %e, "Initial collection load failed");
    }

    let cleanup_handle = spawn_cleanup_task(state.catalog.cache().clone(), config.cleanup_interval);
    info!("Background tasks started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(vec![cleanup_handle, sync_handle]))
        .await
        .context("serving HTTP")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then aborts the background tasks.
async fn shutdown_signal(tasks: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for task in tasks {
        task.abort();
    }
    warn!("Background tasks aborted");
}
