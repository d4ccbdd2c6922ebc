use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use konnect::{api, config::AppConfig, seed, state::AppState, tasks};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "konnect=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting konnect...");

    let config = AppConfig::from_env();
    let port = config.port;
    let snapshot = config
        .snapshot_path
        .clone()
        .map(|path| (path, config.snapshot_interval));
    let seed_demo = config.seed_demo;

    let state = Arc::new(AppState::new(config));

    if seed_demo {
        match state.import_state(seed::demo_snapshot()).await {
            Ok(()) => tracing::info!("Demo data loaded"),
            Err(e) => tracing::warn!("Failed to load demo data: {}", e),
        }
    }

    // Restore the previous snapshot, then keep writing new ones
    if let Some((path, interval)) = snapshot {
        match state.load_snapshot(&path).await {
            Ok(true) => tracing::info!(path = %path.display(), "Snapshot restored"),
            Ok(false) => tracing::info!(path = %path.display(), "No snapshot yet, starting empty"),
            Err(e) => tracing::warn!(path = %path.display(), "Failed to restore snapshot: {}", e),
        }
        tasks::spawn_snapshot_writer(state.clone(), path, interval);
    }

    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
