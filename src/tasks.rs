use crate::state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Spawn a background task that periodically writes a state snapshot to `path`.
///
/// Abort the returned handle to stop it.
pub fn spawn_snapshot_writer(
    state: Arc<AppState>,
    path: PathBuf,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately; nothing has changed yet
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match state.save_snapshot(&path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "Snapshot written"),
                Err(e) => tracing::error!(path = %path.display(), "Snapshot failed: {}", e),
            }
        }
    })
}
