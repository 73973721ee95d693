use crate::state::AppState;
use std::time::{Duration, SystemTime};
use tokio::sync::watch;

/// Periodically delete staged uploads that were never attached to a
/// movie. Anything older than the configured max age is fair game.
pub async fn run(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let interval = Duration::from_secs(state.config.temp_sweep_interval_secs);
    let max_age = Duration::from_secs(state.config.temp_max_age_secs);

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {
                tracing::info!("Temp reaper shutting down");
                return;
            }
        }

        match sweep(&state, max_age).await {
            Ok(0) => {}
            Ok(count) => tracing::info!(count, "Stale staged uploads removed"),
            Err(e) => tracing::warn!(error = %e, "Temp sweep failed"),
        }
    }
}

pub async fn sweep(state: &AppState, max_age: Duration) -> std::io::Result<u64> {
    let mut entries = match tokio::fs::read_dir(state.store.temp_dir()).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let now = SystemTime::now();
    let mut removed = 0u64;

    while let Some(entry) = entries.next_entry().await? {
        let meta = match entry.metadata().await {
            Ok(meta) => meta,
            Err(_) => continue,
        };
        if !meta.is_file() {
            continue;
        }
        let modified = match meta.modified() {
            Ok(modified) => modified,
            Err(_) => continue,
        };
        let stale = now
            .duration_since(modified)
            .map(|age| age >= max_age)
            .unwrap_or(false);
        if !stale {
            continue;
        }

        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => {
                removed += 1;
                tracing::debug!(path = %entry.path().display(), "Stale staged upload removed");
            }
            Err(e) => {
                tracing::warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "Failed to remove stale staged upload"
                );
            }
        }
    }

    Ok(removed)
}
