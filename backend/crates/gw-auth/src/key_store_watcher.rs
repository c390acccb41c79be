use crate::{AuthError, KeyStore, Result as AuthErrorResult};

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use error_location::ErrorLocation;
use log::{debug, error, info, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Background watcher that keeps a [`KeyStore`] in sync with its key file.
///
/// The parent directory is watched (not the file itself) so that editors which
/// replace the file by rename, and deletes followed by re-creates, are seen.
pub struct KeyStoreWatcher {
    watcher: Option<RecommendedWatcher>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    path: PathBuf,
}

impl KeyStoreWatcher {
    /// Start watching `path`. Must be called from within a tokio runtime.
    #[track_caller]
    pub fn spawn(store: Arc<KeyStore>, path: impl Into<PathBuf>) -> AuthErrorResult<Self> {
        let path = path.into();
        let watch_dir = watch_directory(&path);
        let caller = Location::caller();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver only goes away during shutdown
            let _ = event_tx.send(res);
        })
        .map_err(|source| AuthError::KeyFileWatch {
            path: path.clone(),
            source,
            location: ErrorLocation::from(caller),
        })?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|source| AuthError::KeyFileWatch {
                path: path.clone(),
                source,
                location: ErrorLocation::from(caller),
            })?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(watch_loop(store, path.clone(), event_rx, stop_rx));

        info!(
            "Watching key file {} (directory {})",
            path.display(),
            watch_dir.display()
        );

        Ok(Self {
            watcher: Some(watcher),
            stop_tx: Some(stop_tx),
            task: Some(task),
            path,
        })
    }

    /// Stop the background task and release the OS watch handle
    pub async fn shutdown(mut self) {
        // Dropping the watcher closes the event channel as well
        self.watcher.take();

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            error!("Key file watcher task failed: {}", e);
        }

        info!("Stopped watching key file {}", self.path.display());
    }
}

fn watch_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

async fn watch_loop(
    store: Arc<KeyStore>,
    path: PathBuf,
    mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                debug!("Key file watcher received stop signal");
                break;
            }
            event = events.recv() => match event {
                Some(Ok(event)) => apply_event(&store, &path, &event).await,
                Some(Err(e)) => warn!("Key file watch error for {}: {}", path.display(), e),
                None => break,
            },
        }
    }
}

/// Apply one file system event to the store.
///
/// Create/modify reload the file; remove clears the store. A failed reload
/// keeps the last-known-good keys.
pub(crate) async fn apply_event(store: &KeyStore, path: &Path, event: &Event) {
    if !event.paths.iter().any(|p| p.file_name() == path.file_name()) {
        return;
    }

    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => {
            if !path.exists() {
                // Renamed away
                store.clear();
                return;
            }
            match store.reload(path).await {
                Ok(count) => info!(
                    "Reloaded {} signing key(s) from {}",
                    count,
                    path.display()
                ),
                Err(e) => warn!("Keeping previous signing keys: {}", e),
            }
        }
        EventKind::Remove(_) => {
            warn!("Key file {} was removed", path.display());
            store.clear();
        }
        _ => {}
    }
}
