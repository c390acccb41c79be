use gw_auth::{KeyStore, KeyStoreWatcher};

use std::path::Path;
use std::sync::Arc;

use log::{error, info, warn};

/// Initial key load. An unreadable file starts the gateway with no keys.
pub fn load_keys(key_store: &KeyStore, path: &Path) {
    match key_store.load(path) {
        Ok(count) => info!("Loaded {} keys from {}", count, path.display()),
        Err(e) => warn!("Starting without keys: {}", e),
    }
}

/// Start hot-reloading the key file.
///
/// Failing to set up the watch is logged and the gateway keeps serving the
/// keys it already loaded.
pub fn start_key_watcher(key_store: Arc<KeyStore>, path: &Path) -> Option<KeyStoreWatcher> {
    match KeyStoreWatcher::spawn(key_store, path) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            error!("Key file watching disabled, keys will not hot-reload: {}", e);
            None
        }
    }
}
