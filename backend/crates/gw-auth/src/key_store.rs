use crate::{AuthError, KeyEntry, Result as AuthErrorResult};

use std::collections::HashMap;
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use error_location::ErrorLocation;
use log::{debug, info, warn};
use metrics::counter;

/// One immutable version of the loaded keys
pub type KeyMap = HashMap<String, Arc<KeyEntry>>;

/// Hot-reloadable key id -> key entry mapping.
///
/// Each reload builds a complete new [`KeyMap`] and publishes it with a single
/// pointer swap, so a reader sees either the old or the new version, never a mix.
pub struct KeyStore {
    keys: ArcSwap<KeyMap>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self {
            keys: ArcSwap::from_pointee(KeyMap::new()),
        }
    }

    /// Read and parse the key file, replacing the current map.
    ///
    /// On read failure the previously loaded keys stay in place.
    #[track_caller]
    pub fn load(&self, path: &Path) -> AuthErrorResult<usize> {
        let caller = Location::caller();
        let contents = std::fs::read_to_string(path)
            .map_err(|source| read_failed(path, source, caller))?;

        let count = self.replace(&contents);
        info!("Loaded {} signing key(s) from {}", count, path.display());
        Ok(count)
    }

    /// [`load`](Self::load) off the runtime's worker thread, for file events
    pub async fn reload(&self, path: &Path) -> AuthErrorResult<usize> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| read_failed(path, source, Location::caller()))?;

        Ok(self.replace(&contents))
    }

    /// Parse `contents` and publish the result as the new map
    pub fn replace(&self, contents: &str) -> usize {
        let keys = parse_key_file(contents);
        let count = keys.len();
        self.keys.store(Arc::new(keys));
        counter!("gateway_key_store_reloads_total", "result" => "ok").increment(1);
        count
    }

    /// Drop every key (the key file was deleted)
    pub fn clear(&self) {
        self.keys.store(Arc::new(KeyMap::new()));
        info!("Key store cleared");
    }

    pub fn get_key(&self, key_id: &str) -> Option<Arc<KeyEntry>> {
        self.keys.load().get(key_id).cloned()
    }

    /// The current map version
    pub fn snapshot(&self) -> Arc<KeyMap> {
        self.keys.load_full()
    }

    pub fn len(&self) -> usize {
        self.keys.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.load().is_empty()
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read_failed(
    path: &Path,
    source: std::io::Error,
    location: &'static Location<'static>,
) -> AuthError {
    counter!("gateway_key_store_reloads_total", "result" => "error").increment(1);
    AuthError::KeyFileRead {
        path: path.to_path_buf(),
        source,
        location: ErrorLocation::from(location),
    }
}

/// Parse the `keyId,algorithm,material` format.
///
/// Material continues over the following lines until the next line that
/// starts a record, so PEM blocks can span lines. Blank lines and lines
/// before the first record are ignored.
pub fn parse_key_file(contents: &str) -> KeyMap {
    let mut keys = KeyMap::new();
    let mut pending: Option<KeyEntry> = None;

    for line in contents.lines() {
        if let Some((key_id, algorithm, material)) = split_record(line) {
            if let Some(entry) = pending.take() {
                insert_entry(&mut keys, entry);
            }
            pending = Some(KeyEntry::new(key_id, algorithm, material.trim()));
            continue;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match pending.as_mut() {
            Some(entry) => {
                if !entry.material.is_empty() {
                    entry.material.push('\n');
                }
                entry.material.push_str(line);
            }
            None => debug!("Skipping key file line outside of a record"),
        }
    }

    if let Some(entry) = pending.take() {
        insert_entry(&mut keys, entry);
    }

    keys
}

fn insert_entry(keys: &mut KeyMap, entry: KeyEntry) {
    if keys.contains_key(&entry.key_id) {
        warn!(
            "Duplicate key id '{}' in key file, later entry wins",
            entry.key_id
        );
    }
    keys.insert(entry.key_id.clone(), Arc::new(entry));
}

/// `<token>,<token>,<rest>` where tokens are non-empty and contain no whitespace
fn split_record(line: &str) -> Option<(&str, &str, &str)> {
    let mut parts = line.splitn(3, ',');
    let key_id = parts.next()?.trim();
    let algorithm = parts.next()?.trim();
    let material = parts.next()?;

    let is_token = |s: &str| !s.is_empty() && !s.chars().any(char::is_whitespace);
    if is_token(key_id) && is_token(algorithm) {
        Some((key_id, algorithm, material))
    } else {
        None
    }
}
