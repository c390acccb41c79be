use crate::{ConfigError, ConfigErrorResult, DEFAULT_KEY_STORE_PATH, DEFAULT_KEY_STORE_WATCH};

use serde::Deserialize;

/// Location of the signing key file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeyStoreConfig {
    /// Absolute, or relative to the config dir
    pub path: String,
    /// Reload the file when it changes
    pub watch: bool,
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        Self {
            path: String::from(DEFAULT_KEY_STORE_PATH),
            watch: DEFAULT_KEY_STORE_WATCH,
        }
    }
}

impl KeyStoreConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.path.trim().is_empty() {
            return Err(ConfigError::key_store("key_store.path must not be empty"));
        }

        if self.path.contains("..") {
            return Err(ConfigError::key_store(
                "key_store.path cannot contain '..'",
            ));
        }

        Ok(())
    }
}
