mod routes;

use crate::{CONFIG_DIR_ENV, CONFIG_FILE_NAME};

use std::env;

use tempfile::TempDir;

/// RAII guard for environment variables - automatically restores on drop
pub(crate) struct EnvGuard {
    key: &'static str,
    original: Option<String>,
}

impl EnvGuard {
    pub(crate) fn set(key: &'static str, value: &str) -> Self {
        unsafe {
            let original = env::var(key).ok();
            env::set_var(key, value);
            Self { key, original }
        }
    }

    pub(crate) fn remove(key: &'static str) -> Self {
        unsafe {
            let original = env::var(key).ok();
            env::remove_var(key);
            Self { key, original }
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        unsafe {
            match &self.original {
                Some(val) => env::set_var(self.key, val),
                None => env::remove_var(self.key),
            }
        }
    }
}

/// Every `GW_*` override, cleared so the host environment can't leak in
const OVERRIDES: [&str; 9] = [
    "GW_SERVER_HOST",
    "GW_SERVER_PORT",
    "GW_LOG_LEVEL",
    "GW_LOG_COLORED",
    "GW_LOG_FILE",
    "GW_KEY_STORE_PATH",
    "GW_KEY_STORE_WATCH",
    "GW_RATE_LIMIT_STORE_REDIS_URL",
    "GW_RATE_LIMIT_STORE_TIMEOUT_MS",
];

pub(crate) struct ConfigDir {
    pub(crate) temp: TempDir,
    _guards: Vec<EnvGuard>,
}

impl ConfigDir {
    pub(crate) fn write_config(&self, contents: &str) {
        std::fs::write(self.temp.path().join(CONFIG_FILE_NAME), contents).unwrap();
    }
}

/// Create a temp config directory and point GW_CONFIG_DIR at it
pub(crate) fn setup_config_dir() -> ConfigDir {
    let temp = TempDir::new().unwrap();
    let mut guards: Vec<EnvGuard> = OVERRIDES.into_iter().map(EnvGuard::remove).collect();
    guards.push(EnvGuard::set(CONFIG_DIR_ENV, temp.path().to_str().unwrap()));
    ConfigDir {
        temp,
        _guards: guards,
    }
}
