use crate::{
    CONFIG_DIR_ENV, CONFIG_FILE_NAME, ConfigError, ConfigErrorResult, DEFAULT_CONFIG_DIR,
    KeyStoreConfig, LoggingConfig, RateLimitStoreConfig, RouteConfig, ServerConfig,
};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub key_store: KeyStoreConfig,
    pub rate_limit_store: RateLimitStoreConfig,
    pub routes: Vec<RouteConfig>,
}

impl Config {
    /// Load the gateway configuration.
    ///
    /// Loading order:
    /// 1. `GW_CONFIG_DIR` env var, else `./.gw/`
    /// 2. Create the config directory if it doesn't exist
    /// 3. Read `config.toml` if present, else defaults
    /// 4. Apply `GW_*` environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILE_NAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// `GW_CONFIG_DIR` if set, else `./.gw/` under the working directory
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.server.validate()?;
        self.logging.validate()?;
        self.key_store.validate()?;
        self.rate_limit_store.validate()?;

        let mut seen_ids = HashSet::new();
        let mut seen_paths = HashSet::new();
        for route in &self.routes {
            route.validate()?;
            if !seen_ids.insert(route.id.as_str()) {
                return Err(ConfigError::route(format!(
                    "duplicate route id '{}'",
                    route.id
                )));
            }
            if !seen_paths.insert(route.normalized_path()) {
                return Err(ConfigError::route(format!(
                    "route '{}': path '{}' is already guarded by another route",
                    route.id, route.path
                )));
            }
        }

        Ok(())
    }

    /// Absolute path of the key file
    pub fn key_store_path(&self) -> ConfigErrorResult<PathBuf> {
        let path = Path::new(&self.key_store.path);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        Ok(Self::config_dir()?.join(path))
    }

    /// Absolute path of the log file, when logging to a file
    pub fn log_file_path(&self) -> ConfigErrorResult<Option<PathBuf>> {
        match &self.logging.file {
            Some(file) => Ok(Some(Self::config_dir()?.join(&self.logging.dir).join(file))),
            None => Ok(None),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Log configuration summary (NEVER logs secrets).
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  server: {}:{}", self.server.host, self.server.port);
        info!(
            "  logging: {} (colored: {}, file: {})",
            self.logging.level,
            self.logging.colored,
            self.logging.file.as_deref().unwrap_or("stdout")
        );
        info!(
            "  key_store: {} (watch: {})",
            self.key_store.path, self.key_store.watch
        );
        info!(
            "  rate_limit_store: {} (timeout {}ms)",
            // URL may carry a password
            if self.rate_limit_store.redis_url.is_some() {
                "redis"
            } else {
                "local"
            },
            self.rate_limit_store.timeout_ms
        );

        for route in &self.routes {
            let auth = route
                .auth
                .as_ref()
                .map(|auth| format!("key {}", auth.key_location))
                .unwrap_or_else(|| String::from("no auth"));
            let rate_limit = route
                .rate_limit
                .as_ref()
                .map(|rl| format!("{}/{}s by {}", rl.limit, rl.window_secs, rl.key_location))
                .unwrap_or_else(|| String::from("no rate limit"));
            info!("  route {} {}: {}, {}", route.id, route.path, auth, rate_limit);
        }
    }

    fn apply_env_overrides(&mut self) {
        // Server
        Self::apply_env_string("GW_SERVER_HOST", &mut self.server.host);
        Self::apply_env_parse("GW_SERVER_PORT", &mut self.server.port);

        // Logging
        Self::apply_env_parse("GW_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("GW_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("GW_LOG_FILE", &mut self.logging.file);

        // Key store
        Self::apply_env_string("GW_KEY_STORE_PATH", &mut self.key_store.path);
        Self::apply_env_bool("GW_KEY_STORE_WATCH", &mut self.key_store.watch);

        // Rate limit store
        Self::apply_env_option_string(
            "GW_RATE_LIMIT_STORE_REDIS_URL",
            &mut self.rate_limit_store.redis_url,
        );
        Self::apply_env_parse(
            "GW_RATE_LIMIT_STORE_TIMEOUT_MS",
            &mut self.rate_limit_store.timeout_ms,
        );
    }

    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Accepts "true"/"1"/"yes"; anything else is false
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = matches!(val.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes");
        }
    }

    /// Unparseable values leave the target untouched
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.trim().parse()
        {
            *target = parsed;
        }
    }

    /// An empty value clears the option
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = (!val.trim().is_empty()).then_some(val);
        }
    }
}
