mod config;
mod error;
mod key_store_config;
mod log_level;
mod logging_config;
mod rate_limit_store_config;
mod route_config;
mod server_config;

pub use config::Config;
pub use error::{ConfigError, ConfigErrorResult};
pub use key_store_config::KeyStoreConfig;
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use rate_limit_store_config::RateLimitStoreConfig;
pub use route_config::{RouteAuthSettings, RouteConfig, RouteRateLimitSettings};
pub use server_config::ServerConfig;

pub const CONFIG_DIR_ENV: &str = "GW_CONFIG_DIR";
pub const DEFAULT_CONFIG_DIR: &str = ".gw";
pub const CONFIG_FILE_NAME: &str = "config.toml";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const MIN_PORT: u16 = 1024;

const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "log";
const DEFAULT_LOG_COLORED: bool = true;

const DEFAULT_KEY_STORE_PATH: &str = "keys.csv";
const DEFAULT_KEY_STORE_WATCH: bool = true;

const DEFAULT_STORE_TIMEOUT_MS: u64 = 50;
const MIN_STORE_TIMEOUT_MS: u64 = 1;
const MAX_STORE_TIMEOUT_MS: u64 = 10_000;

const DEFAULT_ROLES_CLAIM: &str = "roles";
const MIN_RATE_LIMIT: u32 = 1;
const MAX_RATE_LIMIT: u32 = 100_000;
const MIN_RATE_LIMIT_WINDOW_SECS: u64 = 1;
const MAX_RATE_LIMIT_WINDOW_SECS: u64 = 86_400;

#[cfg(test)]
mod tests;
