use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Config error: {0}")]
    Config(#[from] gw_config::ConfigError),

    #[error("Auth error: {0}")]
    Auth(#[from] gw_auth::AuthError),

    #[error("Route '{route_id}' is misconfigured: {source} {location}")]
    Route {
        route_id: String,
        #[source]
        source: gw_auth::AuthError,
        location: ErrorLocation,
    },

    #[error("Failed to open log file {path}: {source} {location}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Logger error: {message} {location}")]
    Logger {
        message: String,
        location: ErrorLocation,
    },
}

impl ServerError {
    #[track_caller]
    pub fn route(route_id: &str, source: gw_auth::AuthError) -> Self {
        Self::Route {
            route_id: route_id.to_string(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
