use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Unsupported key algorithm '{algorithm}' {location}")]
    UnsupportedAlgorithm {
        algorithm: String,
        location: ErrorLocation,
    },

    #[error("Invalid key material: {message} {location}")]
    InvalidKey {
        message: String,
        location: ErrorLocation,
    },

    #[error("HMAC secret must not be blank {location}")]
    BlankHmacSecret { location: ErrorLocation },

    #[error("Invalid key location '{value}': {message} {location}")]
    InvalidKeyLocation {
        value: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid rate limit: {message} {location}")]
    InvalidRateLimit {
        message: String,
        location: ErrorLocation,
    },

    #[error("Failed to read key file {path}: {source} {location}")]
    KeyFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Failed to watch key file {path}: {source} {location}")]
    KeyFileWatch {
        path: PathBuf,
        #[source]
        source: notify::Error,
        location: ErrorLocation,
    },

    #[error("Rate limit store failed: {source} {location}")]
    RateLimitStore {
        #[source]
        source: redis::RedisError,
        location: ErrorLocation,
    },

    #[error("Rate limit store is not connected yet {location}")]
    RateLimitStoreUnavailable { location: ErrorLocation },

    #[error("Rate limit store timed out after {timeout_ms}ms {location}")]
    RateLimitStoreTimeout {
        timeout_ms: u64,
        location: ErrorLocation,
    },
}

impl AuthError {
    /// Stable code for logs and metric labels
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedAlgorithm { .. } => "UNSUPPORTED_ALGORITHM",
            Self::InvalidKey { .. } => "INVALID_KEY",
            Self::BlankHmacSecret { .. } => "BLANK_HMAC_SECRET",
            Self::InvalidKeyLocation { .. } => "INVALID_KEY_LOCATION",
            Self::InvalidRateLimit { .. } => "INVALID_RATE_LIMIT",
            Self::KeyFileRead { .. } => "KEY_FILE_READ",
            Self::KeyFileWatch { .. } => "KEY_FILE_WATCH",
            Self::RateLimitStore { .. } => "RATE_LIMIT_STORE",
            Self::RateLimitStoreUnavailable { .. } => "RATE_LIMIT_STORE_UNAVAILABLE",
            Self::RateLimitStoreTimeout { .. } => "RATE_LIMIT_STORE_TIMEOUT",
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
