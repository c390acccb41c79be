use crate::{ConfigError, ConfigErrorResult, DEFAULT_LOG_COLORED, DEFAULT_LOG_DIRECTORY, LogLevel};

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// ANSI colors on stdout; ignored when logging to a file
    pub colored: bool,
    /// Log file name inside `dir`; stdout when unset
    pub file: Option<String>,
    /// Directory for `file`, relative to the config dir
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            colored: DEFAULT_LOG_COLORED,
            file: None,
            dir: String::from(DEFAULT_LOG_DIRECTORY),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        for (name, value) in [("logging.dir", Some(self.dir.as_str())), ("logging.file", self.file.as_deref())] {
            let Some(value) = value else { continue };
            if value.trim().is_empty() || Path::new(value).is_absolute() || value.contains("..") {
                return Err(ConfigError::logging(format!(
                    "{name} must be a non-empty relative path without '..', got '{value}'"
                )));
            }
        }

        Ok(())
    }
}
