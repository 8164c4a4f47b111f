//! Settings file for the `nwkit` binary.

use std::path::Path;

use nwkit_common_config::{ConfigError, ConfigLoader};
use nwkit_common_log::{LogConfig, LogFormat, LogLevel};
use nwkit_http::HttpConfig;
use serde::{Deserialize, Serialize};

/// Contents of `nwkit.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub http: HttpConfig,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl CliConfig {
    /// Load from `path`, or from `$NWKIT_CONFIG` / `nwkit.yaml`.
    ///
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => ConfigLoader::new(path).required().load(),
            None => ConfigLoader::from_env().load(),
        }
    }

    /// Logging config: environment first, then this file, then the flags.
    pub fn log_config(&self, verbose: u8, quiet: bool) -> LogConfig {
        let mut config = LogConfig::from_env();

        if let Some(level) = self.log.level.as_deref().and_then(LogLevel::parse) {
            config.level = level;
        }
        if let Some(format) = &self.log.format {
            config.format = LogFormat::parse(format);
        }

        if quiet {
            config.with_level(LogLevel::Error)
        } else if verbose > 0 {
            config.with_level(LogLevel::from_verbosity(verbose))
        } else {
            config
        }
    }
}
