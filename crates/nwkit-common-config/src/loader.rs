//! Configuration file loading and parsing.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::env::{vars, Environment};

/// File looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "nwkit.yaml";

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },

    #[error("invalid expansion pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Loads one YAML file into a config type.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
    required: bool,
}

impl ConfigLoader {
    /// A loader for `path`. A missing file yields the type's default.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required: false,
        }
    }

    /// `$NWKIT_CONFIG` if set, else [`DEFAULT_CONFIG_FILE`].
    pub fn from_env() -> Self {
        Self::new(Environment::get_or(vars::NWKIT_CONFIG, DEFAULT_CONFIG_FILE))
    }

    /// Fail with [`ConfigError::NotFound`] instead of falling back to defaults.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load<T: DeserializeOwned + Default>(&self) -> Result<T, ConfigError> {
        if !self.path.exists() {
            if self.required {
                return Err(ConfigError::NotFound {
                    path: self.path.clone(),
                });
            }
            return Ok(T::default());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let expanded = expand_env_vars(&contents)?;
        if expanded.trim().is_empty() {
            return Ok(T::default());
        }

        serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })
    }

    /// Write `config` as YAML, creating parent directories.
    pub fn save<T: Serialize>(&self, config: &T) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }
}

fn env_var_pattern() -> Result<&'static Regex, ConfigError> {
    static PATTERN: OnceCell<Regex> = OnceCell::new();
    PATTERN
        .get_or_try_init(|| Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}"))
        .map_err(ConfigError::from)
}

/// Expand `${VAR}` and `${VAR:-default}` in `content`.
///
/// Substituted text is not expanded again.
pub fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
    let pattern = env_var_pattern()?;
    let mut expanded = String::with_capacity(content.len());
    let mut last = 0;

    for cap in pattern.captures_iter(content) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        let value = match (std::env::var(name.as_str()), cap.get(2)) {
            (Ok(value), _) => value,
            (Err(_), Some(default)) => default.as_str().to_string(),
            (Err(_), None) => {
                return Err(ConfigError::EnvVarNotFound {
                    var: name.as_str().to_string(),
                })
            }
        };

        expanded.push_str(&content[last..whole.start()]);
        expanded.push_str(&value);
        last = whole.end();
    }

    expanded.push_str(&content[last..]);
    Ok(expanded)
}
