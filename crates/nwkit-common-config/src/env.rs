//! Environment variable handling.

use std::env;
use std::io::ErrorKind;
use std::str::FromStr;

use thiserror::Error;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("required environment variable not set: {var}")]
    NotSet { var: String },

    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("failed to load .env file: {0}")]
    DotenvError(#[from] dotenvy::Error),
}

/// Environment variable names.
pub mod vars {
    pub const NWKIT_CONFIG: &str = "NWKIT_CONFIG";
    /// Selects the extra `.env.<name>` file loaded by [`Environment::init`].
    pub const NWKIT_ENV: &str = "NWKIT_ENV";
}

/// Typed access to the process environment.
pub struct Environment {
    _guard: (),
}

impl Environment {
    /// Load `.env`, `.env.local` and `.env.$NWKIT_ENV` from the working
    /// directory. Missing files are skipped; variables already set win.
    pub fn init() -> Result<Self, EnvError> {
        load_optional(".env")?;
        load_optional(".env.local")?;
        if let Ok(name) = env::var(vars::NWKIT_ENV) {
            load_optional(&format!(".env.{name}"))?;
        }
        Ok(Self { _guard: () })
    }

    pub fn require(var: &str) -> Result<String, EnvError> {
        env::var(var).map_err(|_| EnvError::NotSet { var: var.to_string() })
    }

    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok()
    }

    pub fn get_or(var: &str, default: &str) -> String {
        env::var(var).unwrap_or_else(|_| default.to_string())
    }

    /// `true`, `1` and `yes` are true; anything else set is false.
    pub fn get_bool(var: &str) -> Option<bool> {
        env::var(var)
            .ok()
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
    }

    pub fn get_int<T: FromStr>(var: &str) -> Result<Option<T>, EnvError> {
        match env::var(var) {
            Ok(v) => v.trim().parse().map(Some).map_err(|_| EnvError::InvalidValue {
                var: var.to_string(),
                message: format!("expected integer, got {v:?}"),
            }),
            Err(_) => Ok(None),
        }
    }
}

fn load_optional(file: &str) -> Result<(), EnvError> {
    match dotenvy::from_filename(file) {
        Ok(_) => Ok(()),
        Err(dotenvy::Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
