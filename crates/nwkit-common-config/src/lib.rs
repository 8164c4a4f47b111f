//! Configuration for nwkit.
//!
//! YAML files are loaded into any `serde` type with [`ConfigLoader`];
//! `.env` files and typed variable access live in [`env`].

pub mod env;
pub mod loader;

pub use env::{vars, EnvError, Environment};
pub use loader::{expand_env_vars, ConfigError, ConfigLoader, DEFAULT_CONFIG_FILE};
