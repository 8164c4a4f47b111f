//! Library side of the `nwkit` binary, split out so commands can be tested.

pub mod cli;
pub mod commands;
pub mod config;
pub mod exit;

pub use cli::{Cli, Command};
pub use config::CliConfig;
pub use exit::Exit;
