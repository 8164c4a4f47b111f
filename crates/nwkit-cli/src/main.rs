//! nwkit command-line client.

use std::process::ExitCode;

use clap::Parser;
use nwkit_cli::{commands, Cli, CliConfig, Exit};
use nwkit_common_config::Environment;
use nwkit_http::HttpClient;
use tracing::error;

fn main() -> ExitCode {
    // Before parsing, so `--config` can fall back to NWKIT_CONFIG from a .env file.
    if let Err(e) = Environment::init() {
        eprintln!("nwkit: {e}");
        return Exit::ConfigError.into();
    }

    let cli = Cli::parse();

    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("nwkit: {e}");
            return Exit::ConfigError.into();
        }
    };

    if let Err(e) = nwkit_common_log::init(config.log_config(cli.verbose, cli.quiet)) {
        eprintln!("nwkit: {e}");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("nwkit: failed to start runtime: {e}");
            return Exit::GeneralError.into();
        }
    };

    match runtime.block_on(run(cli, config)) {
        Ok(()) => Exit::Success.into(),
        Err(e) => {
            error!("{e:#}");
            Exit::for_error(&e).into()
        }
    }
}

async fn run(cli: Cli, config: CliConfig) -> anyhow::Result<()> {
    let client = HttpClient::with_config(&config.http)?;
    let mut stdout = std::io::stdout().lock();
    commands::execute(cli.command, &client, &mut stdout).await
}
