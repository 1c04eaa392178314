use std::io;
use std::sync::Arc;

use flock_cli::command::DEFAULT_CONNECTION;
use flock_cli::config::ShellConfig;
use flock_cli::connection::ConnectionError;
use flock_cli::registry::Registry;
use flock_cli::router::Router;
use flock_cli::shell::{Shell, ShellError};
use flock_cli::transport::ZmqTransport;
use tokio::io::BufReader;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to connect to {address}: {source}")]
    Startup {
        address: String,
        #[source]
        source: ConnectionError,
    },
    #[error("failed to open log file: {0}")]
    Logging(#[source] io::Error),
    #[error(transparent)]
    Shell(#[from] ShellError),
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let config = ShellConfig::from_args();
    flock_cli::logging::init(config.log_file.as_deref()).map_err(CliError::Logging)?;

    let transport = Arc::new(ZmqTransport::new(config.connect_timeout));
    let mut registry = Registry::new(transport, config.connection.clone());
    registry
        .connect(DEFAULT_CONNECTION, &config.address)
        .await
        .map_err(|source| CliError::Startup {
            address: config.address.clone(),
            source,
        })?;
    tracing::info!(address = %config.address, "flock-cli ready");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut shell = Shell::new(Router::new(registry), stdin, tokio::io::stdout());
    if config.banner {
        shell.run_line("version").await?;
    }
    shell.run().await?;
    Ok(())
}
