//! Command-line and environment configuration.
//!
//! Every flag has an environment fallback so the shell can be configured
//! from a wrapper script without editing arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::connection::DEFAULT_PREFIX;
use crate::registry::ConnectionSettings;
use crate::transport::zmq::DEFAULT_CONNECT_TIMEOUT;

pub const DEFAULT_ADDRESS: &str = "tcp://127.0.0.1:3000";

#[derive(Parser, Debug)]
#[command(
    name = "flock-cli",
    version,
    about = "Interactive shell for MessagePack request/reply endpoints"
)]
pub struct Cli {
    /// Address of the `default` connection. A bare port expands with --prefix.
    #[arg(env = "FLOCK_ADDRESS", default_value = DEFAULT_ADDRESS)]
    pub address: String,

    /// Prefix used to expand bare port numbers.
    #[arg(long, env = "FLOCK_PREFIX", default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Seconds to wait for a reply. Unset or 0 waits indefinitely.
    #[arg(long, env = "FLOCK_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Seconds to wait for a socket to connect.
    #[arg(long, env = "FLOCK_CONNECT_TIMEOUT_SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT.as_secs())]
    pub connect_timeout_secs: u64,

    /// Log file path. Empty disables file logging.
    #[arg(long, env = "FLOCK_LOG_FILE", default_value = "cli.log")]
    pub log_file: String,

    /// Skip the startup `version` request.
    #[arg(long)]
    pub no_banner: bool,
}

/// Resolved settings for one shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub address: String,
    pub connection: ConnectionSettings,
    pub connect_timeout: Duration,
    pub log_file: Option<PathBuf>,
    pub banner: bool,
}

impl From<Cli> for ShellConfig {
    fn from(cli: Cli) -> Self {
        Self {
            address: cli.address,
            connection: ConnectionSettings {
                prefix: cli.prefix,
                timeout: cli
                    .timeout_secs
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs),
            },
            connect_timeout: Duration::from_secs(cli.connect_timeout_secs),
            log_file: (!cli.log_file.is_empty()).then(|| PathBuf::from(cli.log_file)),
            banner: !cli.no_banner,
        }
    }
}

impl ShellConfig {
    /// Parse the process arguments and environment.
    #[must_use]
    pub fn from_args() -> Self {
        Cli::parse().into()
    }
}
