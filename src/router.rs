//! Router — executes one command line against the registry.
//!
//! DESIGN
//! ======
//! Administrative heads are intercepted before generic dispatch and act on
//! the registry directly. Everything else is resolved to a named connection
//! and sent as a `{cmd, subcmd, data}` request.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is a `CommandError` scoped to the line that caused it. The
//! router never tears itself down on error; only `.exit` ends a session.

use serde_json::Value;
use tracing::{debug, info};

use crate::command::{self, Admin, Command, Line};
use crate::connection::{Connection, ConnectionError};
use crate::payload::{MalformedLiteral, Payload};
use crate::registry::Registry;

// =============================================================================
// TYPES
// =============================================================================

/// What a line produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A value to show the user.
    Reply(Value),
    /// Succeeded with nothing to show.
    Done,
    /// Every connection is closed; stop reading input.
    Exit,
}

/// Errors raised while executing one line.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    MalformedLiteral(#[from] MalformedLiteral),

    /// The line named a connection that is not registered.
    #[error("no connection named '{0}'")]
    NoConnection(String),

    /// An administrative command was missing an argument.
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("{name}: {source}")]
    Connection {
        name: String,
        #[source]
        source: ConnectionError,
    },
}

impl CommandError {
    /// Grepable error code for logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedLiteral(_) => "E_MALFORMED_LITERAL",
            Self::NoConnection(_) => "E_NO_CONNECTION",
            Self::Usage(_) => "E_USAGE",
            Self::Connection { source, .. } => source.error_code(),
        }
    }
}

// =============================================================================
// ROUTER
// =============================================================================

pub struct Router {
    registry: Registry,
}

impl Router {
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Parse and run one input line.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] describing why this line failed. The router
    /// stays usable afterwards.
    pub async fn execute(&mut self, line: &str) -> Result<Outcome, CommandError> {
        match command::parse_line(line)? {
            Line::Admin(admin, payload) => self.administer(admin, &payload).await,
            Line::Dispatch(command) => self.dispatch(command).await,
        }
    }

    /// Disconnect every registered connection.
    pub fn shutdown(&mut self) {
        info!(connections = self.registry.len(), "shutting down");
        self.registry.disconnect_all();
    }

    async fn administer(&mut self, admin: Admin, payload: &Payload) -> Result<Outcome, CommandError> {
        debug!(command = admin.keyword(), "admin");
        match admin {
            Admin::Exit => {
                self.shutdown();
                Ok(Outcome::Exit)
            }
            Admin::PortList => Ok(Outcome::Reply(self.registry.list())),
            Admin::Help => Ok(Outcome::Reply(Value::String(command::help_text()))),
            Admin::PortDisconnect => {
                let (name, _) = arguments(admin, payload)?;
                self.registry.disconnect(name);
                Ok(Outcome::Done)
            }
            Admin::PortConnect => {
                let (name, address) = arguments(admin, payload)?;
                let address = required(admin, address)?;
                self.registry
                    .connect(name, address)
                    .await
                    .map_err(|source| connection_error(name, source))?;
                Ok(Outcome::Done)
            }
            Admin::PortSubConnect => {
                let (name, address) = arguments(admin, payload)?;
                let address = required(admin, address)?;
                self.lookup(name)?
                    .connect(None, Some(address))
                    .await
                    .map_err(|source| connection_error(name, source))?;
                Ok(Outcome::Done)
            }
            Admin::PortSubscribe | Admin::PortUnsubscribe => {
                let (name, topic) = arguments(admin, payload)?;
                // no topic means every publication
                let topic = topic.unwrap_or_default();
                let connection = self.lookup(name)?;
                let result = if admin == Admin::PortSubscribe {
                    connection.subscribe(topic).await
                } else {
                    connection.unsubscribe(topic).await
                };
                result.map_err(|source| connection_error(name, source))?;
                Ok(Outcome::Done)
            }
        }
    }

    async fn dispatch(&self, command: Command) -> Result<Outcome, CommandError> {
        let (name, request) = command.into_request();
        let Some(connection) = self.registry.get(&name) else {
            return Err(CommandError::NoConnection(name));
        };
        debug!(connection = %name, cmd = %request.cmd, subcmd = %request.subcmd, "dispatch");
        let reply = connection
            .send(&request)
            .await
            .map_err(|source| CommandError::Connection { name, source })?;
        Ok(Outcome::Reply(reply))
    }

    fn lookup(&mut self, name: &str) -> Result<&mut Connection, CommandError> {
        self.registry
            .get_mut(name)
            .ok_or_else(|| CommandError::NoConnection(name.to_owned()))
    }
}

/// Split administrative arguments into a required name and an optional rest.
fn arguments(admin: Admin, payload: &Payload) -> Result<(&str, Option<&str>), CommandError> {
    let text = payload.as_text().ok_or(CommandError::Usage(admin.usage()))?;
    match command::split_argument(text) {
        ("", _) => Err(CommandError::Usage(admin.usage())),
        split => Ok(split),
    }
}

fn required(admin: Admin, argument: Option<&str>) -> Result<&str, CommandError> {
    argument
        .filter(|a| !a.is_empty())
        .ok_or(CommandError::Usage(admin.usage()))
}

fn connection_error(name: &str, source: ConnectionError) -> CommandError {
    CommandError::Connection {
        name: name.to_owned(),
        source,
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
