//! Command grammar.
//!
//! ```text
//! .exit | .port-connect <name> <address> | .port-disconnect <name> | .port-list
//! [<connection>/]<command>[.<subcommand>] <payload>
//! ```
//!
//! The line splits on the first space into a head and a data tail. The tail
//! is classified by [`Payload::parse`] before anything else, so a malformed
//! literal fails the line even for administrative heads.

use frames::Request;

use crate::payload::{MalformedLiteral, Payload};

/// Connection used when the head carries no `<connection>/` part.
pub const DEFAULT_CONNECTION: &str = "default";

/// Reserved heads handled by the router itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admin {
    Exit,
    PortConnect,
    PortDisconnect,
    PortList,
    PortSubConnect,
    PortSubscribe,
    PortUnsubscribe,
    Help,
}

impl Admin {
    pub const ALL: [Self; 8] = [
        Self::Exit,
        Self::PortConnect,
        Self::PortDisconnect,
        Self::PortList,
        Self::PortSubConnect,
        Self::PortSubscribe,
        Self::PortUnsubscribe,
        Self::Help,
    ];

    /// Exact match on the head; no prefix or case folding.
    #[must_use]
    pub fn from_head(head: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|admin| admin.keyword() == head)
    }

    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Exit => ".exit",
            Self::PortConnect => ".port-connect",
            Self::PortDisconnect => ".port-disconnect",
            Self::PortList => ".port-list",
            Self::PortSubConnect => ".port-sub-connect",
            Self::PortSubscribe => ".port-subscribe",
            Self::PortUnsubscribe => ".port-unsubscribe",
            Self::Help => ".help",
        }
    }

    #[must_use]
    pub fn usage(self) -> &'static str {
        match self {
            Self::Exit => ".exit",
            Self::PortConnect => ".port-connect <name> <address>",
            Self::PortDisconnect => ".port-disconnect <name>",
            Self::PortList => ".port-list",
            Self::PortSubConnect => ".port-sub-connect <name> <address>",
            Self::PortSubscribe => ".port-subscribe <name> [topic]",
            Self::PortUnsubscribe => ".port-unsubscribe <name> [topic]",
            Self::Help => ".help",
        }
    }

    fn summary(self) -> &'static str {
        match self {
            Self::Exit => "disconnect everything and quit",
            Self::PortConnect => "bind (or rebind) a named request channel",
            Self::PortDisconnect => "tear down a named connection",
            Self::PortList => "show every connection and its address",
            Self::PortSubConnect => "bind the subscribe channel of a connection",
            Self::PortSubscribe => "add a topic filter (empty topic matches all)",
            Self::PortUnsubscribe => "remove a topic filter",
            Self::Help => "show this text",
        }
    }
}

/// Text printed by `.help`.
#[must_use]
pub fn help_text() -> String {
    let mut lines: Vec<String> = Admin::ALL
        .iter()
        .map(|admin| format!("  {:<36} {}", admin.usage(), admin.summary()))
        .collect();
    lines.insert(0, "administrative commands:".to_owned());
    lines.push(String::new());
    lines.push(format!(
        "everything else: [<connection>/]<command>[.<subcommand>] <payload>  (connection defaults to `{DEFAULT_CONNECTION}`)"
    ));
    lines.join("\n")
}

/// A generic command addressed to one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub connection: String,
    pub command: String,
    pub subcommand: String,
    pub payload: Payload,
}

impl Command {
    /// Split into the target connection name and the wire request.
    #[must_use]
    pub fn into_request(self) -> (String, Request) {
        let request = Request::new(self.command, self.subcommand, self.payload.into_value());
        (self.connection, request)
    }
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Admin(Admin, Payload),
    Dispatch(Command),
}

/// Parse one input line.
///
/// # Errors
///
/// Returns [`MalformedLiteral`] when the tail looks like a literal but is not one.
pub fn parse_line(line: &str) -> Result<Line, MalformedLiteral> {
    let (head, tail) = line.split_once(' ').unwrap_or((line, ""));
    let payload = Payload::parse(tail)?;

    if let Some(admin) = Admin::from_head(head) {
        return Ok(Line::Admin(admin, payload));
    }

    let (target, subcommand) = head.split_once('.').unwrap_or((head, ""));
    let (connection, command) = target
        .split_once('/')
        .unwrap_or((DEFAULT_CONNECTION, target));

    Ok(Line::Dispatch(Command {
        connection: connection.to_owned(),
        command: command.to_owned(),
        subcommand: subcommand.to_owned(),
        payload,
    }))
}

/// Split an administrative argument string on its first space.
///
/// The remainder is trimmed; `None` when there is no space at all.
#[must_use]
pub fn split_argument(text: &str) -> (&str, Option<&str>) {
    match text.trim_start().split_once(' ') {
        Some((first, rest)) => (first, Some(rest.trim())),
        None => (text.trim(), None),
    }
}

#[cfg(test)]
#[path = "command_test.rs"]
mod tests;
