//! flock — an interactive shell that multiplexes commands to named
//! request/reply endpoints.
//!
//! ARCHITECTURE
//! ============
//! A line typed at the [`shell`] is handed to the [`router`], which parses it
//! with the [`command`] grammar. Administrative heads (`.port-connect`,
//! `.exit`, ...) act on the [`registry`]; everything else is encoded by the
//! `frames` crate and sent over the named [`connection`]'s request channel.
//! Sockets sit behind the [`transport`] traits; production uses ZeroMQ.

pub mod command;
pub mod config;
pub mod connection;
pub mod logging;
pub mod payload;
pub mod registry;
pub mod router;
pub mod shell;
pub mod transport;
