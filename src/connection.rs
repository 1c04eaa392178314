//! Connection — one named endpoint with a request and a subscribe channel.
//!
//! DESIGN
//! ======
//! The request channel lives in a capacity-1 slot (`tokio::sync::Mutex`).
//! `send` takes the slot with `try_lock`, so a second caller fails fast with
//! `RequestInFlight` instead of interleaving on a socket that has no request
//! correlation. Connect and disconnect take `&mut self` and never contend.
//!
//! Binding a channel that is already bound drops the old channel first, so at
//! most one binding per channel is ever live.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use frames::{CodecError, Request};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::transport::{RequestChannel, SubscribeChannel, Transport, TransportError};

/// Network prefix used to expand bare port numbers.
pub const DEFAULT_PREFIX: &str = "tcp://127.0.0.1";

/// Errors raised by [`Connection`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The channel needed for this operation has never been bound.
    #[error("not connected")]
    NotConnected,

    /// Another request is still waiting for its reply.
    #[error("a request is already in flight")]
    RequestInFlight,

    /// No reply arrived within the configured limit.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ConnectionError {
    /// Grepable error code for logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotConnected => "E_NOT_CONNECTED",
            Self::RequestInFlight => "E_REQUEST_IN_FLIGHT",
            Self::Timeout(_) => "E_TIMEOUT",
            Self::Transport(_) => "E_TRANSPORT",
            Self::Codec(_) => "E_CODEC",
        }
    }
}

/// Expand a bare port number into `<prefix>:<port>`; anything else is used verbatim.
#[must_use]
pub fn expand_address(prefix: &str, address: &str) -> String {
    if !address.is_empty() && address.bytes().all(|b| b.is_ascii_digit()) {
        format!("{prefix}:{address}")
    } else {
        address.to_owned()
    }
}

pub struct Connection {
    name: String,
    prefix: String,
    transport: Arc<dyn Transport>,
    timeout: Option<Duration>,
    request: Mutex<Option<Box<dyn RequestChannel>>>,
    request_address: Option<String>,
    subscriber: Option<Box<dyn SubscribeChannel>>,
    subscribe_address: Option<String>,
    topics: BTreeSet<String>,
}

impl Connection {
    #[must_use]
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            transport,
            timeout: None,
            request: Mutex::new(None),
            request_address: None,
            subscriber: None,
            subscribe_address: None,
            topics: BTreeSet::new(),
        }
    }

    /// Bound every `send` by `timeout`. `None` waits indefinitely.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully expanded address of the request channel, if bound.
    #[must_use]
    pub fn request_address(&self) -> Option<&str> {
        self.request_address.as_deref()
    }

    /// Fully expanded address of the subscribe channel, if bound.
    #[must_use]
    pub fn subscribe_address(&self) -> Option<&str> {
        self.subscribe_address.as_deref()
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(String::as_str)
    }

    /// Bind either or both channels. `None` leaves that channel as it is.
    ///
    /// Rebinding the subscribe channel re-applies the current topic set.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Transport`] if a socket cannot be opened;
    /// the affected channel is left unbound. A failed subscribe bind also
    /// clears the topic set.
    pub async fn connect(
        &mut self,
        request: Option<&str>,
        subscribe: Option<&str>,
    ) -> Result<(), ConnectionError> {
        if let Some(raw) = request {
            let address = expand_address(&self.prefix, raw);
            self.release_request();
            let channel = self.transport.open_request(&address).await?;
            *self.request.get_mut() = Some(channel);
            info!(connection = %self.name, %address, "request channel bound");
            self.request_address = Some(address);
        }

        if let Some(raw) = subscribe {
            let address = expand_address(&self.prefix, raw);
            self.release_subscriber();
            let channel = match self.open_subscriber(&address).await {
                Ok(channel) => channel,
                Err(e) => {
                    self.topics.clear();
                    return Err(e);
                }
            };
            info!(connection = %self.name, %address, topics = self.topics.len(), "subscribe channel bound");
            self.subscriber = Some(channel);
            self.subscribe_address = Some(address);
        }

        Ok(())
    }

    /// Encode `request`, send it and wait for the single reply.
    ///
    /// # Errors
    ///
    /// - [`ConnectionError::RequestInFlight`] if another send is outstanding.
    /// - [`ConnectionError::NotConnected`] if the request channel is unbound.
    /// - [`ConnectionError::Timeout`] if a timeout is set and expires; the
    ///   request channel is reopened so the next send starts clean.
    /// - [`ConnectionError::Transport`] / [`ConnectionError::Codec`] otherwise.
    pub async fn send(&self, request: &Request) -> Result<Value, ConnectionError> {
        let mut slot = self
            .request
            .try_lock()
            .map_err(|_| ConnectionError::RequestInFlight)?;
        let Some(channel) = slot.as_mut() else {
            return Err(ConnectionError::NotConnected);
        };

        let payload = frames::encode_request(request)?;
        debug!(connection = %self.name, cmd = %request.cmd, subcmd = %request.subcmd, "send");

        let reply = match self.timeout {
            None => channel.request(payload).await?,
            Some(limit) => {
                let outcome = tokio::time::timeout(limit, channel.request(payload)).await;
                match outcome {
                    Ok(reply) => reply?,
                    Err(_) => {
                        warn!(connection = %self.name, cmd = %request.cmd, ?limit, "request timed out");
                        self.reopen_request(&mut slot).await;
                        return Err(ConnectionError::Timeout(limit));
                    }
                }
            }
        };

        Ok(frames::decode_reply(&reply)?)
    }

    /// Add a topic filter. Subscribing twice to the same topic is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NotConnected`] if the subscribe channel is unbound.
    pub async fn subscribe(&mut self, topic: &str) -> Result<(), ConnectionError> {
        let Some(channel) = self.subscriber.as_mut() else {
            return Err(ConnectionError::NotConnected);
        };
        if self.topics.contains(topic) {
            return Ok(());
        }
        channel.subscribe(topic).await?;
        self.topics.insert(topic.to_owned());
        debug!(connection = %self.name, %topic, "subscribed");
        Ok(())
    }

    /// Remove a topic filter. Removing an unknown topic is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NotConnected`] if the subscribe channel is unbound.
    pub async fn unsubscribe(&mut self, topic: &str) -> Result<(), ConnectionError> {
        let Some(channel) = self.subscriber.as_mut() else {
            return Err(ConnectionError::NotConnected);
        };
        if !self.topics.contains(topic) {
            return Ok(());
        }
        channel.unsubscribe(topic).await?;
        self.topics.remove(topic);
        debug!(connection = %self.name, %topic, "unsubscribed");
        Ok(())
    }

    /// Release both channels and forget all topics. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        let was_bound = self.request_address.is_some() || self.subscribe_address.is_some();
        self.release_request();
        self.release_subscriber();
        self.topics.clear();
        if was_bound {
            info!(connection = %self.name, "disconnected");
        }
    }

    fn release_request(&mut self) {
        *self.request.get_mut() = None;
        self.request_address = None;
    }

    fn release_subscriber(&mut self) {
        self.subscriber = None;
        self.subscribe_address = None;
    }

    async fn open_subscriber(&self, address: &str) -> Result<Box<dyn SubscribeChannel>, ConnectionError> {
        let mut channel = self.transport.open_subscribe(&self.name, address).await?;
        for topic in &self.topics {
            channel.subscribe(topic).await?;
        }
        Ok(channel)
    }

    async fn reopen_request(&self, slot: &mut Option<Box<dyn RequestChannel>>) {
        *slot = None;
        let Some(address) = self.request_address.as_deref() else {
            return;
        };
        match self.transport.open_request(address).await {
            Ok(channel) => *slot = Some(channel),
            Err(e) => warn!(connection = %self.name, %address, error = %e, "request channel reopen failed"),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("request_address", &self.request_address)
            .field("subscribe_address", &self.subscribe_address)
            .field("topics", &self.topics)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
