//! Transport seam — the socket primitives a `Connection` is built on.
//!
//! DESIGN
//! ======
//! A `Transport` opens channels; a channel is released by dropping it. The
//! request channel is strictly alternating (one send, one reply) with no
//! correlation ids, so callers must never overlap calls on the same channel.
//! The subscribe channel takes fire-and-forget topic updates.
//!
//! `ZmqTransport` is the production adapter. Tests swap in the recording
//! transport from `testing`.

pub mod zmq;

#[cfg(test)]
pub mod testing;

pub use zmq::ZmqTransport;

/// Errors raised by socket-level operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The socket refused or failed the connection attempt.
    #[error("failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    /// The connection attempt did not complete in time.
    #[error("timed out connecting to {address}")]
    ConnectTimeout { address: String },

    /// A send or receive on an established socket failed.
    #[error("socket error: {0}")]
    Socket(String),

    /// The peer replied with a message carrying no frames.
    #[error("reply contained no frames")]
    EmptyReply,

    /// The background task owning the socket has stopped.
    #[error("channel closed")]
    Closed,
}

/// Factory for request and subscribe channels.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Open a request/reply channel connected to a fully qualified address.
    async fn open_request(&self, address: &str) -> Result<Box<dyn RequestChannel>, TransportError>;

    /// Open a subscribe channel connected to a fully qualified address.
    ///
    /// `name` identifies the owning connection in log output.
    async fn open_subscribe(
        &self,
        name: &str,
        address: &str,
    ) -> Result<Box<dyn SubscribeChannel>, TransportError>;
}

/// One request/reply socket. Dropping it releases the binding.
#[async_trait::async_trait]
pub trait RequestChannel: Send {
    /// Send one request and wait for exactly one reply.
    async fn request(&mut self, payload: Vec<u8>) -> Result<Vec<u8>, TransportError>;
}

/// One subscribe socket. Dropping it releases the binding.
#[async_trait::async_trait]
pub trait SubscribeChannel: Send + Sync {
    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    async fn unsubscribe(&mut self, topic: &str) -> Result<(), TransportError>;
}
