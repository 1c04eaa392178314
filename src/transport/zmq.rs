//! ZeroMQ adapter — REQ sockets for request/reply, SUB sockets for topics.
//!
//! DESIGN
//! ======
//! A REQ socket is owned directly by its `ZmqRequestChannel`; the caller's
//! single-outstanding-request slot guarantees it is never driven concurrently.
//!
//! A SUB socket must be read continuously while topic updates arrive, so each
//! subscribe channel spawns one task that owns the socket and `select!`s
//! between inbound publications and a control queue. The channel handle only
//! holds the queue sender; dropping it closes the queue and aborts the task,
//! which drops the socket.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, SubSocket, ZmqMessage};

use super::{RequestChannel, SubscribeChannel, Transport, TransportError};

/// Default bound on how long a connect attempt may take.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const CONTROL_QUEUE_DEPTH: usize = 64;

/// Transport backed by the pure-Rust `zeromq` crate.
#[derive(Debug, Clone)]
pub struct ZmqTransport {
    connect_timeout: Duration,
}

impl ZmqTransport {
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    async fn dial<S: Socket>(&self, socket: &mut S, address: &str) -> Result<(), TransportError> {
        match tokio::time::timeout(self.connect_timeout, socket.connect(address)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TransportError::Connect {
                address: address.to_owned(),
                reason: e.to_string(),
            }),
            Err(_) => Err(TransportError::ConnectTimeout {
                address: address.to_owned(),
            }),
        }
    }
}

impl Default for ZmqTransport {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

#[async_trait::async_trait]
impl Transport for ZmqTransport {
    async fn open_request(&self, address: &str) -> Result<Box<dyn RequestChannel>, TransportError> {
        let mut socket = ReqSocket::new();
        self.dial(&mut socket, address).await?;
        debug!(%address, "zmq: req socket connected");
        Ok(Box::new(ZmqRequestChannel { socket }))
    }

    async fn open_subscribe(
        &self,
        name: &str,
        address: &str,
    ) -> Result<Box<dyn SubscribeChannel>, TransportError> {
        let mut socket = SubSocket::new();
        self.dial(&mut socket, address).await?;
        debug!(%address, "zmq: sub socket connected");

        let (control, queue) = mpsc::channel(CONTROL_QUEUE_DEPTH);
        let task = tokio::spawn(run_subscriber(name.to_owned(), socket, queue));
        Ok(Box::new(ZmqSubscribeChannel { control, task }))
    }
}

// =============================================================================
// REQUEST CHANNEL
// =============================================================================

struct ZmqRequestChannel {
    socket: ReqSocket,
}

#[async_trait::async_trait]
impl RequestChannel for ZmqRequestChannel {
    async fn request(&mut self, payload: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        self.socket
            .send(ZmqMessage::from(payload))
            .await
            .map_err(|e| TransportError::Socket(e.to_string()))?;
        let reply = self
            .socket
            .recv()
            .await
            .map_err(|e| TransportError::Socket(e.to_string()))?;
        reply
            .into_vec()
            .into_iter()
            .next()
            .map(|frame| frame.to_vec())
            .ok_or(TransportError::EmptyReply)
    }
}

// =============================================================================
// SUBSCRIBE CHANNEL
// =============================================================================

enum Control {
    Subscribe(String),
    Unsubscribe(String),
}

struct ZmqSubscribeChannel {
    control: mpsc::Sender<Control>,
    task: JoinHandle<()>,
}

impl ZmqSubscribeChannel {
    async fn enqueue(&self, control: Control) -> Result<(), TransportError> {
        self.control
            .send(control)
            .await
            .map_err(|_| TransportError::Closed)
    }
}

#[async_trait::async_trait]
impl SubscribeChannel for ZmqSubscribeChannel {
    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.enqueue(Control::Subscribe(topic.to_owned())).await
    }

    async fn unsubscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.enqueue(Control::Unsubscribe(topic.to_owned())).await
    }
}

impl Drop for ZmqSubscribeChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_subscriber(name: String, mut socket: SubSocket, mut queue: mpsc::Receiver<Control>) {
    loop {
        tokio::select! {
            control = queue.recv() => {
                let Some(control) = control else { break };
                let (topic, result) = match control {
                    Control::Subscribe(topic) => {
                        let result = socket.subscribe(&topic).await;
                        (topic, result)
                    }
                    Control::Unsubscribe(topic) => {
                        let result = socket.unsubscribe(&topic).await;
                        (topic, result)
                    }
                };
                if let Err(e) = result {
                    warn!(connection = %name, %topic, error = %e, "zmq: topic update failed");
                }
            }
            message = socket.recv() => {
                match message {
                    Ok(message) => log_publication(&name, message),
                    Err(e) => {
                        warn!(connection = %name, error = %e, "zmq: sub socket failed");
                        break;
                    }
                }
            }
        }
    }
    debug!(connection = %name, "zmq: subscriber stopped");
}

fn log_publication(name: &str, message: ZmqMessage) {
    let mut parts = message.into_vec().into_iter();
    let topic = parts
        .next()
        .map(|frame| String::from_utf8_lossy(&frame).into_owned())
        .unwrap_or_default();
    let body = parts.next().map_or_else(String::new, |frame| {
        frames::decode_reply(&frame).map_or_else(
            |_| String::from_utf8_lossy(&frame).into_owned(),
            |value| value.to_string(),
        )
    });
    info!(connection = %name, %topic, data = %body, "publication");
}

#[cfg(test)]
#[path = "zmq_test.rs"]
mod tests;
