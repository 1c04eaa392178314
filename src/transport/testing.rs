//! Recording transport for tests.
//!
//! Every open, drop and topic update is appended to a shared event log so
//! tests can assert exactly which bindings are live. Request channels echo the
//! decoded request back as `{cmd, subcmd, data}` unless replies are held.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::sync::Notify;

use super::{RequestChannel, SubscribeChannel, Transport, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    OpenRequest(String),
    CloseRequest(String),
    OpenSubscribe(String),
    CloseSubscribe(String),
    Subscribe(String, String),
    Unsubscribe(String, String),
}

#[derive(Default)]
struct Inner {
    events: Mutex<Vec<Event>>,
    sent: Mutex<Vec<(String, frames::Request)>>,
    refused: Mutex<HashSet<String>>,
    hold: Mutex<bool>,
    entered: Notify,
    release: Notify,
}

#[derive(Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Inner>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.events.lock().unwrap().clone()
    }

    /// Requests received so far, paired with the address they were sent to.
    pub fn sent(&self) -> Vec<(String, frames::Request)> {
        self.inner.sent.lock().unwrap().clone()
    }

    /// Addresses with an open request channel.
    pub fn live_requests(&self) -> Vec<String> {
        live(&self.events(), |event| match event {
            Event::OpenRequest(address) => Some((address.clone(), 1)),
            Event::CloseRequest(address) => Some((address.clone(), -1)),
            _ => None,
        })
    }

    /// Addresses with an open subscribe channel.
    pub fn live_subscribers(&self) -> Vec<String> {
        live(&self.events(), |event| match event {
            Event::OpenSubscribe(address) => Some((address.clone(), 1)),
            Event::CloseSubscribe(address) => Some((address.clone(), -1)),
            _ => None,
        })
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events().iter().filter(|event| *event == wanted).count()
    }

    /// Make connection attempts to `address` fail.
    pub fn refuse(&self, address: &str) {
        self.inner.refused.lock().unwrap().insert(address.to_owned());
    }

    /// Park every request until [`Self::release`] is called.
    pub fn hold_replies(&self) {
        *self.inner.hold.lock().unwrap() = true;
    }

    /// Wait until a held request has reached the channel.
    pub async fn request_entered(&self) {
        self.inner.entered.notified().await;
    }

    pub fn release(&self) {
        *self.inner.hold.lock().unwrap() = false;
        self.inner.release.notify_waiters();
    }

    fn record(&self, event: Event) {
        self.inner.events.lock().unwrap().push(event);
    }

    fn check_refused(&self, address: &str) -> Result<(), TransportError> {
        if self.inner.refused.lock().unwrap().contains(address) {
            return Err(TransportError::Connect {
                address: address.to_owned(),
                reason: "connection refused".to_owned(),
            });
        }
        Ok(())
    }
}

fn live<F>(events: &[Event], delta: F) -> Vec<String>
where
    F: Fn(&Event) -> Option<(String, i32)>,
{
    let mut open: Vec<(String, i32)> = Vec::new();
    for (address, change) in events.iter().filter_map(delta) {
        match open.iter_mut().find(|(a, _)| *a == address) {
            Some((_, count)) => *count += change,
            None => open.push((address, change)),
        }
    }
    open.into_iter()
        .flat_map(|(address, count)| std::iter::repeat_n(address, usize::try_from(count).unwrap_or(0)))
        .collect()
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn open_request(&self, address: &str) -> Result<Box<dyn RequestChannel>, TransportError> {
        self.check_refused(address)?;
        self.record(Event::OpenRequest(address.to_owned()));
        Ok(Box::new(RecordingRequest {
            transport: self.clone(),
            address: address.to_owned(),
        }))
    }

    async fn open_subscribe(
        &self,
        _name: &str,
        address: &str,
    ) -> Result<Box<dyn SubscribeChannel>, TransportError> {
        self.check_refused(address)?;
        self.record(Event::OpenSubscribe(address.to_owned()));
        Ok(Box::new(RecordingSubscriber {
            transport: self.clone(),
            address: address.to_owned(),
        }))
    }
}

struct RecordingRequest {
    transport: RecordingTransport,
    address: String,
}

#[async_trait::async_trait]
impl RequestChannel for RecordingRequest {
    async fn request(&mut self, payload: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let request =
            frames::decode_request(&payload).map_err(|e| TransportError::Socket(e.to_string()))?;
        self.transport
            .inner
            .sent
            .lock()
            .unwrap()
            .push((self.address.clone(), request.clone()));

        let held = *self.transport.inner.hold.lock().unwrap();
        if held {
            let released = self.transport.inner.release.notified();
            self.transport.inner.entered.notify_one();
            released.await;
        }

        let reply = json!({"cmd": request.cmd, "subcmd": request.subcmd, "data": request.data});
        frames::encode_reply(&reply).map_err(|e| TransportError::Socket(e.to_string()))
    }
}

impl Drop for RecordingRequest {
    fn drop(&mut self) {
        self.transport
            .record(Event::CloseRequest(self.address.clone()));
    }
}

struct RecordingSubscriber {
    transport: RecordingTransport,
    address: String,
}

#[async_trait::async_trait]
impl SubscribeChannel for RecordingSubscriber {
    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.transport
            .record(Event::Subscribe(self.address.clone(), topic.to_owned()));
        Ok(())
    }

    async fn unsubscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.transport
            .record(Event::Unsubscribe(self.address.clone(), topic.to_owned()));
        Ok(())
    }
}

impl Drop for RecordingSubscriber {
    fn drop(&mut self) {
        self.transport
            .record(Event::CloseSubscribe(self.address.clone()));
    }
}
