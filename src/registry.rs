//! Registry — live connections keyed by name, plus their last-bound addresses.
//!
//! DESIGN
//! ======
//! Both maps are private and only mutated together inside `&mut self`
//! methods, so a name is either in both or in neither. Connect-or-replace
//! reuses the registered `Connection` after disconnecting it, which keeps a
//! single live instance per name.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::info;

use crate::connection::{Connection, ConnectionError, DEFAULT_PREFIX};
use crate::transport::Transport;

/// Settings applied to every connection the registry creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Prefix used to expand bare port numbers.
    pub prefix: String,
    /// Per-request reply timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_owned(),
            timeout: None,
        }
    }
}

pub struct Registry {
    transport: Arc<dyn Transport>,
    settings: ConnectionSettings,
    connections: HashMap<String, Connection>,
    addresses: BTreeMap<String, String>,
}

impl Registry {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, settings: ConnectionSettings) -> Self {
        Self {
            transport,
            settings,
            connections: HashMap::new(),
            addresses: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Connection> {
        self.connections.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Connection> {
        self.connections.get_mut(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Address each name was last connected with, as given by the caller.
    #[must_use]
    pub fn addresses(&self) -> &BTreeMap<String, String> {
        &self.addresses
    }

    /// The name → address mapping as a JSON object.
    #[must_use]
    pub fn list(&self) -> Value {
        let map: Map<String, Value> = self
            .addresses
            .iter()
            .map(|(name, address)| (name.clone(), Value::String(address.clone())))
            .collect();
        Value::Object(map)
    }

    /// Bind the request channel of `name` to `address`, creating the
    /// connection or disconnecting and rebinding an existing one.
    ///
    /// # Errors
    ///
    /// Returns the bind error; the name is then removed from the registry.
    pub async fn connect(&mut self, name: &str, address: &str) -> Result<(), ConnectionError> {
        let connection = match self.connections.entry(name.to_owned()) {
            Entry::Occupied(entry) => {
                let connection = entry.into_mut();
                connection.disconnect();
                connection
            }
            Entry::Vacant(entry) => entry.insert(
                Connection::new(name, self.settings.prefix.clone(), Arc::clone(&self.transport))
                    .with_timeout(self.settings.timeout),
            ),
        };
        self.addresses.insert(name.to_owned(), address.to_owned());

        if let Err(e) = connection.connect(Some(address), None).await {
            self.connections.remove(name);
            self.addresses.remove(name);
            return Err(e);
        }
        info!(%name, %address, "connection bound");
        Ok(())
    }

    /// Disconnect and forget `name`. Returns whether it was registered.
    pub fn disconnect(&mut self, name: &str) -> bool {
        info!(%name, "closing connection");
        let Some(mut connection) = self.connections.remove(name) else {
            return false;
        };
        connection.disconnect();
        self.addresses.remove(name);
        true
    }

    /// Disconnect every registered connection.
    pub fn disconnect_all(&mut self) {
        let names: Vec<String> = self.connections.keys().cloned().collect();
        for name in names {
            self.disconnect(&name);
        }
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
