//! Transport selection and the credential shapes each transport takes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The transport a bus runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusType {
    /// In-process dispatch, no broker.
    #[default]
    InMemory,
    /// Managed cloud topic service with named subscriptions.
    ManagedTopicBus,
    /// Broker based queues bound through exchanges.
    BrokerQueueBus,
    /// Managed cloud queue service, polled point to point.
    ManagedQueueBus,
}

impl BusType {
    /// Whether `configure` must be given a connection string for this type.
    pub fn requires_connection_string(self) -> bool {
        matches!(self, BusType::ManagedTopicBus | BusType::BrokerQueueBus)
    }

    /// Whether this type is configured through region/access/secret credentials.
    pub fn requires_credentials(self) -> bool {
        matches!(self, BusType::ManagedQueueBus)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BusType::InMemory => "in-memory",
            BusType::ManagedTopicBus => "managed-topic-bus",
            BusType::BrokerQueueBus => "broker-queue-bus",
            BusType::ManagedQueueBus => "managed-queue-bus",
        }
    }
}

impl fmt::Display for BusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Region and key pair for the managed queue bus.
#[derive(Clone, PartialEq, Eq)]
pub struct ManagedQueueCredentials {
    region: String,
    access_key: String,
    secret_key: String,
}

impl ManagedQueueCredentials {
    pub(crate) fn new(region: String, access_key: String, secret_key: String) -> Self {
        Self {
            region,
            access_key,
            secret_key,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for ManagedQueueCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedQueueCredentials")
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// How the selected transport is reached.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Connection {
    #[default]
    None,
    ConnectionString(String),
    Credentials(ManagedQueueCredentials),
}

impl Connection {
    pub fn connection_string(&self) -> Option<&str> {
        match self {
            Connection::ConnectionString(s) => Some(s),
            _ => None,
        }
    }

    pub fn credentials(&self) -> Option<&ManagedQueueCredentials> {
        match self {
            Connection::Credentials(c) => Some(c),
            _ => None,
        }
    }
}
