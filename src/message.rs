//! Messages, their runtime type identity, and the envelope that carries them.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConsumeError, TransportError};
use crate::naming::short_type_name;

/// Anything that can travel over the bus.
///
/// Blanket-implemented for every owned serde type, so application events
/// only need `#[derive(Serialize, Deserialize)]`.
pub trait Message: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Message for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// A message type carried as a runtime value.
///
/// Topic mappings, transport topologies and consumer bindings are keyed by
/// this value so the wiring code never needs the message as a generic
/// parameter. Equality and hashing use the `TypeId` only.
#[derive(Clone, Copy)]
pub struct MessageType {
    id: TypeId,
    full_name: &'static str,
    check: fn(&Envelope) -> Result<(), ConsumeError>,
}

impl MessageType {
    pub fn of<T: Message>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            full_name: type_name::<T>(),
            check: |envelope| envelope.decode::<T>().map(drop),
        }
    }

    /// Whether `envelope` holds a body of this type.
    pub fn check(&self, envelope: &Envelope) -> Result<(), ConsumeError> {
        (self.check)(envelope)
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified Rust path of the type.
    pub fn full_name(&self) -> &'static str {
        self.full_name
    }

    /// Simple type name, used as the default entity name and in logs.
    pub fn name(&self) -> &'static str {
        short_type_name(self.full_name)
    }
}

impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MessageType {}

impl Hash for MessageType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageType").field(&self.full_name).finish()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A message on the wire.
#[derive(Clone, Debug)]
pub struct Envelope {
    /// Unique identifier for this message
    pub message_id: String,
    /// Simple name of the message type (e.g., "OrderCreated")
    pub message_type: String,
    /// Bitcode-encoded body
    pub payload: Vec<u8>,
    /// Transport headers (correlation IDs, fault details, etc.)
    pub headers: Vec<(String, String)>,
}

impl Envelope {
    /// Create an envelope with a fresh message id.
    pub fn new(message_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            message_type: message_type.into(),
            payload,
            headers: Vec::new(),
        }
    }

    /// Encode a message with bitcode.
    pub fn encode<T: Message>(message: &T) -> Result<Self, TransportError> {
        let payload = bitcode::serialize(message)?;
        Ok(Self::new(MessageType::of::<T>().name(), payload))
    }

    /// Decode the payload back into a message.
    pub fn decode<T: Message>(&self) -> Result<T, ConsumeError> {
        bitcode::deserialize(&self.payload).map_err(|err| ConsumeError::Decode {
            message_type: self.message_type.clone(),
            reason: err.to_string(),
        })
    }

    /// Add a header to the envelope.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// First header with the given key.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Published when a message exhausted its retries and fault publication is on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub message_id: String,
    pub message_type: String,
    pub endpoint: String,
    pub reason: String,
    pub attempts: u32,
}
