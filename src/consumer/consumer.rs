//! Consumer trait, identity, and the context handed to each delivery.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::ConsumeError;
use crate::message::{Envelope, Message, MessageType};
use crate::naming::{kebab_case, short_type_name};

/// Handles one message type.
///
/// Returning an error hands the message to the endpoint's retry policy.
///
/// ```
/// use buswire::{ConsumeContext, ConsumeError, Consumer};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct OrderCreated { id: String }
///
/// struct OrderCreatedConsumer;
///
/// impl Consumer for OrderCreatedConsumer {
///     type Message = OrderCreated;
///
///     fn consume(&self, ctx: &ConsumeContext<OrderCreated>) -> Result<(), ConsumeError> {
///         if ctx.message().id.is_empty() {
///             return Err(ConsumeError::rejected("order without id"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Consumer: Send + Sync + 'static {
    type Message: Message;

    fn consume(&self, context: &ConsumeContext<Self::Message>) -> Result<(), ConsumeError>;
}

/// A delivered message plus where and how it arrived.
#[derive(Debug)]
pub struct ConsumeContext<T> {
    message: T,
    message_id: String,
    topic: Option<String>,
    endpoint: String,
    attempt: u32,
    headers: Vec<(String, String)>,
}

impl<T> ConsumeContext<T> {
    pub fn message(&self) -> &T {
        &self.message
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Topic the message was published to, `None` for queue sends.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Receive endpoint that delivered the message.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 1 for the first delivery, incremented on every retry.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// One delivery of an envelope to a receive endpoint.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Delivery<'a> {
    pub envelope: &'a Envelope,
    pub topic: Option<&'a str>,
    pub endpoint: &'a str,
    pub attempt: u32,
}

impl Delivery<'_> {
    pub(crate) fn context<T: Message>(&self) -> Result<ConsumeContext<T>, ConsumeError> {
        Ok(ConsumeContext {
            message: self.envelope.decode::<T>()?,
            message_id: self.envelope.message_id.clone(),
            topic: self.topic.map(str::to_string),
            endpoint: self.endpoint.to_string(),
            attempt: self.attempt,
            headers: self.envelope.headers.clone(),
        })
    }
}

/// Collision-free identity of a consumer implementation.
///
/// Matched by `TypeId`; two consumers with the same simple name in
/// different modules stay distinct.
#[derive(Clone, Copy)]
pub struct ConsumerType {
    id: TypeId,
    full_name: &'static str,
    message_type: MessageType,
}

impl ConsumerType {
    pub fn of<C: Consumer>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            full_name: type_name::<C>(),
            message_type: MessageType::of::<C::Message>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn full_name(&self) -> &'static str {
        self.full_name
    }

    pub fn name(&self) -> &'static str {
        short_type_name(self.full_name)
    }

    /// Message type the consumer handles.
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Kebab-case endpoint name used when the consumer gets a convention endpoint.
    pub fn endpoint_name(&self) -> String {
        kebab_case(self.name())
    }
}

impl PartialEq for ConsumerType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConsumerType {}

impl Hash for ConsumerType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ConsumerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConsumerType").field(&self.full_name).finish()
    }
}

impl fmt::Display for ConsumerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
