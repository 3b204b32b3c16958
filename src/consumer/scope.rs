//! Consumer registrations grouped into scopes, and the context that searches them.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use super::consumer::{Consumer, ConsumerType, Delivery};
use crate::error::ConsumeError;
use crate::message::MessageType;

/// Type-erased consumer stored in a registration.
pub(crate) trait ErasedConsumer: Send + Sync {
    fn consume(&self, delivery: &Delivery<'_>) -> Result<(), ConsumeError>;
}

struct TypedConsumer<C>(C);

impl<C: Consumer> ErasedConsumer for TypedConsumer<C> {
    fn consume(&self, delivery: &Delivery<'_>) -> Result<(), ConsumeError> {
        let context = delivery.context::<C::Message>()?;
        self.0.consume(&context)
    }
}

/// A consumer instance together with its identity.
#[derive(Clone)]
pub struct ConsumerRegistration {
    consumer_type: ConsumerType,
    handler: Arc<dyn ErasedConsumer>,
}

impl ConsumerRegistration {
    pub fn new<C: Consumer>(consumer: C) -> Self {
        Self {
            consumer_type: ConsumerType::of::<C>(),
            handler: Arc::new(TypedConsumer(consumer)),
        }
    }

    pub fn consumer_type(&self) -> ConsumerType {
        self.consumer_type
    }

    pub fn message_type(&self) -> MessageType {
        self.consumer_type.message_type()
    }

    pub(crate) fn consume(&self, delivery: &Delivery<'_>) -> Result<(), ConsumeError> {
        self.handler.consume(delivery)
    }
}

impl fmt::Debug for ConsumerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerRegistration")
            .field("consumer_type", &self.consumer_type)
            .finish_non_exhaustive()
    }
}

/// A named group of consumers, typically one per application component.
///
/// ```
/// use buswire::{ConsumeContext, ConsumeError, Consumer, ConsumerScope};
/// # #[derive(serde::Serialize, serde::Deserialize)]
/// # struct Ping;
/// # struct PingConsumer;
/// # impl Consumer for PingConsumer {
/// #     type Message = Ping;
/// #     fn consume(&self, _: &ConsumeContext<Ping>) -> Result<(), ConsumeError> { Ok(()) }
/// # }
///
/// let scope = ConsumerScope::new("diagnostics").add(PingConsumer);
/// assert_eq!(scope.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct ConsumerScope {
    name: String,
    registrations: Vec<ConsumerRegistration>,
}

impl ConsumerScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registrations: Vec::new(),
        }
    }

    /// Register a consumer instance.
    pub fn add<C: Consumer>(mut self, consumer: C) -> Self {
        self.registrations.push(ConsumerRegistration::new(consumer));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registrations(&self) -> &[ConsumerRegistration] {
        &self.registrations
    }

    /// First registration of the given consumer type in this scope.
    pub fn find(&self, consumer_type: &ConsumerType) -> Option<&ConsumerRegistration> {
        self.registrations
            .iter()
            .find(|r| &r.consumer_type == consumer_type)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl fmt::Debug for ConsumerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let consumers: Vec<&str> = self
            .registrations
            .iter()
            .map(|r| r.consumer_type.name())
            .collect();
        f.debug_struct("ConsumerScope")
            .field("name", &self.name)
            .field("consumers", &consumers)
            .finish()
    }
}

/// Every consumer visible to the wiring: the entry scope, then extra scopes.
#[derive(Debug, Clone, Default)]
pub struct RegistrationContext {
    scopes: Vec<ConsumerScope>,
}

impl RegistrationContext {
    pub fn new<I>(entry_scope: ConsumerScope, extra_scopes: I) -> Self
    where
        I: IntoIterator<Item = ConsumerScope>,
    {
        let mut scopes = vec![entry_scope];
        scopes.extend(extra_scopes);
        Self { scopes }
    }

    pub fn scopes(&self) -> &[ConsumerScope] {
        &self.scopes
    }

    /// Locate a consumer across all scopes. The first registration wins.
    pub fn find(&self, consumer_type: &ConsumerType) -> Option<&ConsumerRegistration> {
        let mut matches = self
            .scopes
            .iter()
            .filter_map(|scope| scope.find(consumer_type).map(|r| (scope, r)));

        let (scope, registration) = matches.next()?;
        let duplicates = matches.count();
        if duplicates > 0 {
            warn!(
                consumer = consumer_type.full_name(),
                scope = scope.name(),
                duplicates,
                "consumer registered more than once, using the first registration"
            );
        }
        Some(registration)
    }

    /// Distinct registrations in search order, first registration of each type.
    pub fn registrations(&self) -> Vec<&ConsumerRegistration> {
        let mut seen = HashSet::new();
        self.scopes
            .iter()
            .flat_map(|scope| scope.registrations.iter())
            .filter(|r| seen.insert(r.consumer_type))
            .collect()
    }
}
