//! Transport configurator contracts.
//!
//! Each transport exposes a different registration shape while the bus is
//! being wired: the managed topic bus has subscription endpoints, the broker
//! queue bus has exchange-bound queues, the managed queue bus has plain
//! polled queues, and the in-memory bus only has convention endpoints.
//! [`BusConfigurator`] is the closed set the wiring components match on.

use std::fmt;
use std::time::Duration;

use crate::consumer::ConsumerRegistration;
use crate::error::WiringError;
use crate::message::MessageType;
use crate::options::BusType;

/// Callback that configures a receive endpoint.
pub type ConfigureEndpoint<'a> =
    dyn FnMut(&mut dyn ReceiveEndpointConfigurator) -> Result<(), WiringError> + 'a;

/// Callback that configures a broker receive endpoint.
pub type ConfigureBrokerEndpoint<'a> =
    dyn FnMut(&mut dyn BrokerReceiveEndpointConfigurator) -> Result<(), WiringError> + 'a;

/// Message topology shared by every transport: which entity a type publishes to.
pub trait MessageTopologyConfigurator {
    fn set_entity_name(&mut self, message_type: MessageType, entity_name: &str);
}

/// Settings of one receive endpoint while it is being created.
pub trait ReceiveEndpointConfigurator {
    fn endpoint_name(&self) -> &str;

    /// Attach a consumer to this endpoint.
    fn configure_consumer(&mut self, registration: &ConsumerRegistration);

    /// Retry failed deliveries `count` times without delay.
    fn use_message_retry(&mut self, count: u32);

    /// Redeliver failed messages after each interval.
    fn use_delayed_redelivery(&mut self, intervals: &[Duration]);

    /// Send skipped messages (no consumer on this endpoint) to the dead-letter queue.
    fn configure_dead_letter_queue_dead_letter_transport(&mut self);

    /// Send faulted messages to the dead-letter queue instead of the error queue.
    fn configure_dead_letter_queue_error_transport(&mut self);

    /// Whether a [`Fault`](crate::message::Fault) is published when retries are exhausted.
    fn set_publish_faults(&mut self, publish: bool);
}

/// Exchange kind a broker queue is bound through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeType {
    #[default]
    Fanout,
    Direct,
    Topic,
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeType::Fanout => f.write_str("fanout"),
            ExchangeType::Direct => f.write_str("direct"),
            ExchangeType::Topic => f.write_str("topic"),
        }
    }
}

/// Broker receive endpoints additionally choose their exchange type.
pub trait BrokerReceiveEndpointConfigurator: ReceiveEndpointConfigurator {
    fn set_exchange_type(&mut self, exchange_type: ExchangeType);
}

/// In-process transport.
pub trait InMemoryBusConfigurator: MessageTopologyConfigurator {
    fn receive_endpoint(
        &mut self,
        queue_name: &str,
        configure: &mut ConfigureEndpoint<'_>,
    ) -> Result<(), WiringError>;
}

/// Managed cloud topic service. The service fans a topic out to named subscriptions.
pub trait ManagedTopicBusConfigurator: MessageTopologyConfigurator {
    fn subscription_endpoint(
        &mut self,
        subscription_name: &str,
        topic_path: &str,
        configure: &mut ConfigureEndpoint<'_>,
    ) -> Result<(), WiringError>;

    fn receive_endpoint(
        &mut self,
        queue_name: &str,
        configure: &mut ConfigureEndpoint<'_>,
    ) -> Result<(), WiringError>;
}

/// Broker based queues. Routing is decided by exchange bindings.
pub trait BrokerQueueBusConfigurator: MessageTopologyConfigurator {
    fn receive_endpoint(
        &mut self,
        queue_name: &str,
        configure: &mut ConfigureBrokerEndpoint<'_>,
    ) -> Result<(), WiringError>;
}

/// Managed cloud queues, polled point to point.
pub trait ManagedQueueBusConfigurator: MessageTopologyConfigurator {
    fn receive_endpoint(
        &mut self,
        queue_name: &str,
        configure: &mut ConfigureEndpoint<'_>,
    ) -> Result<(), WiringError>;
}

/// The configurator of the transport being wired.
pub enum BusConfigurator<'a> {
    InMemory(&'a mut dyn InMemoryBusConfigurator),
    ManagedTopic(&'a mut dyn ManagedTopicBusConfigurator),
    BrokerQueue(&'a mut dyn BrokerQueueBusConfigurator),
    ManagedQueue(&'a mut dyn ManagedQueueBusConfigurator),
}

impl BusConfigurator<'_> {
    pub fn bus_type(&self) -> BusType {
        match self {
            BusConfigurator::InMemory(_) => BusType::InMemory,
            BusConfigurator::ManagedTopic(_) => BusType::ManagedTopicBus,
            BusConfigurator::BrokerQueue(_) => BusType::BrokerQueueBus,
            BusConfigurator::ManagedQueue(_) => BusType::ManagedQueueBus,
        }
    }

    /// Borrow the same configurator for a shorter wiring step.
    pub fn reborrow(&mut self) -> BusConfigurator<'_> {
        match self {
            BusConfigurator::InMemory(c) => BusConfigurator::InMemory(&mut **c),
            BusConfigurator::ManagedTopic(c) => BusConfigurator::ManagedTopic(&mut **c),
            BusConfigurator::BrokerQueue(c) => BusConfigurator::BrokerQueue(&mut **c),
            BusConfigurator::ManagedQueue(c) => BusConfigurator::ManagedQueue(&mut **c),
        }
    }
}

impl fmt::Debug for BusConfigurator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BusConfigurator").field(&self.bus_type()).finish()
    }
}
