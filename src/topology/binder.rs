//! Topology binder: maps a message type, known only as a runtime value, to
//! its topic on whichever transport is being wired.

use tracing::debug;

use super::configurator::{
    BrokerQueueBusConfigurator, BusConfigurator, InMemoryBusConfigurator,
    ManagedQueueBusConfigurator, ManagedTopicBusConfigurator,
};
use crate::error::WiringError;
use crate::message::MessageType;
use crate::options::BusType;

/// Optional handle per transport. Exactly one must be set.
#[derive(Default)]
pub struct TransportHandles<'a> {
    pub in_memory: Option<&'a mut dyn InMemoryBusConfigurator>,
    pub managed_topic: Option<&'a mut dyn ManagedTopicBusConfigurator>,
    pub broker_queue: Option<&'a mut dyn BrokerQueueBusConfigurator>,
    pub managed_queue: Option<&'a mut dyn ManagedQueueBusConfigurator>,
}

impl<'a> TransportHandles<'a> {
    /// Bus types whose handle is set, in resolution precedence order.
    pub fn active_bus_types(&self) -> Vec<BusType> {
        let mut active = Vec::new();
        if self.managed_topic.is_some() {
            active.push(BusType::ManagedTopicBus);
        }
        if self.broker_queue.is_some() {
            active.push(BusType::BrokerQueueBus);
        }
        if self.managed_queue.is_some() {
            active.push(BusType::ManagedQueueBus);
        }
        if self.in_memory.is_some() {
            active.push(BusType::InMemory);
        }
        active
    }

    /// Resolve the single active configurator.
    ///
    /// Precedence is managed topic > broker queue > managed queue >
    /// in-memory, but more than one handle is rejected before it applies.
    pub fn into_active(self) -> Result<BusConfigurator<'a>, WiringError> {
        let active = self.active_bus_types();
        if active.len() > 1 {
            return Err(WiringError::MultipleActiveTransports(active));
        }

        if let Some(c) = self.managed_topic {
            Ok(BusConfigurator::ManagedTopic(c))
        } else if let Some(c) = self.broker_queue {
            Ok(BusConfigurator::BrokerQueue(c))
        } else if let Some(c) = self.managed_queue {
            Ok(BusConfigurator::ManagedQueue(c))
        } else if let Some(c) = self.in_memory {
            Ok(BusConfigurator::InMemory(c))
        } else {
            Err(WiringError::NoActiveTransport)
        }
    }
}

impl<'a> From<BusConfigurator<'a>> for TransportHandles<'a> {
    fn from(configurator: BusConfigurator<'a>) -> Self {
        let mut handles = TransportHandles::default();
        match configurator {
            BusConfigurator::InMemory(c) => handles.in_memory = Some(c),
            BusConfigurator::ManagedTopic(c) => handles.managed_topic = Some(c),
            BusConfigurator::BrokerQueue(c) => handles.broker_queue = Some(c),
            BusConfigurator::ManagedQueue(c) => handles.managed_queue = Some(c),
        }
        handles
    }
}

/// Binds message types to topic/entity names on the active transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct TopologyBinder;

impl TopologyBinder {
    pub fn new() -> Self {
        Self
    }

    /// Bind `message_type` to `topic` on the one transport in `handles`.
    ///
    /// Returns the bus type that received the binding.
    pub fn map_event_to_topic(
        &self,
        message_type: MessageType,
        topic: &str,
        handles: TransportHandles<'_>,
    ) -> Result<BusType, WiringError> {
        let configurator = handles.into_active()?;
        let bus_type = configurator.bus_type();

        match configurator {
            BusConfigurator::ManagedTopic(c) => c.set_entity_name(message_type, topic),
            BusConfigurator::BrokerQueue(c) => c.set_entity_name(message_type, topic),
            BusConfigurator::ManagedQueue(c) => c.set_entity_name(message_type, topic),
            BusConfigurator::InMemory(c) => c.set_entity_name(message_type, topic),
        }

        debug!(
            message_type = message_type.name(),
            topic,
            bus_type = %bus_type,
            "message type bound to topic"
        );
        Ok(bus_type)
    }
}
