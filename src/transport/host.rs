//! The bus host builds the concrete transport the configuration selects.

use std::sync::Arc;

use super::in_memory::{InMemoryBus, InMemoryBusFactory};
use super::transport::Transport;
use crate::error::{TransportError, WiringError};
use crate::options::{BusType, ManagedQueueCredentials};
use crate::topology::{
    BrokerQueueBusConfigurator, InMemoryBusConfigurator, ManagedQueueBusConfigurator,
    ManagedTopicBusConfigurator,
};

/// A transport under construction.
///
/// `C` is the transport's configurator; the wiring components use it until
/// `start` turns the factory into a running transport.
pub trait BusFactory<C: ?Sized> {
    fn configurator(&mut self) -> &mut C;

    fn start(self: Box<Self>) -> Result<Arc<dyn Transport>, TransportError>;
}

pub type InMemoryFactory = Box<dyn BusFactory<dyn InMemoryBusConfigurator>>;
pub type ManagedTopicFactory = Box<dyn BusFactory<dyn ManagedTopicBusConfigurator>>;
pub type BrokerQueueFactory = Box<dyn BusFactory<dyn BrokerQueueBusConfigurator>>;
pub type ManagedQueueFactory = Box<dyn BusFactory<dyn ManagedQueueBusConfigurator>>;

/// Connects to the broker or service behind each bus type.
///
/// Only the in-memory transport ships with this crate. Hosts that talk to a
/// real managed topic service, broker or managed queue service override the
/// matching method.
pub trait BusHost {
    fn in_memory(&mut self) -> Result<InMemoryFactory, WiringError> {
        Ok(Box::new(InMemoryBusFactory::new(InMemoryBus::new())))
    }

    fn managed_topic(
        &mut self,
        _connection_string: &str,
    ) -> Result<ManagedTopicFactory, WiringError> {
        Err(WiringError::TransportUnavailable(BusType::ManagedTopicBus))
    }

    fn broker_queue(
        &mut self,
        _connection_string: &str,
    ) -> Result<BrokerQueueFactory, WiringError> {
        Err(WiringError::TransportUnavailable(BusType::BrokerQueueBus))
    }

    fn managed_queue(
        &mut self,
        _credentials: &ManagedQueueCredentials,
    ) -> Result<ManagedQueueFactory, WiringError> {
        Err(WiringError::TransportUnavailable(BusType::ManagedQueueBus))
    }
}

/// Host for the in-memory transport that keeps a handle to the started bus.
///
/// ```
/// use buswire::{BusHost, InMemoryHost};
///
/// let mut host = InMemoryHost::new();
/// let handle = host.bus();
/// assert!(!handle.is_started());
/// # let _ = host.in_memory();
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryHost {
    bus: InMemoryBus,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the bus this host starts, for inspecting logs and dead letters.
    pub fn bus(&self) -> InMemoryBus {
        self.bus.clone()
    }
}

impl BusHost for InMemoryHost {
    fn in_memory(&mut self) -> Result<InMemoryFactory, WiringError> {
        Ok(Box::new(InMemoryBusFactory::new(self.bus.clone())))
    }
}
