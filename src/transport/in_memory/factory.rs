use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::bus::InMemoryBus;
use super::endpoint::EndpointDefinition;
use crate::error::{TransportError, WiringError};
use crate::message::MessageType;
use crate::topology::{ConfigureEndpoint, InMemoryBusConfigurator, MessageTopologyConfigurator};
use crate::transport::{BusFactory, Transport};

/// Collects topology and endpoints for an [`InMemoryBus`], then starts it.
#[derive(Debug)]
pub struct InMemoryBusFactory {
    bus: InMemoryBus,
    topology: HashMap<MessageType, String>,
    endpoints: Vec<EndpointDefinition>,
}

impl InMemoryBusFactory {
    pub fn new(bus: InMemoryBus) -> Self {
        Self {
            bus,
            topology: HashMap::new(),
            endpoints: Vec::new(),
        }
    }

    pub fn entity_name(&self, message_type: &MessageType) -> Option<&str> {
        self.topology.get(message_type).map(String::as_str)
    }

    pub fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }
}

impl MessageTopologyConfigurator for InMemoryBusFactory {
    fn set_entity_name(&mut self, message_type: MessageType, entity_name: &str) {
        self.topology.insert(message_type, entity_name.to_string());
    }
}

impl InMemoryBusConfigurator for InMemoryBusFactory {
    fn receive_endpoint(
        &mut self,
        queue_name: &str,
        configure: &mut ConfigureEndpoint<'_>,
    ) -> Result<(), WiringError> {
        if self.endpoints.iter().any(|e| e.name() == queue_name) {
            return Err(WiringError::Transport(TransportError::Rejected(format!(
                "duplicate receive endpoint: {queue_name}"
            ))));
        }

        let mut definition = EndpointDefinition::new(queue_name);
        configure(&mut definition)?;
        debug!(
            endpoint = queue_name,
            consumers = definition.consumers().len(),
            "in-memory receive endpoint configured"
        );
        self.endpoints.push(definition);
        Ok(())
    }
}

impl BusFactory<dyn InMemoryBusConfigurator> for InMemoryBusFactory {
    fn configurator(&mut self) -> &mut (dyn InMemoryBusConfigurator + 'static) {
        self
    }

    fn start(self: Box<Self>) -> Result<Arc<dyn Transport>, TransportError> {
        let InMemoryBusFactory {
            bus,
            topology,
            endpoints,
        } = *self;
        bus.launch(topology, endpoints)
    }
}
