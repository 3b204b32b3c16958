//! Transport configurator contracts and the topology binder.

mod binder;
mod configurator;

pub use binder::{TopologyBinder, TransportHandles};
pub use configurator::{
    BrokerQueueBusConfigurator, BrokerReceiveEndpointConfigurator, BusConfigurator,
    ConfigureBrokerEndpoint, ConfigureEndpoint, ExchangeType, InMemoryBusConfigurator,
    ManagedQueueBusConfigurator, ManagedTopicBusConfigurator, MessageTopologyConfigurator,
    ReceiveEndpointConfigurator,
};
