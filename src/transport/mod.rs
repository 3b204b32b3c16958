//! Transports: the runtime contract, send addresses, hosts that build
//! transports, and the in-memory implementation.

mod address;
mod host;
pub mod in_memory;
mod transport;

pub use address::Address;
pub use host::{
    BrokerQueueFactory, BusFactory, BusHost, InMemoryFactory, InMemoryHost, ManagedQueueFactory,
    ManagedTopicFactory,
};
pub use in_memory::{DeadLetter, InMemoryBus, InMemoryBusFactory, LoggedMessage, MessageLog};
pub use transport::{Sender, Transport, TransportStats};
