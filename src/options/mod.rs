//! Configuration model.
//!
//! [`EventBusOptions`] is filled in through fluent setters during startup,
//! then frozen into a [`BusConfiguration`] that the topology binder, the
//! subscription registrar and the consumer registrar read from.

mod builder;
mod bus_type;
mod configuration;
mod mapping;
mod retry;
mod settings;

pub use builder::EventBusOptions;
pub use bus_type::{BusType, Connection, ManagedQueueCredentials};
pub use configuration::BusConfiguration;
pub use mapping::{Subscription, TopicMapping, TopicMappings};
pub use retry::{RetryPolicy, DEFAULT_RETRY_COUNT};
pub use settings::{BusSettings, RetrySettings};
