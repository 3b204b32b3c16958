//! Composition root: turns a configuration and a set of consumers into a
//! running [`EventBus`].
//!
//! Wiring runs once, before any message flows:
//!
//! 1. every topic mapping is bound on the transport's topology,
//! 2. every named subscription gets its receive endpoint,
//! 3. every consumer not attached by a subscription gets a convention
//!    endpoint named after it in kebab-case,
//! 4. the transport starts.

use std::sync::Arc;

use tracing::{debug, info};

use crate::bus::EventBus;
use crate::consumer::{ConsumerScope, ConsumerType, RegistrationContext};
use crate::error::{BusError, ConfigError, WiringError};
use crate::options::{BusConfiguration, BusType, EventBusOptions};
use crate::subscription::SubscriptionRegistrar;
use crate::topology::{
    BrokerReceiveEndpointConfigurator, BusConfigurator, ReceiveEndpointConfigurator,
    TopologyBinder, TransportHandles,
};
use crate::transport::{BusHost, Transport};

/// Wires the bus described by an [`EventBusOptions`].
///
/// ```
/// use buswire::{
///     BusBootstrap, ConsumeContext, ConsumeError, Consumer, ConsumerScope,
///     ConsumerType, EventBusOptions, InMemoryHost, MessageType,
/// };
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct OrderCreated {
///     id: u64,
/// }
///
/// struct OrderCreatedConsumer;
///
/// impl Consumer for OrderCreatedConsumer {
///     type Message = OrderCreated;
///
///     fn consume(&self, _ctx: &ConsumeContext<OrderCreated>) -> Result<(), ConsumeError> {
///         Ok(())
///     }
/// }
///
/// let options = EventBusOptions::new()
///     .map_topic(
///         "orders.created",
///         MessageType::of::<OrderCreated>(),
///         Some(ConsumerType::of::<OrderCreatedConsumer>()),
///         Some("orders-sub"),
///     )
///     .unwrap();
/// let mut host = InMemoryHost::new();
///
/// let bus = BusBootstrap::new(options, ConsumerScope::new("app").add(OrderCreatedConsumer))
///     .start(&mut host)
///     .unwrap();
/// assert!(bus.publish(&OrderCreated { id: 7 }).is_delivered());
/// assert_eq!(bus.stop().delivered, 1);
/// ```
#[derive(Debug)]
pub struct BusBootstrap {
    configuration: BusConfiguration,
    context: RegistrationContext,
    binder: TopologyBinder,
    subscriptions: SubscriptionRegistrar,
}

impl BusBootstrap {
    /// `entry_scope` is searched before the scopes added with
    /// [`EventBusOptions::add_consumer_scopes`].
    pub fn new(options: EventBusOptions, entry_scope: ConsumerScope) -> Self {
        let configuration = options.freeze();
        let context =
            RegistrationContext::new(entry_scope, configuration.consumer_scopes().iter().cloned());
        Self {
            subscriptions: SubscriptionRegistrar::new(configuration.clone()),
            binder: TopologyBinder::new(),
            configuration,
            context,
        }
    }

    pub fn configuration(&self) -> &BusConfiguration {
        &self.configuration
    }

    pub fn registration_context(&self) -> &RegistrationContext {
        &self.context
    }

    /// Build the transport through `host`, wire it and start it.
    ///
    /// A disabled bus skips the host entirely and returns a bus whose
    /// publish and send are no-ops.
    pub fn start(self, host: &mut dyn BusHost) -> Result<EventBus, BusError> {
        if self.configuration.is_disabled() {
            info!("event bus disabled, no transport started");
            return Ok(EventBus::disabled(self.configuration));
        }

        let bus_type = self.configuration.bus_type();
        let transport = self.start_transport(bus_type, host)?;
        info!(
            bus_type = %bus_type,
            topics = self.configuration.topic_mappings().len(),
            subscriptions = self.configuration.subscriptions().len(),
            "event bus started"
        );
        Ok(EventBus::new(self.configuration, transport))
    }

    fn start_transport(
        &self,
        bus_type: BusType,
        host: &mut dyn BusHost,
    ) -> Result<Arc<dyn Transport>, BusError> {
        let connection = self.configuration.connection();

        let transport = match bus_type {
            BusType::InMemory => {
                let mut factory = host.in_memory()?;
                self.wire(BusConfigurator::InMemory(factory.configurator()))?;
                factory.start()?
            }
            BusType::ManagedTopicBus => {
                let connection_string = connection
                    .connection_string()
                    .ok_or(ConfigError::MissingConnectionString(bus_type))?;
                let mut factory = host.managed_topic(connection_string)?;
                self.wire(BusConfigurator::ManagedTopic(factory.configurator()))?;
                factory.start()?
            }
            BusType::BrokerQueueBus => {
                let connection_string = connection
                    .connection_string()
                    .ok_or(ConfigError::MissingConnectionString(bus_type))?;
                let mut factory = host.broker_queue(connection_string)?;
                self.wire(BusConfigurator::BrokerQueue(factory.configurator()))?;
                factory.start()?
            }
            BusType::ManagedQueueBus => {
                let credentials = connection
                    .credentials()
                    .ok_or(ConfigError::CredentialOverloadRequired(bus_type))?;
                let mut factory = host.managed_queue(credentials)?;
                self.wire(BusConfigurator::ManagedQueue(factory.configurator()))?;
                factory.start()?
            }
        };
        Ok(transport)
    }

    /// Bind topics, register subscriptions and create convention endpoints
    /// on a transport configurator.
    pub fn wire(&self, mut configurator: BusConfigurator<'_>) -> Result<(), WiringError> {
        for mapping in self.configuration.topic_mappings().iter() {
            self.binder.map_event_to_topic(
                mapping.message_type(),
                mapping.topic(),
                TransportHandles::from(configurator.reborrow()),
            )?;
        }

        let attached = self.subscriptions.register_subscriptions(
            &self.context,
            self.configuration.subscriptions(),
            configurator.reborrow(),
        )?;

        self.configure_endpoints(&attached, configurator)
    }

    /// Consumers that share a kebab-case name share one endpoint.
    fn configure_endpoints(
        &self,
        attached: &[ConsumerType],
        mut configurator: BusConfigurator<'_>,
    ) -> Result<(), WiringError> {
        let registrar = self.subscriptions.consumer_registrar();

        let mut groups: Vec<(String, Vec<ConsumerType>)> = Vec::new();
        for registration in self.context.registrations() {
            let consumer_type = registration.consumer_type();
            if attached.contains(&consumer_type) {
                continue;
            }
            let name = consumer_type.endpoint_name();
            match groups.iter_mut().find(|(existing, _)| *existing == name) {
                Some((_, members)) => members.push(consumer_type),
                None => groups.push((name, vec![consumer_type])),
            }
        }

        for (name, members) in &groups {
            let mut configure = |endpoint: &mut dyn ReceiveEndpointConfigurator| {
                members.iter().try_for_each(|consumer_type| {
                    registrar.add_consumers_from_configuration(
                        &self.context,
                        &mut *endpoint,
                        consumer_type,
                    )
                })
            };

            match &mut configurator {
                BusConfigurator::InMemory(c) => c.receive_endpoint(name, &mut configure)?,
                BusConfigurator::ManagedTopic(c) => c.receive_endpoint(name, &mut configure)?,
                BusConfigurator::ManagedQueue(c) => c.receive_endpoint(name, &mut configure)?,
                BusConfigurator::BrokerQueue(c) => c.receive_endpoint(
                    name,
                    &mut |endpoint: &mut dyn BrokerReceiveEndpointConfigurator| {
                        members.iter().try_for_each(|consumer_type| {
                            registrar.add_consumers_from_configuration(
                                &self.context,
                                &mut *endpoint,
                                consumer_type,
                            )
                        })
                    },
                )?,
            }

            debug!(
                endpoint = %name,
                consumers = members.len(),
                bus_type = %configurator.bus_type(),
                "convention endpoint configured"
            );
        }
        Ok(())
    }
}
