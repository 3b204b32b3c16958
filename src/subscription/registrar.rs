//! Subscription registrar.
//!
//! Each transport materializes a named subscription differently:
//!
//! - managed topic bus: a subscription endpoint under the topic; the service
//!   fans the topic out to it.
//! - broker queue bus: a queue named after the subscription, bound through a
//!   direct exchange.
//! - managed queue bus: a queue named after the subscription, polled point
//!   to point.
//! - in-memory: nothing; in-process dispatch has no durable subscriptions.

use tracing::debug;

use crate::consumer::{ConsumerRegistrar, ConsumerType, RegistrationContext};
use crate::error::WiringError;
use crate::options::{BusConfiguration, Subscription};
use crate::topology::{
    BrokerReceiveEndpointConfigurator, BusConfigurator, ExchangeType, ReceiveEndpointConfigurator,
};

/// Creates one receive endpoint per named subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionRegistrar {
    consumers: ConsumerRegistrar,
}

impl SubscriptionRegistrar {
    pub fn new(configuration: BusConfiguration) -> Self {
        Self {
            consumers: ConsumerRegistrar::new(configuration),
        }
    }

    pub fn consumer_registrar(&self) -> &ConsumerRegistrar {
        &self.consumers
    }

    /// Register every named subscription on the transport being wired.
    ///
    /// Returns the consumers that were attached to a subscription endpoint.
    pub fn register_subscriptions(
        &self,
        context: &RegistrationContext,
        subscriptions: &[Subscription],
        mut configurator: BusConfigurator<'_>,
    ) -> Result<Vec<ConsumerType>, WiringError> {
        let mut attached = Vec::new();

        for subscription in subscriptions.iter().filter(|s| s.is_named()) {
            let name = subscription.subscription_name();
            let topic = subscription.topic_path();
            let consumer_type = subscription.consumer_type();

            match &mut configurator {
                BusConfigurator::ManagedTopic(cfg) => {
                    cfg.subscription_endpoint(
                        name,
                        topic,
                        &mut |endpoint: &mut dyn ReceiveEndpointConfigurator| {
                            self.consumers
                                .add_consumers_from_configuration(context, endpoint, &consumer_type)
                        },
                    )?;
                }
                BusConfigurator::BrokerQueue(cfg) => {
                    cfg.receive_endpoint(
                        name,
                        &mut |endpoint: &mut dyn BrokerReceiveEndpointConfigurator| {
                            endpoint.set_exchange_type(ExchangeType::Direct);
                            self.consumers
                                .add_consumers_from_configuration(context, endpoint, &consumer_type)
                        },
                    )?;
                }
                BusConfigurator::ManagedQueue(cfg) => {
                    cfg.receive_endpoint(
                        name,
                        &mut |endpoint: &mut dyn ReceiveEndpointConfigurator| {
                            self.consumers
                                .add_consumers_from_configuration(context, endpoint, &consumer_type)
                        },
                    )?;
                }
                BusConfigurator::InMemory(_) => {
                    debug!(
                        subscription = name,
                        topic, "in-memory transport has no subscription endpoints"
                    );
                    continue;
                }
            }

            debug!(
                subscription = name,
                topic,
                consumer = consumer_type.name(),
                bus_type = %configurator.bus_type(),
                "subscription endpoint registered"
            );
            attached.push(consumer_type);
        }

        Ok(attached)
    }
}
