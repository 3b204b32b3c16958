//! Attaches consumers to receive endpoints and applies the retry and
//! dead-letter policy.

use tracing::debug;

use super::consumer::ConsumerType;
use super::scope::RegistrationContext;
use crate::error::WiringError;
use crate::options::{BusConfiguration, RetryPolicy};
use crate::topology::ReceiveEndpointConfigurator;

/// Configures the consumer side of every receive endpoint.
#[derive(Debug, Clone)]
pub struct ConsumerRegistrar {
    configuration: BusConfiguration,
}

impl ConsumerRegistrar {
    pub fn new(configuration: BusConfiguration) -> Self {
        Self { configuration }
    }

    /// Attach the consumer identified by `consumer_type` to `endpoint`, then
    /// apply the process-wide retry and dead-letter policy.
    pub fn add_consumers_from_configuration<E>(
        &self,
        context: &RegistrationContext,
        endpoint: &mut E,
        consumer_type: &ConsumerType,
    ) -> Result<(), WiringError>
    where
        E: ReceiveEndpointConfigurator + ?Sized,
    {
        let registration = context
            .find(consumer_type)
            .ok_or_else(|| WiringError::ConsumerNotFound(consumer_type.full_name().to_string()))?;

        endpoint.configure_consumer(registration);
        debug!(
            endpoint = endpoint.endpoint_name(),
            consumer = consumer_type.name(),
            "consumer attached"
        );

        self.apply_policy(endpoint);
        Ok(())
    }

    /// Apply retry and dead-letter settings to an endpoint.
    pub fn apply_policy<E>(&self, endpoint: &mut E)
    where
        E: ReceiveEndpointConfigurator + ?Sized,
    {
        match self.configuration.retry_policy() {
            RetryPolicy::Immediate { count } => endpoint.use_message_retry(*count),
            RetryPolicy::Intervals(intervals) => endpoint.use_delayed_redelivery(intervals),
        }

        if !self.configuration.dead_letter_enabled() {
            return;
        }

        endpoint.configure_dead_letter_queue_dead_letter_transport();
        endpoint.configure_dead_letter_queue_error_transport();
        endpoint.set_publish_faults(false);
    }
}
