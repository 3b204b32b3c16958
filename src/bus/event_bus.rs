//! Runtime facade used by application code once the bus is wired.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info};

use super::outcome::{PublishOutcome, SkipReason};
use crate::error::TransportError;
use crate::message::{Envelope, Message, MessageType};
use crate::options::BusConfiguration;
use crate::transport::{Address, Transport, TransportStats};

/// Publishes and sends messages over the started transport.
///
/// Cloning is cheap; clones share the transport and may be used from any
/// thread. Neither `publish` nor `send` ever returns an error: failures are
/// logged and reported through [`PublishOutcome`].
#[derive(Clone)]
pub struct EventBus {
    configuration: BusConfiguration,
    transport: Option<Arc<dyn Transport>>,
}

impl EventBus {
    pub fn new(configuration: BusConfiguration, transport: Arc<dyn Transport>) -> Self {
        Self {
            configuration,
            transport: Some(transport),
        }
    }

    /// A bus that never reaches a transport.
    pub fn disabled(configuration: BusConfiguration) -> Self {
        Self {
            configuration,
            transport: None,
        }
    }

    pub fn configuration(&self) -> &BusConfiguration {
        &self.configuration
    }

    pub fn is_disabled(&self) -> bool {
        self.configuration.is_disabled() || self.transport.is_none()
    }

    fn active_transport(&self) -> Option<&Arc<dyn Transport>> {
        if self.configuration.is_disabled() {
            return None;
        }
        self.transport.as_ref()
    }

    /// Publish `message` to the topic its type is mapped to.
    pub fn publish<T: Message>(&self, message: &T) -> PublishOutcome {
        let message_type = MessageType::of::<T>();
        let Some(transport) = self.active_transport() else {
            debug!(message_type = %message_type, "bus disabled, publish skipped");
            return PublishOutcome::Skipped(SkipReason::Disabled);
        };

        match Envelope::encode(message).and_then(|e| transport.publish(&message_type, e)) {
            Ok(()) => {
                info!(message_type = %message_type, "message published");
                PublishOutcome::Published
            }
            Err(err) => {
                error!(message_type = %message_type, error = %err, "failed to publish message");
                PublishOutcome::Failed(err)
            }
        }
    }

    /// Send `message` to a queue, or to a topic by name when `is_topic`.
    pub fn send<T: Message>(
        &self,
        message: &T,
        destination: &str,
        is_topic: bool,
    ) -> PublishOutcome {
        let message_type = MessageType::of::<T>();
        if destination.is_empty() {
            debug!(message_type = %message_type, "empty destination, send skipped");
            return PublishOutcome::Skipped(SkipReason::EmptyDestination);
        }
        let Some(transport) = self.active_transport() else {
            debug!(message_type = %message_type, destination, "bus disabled, send skipped");
            return PublishOutcome::Skipped(SkipReason::Disabled);
        };

        let address = Address::for_destination(destination, is_topic);
        match Self::send_to(transport.as_ref(), &address, &message_type, message) {
            Ok(()) => {
                info!(message_type = %message_type, %address, "message sent");
                PublishOutcome::Sent(address)
            }
            Err(err) => {
                error!(
                    message_type = %message_type,
                    %address,
                    error = %err,
                    "failed to send message"
                );
                PublishOutcome::Failed(err)
            }
        }
    }

    fn send_to<T: Message>(
        transport: &dyn Transport,
        address: &Address,
        message_type: &MessageType,
        message: &T,
    ) -> Result<(), TransportError> {
        let envelope = Envelope::encode(message)?;
        let endpoint = transport.send_endpoint(address)?;
        endpoint.send(message_type, envelope)
    }

    /// Stop the transport after in-flight deliveries finish.
    pub fn stop(&self) -> TransportStats {
        match &self.transport {
            Some(transport) => transport.stop(),
            None => TransportStats::default(),
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("bus_type", &self.configuration.bus_type())
            .field("disabled", &self.is_disabled())
            .finish()
    }
}
