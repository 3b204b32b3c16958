//! Frozen, shareable view of the configuration model.

use std::sync::Arc;

use super::builder::EventBusOptions;
use super::bus_type::{BusType, Connection};
use super::mapping::{Subscription, TopicMappings};
use super::retry::RetryPolicy;
use crate::consumer::ConsumerScope;

/// Read-only configuration shared by the wiring components and the bus.
///
/// Produced by [`EventBusOptions::freeze`]. Cloning is cheap and every
/// clone sees the same values for the life of the process.
#[derive(Debug, Clone)]
pub struct BusConfiguration {
    options: Arc<EventBusOptions>,
}

impl BusConfiguration {
    pub(crate) fn new(options: EventBusOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    pub fn bus_type(&self) -> BusType {
        self.options.bus_type()
    }

    pub fn connection(&self) -> &Connection {
        self.options.connection()
    }

    pub fn is_disabled(&self) -> bool {
        self.options.is_disabled()
    }

    pub fn topic_mappings(&self) -> &TopicMappings {
        self.options.topic_mappings()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.options.retry_policy()
    }

    pub fn dead_letter_enabled(&self) -> bool {
        self.options.dead_letter_enabled()
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        self.options.subscriptions()
    }

    pub fn consumer_scopes(&self) -> &[ConsumerScope] {
        self.options.consumer_scopes()
    }
}

impl Default for BusConfiguration {
    fn default() -> Self {
        EventBusOptions::default().freeze()
    }
}
