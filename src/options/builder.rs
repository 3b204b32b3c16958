//! Fluent configuration model, filled in once at startup.

use std::time::Duration;

use tracing::debug;

use super::bus_type::{BusType, Connection, ManagedQueueCredentials};
use super::configuration::BusConfiguration;
use super::mapping::{Subscription, TopicMappings};
use super::retry::RetryPolicy;
use super::settings::{BusSettings, RetrySettings};
use crate::consumer::{ConsumerScope, ConsumerType};
use crate::error::ConfigError;
use crate::message::MessageType;

/// Everything the bus needs to know before it starts.
///
/// Setters consume and return the options so calls chain. Setters that
/// validate return `Result` and fail at the call site; the rest are plain
/// flag and list setters.
///
/// ## Example
///
/// ```
/// use std::time::Duration;
/// use buswire::{BusType, EventBusOptions, MessageType};
///
/// # #[derive(serde::Serialize, serde::Deserialize)]
/// # struct OrderCreated { id: String }
/// let options = EventBusOptions::new()
///     .configure(BusType::BrokerQueueBus, Some("amqp://localhost"))?
///     .add_publish_mapping("orders.created", MessageType::of::<OrderCreated>())?
///     .set_retry_intervals([Duration::from_secs(1), Duration::from_secs(5)])
///     .use_dead_letter_queue(true);
///
/// assert_eq!(options.retry_policy().retry_count(), 2);
/// # Ok::<(), buswire::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventBusOptions {
    bus_type: BusType,
    connection: Connection,
    disabled: bool,
    topic_mappings: TopicMappings,
    retry_policy: RetryPolicy,
    dead_letter_enabled: bool,
    subscriptions: Vec<Subscription>,
    consumer_scopes: Vec<ConsumerScope>,
}

impl EventBusOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the bus type and, for every type but in-memory, its connection string.
    ///
    /// The managed queue bus is rejected here; it is configured through
    /// [`configure_with_credentials`](Self::configure_with_credentials).
    pub fn configure(
        mut self,
        bus_type: BusType,
        connection_string: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if bus_type.requires_credentials() {
            return Err(ConfigError::CredentialOverloadRequired(bus_type));
        }

        let connection_string = connection_string.map(str::trim).filter(|s| !s.is_empty());
        if bus_type.requires_connection_string() && connection_string.is_none() {
            return Err(ConfigError::MissingConnectionString(bus_type));
        }

        self.bus_type = bus_type;
        self.connection = match connection_string {
            Some(s) if bus_type != BusType::InMemory => Connection::ConnectionString(s.to_string()),
            _ => Connection::None,
        };
        Ok(self)
    }

    /// Select the managed queue bus with its region, access key and secret key.
    pub fn configure_with_credentials(
        mut self,
        bus_type: BusType,
        region: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Self, ConfigError> {
        if !bus_type.requires_credentials() {
            return Err(ConfigError::CredentialsNotSupported(bus_type));
        }

        let required = |value: &str, field: &'static str| {
            let value = value.trim();
            if value.is_empty() {
                Err(ConfigError::MissingCredential { bus_type, field })
            } else {
                Ok(value.to_string())
            }
        };
        let region = required(region, "region")?;
        let access_key = required(access_key, "access key")?;
        let secret_key = required(secret_key, "secret key")?;

        self.bus_type = bus_type;
        self.connection =
            Connection::Credentials(ManagedQueueCredentials::new(region, access_key, secret_key));
        Ok(self)
    }

    /// Switch the whole bus off without touching the wiring code.
    pub fn disable_bus(mut self, disable: bool) -> Self {
        self.disabled = disable;
        self
    }

    /// Route messages that exhausted their retries to the dead-letter queue.
    pub fn use_dead_letter_queue(mut self, use_it: bool) -> Self {
        self.dead_letter_enabled = use_it;
        self
    }

    /// Map a message type to a topic and optionally subscribe a consumer to it.
    ///
    /// The subscription is only added when both `consumer_type` and a
    /// non-blank `subscription_name` are given. A type that is already mapped
    /// keeps its first topic.
    pub fn map_topic(
        mut self,
        topic_path: &str,
        event_type: MessageType,
        consumer_type: Option<ConsumerType>,
        subscription_name: Option<&str>,
    ) -> Result<Self, ConfigError> {
        self.insert_mapping(topic_path, event_type)?;

        if let (Some(consumer_type), Some(name)) = (consumer_type, subscription_name) {
            self.push_subscription(topic_path, consumer_type, name);
        }
        Ok(self)
    }

    /// Map a message type to a topic for publishing only.
    pub fn add_publish_mapping(
        mut self,
        topic_path: &str,
        event_type: MessageType,
    ) -> Result<Self, ConfigError> {
        self.insert_mapping(topic_path, event_type)?;
        Ok(self)
    }

    /// Subscribe a consumer to a topic this process may never publish to.
    pub fn add_subscription(
        mut self,
        topic_path: &str,
        consumer_type: ConsumerType,
        subscription_name: &str,
    ) -> Result<Self, ConfigError> {
        require_topic(topic_path)?;
        self.push_subscription(topic_path, consumer_type, subscription_name);
        Ok(self)
    }

    /// Retry failed deliveries `count` times without delay.
    pub fn retry_immediately(mut self, count: i32) -> Result<Self, ConfigError> {
        let count = u32::try_from(count).map_err(|_| ConfigError::NegativeRetryCount(count))?;
        self.retry_policy = RetryPolicy::Immediate { count };
        Ok(self)
    }

    /// Redeliver failed messages after each of the given intervals.
    ///
    /// An empty list leaves the current policy untouched.
    pub fn set_retry_intervals<I>(mut self, intervals: I) -> Self
    where
        I: IntoIterator<Item = Duration>,
    {
        let intervals: Vec<Duration> = intervals.into_iter().collect();
        if !intervals.is_empty() {
            self.retry_policy = RetryPolicy::Intervals(intervals);
        }
        self
    }

    /// Extra scopes to search for consumers besides the entry scope.
    pub fn add_consumer_scopes<I>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = ConsumerScope>,
    {
        self.consumer_scopes.extend(scopes);
        self
    }

    /// Replay a settings document through the validating setters.
    pub fn apply_settings(self, settings: &BusSettings) -> Result<Self, ConfigError> {
        let mut options = if settings.bus_type.requires_credentials() {
            self.configure_with_credentials(
                settings.bus_type,
                settings.region.as_deref().unwrap_or_default(),
                settings.access_key.as_deref().unwrap_or_default(),
                settings.secret_key.as_deref().unwrap_or_default(),
            )?
        } else {
            self.configure(settings.bus_type, settings.connection_string.as_deref())?
        };

        options = options
            .disable_bus(settings.disabled)
            .use_dead_letter_queue(settings.dead_letter_queue);

        options = match &settings.retry {
            Some(RetrySettings::Immediate(count)) => options.retry_immediately(*count)?,
            Some(RetrySettings::IntervalsMs(intervals)) => {
                options.set_retry_intervals(intervals.iter().map(|ms| Duration::from_millis(*ms)))
            }
            None => options,
        };

        Ok(options)
    }

    /// Freeze into the read-only configuration handed to the wiring components.
    pub fn freeze(self) -> BusConfiguration {
        BusConfiguration::new(self)
    }

    pub fn bus_type(&self) -> BusType {
        self.bus_type
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn topic_mappings(&self) -> &TopicMappings {
        &self.topic_mappings
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub fn dead_letter_enabled(&self) -> bool {
        self.dead_letter_enabled
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn consumer_scopes(&self) -> &[ConsumerScope] {
        &self.consumer_scopes
    }

    fn insert_mapping(
        &mut self,
        topic_path: &str,
        event_type: MessageType,
    ) -> Result<(), ConfigError> {
        require_topic(topic_path)?;
        if !self.topic_mappings.insert_if_absent(event_type, topic_path) {
            debug!(
                message_type = event_type.name(),
                topic = topic_path,
                "message type already mapped, keeping the first topic"
            );
        }
        Ok(())
    }

    fn push_subscription(&mut self, topic_path: &str, consumer_type: ConsumerType, name: &str) {
        let subscription = Subscription::new(topic_path, consumer_type, name);
        if subscription.is_named() {
            self.subscriptions.push(subscription);
        } else {
            debug!(
                topic = topic_path,
                consumer = consumer_type.name(),
                "subscription without a name ignored"
            );
        }
    }
}

fn require_topic(topic_path: &str) -> Result<(), ConfigError> {
    if topic_path.trim().is_empty() {
        Err(ConfigError::EmptyTopicPath)
    } else {
        Ok(())
    }
}
