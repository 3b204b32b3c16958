//! Declared topic mappings and subscriptions.

use crate::consumer::ConsumerType;
use crate::message::MessageType;

/// A message type bound to the topic (entity) it publishes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMapping {
    message_type: MessageType,
    topic: String,
}

impl TopicMapping {
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Topic mappings in declaration order. The first mapping for a type wins.
#[derive(Debug, Clone, Default)]
pub struct TopicMappings {
    mappings: Vec<TopicMapping>,
}

impl TopicMappings {
    /// Map `message_type` to `topic` unless it is already mapped.
    ///
    /// Returns `false` when an earlier mapping was kept.
    pub(crate) fn insert_if_absent(&mut self, message_type: MessageType, topic: &str) -> bool {
        if self.get(&message_type).is_some() {
            return false;
        }
        self.mappings.push(TopicMapping {
            message_type,
            topic: topic.to_string(),
        });
        true
    }

    /// Topic mapped for a message type.
    pub fn get(&self, message_type: &MessageType) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| &m.message_type == message_type)
            .map(|m| m.topic.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TopicMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// A named, durable binding between a topic and a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    topic_path: String,
    consumer_type: ConsumerType,
    subscription_name: String,
}

impl Subscription {
    pub(crate) fn new(
        topic_path: &str,
        consumer_type: ConsumerType,
        subscription_name: &str,
    ) -> Self {
        Self {
            topic_path: topic_path.to_string(),
            consumer_type,
            subscription_name: subscription_name.to_string(),
        }
    }

    pub fn topic_path(&self) -> &str {
        &self.topic_path
    }

    pub fn consumer_type(&self) -> ConsumerType {
        self.consumer_type
    }

    pub fn subscription_name(&self) -> &str {
        &self.subscription_name
    }

    /// Only subscriptions with a name get a receive endpoint.
    pub fn is_named(&self) -> bool {
        !self.subscription_name.trim().is_empty()
    }
}
