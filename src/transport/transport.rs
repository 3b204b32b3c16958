//! Runtime side of a started transport.

use std::sync::Arc;

use super::address::Address;
use crate::error::TransportError;
use crate::message::{Envelope, MessageType};

/// A started transport, shared by every clone of the event bus.
///
/// Implementations must be safe to call from many threads at once.
pub trait Transport: Send + Sync {
    /// Publish to the topic bound to `message_type`.
    fn publish(&self, message_type: &MessageType, envelope: Envelope) -> Result<(), TransportError>;

    /// Resolve a send channel for an address.
    fn send_endpoint(&self, address: &Address) -> Result<Arc<dyn Sender>, TransportError>;

    /// Stop receiving, wait for in-flight deliveries, and report.
    fn stop(&self) -> TransportStats;
}

/// Send channel for one address (point to point, or a topic by name).
pub trait Sender: Send + Sync {
    fn address(&self) -> &Address;

    fn send(&self, message_type: &MessageType, envelope: Envelope) -> Result<(), TransportError>;
}

/// Delivery statistics collected by a transport's receive endpoints.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransportStats {
    /// Messages a consumer handled successfully.
    pub delivered: usize,
    /// Consume attempts, first deliveries and retries together.
    pub attempts: usize,
    /// Retries after a failed attempt.
    pub retried: usize,
    /// Messages that exhausted their retries.
    pub faulted: usize,
    /// Messages moved to the dead-letter queue.
    pub dead_lettered: usize,
    /// Messages no consumer on the endpoint handles.
    pub skipped: usize,
}

impl TransportStats {
    pub fn merge(&mut self, other: TransportStats) {
        self.delivered += other.delivered;
        self.attempts += other.attempts;
        self.retried += other.retried;
        self.faulted += other.faulted;
        self.dead_lettered += other.dead_lettered;
        self.skipped += other.skipped;
    }
}
