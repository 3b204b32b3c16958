//! Append-only record of everything the in-memory bus published or sent.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use crate::message::Envelope;
use crate::transport::Address;

/// An envelope and the address it went to.
#[derive(Clone, Debug)]
pub struct LoggedMessage {
    pub address: Address,
    pub envelope: Envelope,
}

/// Thread-safe message log shared by every clone of an in-memory bus.
///
/// Entries are kept in the order the bus accepted them, fault messages
/// included.
#[derive(Clone, Default)]
pub struct MessageLog {
    entries: Arc<RwLock<Vec<LoggedMessage>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&self, address: Address, envelope: Envelope) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LoggedMessage { address, envelope });
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<LoggedMessage>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get all logged messages.
    pub fn entries(&self) -> Vec<LoggedMessage> {
        self.read().clone()
    }

    /// Get all message types in order.
    pub fn message_types(&self) -> Vec<String> {
        self.read()
            .iter()
            .map(|m| m.envelope.message_type.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Find the first message of a type.
    pub fn find_by_type(&self, message_type: &str) -> Option<LoggedMessage> {
        self.read()
            .iter()
            .find(|m| m.envelope.message_type == message_type)
            .cloned()
    }

    /// Find all messages of a type.
    pub fn find_all_by_type(&self, message_type: &str) -> Vec<LoggedMessage> {
        self.read()
            .iter()
            .filter(|m| m.envelope.message_type == message_type)
            .cloned()
            .collect()
    }

    /// All messages that went to an address.
    pub fn sent_to(&self, address: &Address) -> Vec<LoggedMessage> {
        self.read()
            .iter()
            .filter(|m| &m.address == address)
            .cloned()
            .collect()
    }

    /// Clear the log (useful for test cleanup).
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
