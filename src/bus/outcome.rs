//! Result of a publish or send.

use crate::error::TransportError;
use crate::transport::Address;

/// Why a publish or send did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The bus is disabled.
    Disabled,
    /// `send` was given an empty destination.
    EmptyDestination,
}

/// What happened to a publish or send.
///
/// Failures are already logged by the time the caller sees this, so it is
/// fine to drop it.
#[derive(Debug)]
pub enum PublishOutcome {
    Published,
    Sent(Address),
    Skipped(SkipReason),
    Failed(TransportError),
}

impl PublishOutcome {
    /// Published or sent.
    pub fn is_delivered(&self) -> bool {
        matches!(self, PublishOutcome::Published | PublishOutcome::Sent(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, PublishOutcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PublishOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<&TransportError> {
        match self {
            PublishOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}
