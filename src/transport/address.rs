//! Topic- and queue-shaped send addresses.

use std::fmt;
use std::str::FromStr;

use crate::error::TransportError;

/// Where a `send` goes: a topic (fan-out) or a queue (point to point).
///
/// Rendered as `topic:<name>` or `queue:<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    Topic(String),
    Queue(String),
}

impl Address {
    pub fn topic(name: impl Into<String>) -> Self {
        Address::Topic(name.into())
    }

    pub fn queue(name: impl Into<String>) -> Self {
        Address::Queue(name.into())
    }

    /// Address for a `send` destination.
    pub fn for_destination(destination: &str, is_topic: bool) -> Self {
        if is_topic {
            Address::topic(destination)
        } else {
            Address::queue(destination)
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Address::Topic(name) | Address::Queue(name) => name,
        }
    }

    pub fn is_topic(&self) -> bool {
        matches!(self, Address::Topic(_))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Topic(name) => write!(f, "topic:{}", name),
            Address::Queue(name) => write!(f, "queue:{}", name),
        }
    }
}

impl FromStr for Address {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, name) = s
            .split_once(':')
            .ok_or_else(|| TransportError::Rejected(format!("address without scheme: {}", s)))?;
        if name.is_empty() {
            return Err(TransportError::Rejected(format!("address without name: {}", s)));
        }
        match scheme {
            "topic" => Ok(Address::topic(name)),
            "queue" => Ok(Address::queue(name)),
            other => Err(TransportError::Rejected(format!(
                "unknown address scheme: {}",
                other
            ))),
        }
    }
}
