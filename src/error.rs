//! Error types for configuration, wiring, transports and consumers.
//!
//! Configuration and wiring errors abort startup. Transport errors only ever
//! reach application code as a [`PublishOutcome::Failed`] value.
//!
//! [`PublishOutcome::Failed`]: crate::bus::PublishOutcome::Failed

use std::error::Error;

use thiserror::Error;

use crate::options::BusType;

/// Misconfiguration detected at the call site of a configuration setter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A non in-memory bus was configured without a connection string.
    #[error("the connection string for the event bus must be set when the bus type is {0}")]
    MissingConnectionString(BusType),
    /// The managed queue bus was configured through the connection string overload.
    #[error("{0} needs region, access key and secret key; use configure_with_credentials")]
    CredentialOverloadRequired(BusType),
    /// One of the managed queue credentials is empty.
    #[error("{field} must be set for the {bus_type} bus")]
    MissingCredential {
        bus_type: BusType,
        field: &'static str,
    },
    /// Credentials were supplied for a bus type that does not take them.
    #[error("credentials are only accepted by the managed queue bus, not {0}")]
    CredentialsNotSupported(BusType),
    /// A topic mapping or subscription named no topic.
    #[error("topic path must not be empty")]
    EmptyTopicPath,
    /// `retry_immediately` was given a negative count.
    #[error("retry count must be zero or a positive integer, got {0}")]
    NegativeRetryCount(i32),
    /// A settings document could not be parsed.
    #[error("invalid bus settings: {0}")]
    InvalidSettings(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::InvalidSettings(err.to_string())
    }
}

/// Failure while binding the frozen configuration onto a transport.
#[derive(Debug, Error)]
pub enum WiringError {
    /// The topology binder was handed no transport configurator.
    #[error("no transport configurator is active")]
    NoActiveTransport,
    /// The topology binder was handed more than one transport configurator.
    #[error("more than one transport configurator is active: {0:?}")]
    MultipleActiveTransports(Vec<BusType>),
    /// A subscription names a consumer no scope registered.
    #[error("no registered consumer matches {0}")]
    ConsumerNotFound(String),
    /// The bus host cannot build the selected transport.
    #[error("the bus host cannot provide a {0} transport")]
    TransportUnavailable(BusType),
    /// The transport refused to start.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Error raised by a transport while publishing, sending or starting.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection to the broker or service failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// The message body could not be encoded.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
    /// The transport rejected the message.
    #[error("message rejected: {0}")]
    Rejected(String),
    /// No endpoint is reachable at the requested address.
    #[error("no endpoint at {0}")]
    EndpointNotFound(String),
    /// The transport has been stopped.
    #[error("transport has been stopped")]
    Stopped,
    /// A topic fan-out reached only some of its bound endpoints.
    #[error("delivered to {delivered} of {targets} endpoints")]
    PartiallyDelivered { delivered: usize, targets: usize },
    /// Other error.
    #[error("transport error: {0}")]
    Other(#[source] Box<dyn Error + Send + Sync>),
}

impl From<bitcode::Error> for TransportError {
    fn from(err: bitcode::Error) -> Self {
        TransportError::SerializationFailed(err.to_string())
    }
}

/// Error returned by a consumer. Any error triggers the endpoint's retry policy.
#[derive(Debug, Error)]
pub enum ConsumeError {
    /// The envelope payload could not be decoded into the consumer's message.
    #[error("failed to decode {message_type}: {reason}")]
    Decode {
        message_type: String,
        reason: String,
    },
    /// The consumer refused the message.
    #[error("rejected: {0}")]
    Rejected(String),
    /// The consumer panicked while handling the message.
    #[error("consumer panicked: {0}")]
    Panicked(String),
    /// Other error.
    #[error("consumer error: {0}")]
    Other(#[source] Box<dyn Error + Send + Sync>),
}

impl ConsumeError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        ConsumeError::Rejected(reason.into())
    }
}

/// Any error that can abort bus startup.
#[derive(Debug, Error)]
pub enum BusError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Wiring(#[from] WiringError),
}

impl From<TransportError> for BusError {
    fn from(err: TransportError) -> Self {
        BusError::Wiring(WiringError::Transport(err))
    }
}
