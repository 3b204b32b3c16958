//! Settings document for the scalar part of the configuration model.

use serde::{Deserialize, Serialize};

use super::bus_type::BusType;
use crate::error::ConfigError;

/// Transport, credentials and policy loaded from a settings file.
///
/// Topic mappings and subscriptions name Rust types, so they stay in code.
///
/// ```
/// use buswire::{BusSettings, BusType};
///
/// let settings = BusSettings::from_json_str(r#"{
///     "bus_type": "broker_queue_bus",
///     "connection_string": "amqp://localhost",
///     "dead_letter_queue": true,
///     "retry": { "intervals_ms": [100, 500] }
/// }"#)?;
/// assert_eq!(settings.bus_type, BusType::BrokerQueueBus);
/// # Ok::<(), buswire::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusSettings {
    pub bus_type: BusType,
    pub connection_string: Option<String>,
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub disabled: bool,
    pub dead_letter_queue: bool,
    pub retry: Option<RetrySettings>,
}

/// Retry section of [`BusSettings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrySettings {
    Immediate(i32),
    IntervalsMs(Vec<u64>),
}

impl BusSettings {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
