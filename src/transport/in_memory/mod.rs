//! In-process transport.
//!
//! Each receive endpoint runs on its own thread and consumes from a channel.
//! Topics fan out to every endpoint whose consumers handle the message type
//! bound to that topic.

mod bus;
mod endpoint;
mod factory;
mod failures;
mod message_log;

pub use bus::InMemoryBus;
pub use endpoint::EndpointDefinition;
pub use factory::InMemoryBusFactory;
pub use failures::{DeadLetter, FailureRoute};
pub use message_log::{LoggedMessage, MessageLog};
