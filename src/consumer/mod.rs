//! Consumers, their registration scopes, and the consumer registrar.

mod consumer;
mod registrar;
mod scope;

pub(crate) use consumer::Delivery;
pub use consumer::{ConsumeContext, Consumer, ConsumerType};
pub use registrar::ConsumerRegistrar;
pub use scope::{ConsumerRegistration, ConsumerScope, RegistrationContext};
