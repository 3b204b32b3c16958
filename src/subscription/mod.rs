//! Turns declared subscriptions into transport receive endpoints.

mod registrar;

pub use registrar::SubscriptionRegistrar;
