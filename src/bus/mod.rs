//! Runtime facade.
//!
//! ```text
//! application code
//!        │  publish(&msg) / send(&msg, "billing", false)
//!        ▼
//! ┌──────────────────────────────┐
//! │ EventBus                     │  disabled? empty destination?
//! │  - encodes the Envelope      │  -> Skipped
//! │  - logs, never raises        │  transport error -> Failed
//! └──────────────────────────────┘
//!        │
//!        ▼
//!   Arc<dyn Transport>  (topic:<name> / queue:<name>)
//! ```

mod event_bus;
mod outcome;

pub use event_bus::EventBus;
pub use outcome::{PublishOutcome, SkipReason};
