//! Where the in-memory bus parks messages it could not deliver.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::message::Envelope;

/// A message moved to the dead-letter queue.
#[derive(Clone, Debug)]
pub struct DeadLetter {
    pub endpoint: String,
    pub envelope: Envelope,
    pub reason: String,
    pub attempts: u32,
}

/// Where an endpoint sends faulted or skipped messages.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FailureRoute {
    /// A sibling queue named after the endpoint (`<endpoint>_error`,
    /// `<endpoint>_skipped`).
    #[default]
    EndpointQueue,
    /// The bus-wide dead-letter queue.
    DeadLetterQueue,
}

#[derive(Clone, Default)]
pub(crate) struct FailureStore {
    dead_letters: Arc<Mutex<Vec<DeadLetter>>>,
    queues: Arc<Mutex<HashMap<String, Vec<Envelope>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FailureStore {
    pub(crate) fn dead_letter(&self, letter: DeadLetter) {
        lock(&self.dead_letters).push(letter);
    }

    pub(crate) fn enqueue(&self, queue: String, envelope: Envelope) {
        lock(&self.queues).entry(queue).or_default().push(envelope);
    }

    pub(crate) fn dead_letters(&self) -> Vec<DeadLetter> {
        lock(&self.dead_letters).clone()
    }

    pub(crate) fn queue(&self, queue: &str) -> Vec<Envelope> {
        lock(&self.queues).get(queue).cloned().unwrap_or_default()
    }
}
