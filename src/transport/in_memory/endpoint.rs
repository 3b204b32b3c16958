//! In-memory receive endpoints: the definition built while wiring, and the
//! worker thread that consumes from it once the bus runs.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Receiver;
use std::sync::Weak;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, warn};

use super::bus::Router;
use super::failures::{DeadLetter, FailureRoute, FailureStore};
use crate::consumer::{ConsumerRegistration, Delivery};
use crate::error::ConsumeError;
use crate::message::{Envelope, Fault, MessageType};
use crate::options::RetryPolicy;
use crate::topology::ReceiveEndpointConfigurator;
use crate::transport::TransportStats;

/// A receive endpoint as configured during wiring.
///
/// Without a retry call the endpoint delivers each message once.
#[derive(Debug, Clone)]
pub struct EndpointDefinition {
    name: String,
    consumers: Vec<ConsumerRegistration>,
    retry: RetryPolicy,
    error_route: FailureRoute,
    skipped_route: FailureRoute,
    publish_faults: bool,
}

impl EndpointDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            consumers: Vec::new(),
            retry: RetryPolicy::Immediate { count: 0 },
            error_route: FailureRoute::EndpointQueue,
            skipped_route: FailureRoute::EndpointQueue,
            publish_faults: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn consumers(&self) -> &[ConsumerRegistration] {
        &self.consumers
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn error_route(&self) -> FailureRoute {
        self.error_route
    }

    pub fn skipped_route(&self) -> FailureRoute {
        self.skipped_route
    }

    pub fn publish_faults(&self) -> bool {
        self.publish_faults
    }

    /// Message types consumed here, without duplicates.
    pub(crate) fn message_types(&self) -> Vec<MessageType> {
        let mut types: Vec<MessageType> = Vec::new();
        for registration in &self.consumers {
            let message_type = registration.message_type();
            if !types.contains(&message_type) {
                types.push(message_type);
            }
        }
        types
    }
}

impl ReceiveEndpointConfigurator for EndpointDefinition {
    fn endpoint_name(&self) -> &str {
        &self.name
    }

    fn configure_consumer(&mut self, registration: &ConsumerRegistration) {
        let consumer_type = registration.consumer_type();
        if self.consumers.iter().any(|c| c.consumer_type() == consumer_type) {
            debug!(
                endpoint = %self.name,
                consumer = consumer_type.name(),
                "consumer already attached"
            );
            return;
        }
        self.consumers.push(registration.clone());
    }

    fn use_message_retry(&mut self, count: u32) {
        self.retry = RetryPolicy::Immediate { count };
    }

    fn use_delayed_redelivery(&mut self, intervals: &[Duration]) {
        self.retry = RetryPolicy::Intervals(intervals.to_vec());
    }

    fn configure_dead_letter_queue_dead_letter_transport(&mut self) {
        self.skipped_route = FailureRoute::DeadLetterQueue;
    }

    fn configure_dead_letter_queue_error_transport(&mut self) {
        self.error_route = FailureRoute::DeadLetterQueue;
    }

    fn set_publish_faults(&mut self, publish: bool) {
        self.publish_faults = publish;
    }
}

pub(crate) struct InboundMessage {
    pub message_type: MessageType,
    pub envelope: Envelope,
    pub topic: Option<String>,
}

pub(crate) enum Command {
    Deliver(InboundMessage),
    Stop,
}

/// Consumes one endpoint's inbox on its own thread.
pub(crate) struct EndpointWorker {
    definition: EndpointDefinition,
    failures: FailureStore,
}

impl EndpointWorker {
    pub(crate) fn new(definition: EndpointDefinition, failures: FailureStore) -> Self {
        Self {
            definition,
            failures,
        }
    }

    /// Run until told to stop or the bus is dropped.
    pub(crate) fn run(self, inbox: Receiver<Command>, router: Weak<Router>) -> TransportStats {
        let mut stats = TransportStats::default();
        debug!(endpoint = %self.definition.name, "receive endpoint started");

        while let Ok(command) = inbox.recv() {
            let message = match command {
                Command::Deliver(message) => message,
                Command::Stop => break,
            };
            self.handle(&message, &router, &mut stats);
            if let Some(router) = router.upgrade() {
                router.complete();
            }
        }

        debug!(endpoint = %self.definition.name, ?stats, "receive endpoint stopped");
        stats
    }

    fn handle(&self, message: &InboundMessage, router: &Weak<Router>, stats: &mut TransportStats) {
        let consumers: Vec<&ConsumerRegistration> = self
            .definition
            .consumers
            .iter()
            .filter(|c| c.message_type() == message.message_type)
            .collect();

        if consumers.is_empty() {
            self.skip(message, stats);
            return;
        }

        // a body that does not decode will not on a retry either
        if let Err(err) = message.message_type.check(&message.envelope) {
            stats.attempts += 1;
            self.fault(message, &err, 1, router, stats);
            return;
        }

        let mut attempt: u32 = 1;
        loop {
            stats.attempts += 1;
            let delivery = Delivery {
                envelope: &message.envelope,
                topic: message.topic.as_deref(),
                endpoint: &self.definition.name,
                attempt,
            };

            let err = match consumers.iter().try_for_each(|c| consume_guarded(c, &delivery)) {
                Ok(()) => {
                    stats.delivered += 1;
                    return;
                }
                Err(err) => err,
            };

            match self.definition.retry.delay_before_retry(attempt as usize) {
                Some(delay) => {
                    warn!(
                        endpoint = %self.definition.name,
                        message_type = %message.envelope.message_type,
                        attempt,
                        error = %err,
                        "consume failed, retrying"
                    );
                    stats.retried += 1;
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
                None => {
                    self.fault(message, &err, attempt, router, stats);
                    return;
                }
            }
        }
    }

    fn fault(
        &self,
        message: &InboundMessage,
        err: &ConsumeError,
        attempts: u32,
        router: &Weak<Router>,
        stats: &mut TransportStats,
    ) {
        let name = &self.definition.name;
        let reason = err.to_string();
        stats.faulted += 1;
        error!(
            endpoint = %name,
            message_type = %message.envelope.message_type,
            message_id = %message.envelope.message_id,
            attempts,
            error = %reason,
            "message faulted"
        );

        match self.definition.error_route {
            FailureRoute::DeadLetterQueue => {
                self.failures.dead_letter(DeadLetter {
                    endpoint: name.clone(),
                    envelope: message.envelope.clone(),
                    reason: reason.clone(),
                    attempts,
                });
                stats.dead_lettered += 1;
            }
            FailureRoute::EndpointQueue => self.failures.enqueue(
                format!("{name}_error"),
                message
                    .envelope
                    .clone()
                    .with_header("fault-reason", reason.clone()),
            ),
        }

        // a faulting Fault consumer must not feed itself
        if !self.definition.publish_faults || message.message_type == MessageType::of::<Fault>() {
            return;
        }
        let Some(router) = router.upgrade() else {
            return;
        };

        let fault = Fault {
            message_id: message.envelope.message_id.clone(),
            message_type: message.envelope.message_type.clone(),
            endpoint: name.clone(),
            reason,
            attempts,
        };
        let published = Envelope::encode(&fault).and_then(|envelope| {
            router.publish_from_endpoint(&MessageType::of::<Fault>(), envelope)
        });
        if let Err(e) = published {
            warn!(endpoint = %name, error = %e, "failed to publish fault");
        }
    }

    fn skip(&self, message: &InboundMessage, stats: &mut TransportStats) {
        let name = &self.definition.name;
        stats.skipped += 1;
        warn!(
            endpoint = %name,
            message_type = %message.envelope.message_type,
            "no consumer for message, skipping"
        );

        match self.definition.skipped_route {
            FailureRoute::DeadLetterQueue => {
                self.failures.dead_letter(DeadLetter {
                    endpoint: name.clone(),
                    envelope: message.envelope.clone(),
                    reason: format!("skipped: no consumer for {}", message.envelope.message_type),
                    attempts: 0,
                });
                stats.dead_lettered += 1;
            }
            FailureRoute::EndpointQueue => self
                .failures
                .enqueue(format!("{name}_skipped"), message.envelope.clone()),
        }
    }
}

fn consume_guarded(
    registration: &ConsumerRegistration,
    delivery: &Delivery<'_>,
) -> Result<(), ConsumeError> {
    panic::catch_unwind(AssertUnwindSafe(|| registration.consume(delivery)))
        .unwrap_or_else(|payload| Err(ConsumeError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
