use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender as Inbox};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::endpoint::{Command, EndpointDefinition, EndpointWorker, InboundMessage};
use super::failures::{DeadLetter, FailureStore};
use super::message_log::MessageLog;
use crate::error::TransportError;
use crate::message::{Envelope, MessageType};
use crate::transport::{Address, Sender, Transport, TransportStats};

const IDLE_POLL: Duration = Duration::from_millis(1);

/// Handle to an in-process bus.
///
/// Every clone refers to the same bus. The handle exists before the bus is
/// started so tests can keep one and inspect the log and failure queues
/// after wiring.
#[derive(Clone, Default)]
pub struct InMemoryBus {
    log: MessageLog,
    failures: FailureStore,
    router: Arc<OnceLock<Arc<Router>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.router.get().is_some()
    }

    /// Whether two handles refer to the same bus.
    pub fn same_bus(&self, other: &InMemoryBus) -> bool {
        Arc::ptr_eq(&self.router, &other.router)
    }

    /// Everything published or sent, in order.
    pub fn message_log(&self) -> MessageLog {
        self.log.clone()
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.failures.dead_letters()
    }

    /// Messages that faulted on `endpoint` and went to its error queue.
    pub fn error_queue(&self, endpoint: &str) -> Vec<Envelope> {
        self.failures.queue(&format!("{endpoint}_error"))
    }

    /// Messages `endpoint` had no consumer for.
    pub fn skipped_queue(&self, endpoint: &str) -> Vec<Envelope> {
        self.failures.queue(&format!("{endpoint}_skipped"))
    }

    /// Names of the running receive endpoints.
    pub fn endpoint_names(&self) -> Vec<String> {
        self.router
            .get()
            .map(|r| r.endpoints.iter().map(|e| e.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Endpoints bound to `topic`.
    pub fn topic_subscribers(&self, topic: &str) -> Vec<String> {
        let Some(router) = self.router.get() else {
            return Vec::new();
        };
        router
            .topics
            .get(topic)
            .map(|idx| idx.iter().map(|i| router.endpoints[*i].name.clone()).collect())
            .unwrap_or_default()
    }

    fn running(&self) -> Result<&Arc<Router>, TransportError> {
        self.router
            .get()
            .ok_or_else(|| TransportError::ConnectionFailed("in-memory bus not started".into()))
    }

    /// Spawn one worker per endpoint and start routing.
    pub(crate) fn launch(
        &self,
        topology: HashMap<MessageType, String>,
        definitions: Vec<EndpointDefinition>,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        if self.is_started() {
            return Err(TransportError::Rejected("in-memory bus already started".into()));
        }

        let mut topics: HashMap<String, Vec<usize>> = HashMap::new();
        let mut queues = HashMap::new();
        let mut endpoints = Vec::with_capacity(definitions.len());
        let mut receivers = Vec::with_capacity(definitions.len());

        for (idx, definition) in definitions.iter().enumerate() {
            queues.insert(definition.name().to_string(), idx);
            for message_type in definition.message_types() {
                let topic = entity_name(&topology, &message_type);
                topics.entry(topic).or_default().push(idx);
            }
            let (tx, rx) = mpsc::channel();
            endpoints.push(EndpointSlot {
                name: definition.name().to_string(),
                inbox: tx,
            });
            receivers.push(rx);
        }

        let router = Arc::new(Router {
            topology,
            topics,
            queues,
            endpoints,
            in_flight: AtomicUsize::new(0),
            stopping: AtomicBool::new(false),
            accepting: RwLock::new(true),
            workers: Mutex::new(Vec::new()),
            log: self.log.clone(),
        });

        let mut handles = Vec::with_capacity(definitions.len());
        for (definition, rx) in definitions.into_iter().zip(receivers) {
            let name = format!("buswire-{}", definition.name());
            let worker = EndpointWorker::new(definition, self.failures.clone());
            let weak = Arc::downgrade(&router);
            let handle = thread::Builder::new()
                .name(name)
                .spawn(move || worker.run(rx, weak))
                .map_err(|e| TransportError::Other(Box::new(e)))?;
            handles.push(handle);
        }
        let count = handles.len();
        *router.workers.lock().unwrap_or_else(PoisonError::into_inner) = handles;

        self.router
            .set(router)
            .map_err(|_| TransportError::Rejected("in-memory bus already started".into()))?;
        info!(endpoints = count, "in-memory bus started");
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Debug for InMemoryBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryBus")
            .field("started", &self.is_started())
            .field("logged", &self.log.len())
            .finish()
    }
}

impl Transport for InMemoryBus {
    fn publish(
        &self,
        message_type: &MessageType,
        envelope: Envelope,
    ) -> Result<(), TransportError> {
        self.running()?.publish(message_type, envelope)
    }

    fn send_endpoint(&self, address: &Address) -> Result<Arc<dyn Sender>, TransportError> {
        let router = self.running()?;
        if let Address::Queue(name) = address {
            if !router.queues.contains_key(name) {
                return Err(TransportError::EndpointNotFound(address.to_string()));
            }
        }
        Ok(Arc::new(InMemorySendEndpoint {
            address: address.clone(),
            router: Arc::clone(router),
        }))
    }

    fn stop(&self) -> TransportStats {
        match self.router.get() {
            Some(router) => router.stop(),
            None => TransportStats::default(),
        }
    }
}

fn entity_name(topology: &HashMap<MessageType, String>, message_type: &MessageType) -> String {
    topology
        .get(message_type)
        .cloned()
        .unwrap_or_else(|| message_type.name().to_string())
}

struct EndpointSlot {
    name: String,
    inbox: Inbox<Command>,
}

/// Routing tables and worker bookkeeping of a started bus.
pub(crate) struct Router {
    topology: HashMap<MessageType, String>,
    topics: HashMap<String, Vec<usize>>,
    queues: HashMap<String, usize>,
    endpoints: Vec<EndpointSlot>,
    in_flight: AtomicUsize,
    stopping: AtomicBool,
    /// Held for reading across every external delivery; `stop` takes it
    /// for writing to close the bus.
    accepting: RwLock<bool>,
    workers: Mutex<Vec<JoinHandle<TransportStats>>>,
    log: MessageLog,
}

impl Router {
    pub(crate) fn publish(
        &self,
        message_type: &MessageType,
        envelope: Envelope,
    ) -> Result<(), TransportError> {
        let address = Address::topic(entity_name(&self.topology, message_type));
        self.deliver(&address, message_type, envelope)
    }

    /// Publish from inside a worker while the triggering message is still in
    /// flight. Allowed while the bus drains during `stop`.
    pub(crate) fn publish_from_endpoint(
        &self,
        message_type: &MessageType,
        envelope: Envelope,
    ) -> Result<(), TransportError> {
        let address = Address::topic(entity_name(&self.topology, message_type));
        self.route(&address, message_type, envelope)
    }

    fn deliver(
        &self,
        address: &Address,
        message_type: &MessageType,
        envelope: Envelope,
    ) -> Result<(), TransportError> {
        let accepting = self.accepting.read().unwrap_or_else(PoisonError::into_inner);
        if !*accepting {
            return Err(TransportError::Stopped);
        }
        self.route(address, message_type, envelope)
    }

    fn route(
        &self,
        address: &Address,
        message_type: &MessageType,
        envelope: Envelope,
    ) -> Result<(), TransportError> {
        let (targets, topic) = match address {
            Address::Topic(name) => (
                self.topics.get(name).cloned().unwrap_or_default(),
                Some(name.clone()),
            ),
            Address::Queue(name) => match self.queues.get(name) {
                Some(idx) => (vec![*idx], None),
                None => return Err(TransportError::EndpointNotFound(address.to_string())),
            },
        };

        self.log.append(address.clone(), envelope.clone());
        if targets.is_empty() {
            debug!(%address, message_type = %message_type, "no endpoint bound");
        }

        let mut delivered = 0;
        for &idx in &targets {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            let command = Command::Deliver(InboundMessage {
                message_type: *message_type,
                envelope: envelope.clone(),
                topic: topic.clone(),
            });
            if self.endpoints[idx].inbox.send(command).is_ok() {
                delivered += 1;
            } else {
                self.complete();
                warn!(%address, endpoint = %self.endpoints[idx].name, "receive endpoint is gone");
            }
        }

        match delivered {
            n if n == targets.len() => Ok(()),
            0 => Err(TransportError::Stopped),
            n => Err(TransportError::PartiallyDelivered {
                delivered: n,
                targets: targets.len(),
            }),
        }
    }

    /// One delivery finished on a worker.
    pub(crate) fn complete(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn wait_idle(&self) {
        while self.in_flight.load(Ordering::SeqCst) > 0 {
            thread::sleep(IDLE_POLL);
        }
    }

    /// Drain, stop every worker and collect their stats. Later calls return
    /// empty stats.
    fn stop(&self) -> TransportStats {
        if self.stopping.swap(true, Ordering::SeqCst) {
            return TransportStats::default();
        }

        // waits out every delivery already past the check in `deliver`
        *self.accepting.write().unwrap_or_else(PoisonError::into_inner) = false;
        self.wait_idle();
        for endpoint in &self.endpoints {
            let _ = endpoint.inbox.send(Command::Stop);
        }

        let handles =
            std::mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));
        let mut stats = TransportStats::default();
        for handle in handles {
            match handle.join() {
                Ok(worker_stats) => stats.merge(worker_stats),
                Err(_) => warn!("receive endpoint worker panicked"),
            }
        }

        info!(?stats, "in-memory bus stopped");
        stats
    }
}

struct InMemorySendEndpoint {
    address: Address,
    router: Arc<Router>,
}

impl Sender for InMemorySendEndpoint {
    fn address(&self) -> &Address {
        &self.address
    }

    fn send(&self, message_type: &MessageType, envelope: Envelope) -> Result<(), TransportError> {
        self.router.deliver(&self.address, message_type, envelope)
    }
}
