//! End-to-end scenarios on the in-memory transport.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use buswire::message::Fault;
use buswire::{
    Address, BusBootstrap, ConsumerScope, ConsumerType, EventBus, EventBusOptions, InMemoryBus,
    InMemoryHost, MessageType,
};

use crate::support::{
    inbox, Inbox, OrderCreated, OrderCreatedConsumer, PaymentCaptured, PaymentCapturedConsumer,
};

fn start(options: EventBusOptions, scope: ConsumerScope) -> (EventBus, InMemoryBus) {
    let mut host = InMemoryHost::new();
    let bus = BusBootstrap::new(options, scope).start(&mut host).unwrap();
    (bus, host.bus())
}

fn orders(received: &Inbox) -> ConsumerScope {
    ConsumerScope::new("orders").add(OrderCreatedConsumer {
        inbox: received.clone(),
    })
}

#[test]
fn published_order_reaches_its_consumer_exactly_once() {
    let received = inbox();
    let options = EventBusOptions::new()
        .map_topic(
            "orders.created",
            MessageType::of::<OrderCreated>(),
            Some(ConsumerType::of::<OrderCreatedConsumer>()),
            Some("orders-sub"),
        )
        .unwrap();
    let (bus, memory) = start(options, orders(&received));

    assert!(bus
        .publish(&OrderCreated {
            order_id: "o-1".into(),
            total: 42
        })
        .is_delivered());
    let stats = bus.stop();

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].order_id, "o-1");
    assert_eq!(received[0].topic.as_deref(), Some("orders.created"));
    assert_eq!(received[0].endpoint, "order-created-consumer");
    assert_eq!(received[0].attempt, 1);
    assert_eq!(stats.delivered, 1);
    assert_eq!(
        memory.message_log().entries()[0].address,
        Address::topic("orders.created")
    );
}

#[test]
fn unmapped_type_publishes_to_its_type_name() {
    let received = inbox();
    let (bus, memory) = start(EventBusOptions::new(), orders(&received));

    bus.publish(&OrderCreated {
        order_id: "o-2".into(),
        total: 1,
    });
    bus.stop();

    assert_eq!(received.lock().unwrap()[0].topic.as_deref(), Some("OrderCreated"));
    assert_eq!(memory.topic_subscribers("OrderCreated"), vec!["order-created-consumer"]);
}

#[test]
fn exhausted_retries_dead_letter_without_fault() {
    let (payments, attempts) = PaymentCapturedConsumer::new();
    let options = EventBusOptions::new()
        .retry_immediately(3)
        .unwrap()
        .use_dead_letter_queue(true);
    let (bus, memory) = start(options, ConsumerScope::new("payments").add(payments));

    bus.publish(&PaymentCaptured {
        order_id: "o-3".into(),
    });
    let stats = bus.stop();

    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    assert_eq!(stats.attempts, 4);
    assert_eq!(stats.retried, 3);
    assert_eq!(stats.faulted, 1);
    assert_eq!(stats.dead_lettered, 1);

    let letters = memory.dead_letters();
    assert_eq!(letters.len(), 1);
    assert_eq!(letters[0].endpoint, "payment-captured-consumer");
    assert_eq!(letters[0].attempts, 4);
    assert!(letters[0].reason.contains("ledger unavailable for o-3"));

    assert!(memory.message_log().find_by_type("Fault").is_none());
    assert!(memory.error_queue("payment-captured-consumer").is_empty());
}

#[test]
fn without_dead_letter_faults_go_to_error_queue_and_publish() {
    let (payments, attempts) = PaymentCapturedConsumer::new();
    let (bus, memory) = start(
        EventBusOptions::new(),
        ConsumerScope::new("payments").add(payments),
    );

    bus.publish(&PaymentCaptured {
        order_id: "o-4".into(),
    });
    let stats = bus.stop();

    // default policy: two immediate retries
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(stats.faulted, 1);
    assert!(memory.dead_letters().is_empty());

    let errors = memory.error_queue("payment-captured-consumer");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].header("fault-reason").is_some());

    let logged = memory.message_log().find_by_type("Fault").unwrap();
    let fault: Fault = logged.envelope.decode().unwrap();
    assert_eq!(fault.message_type, "PaymentCaptured");
    assert_eq!(fault.endpoint, "payment-captured-consumer");
    assert_eq!(fault.attempts, 3);
}

#[test]
fn interval_retries_wait_between_attempts() {
    let (payments, attempts) = PaymentCapturedConsumer::new();
    let options = EventBusOptions::new()
        .set_retry_intervals([Duration::from_millis(20), Duration::from_millis(30)])
        .use_dead_letter_queue(true);
    let (bus, memory) = start(options, ConsumerScope::new("payments").add(payments));

    let started = Instant::now();
    bus.publish(&PaymentCaptured {
        order_id: "o-5".into(),
    });
    let stats = bus.stop();

    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(stats.retried, 2);
    assert_eq!(memory.dead_letters().len(), 1);
}

#[test]
fn queue_send_of_unhandled_type_is_skipped() {
    let received = inbox();
    let (bus, memory) = start(EventBusOptions::new(), orders(&received));

    let outcome = bus.send(
        &PaymentCaptured {
            order_id: "o-6".into(),
        },
        "order-created-consumer",
        false,
    );
    let stats = bus.stop();

    assert!(outcome.is_delivered());
    assert_eq!(stats.skipped, 1);
    assert!(received.lock().unwrap().is_empty());
    assert_eq!(memory.skipped_queue("order-created-consumer").len(), 1);
}

#[test]
fn concurrent_publishers_share_one_bus() {
    let received = inbox();
    let (bus, _memory) = start(EventBusOptions::new(), orders(&received));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let bus = bus.clone();
            std::thread::spawn(move || {
                for n in 0..25 {
                    bus.publish(&OrderCreated {
                        order_id: format!("w{worker}-{n}"),
                        total: n,
                    });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let stats = bus.stop();

    assert_eq!(stats.delivered, 100);
    assert_eq!(received.lock().unwrap().len(), 100);
}

#[test]
fn every_published_outcome_is_consumed_when_stop_races() {
    for _ in 0..20 {
        let received = inbox();
        let (bus, _memory) = start(EventBusOptions::new(), orders(&received));

        let publishers: Vec<_> = (0..4)
            .map(|worker| {
                let bus = bus.clone();
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|n| {
                            bus.publish(&OrderCreated {
                                order_id: format!("w{worker}-{n}"),
                                total: *n,
                            })
                            .is_delivered()
                        })
                        .count()
                })
            })
            .collect();
        let stats = bus.stop();
        let published: usize = publishers.into_iter().map(|p| p.join().unwrap()).sum();

        assert_eq!(received.lock().unwrap().len(), published);
        assert_eq!(stats.delivered, published);
    }
}
