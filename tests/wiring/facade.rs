//! Runtime facade: skip rules and swallowed failures.

use buswire::{
    Address, BusBootstrap, BusHost, ConsumerScope, EventBusOptions, InMemoryHost, PublishOutcome,
    SkipReason, TransportError,
};

use crate::support::{inbox, OrderCreated, OrderCreatedConsumer, ShipOrder, ShipOrderConsumer};

struct PanickingHost;

impl BusHost for PanickingHost {
    fn in_memory(&mut self) -> Result<buswire::transport::InMemoryFactory, buswire::WiringError> {
        panic!("a disabled bus must not build a transport");
    }
}

fn order() -> OrderCreated {
    OrderCreated {
        order_id: "o-1".into(),
        total: 5,
    }
}

#[test]
fn disabled_bus_is_a_guaranteed_no_op() {
    let options = EventBusOptions::new().disable_bus(true);
    let scope = ConsumerScope::new("orders").add(OrderCreatedConsumer { inbox: inbox() });

    let bus = BusBootstrap::new(options, scope).start(&mut PanickingHost).unwrap();

    assert!(matches!(
        bus.publish(&order()),
        PublishOutcome::Skipped(SkipReason::Disabled)
    ));
    assert!(matches!(
        bus.send(&order(), "billing", false),
        PublishOutcome::Skipped(SkipReason::Disabled)
    ));
}

#[test]
fn send_to_queue_and_topic() {
    let shipped = inbox();
    let scope = ConsumerScope::new("shipping").add(ShipOrderConsumer {
        inbox: shipped.clone(),
    });
    let mut host = InMemoryHost::new();
    let bus = BusBootstrap::new(EventBusOptions::new(), scope)
        .start(&mut host)
        .unwrap();

    let ship = ShipOrder {
        order_id: "o-7".into(),
    };
    assert!(matches!(
        bus.send(&ship, "ship-order-consumer", false),
        PublishOutcome::Sent(Address::Queue(ref name)) if name == "ship-order-consumer"
    ));
    assert!(matches!(
        bus.send(&ship, "ShipOrder", true),
        PublishOutcome::Sent(Address::Topic(_))
    ));
    assert!(matches!(
        bus.send(&ship, "", false),
        PublishOutcome::Skipped(SkipReason::EmptyDestination)
    ));
    bus.stop();

    let shipped = shipped.lock().unwrap();
    assert_eq!(shipped.len(), 2);
    assert_eq!(shipped[0].topic, None);
    assert_eq!(shipped[1].topic.as_deref(), Some("ShipOrder"));

    let log = host.bus().message_log();
    assert_eq!(log.sent_to(&Address::queue("ship-order-consumer")).len(), 1);
}

#[test]
fn unknown_queue_fails_without_panicking() {
    let mut host = InMemoryHost::new();
    let bus = BusBootstrap::new(EventBusOptions::new(), ConsumerScope::new("empty"))
        .start(&mut host)
        .unwrap();

    let outcome = bus.send(&order(), "nowhere", false);

    assert!(matches!(
        outcome.error(),
        Some(TransportError::EndpointNotFound(address)) if address == "queue:nowhere"
    ));
    assert!(host.bus().message_log().is_empty());
}

#[test]
fn publish_after_stop_is_reported() {
    let mut host = InMemoryHost::new();
    let bus = BusBootstrap::new(EventBusOptions::new(), ConsumerScope::new("empty"))
        .start(&mut host)
        .unwrap();
    bus.stop();

    assert!(matches!(
        bus.publish(&order()).error(),
        Some(TransportError::Stopped)
    ));
}
