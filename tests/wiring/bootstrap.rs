//! Composition root against the recording host.

use buswire::{
    BusBootstrap, BusError, BusType, ConsumerScope, ConsumerType, EventBusOptions, InMemoryHost,
    MessageType, WiringError,
};

use crate::support::{
    inbox, EndpointKind, OrderCreated, OrderCreatedConsumer, PaymentCapturedConsumer,
    RecordingHost, ShipOrder, ShipOrderConsumer,
};

fn scope() -> ConsumerScope {
    let (payments, _) = PaymentCapturedConsumer::new();
    ConsumerScope::new("orders")
        .add(OrderCreatedConsumer { inbox: inbox() })
        .add(payments)
}

#[test]
fn managed_topic_gets_topology_subscriptions_and_convention_endpoints() {
    let options = EventBusOptions::new()
        .configure(BusType::ManagedTopicBus, Some("Endpoint=sb://orders/"))
        .unwrap()
        .map_topic(
            "orders.created",
            MessageType::of::<OrderCreated>(),
            Some(ConsumerType::of::<OrderCreatedConsumer>()),
            Some("orders-sub"),
        )
        .unwrap();
    let mut host = RecordingHost::new();

    let bus = BusBootstrap::new(options, scope()).start(&mut host).unwrap();

    let wired = host.wired();
    assert_eq!(
        host.log.lock().unwrap().connection_string.as_deref(),
        Some("Endpoint=sb://orders/")
    );
    assert_eq!(
        wired.entity_names,
        vec![("OrderCreated", "orders.created".to_string())]
    );

    let subscription = wired.endpoint("orders-sub").unwrap();
    assert_eq!(subscription.kind, EndpointKind::Subscription);
    assert_eq!(subscription.consumers, vec!["OrderCreatedConsumer"]);

    // the subscribed consumer gets no second endpoint
    assert!(wired.endpoint("order-created-consumer").is_none());
    let convention = wired.endpoint("payment-captured-consumer").unwrap();
    assert_eq!(convention.kind, EndpointKind::Queue);
    assert_eq!(convention.consumers, vec!["PaymentCapturedConsumer"]);
    assert_eq!(convention.retry, Some(2));

    assert!(bus
        .publish(&OrderCreated {
            order_id: "o-1".into(),
            total: 10
        })
        .is_delivered());
    assert_eq!(host.published(), vec!["OrderCreated"]);
}

#[test]
fn extra_scopes_are_wired_too() {
    let options = EventBusOptions::new()
        .configure(BusType::BrokerQueueBus, Some("amqp://localhost"))
        .unwrap()
        .add_consumer_scopes([
            ConsumerScope::new("shipping").add(ShipOrderConsumer { inbox: inbox() })
        ]);
    let mut host = RecordingHost::new();

    BusBootstrap::new(options, scope()).start(&mut host).unwrap();

    let names: Vec<String> = host.wired().endpoints.iter().map(|e| e.name.clone()).collect();
    assert_eq!(
        names,
        vec![
            "order-created-consumer",
            "payment-captured-consumer",
            "ship-order-consumer"
        ]
    );
}

#[test]
fn managed_queue_host_receives_the_credentials() {
    let options = EventBusOptions::new()
        .configure_with_credentials(BusType::ManagedQueueBus, "ap-south-1", "AKIA", "secret")
        .unwrap();
    let mut host = RecordingHost::new();

    BusBootstrap::new(options, scope()).start(&mut host).unwrap();

    assert_eq!(host.log.lock().unwrap().region.as_deref(), Some("ap-south-1"));
}

#[test]
fn transport_the_host_cannot_build_fails_startup() {
    let options = EventBusOptions::new()
        .configure(BusType::BrokerQueueBus, Some("amqp://localhost"))
        .unwrap();
    let mut host = InMemoryHost::new();

    let err = BusBootstrap::new(options, scope()).start(&mut host).unwrap_err();

    assert!(matches!(
        err,
        BusError::Wiring(WiringError::TransportUnavailable(BusType::BrokerQueueBus))
    ));
}

#[test]
fn subscription_to_unregistered_consumer_fails_startup() {
    let options = EventBusOptions::new()
        .configure(BusType::ManagedTopicBus, Some("Endpoint=sb://orders/"))
        .unwrap()
        .add_subscription("shipping", ConsumerType::of::<ShipOrderConsumer>(), "shipping-sub")
        .unwrap();
    let mut host = RecordingHost::new();

    let err = BusBootstrap::new(options, scope()).start(&mut host).unwrap_err();

    assert!(matches!(err, BusError::Wiring(WiringError::ConsumerNotFound(_))));
    assert!(host.log.lock().unwrap().wired.is_none());
}

mod billing {
    use buswire::{ConsumeContext, ConsumeError, Consumer};

    use crate::support::{Inbox, OrderCreated, Received};

    pub struct OrderConsumer {
        pub inbox: Inbox,
    }

    impl Consumer for OrderConsumer {
        type Message = OrderCreated;

        fn consume(&self, ctx: &ConsumeContext<OrderCreated>) -> Result<(), ConsumeError> {
            self.inbox.lock().unwrap().push(Received {
                order_id: ctx.message().order_id.clone(),
                topic: ctx.topic().map(str::to_string),
                endpoint: ctx.endpoint().to_string(),
                attempt: ctx.attempt(),
            });
            Ok(())
        }
    }
}

mod shipping {
    use buswire::{ConsumeContext, ConsumeError, Consumer};

    use crate::support::{Inbox, Received, ShipOrder};

    pub struct OrderConsumer {
        pub inbox: Inbox,
    }

    impl Consumer for OrderConsumer {
        type Message = ShipOrder;

        fn consume(&self, ctx: &ConsumeContext<ShipOrder>) -> Result<(), ConsumeError> {
            self.inbox.lock().unwrap().push(Received {
                order_id: ctx.message().order_id.clone(),
                topic: ctx.topic().map(str::to_string),
                endpoint: ctx.endpoint().to_string(),
                attempt: ctx.attempt(),
            });
            Ok(())
        }
    }
}

#[test]
fn consumers_with_the_same_name_share_a_convention_endpoint() {
    let billed = inbox();
    let shipped = inbox();
    let scope = ConsumerScope::new("orders")
        .add(billing::OrderConsumer {
            inbox: billed.clone(),
        })
        .add(shipping::OrderConsumer {
            inbox: shipped.clone(),
        });
    let mut host = InMemoryHost::new();

    let bus = BusBootstrap::new(EventBusOptions::new(), scope)
        .start(&mut host)
        .unwrap();

    assert_eq!(host.bus().endpoint_names(), vec!["order-consumer"]);
    assert!(bus
        .publish(&OrderCreated {
            order_id: "o-1".into(),
            total: 3
        })
        .is_delivered());
    assert!(bus
        .publish(&ShipOrder {
            order_id: "o-1".into()
        })
        .is_delivered());
    bus.stop();

    assert_eq!(billed.lock().unwrap().len(), 1);
    assert_eq!(shipped.lock().unwrap()[0].endpoint, "order-consumer");
}

#[test]
fn shared_convention_endpoint_lists_every_consumer() {
    let options = EventBusOptions::new()
        .configure(BusType::BrokerQueueBus, Some("amqp://localhost"))
        .unwrap();
    let scope = ConsumerScope::new("orders")
        .add(billing::OrderConsumer { inbox: inbox() })
        .add(shipping::OrderConsumer { inbox: inbox() });
    let mut host = RecordingHost::new();

    BusBootstrap::new(options, scope).start(&mut host).unwrap();

    let wired = host.wired();
    assert_eq!(wired.endpoints.len(), 1);
    assert_eq!(
        wired.endpoint("order-consumer").unwrap().consumers,
        vec!["OrderConsumer", "OrderConsumer"]
    );
}
