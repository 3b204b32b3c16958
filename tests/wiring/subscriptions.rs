//! Subscription registrar per transport, with the consumer registrar's policy.

use std::time::Duration;

use buswire::topology::{BusConfigurator, ExchangeType};
use buswire::{
    BusType, ConsumerScope, ConsumerType, EventBusOptions, RegistrationContext,
    SubscriptionRegistrar, WiringError,
};

use crate::support::{
    inbox, EndpointKind, OrderCreatedConsumer, PaymentCapturedConsumer, RecordingBus,
};

fn context() -> RegistrationContext {
    let (payments, _) = PaymentCapturedConsumer::new();
    RegistrationContext::new(
        ConsumerScope::new("orders").add(OrderCreatedConsumer { inbox: inbox() }),
        [ConsumerScope::new("payments").add(payments)],
    )
}

fn options() -> EventBusOptions {
    EventBusOptions::new()
        .add_subscription(
            "orders.created",
            ConsumerType::of::<OrderCreatedConsumer>(),
            "orders-sub",
        )
        .unwrap()
        .add_subscription(
            "payments.captured",
            ConsumerType::of::<PaymentCapturedConsumer>(),
            "payments-sub",
        )
        .unwrap()
        .add_subscription("orders.created", ConsumerType::of::<OrderCreatedConsumer>(), "  ")
        .unwrap()
}

#[test]
fn managed_topic_subscribes_under_the_topic() {
    let configuration = options()
        .configure(BusType::ManagedTopicBus, Some("Endpoint=sb://bus/"))
        .unwrap()
        .freeze();
    let mut bus = RecordingBus::default();

    let attached = SubscriptionRegistrar::new(configuration.clone())
        .register_subscriptions(
            &context(),
            configuration.subscriptions(),
            BusConfigurator::ManagedTopic(&mut bus),
        )
        .unwrap();

    assert_eq!(attached.len(), 2);
    let orders = bus.endpoint("orders-sub").unwrap();
    assert_eq!(orders.kind, EndpointKind::Subscription);
    assert_eq!(orders.topic.as_deref(), Some("orders.created"));
    assert_eq!(orders.consumers, vec!["OrderCreatedConsumer"]);
    assert_eq!(orders.retry, Some(2));
    assert_eq!(
        bus.endpoint("payments-sub").unwrap().topic.as_deref(),
        Some("payments.captured")
    );
}

#[test]
fn broker_queue_uses_direct_exchange() {
    let configuration = options()
        .configure(BusType::BrokerQueueBus, Some("amqp://localhost"))
        .unwrap()
        .set_retry_intervals([Duration::from_millis(50)])
        .freeze();
    let mut bus = RecordingBus::default();

    SubscriptionRegistrar::new(configuration.clone())
        .register_subscriptions(
            &context(),
            configuration.subscriptions(),
            BusConfigurator::BrokerQueue(&mut bus),
        )
        .unwrap();

    assert_eq!(bus.endpoints.len(), 2);
    for endpoint in &bus.endpoints {
        assert_eq!(endpoint.kind, EndpointKind::Queue);
        assert_eq!(endpoint.exchange_type, Some(ExchangeType::Direct));
        assert_eq!(endpoint.redelivery, vec![Duration::from_millis(50)]);
        assert_eq!(endpoint.retry, None);
    }
}

#[test]
fn managed_queue_with_dead_letter_silences_faults() {
    let configuration = options()
        .configure_with_credentials(BusType::ManagedQueueBus, "eu-west-1", "AKIA", "secret")
        .unwrap()
        .use_dead_letter_queue(true)
        .freeze();
    let mut bus = RecordingBus::default();

    SubscriptionRegistrar::new(configuration.clone())
        .register_subscriptions(
            &context(),
            configuration.subscriptions(),
            BusConfigurator::ManagedQueue(&mut bus),
        )
        .unwrap();

    let payments = bus.endpoint("payments-sub").unwrap();
    assert_eq!(payments.consumers, vec!["PaymentCapturedConsumer"]);
    assert!(payments.dead_letter_transport);
    assert!(payments.error_transport);
    assert!(!payments.publish_faults);
}

#[test]
fn missing_consumer_stops_wiring() {
    let configuration = options()
        .configure(BusType::ManagedTopicBus, Some("Endpoint=sb://bus/"))
        .unwrap()
        .freeze();
    let only_orders = RegistrationContext::new(
        ConsumerScope::new("orders").add(OrderCreatedConsumer { inbox: inbox() }),
        [],
    );
    let mut bus = RecordingBus::default();

    let err = SubscriptionRegistrar::new(configuration.clone())
        .register_subscriptions(
            &only_orders,
            configuration.subscriptions(),
            BusConfigurator::ManagedTopic(&mut bus),
        )
        .unwrap_err();

    assert!(matches!(
        err,
        WiringError::ConsumerNotFound(ref name) if name.ends_with("PaymentCapturedConsumer")
    ));
}
