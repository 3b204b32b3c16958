//! Configuration model: validation, first-wins mappings, retry and settings.

use std::time::Duration;

use buswire::{
    BusSettings, BusType, ConfigError, ConsumerType, EventBusOptions, MessageType, RetryPolicy,
};

use crate::support::{OrderCreated, OrderCreatedConsumer, PaymentCaptured};

#[test]
fn managed_topic_requires_a_connection_string() {
    let err = EventBusOptions::new()
        .configure(BusType::ManagedTopicBus, Some(""))
        .unwrap_err();
    assert_eq!(err, ConfigError::MissingConnectionString(BusType::ManagedTopicBus));

    let options = EventBusOptions::new()
        .configure(BusType::ManagedTopicBus, Some("Endpoint=sb://orders.example.net/"))
        .unwrap();
    assert_eq!(
        options.connection().connection_string(),
        Some("Endpoint=sb://orders.example.net/")
    );
}

#[test]
fn managed_queue_needs_the_credentials_overload() {
    let err = EventBusOptions::new()
        .configure(BusType::ManagedQueueBus, Some("whatever"))
        .unwrap_err();
    assert_eq!(err, ConfigError::CredentialOverloadRequired(BusType::ManagedQueueBus));

    let err = EventBusOptions::new()
        .configure_with_credentials(BusType::ManagedQueueBus, "", "", "")
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingCredential { field: "region", .. }));

    let err = EventBusOptions::new()
        .configure_with_credentials(BusType::ManagedQueueBus, "us-east-1", "AKIA", "")
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingCredential { field: "secret key", .. }
    ));

    let err = EventBusOptions::new()
        .configure_with_credentials(BusType::InMemory, "us-east-1", "AKIA", "secret")
        .unwrap_err();
    assert_eq!(err, ConfigError::CredentialsNotSupported(BusType::InMemory));
}

#[test]
fn secret_key_never_shows_in_debug_output() {
    let options = EventBusOptions::new()
        .configure_with_credentials(BusType::ManagedQueueBus, "us-east-1", "AKIA", "top-secret")
        .unwrap();
    let rendered = format!("{:?}", options);
    assert!(rendered.contains("us-east-1"));
    assert!(!rendered.contains("top-secret"));
}

#[test]
fn first_topic_mapping_wins() {
    let options = EventBusOptions::new()
        .add_publish_mapping("orders.created", MessageType::of::<OrderCreated>())
        .unwrap()
        .map_topic("orders.v2", MessageType::of::<OrderCreated>(), None, None)
        .unwrap();

    assert_eq!(options.topic_mappings().len(), 1);
    assert_eq!(
        options.topic_mappings().get(&MessageType::of::<OrderCreated>()),
        Some("orders.created")
    );
}

#[test]
fn map_topic_shortcut_also_subscribes() {
    let options = EventBusOptions::new()
        .map_topic(
            "orders.created",
            MessageType::of::<OrderCreated>(),
            Some(ConsumerType::of::<OrderCreatedConsumer>()),
            Some("orders-sub"),
        )
        .unwrap()
        .add_subscription(
            "payments.captured",
            ConsumerType::of::<OrderCreatedConsumer>(),
            "payments-sub",
        )
        .unwrap();

    let subscriptions = options.subscriptions();
    assert_eq!(subscriptions.len(), 2);
    assert_eq!(subscriptions[0].topic_path(), "orders.created");
    assert_eq!(subscriptions[0].subscription_name(), "orders-sub");
    assert_eq!(subscriptions[1].topic_path(), "payments.captured");
    assert!(options
        .topic_mappings()
        .get(&MessageType::of::<PaymentCaptured>())
        .is_none());
}

#[test]
fn retry_modes_replace_each_other() {
    let options = EventBusOptions::new();
    assert_eq!(options.retry_policy(), &RetryPolicy::Immediate { count: 2 });

    let options = options
        .set_retry_intervals([Duration::from_secs(1), Duration::from_secs(5)])
        .retry_immediately(4)
        .unwrap();
    assert_eq!(options.retry_policy(), &RetryPolicy::Immediate { count: 4 });
    assert_eq!(options.retry_policy().max_attempts(), 5);
}

#[test]
fn settings_file_with_unknown_field_is_rejected() {
    let err = BusSettings::from_json_str(r#"{ "bus_typ": "in_memory" }"#).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSettings(_)));
}

#[test]
fn frozen_configuration_is_shared() {
    let configuration = EventBusOptions::new()
        .use_dead_letter_queue(true)
        .freeze();
    let clone = configuration.clone();
    assert!(clone.dead_letter_enabled());
    assert_eq!(clone.bus_type(), BusType::InMemory);
}
