use chrono::Utc;
use std::collections::BTreeMap;
use vault_core::application::KeyEventBus;
use vault_core::domain::{KeyAlgorithm, KeyEventKind, KeyMetadata, KeyStatus};
use vault_core::foundation::KeyId;

fn metadata(id: &str) -> KeyMetadata {
    KeyMetadata {
        key_id: KeyId::from(id),
        algorithm: KeyAlgorithm::EcdsaP256,
        status: KeyStatus::Active,
        created_at: Utc::now(),
        rotated_at: None,
        labels: BTreeMap::new(),
    }
}

#[tokio::test]
async fn events_are_delivered_in_publication_order() {
    let bus = KeyEventBus::new();
    let mut subscription = bus.subscribe();

    bus.publish(KeyEventKind::Created, metadata("k-1"));
    bus.publish(KeyEventKind::Rotated, metadata("k-2"));
    bus.publish(KeyEventKind::Deactivated, metadata("k-3"));

    let first = subscription.recv().await.expect("event");
    assert_eq!(first.kind, KeyEventKind::Created);
    assert_eq!(first.metadata.key_id.as_str(), "k-1");

    let second = subscription.recv().await.expect("event");
    assert_eq!(second.kind, KeyEventKind::Rotated);

    let third = subscription.recv().await.expect("event");
    assert_eq!(third.kind, KeyEventKind::Deactivated);
}

#[tokio::test]
async fn slow_subscriber_loses_overflow_without_blocking_publishers() {
    let bus = KeyEventBus::new();
    let mut stalled = bus.subscribe();

    // Channel capacity is 32; everything past that is dropped, and the
    // publisher never stalls.
    for i in 0..40 {
        bus.publish(KeyEventKind::Created, metadata(&format!("k-{i}")));
    }

    for i in 0..32 {
        let event = stalled.recv().await.expect("buffered event");
        assert_eq!(event.metadata.key_id.as_str(), format!("k-{i}"));
    }

    // The dropped tail is not re-delivered; a fresh publish comes through.
    bus.publish(KeyEventKind::Rotated, metadata("fresh"));
    let event = stalled.recv().await.expect("fresh event");
    assert_eq!(event.metadata.key_id.as_str(), "fresh");
}

#[tokio::test]
async fn every_subscriber_receives_each_event() {
    let bus = KeyEventBus::new();
    let mut first = bus.subscribe();
    let mut second = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 2);

    bus.publish(KeyEventKind::Created, metadata("k-1"));
    assert_eq!(first.recv().await.expect("event").metadata.key_id.as_str(), "k-1");
    assert_eq!(second.recv().await.expect("event").metadata.key_id.as_str(), "k-1");
}

#[tokio::test]
async fn dropping_a_subscription_deregisters_it() {
    let bus = KeyEventBus::new();
    let first = bus.subscribe();
    let mut second = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 2);

    drop(first);
    assert_eq!(bus.subscriber_count(), 1);

    bus.publish(KeyEventKind::Deactivated, metadata("k-1"));
    assert_eq!(second.recv().await.expect("event").kind, KeyEventKind::Deactivated);
}

#[test]
fn publishing_without_subscribers_is_a_no_op() {
    let bus = KeyEventBus::new();
    bus.publish(KeyEventKind::Created, metadata("k-1"));
    assert_eq!(bus.subscriber_count(), 0);
}
