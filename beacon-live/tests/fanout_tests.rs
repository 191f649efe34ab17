use beacon_core::{LocationUpdate, PositionReport};
use beacon_live::FanoutRegistry;
use chrono::Utc;

fn update(user_id: &str) -> LocationUpdate {
    LocationUpdate {
        user_id: user_id.to_string(),
        latitude: 40.0,
        longitude: -73.0,
        battery_level: Some(80),
        observed_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_join_is_idempotent() {
    let registry = FanoutRegistry::default();
    let _rx = registry.register("s1", "alice");

    assert!(registry.join("s1", "g1"));
    assert!(registry.join("s1", "g1"));
    assert_eq!(registry.subscribers("g1"), vec!["s1".to_string()]);
}

#[tokio::test]
async fn test_join_unknown_session_is_rejected() {
    let registry = FanoutRegistry::default();
    assert!(!registry.join("ghost", "g1"));
    assert!(registry.subscribers("g1").is_empty());
}

#[tokio::test]
async fn test_publish_reaches_joined_sessions_only() {
    let registry = FanoutRegistry::default();
    let mut rx1 = registry.register("s1", "alice");
    let mut rx2 = registry.register("s2", "bob");
    let mut rx3 = registry.register("s3", "carol");

    registry.join("s1", "g1");
    registry.join("s2", "g1");
    registry.join("s3", "g2");

    registry.publish("g1", &update("alice"));

    assert_eq!(rx1.recv().await.unwrap().user_id, "alice");
    assert_eq!(rx2.recv().await.unwrap().user_id, "alice");
    assert!(rx3.try_recv().is_err());
    // Exactly one delivery per subscriber.
    assert!(rx1.try_recv().is_err());
    assert!(rx2.try_recv().is_err());
}

#[tokio::test]
async fn test_publish_to_group_without_subscribers() {
    let registry = FanoutRegistry::default();
    // Must be a no-op, not an error.
    registry.publish("empty-group", &update("alice"));
}

#[tokio::test]
async fn test_leave_stops_delivery_for_that_group() {
    let registry = FanoutRegistry::default();
    let mut rx = registry.register("s1", "alice");

    registry.join("s1", "g1");
    registry.join("s1", "g2");
    registry.leave("s1", "g1");

    registry.publish("g1", &update("bob"));
    assert!(rx.try_recv().is_err());

    registry.publish("g2", &update("carol"));
    assert_eq!(rx.recv().await.unwrap().user_id, "carol");
}

#[tokio::test]
async fn test_disconnect_removes_session_from_all_groups() {
    let registry = FanoutRegistry::default();
    let mut rx = registry.register("s1", "alice");

    registry.join("s1", "g1");
    registry.join("s1", "g2");
    registry.disconnect("s1");

    registry.publish("g1", &update("bob"));
    registry.publish("g2", &update("bob"));

    assert!(registry.subscribers("g1").is_empty());
    assert!(registry.subscribers("g2").is_empty());
    assert_eq!(registry.session_count(), 0);
    // Sender side was dropped, so the channel terminates instead of
    // delivering anything further.
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let registry = FanoutRegistry::default();
    let _rx = registry.register("s1", "alice");
    registry.join("s1", "g1");

    registry.disconnect("s1");
    registry.disconnect("s1");
    assert_eq!(registry.session_count(), 0);
}

#[tokio::test]
async fn test_stalled_subscriber_is_dropped_not_blocked() {
    let registry = FanoutRegistry::new(2);
    let mut rx = registry.register("slow", "alice");
    registry.join("slow", "g1");

    // Publish past the channel capacity; every call must return
    // immediately, with the overflow dropped and counted.
    for _ in 0..5 {
        registry.publish("g1", &update("carol"));
    }

    assert_eq!(registry.stalled_deliveries(), 3);
    assert!(rx.recv().await.is_some());
    assert!(rx.recv().await.is_some());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_stall_does_not_affect_other_subscribers() {
    let registry = FanoutRegistry::new(2);
    let mut slow_rx = registry.register("slow", "alice");
    let mut live_rx = registry.register("live", "bob");
    registry.join("slow", "g-slow");
    registry.join("slow", "g1");
    registry.join("live", "g1");

    // Saturate only the slow session's channel via its private group.
    registry.publish("g-slow", &update("carol"));
    registry.publish("g-slow", &update("carol"));
    assert_eq!(registry.stalled_deliveries(), 0);

    registry.publish("g1", &update("dave"));

    // The slow session's delivery was dropped; the healthy one received it.
    assert_eq!(registry.stalled_deliveries(), 1);
    assert_eq!(live_rx.recv().await.unwrap().user_id, "dave");
    assert_eq!(slow_rx.recv().await.unwrap().user_id, "carol");
    assert_eq!(slow_rx.recv().await.unwrap().user_id, "carol");
    assert!(slow_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_reregister_same_session_id_replaces_subscriptions() {
    let registry = FanoutRegistry::default();
    let mut old_rx = registry.register("s1", "alice");
    registry.join("s1", "g1");

    let mut new_rx = registry.register("s1", "alice");
    registry.publish("g1", &update("bob"));

    // The old receiver is dead and the new one has not joined anything yet.
    assert!(old_rx.recv().await.is_none());
    assert!(new_rx.try_recv().is_err());
    assert!(registry.subscribers("g1").is_empty());
}

#[tokio::test]
async fn test_publish_report_fields() {
    let registry = FanoutRegistry::default();
    let mut rx = registry.register("s1", "viewer");
    registry.join("s1", "g1");

    let snapshot = PositionReport {
        latitude: 40.0,
        longitude: -73.0,
        accuracy: Some(5.0),
        battery_level: Some(80),
        observed_at: None,
    }
    .into_snapshot("alice");
    registry.publish("g1", &LocationUpdate::from(&snapshot));

    let received = rx.recv().await.unwrap();
    assert_eq!(received.user_id, "alice");
    assert_eq!(received.latitude, 40.0);
    assert_eq!(received.longitude, -73.0);
    assert_eq!(received.battery_level, Some(80));
    assert_eq!(received.observed_at, snapshot.observed_at);
}
