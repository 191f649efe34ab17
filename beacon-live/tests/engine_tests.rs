use async_trait::async_trait;
use beacon_core::{BeaconError, PositionReport, PositionSnapshot};
use beacon_live::LocationEngine;
use beacon_store::{FamilyStore, HistoryStore, InMemoryStore};
use std::sync::Arc;

fn report(lat: f64, lng: f64) -> PositionReport {
    PositionReport {
        latitude: lat,
        longitude: lng,
        accuracy: Some(10.0),
        battery_level: Some(80),
        observed_at: None,
    }
}

fn engine_with(store: Arc<InMemoryStore>) -> LocationEngine {
    LocationEngine::new(store.clone(), store)
}

/// History store that rejects every write, for the persist-then-cache path.
struct FailingHistoryStore;

#[async_trait]
impl HistoryStore for FailingHistoryStore {
    async fn insert(&self, _snapshot: &PositionSnapshot) -> beacon_core::Result<()> {
        Err(BeaconError::Persistence("store unavailable".to_string()))
    }
}

#[tokio::test]
async fn test_valid_ingest_updates_cache() {
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_with(store.clone());

    let snapshot = engine.ingest("alice", report(40.0, -73.0)).await.unwrap();

    assert_eq!(engine.cache().get("alice"), Some(snapshot));
    assert_eq!(store.history_len(), 1);
}

#[tokio::test]
async fn test_invalid_coordinates_leave_cache_unchanged() {
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_with(store.clone());

    let earlier = engine.ingest("alice", report(10.0, 10.0)).await.unwrap();

    let err = engine.ingest("alice", report(91.0, 0.0)).await.unwrap_err();
    assert!(matches!(err, BeaconError::Validation(_)));
    let err = engine.ingest("alice", report(0.0, 200.0)).await.unwrap_err();
    assert!(matches!(err, BeaconError::Validation(_)));

    // No partial side effects: cache and history still reflect the last
    // valid report only.
    assert_eq!(engine.cache().get("alice"), Some(earlier));
    assert_eq!(store.history_len(), 1);
}

#[tokio::test]
async fn test_persistence_failure_leaves_cache_untouched() {
    let store = Arc::new(InMemoryStore::new());
    let engine = LocationEngine::new(Arc::new(FailingHistoryStore), store);

    let err = engine.ingest("alice", report(40.0, -73.0)).await.unwrap_err();
    assert!(matches!(err, BeaconError::Persistence(_)));
    assert!(engine.cache().get("alice").is_none());
}

#[tokio::test]
async fn test_ingest_fans_out_to_family_sessions() {
    let store = Arc::new(InMemoryStore::new());
    store.add_user("v@example.com", "v");
    let family = store.create_family("family-g", "u").await.unwrap();
    store
        .invite_member(&family.id, "v@example.com", beacon_core::FamilyRole::Member)
        .await
        .unwrap();

    let engine = engine_with(store);
    let mut v_rx = engine.connect("s-v", "v");
    engine.join("s-v", &family.id).await.unwrap();

    let snapshot = engine.ingest("u", report(40.0, -73.0)).await.unwrap();

    let received = v_rx.recv().await.unwrap();
    assert_eq!(received.user_id, "u");
    assert_eq!(received.latitude, 40.0);
    assert_eq!(received.longitude, -73.0);
    assert_eq!(received.battery_level, Some(80));
    assert_eq!(received.observed_at, snapshot.observed_at);

    // Exactly once per subscriber.
    assert!(v_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_ingest_publishes_to_every_group_of_reporter() {
    let store = Arc::new(InMemoryStore::new());
    let f1 = store.create_family("one", "a").await.unwrap();
    let f2 = store.create_family("two", "b").await.unwrap();
    store.add_member(&f1.id, "u", beacon_core::FamilyRole::Member);
    store.add_member(&f2.id, "u", beacon_core::FamilyRole::Member);

    let engine = engine_with(store);
    let mut a_rx = engine.connect("s-a", "a");
    let mut b_rx = engine.connect("s-b", "b");
    engine.join("s-a", &f1.id).await.unwrap();
    engine.join("s-b", &f2.id).await.unwrap();

    engine.ingest("u", report(40.0, -73.0)).await.unwrap();

    assert_eq!(a_rx.recv().await.unwrap().user_id, "u");
    assert_eq!(b_rx.recv().await.unwrap().user_id, "u");
}

#[tokio::test]
async fn test_join_rejected_for_non_member() {
    let store = Arc::new(InMemoryStore::new());
    let family = store.create_family("family-g", "u").await.unwrap();

    let engine = engine_with(store);
    let _rx = engine.connect("s-x", "outsider");

    let err = engine.join("s-x", &family.id).await.unwrap_err();
    assert!(matches!(err, BeaconError::Membership(_)));
    assert!(engine.fanout().subscribers(&family.id).is_empty());
}

#[tokio::test]
async fn test_join_unknown_session_fails() {
    let store = Arc::new(InMemoryStore::new());
    let family = store.create_family("family-g", "u").await.unwrap();
    let engine = engine_with(store);

    let err = engine.join("never-connected", &family.id).await.unwrap_err();
    assert!(matches!(err, BeaconError::Session(_)));
}

#[tokio::test]
async fn test_disconnected_session_receives_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let f1 = store.create_family("one", "u").await.unwrap();
    let f2 = store.create_family("two", "u").await.unwrap();
    store.add_member(&f1.id, "v", beacon_core::FamilyRole::Member);
    store.add_member(&f2.id, "v", beacon_core::FamilyRole::Member);

    let engine = engine_with(store);
    let mut v_rx = engine.connect("s-v", "v");
    engine.join("s-v", &f1.id).await.unwrap();
    engine.join("s-v", &f2.id).await.unwrap();

    engine.disconnect("s-v");

    engine.ingest("u", report(40.0, -73.0)).await.unwrap();
    assert!(v_rx.recv().await.is_none());
}

#[tokio::test]
async fn test_current_locations_restricted_to_family_members() {
    let store = Arc::new(InMemoryStore::new());
    let family = store.create_family("g1", "a").await.unwrap();
    store.add_member(&family.id, "b", beacon_core::FamilyRole::Member);
    store.add_member(&family.id, "c", beacon_core::FamilyRole::Member);

    let engine = engine_with(store);
    engine.ingest("a", report(40.0, -73.0)).await.unwrap();
    engine.ingest("b", report(41.0, -72.0)).await.unwrap();
    // c never reports; stranger is outside the family.
    engine.ingest("stranger", report(50.0, 8.0)).await.unwrap();

    let visible = engine.current_locations_for("a").await.unwrap();
    assert_eq!(visible.len(), 2);
    assert!(visible.contains_key("a"));
    assert!(visible.contains_key("b"));
    assert!(!visible.contains_key("c"));
    assert!(!visible.contains_key("stranger"));
}

#[tokio::test]
async fn test_current_locations_for_user_in_no_groups() {
    let store = Arc::new(InMemoryStore::new());
    let engine = engine_with(store);
    engine.ingest("loner", report(40.0, -73.0)).await.unwrap();

    let visible = engine.current_locations_for("loner").await.unwrap();
    assert!(visible.is_empty());
}

#[tokio::test]
async fn test_slow_subscriber_does_not_fail_ingest() {
    let store = Arc::new(InMemoryStore::new());
    let family = store.create_family("g", "u").await.unwrap();
    store.add_member(&family.id, "v", beacon_core::FamilyRole::Member);

    let engine = LocationEngine::with_channel_capacity(store.clone(), store, 1);
    let mut v_rx = engine.connect("s-v", "v");
    engine.join("s-v", &family.id).await.unwrap();

    // The subscriber never drains; every ingest past the first overflows
    // its channel but still succeeds.
    for step in 0..4 {
        engine.ingest("u", report(10.0, f64::from(step))).await.unwrap();
    }

    assert_eq!(engine.fanout().stalled_deliveries(), 3);
    assert_eq!(v_rx.recv().await.unwrap().longitude, 0.0);
    assert!(v_rx.try_recv().is_err());
    assert_eq!(engine.cache().get("u").unwrap().longitude, 3.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_ingests_do_not_cross_contaminate() {
    let store = Arc::new(InMemoryStore::new());
    let engine = Arc::new(engine_with(store));

    let mut handles = Vec::new();
    for i in 0..16 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let user_id = format!("user-{i}");
            for step in 0..20 {
                engine.ingest(&user_id, report(f64::from(i), f64::from(step))).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for i in 0..16 {
        let snap = engine.cache().get(&format!("user-{i}")).unwrap();
        assert_eq!(snap.latitude, f64::from(i));
        assert_eq!(snap.longitude, 19.0);
    }
}
