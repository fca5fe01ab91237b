#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use chrono::Duration;
use pretty_assertions::assert_eq;

use offsync_core::{
    Attachment, CacheStore, CoreError, FilterSpec, HealthEvent, KeyValueStore, ManualClock,
    MemoryKvStore, NewRecord, RecordChanges, RecordId, RemoteError, StaticConnectivity,
    SyncConfig, SyncCoordinator,
};

use common::{BrokenKv, FakeBlobs, FakeRemote, event, fields, t0};

struct Harness {
    net: Arc<StaticConnectivity>,
    remote: Arc<FakeRemote>,
    blobs: Arc<FakeBlobs>,
    kv: Arc<MemoryKvStore>,
    clock: Arc<ManualClock>,
    coordinator: SyncCoordinator<HealthEvent>,
}

impl Harness {
    fn new(remote: FakeRemote, blobs: FakeBlobs) -> Self {
        let net = Arc::new(StaticConnectivity::online());
        let remote = Arc::new(remote);
        let blobs = Arc::new(blobs);
        let kv = Arc::new(MemoryKvStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let cache = Arc::new(CacheStore::with_clock(
            kv.clone(),
            &SyncConfig::default(),
            clock.clone(),
        ));
        let coordinator = SyncCoordinator::new(net.clone(), remote.clone(), blobs.clone(), cache);
        Self {
            net,
            remote,
            blobs,
            kv,
            clock,
            coordinator,
        }
    }

    fn with_records(records: Vec<HealthEvent>) -> Self {
        Self::new(FakeRemote::with_records(records), FakeBlobs::default())
    }
}

fn attached(url: &str) -> HealthEvent {
    let mut record = event("r1", "Sprained ankle");
    record.attachments = vec![url.into(), "https://blobs.test/keep.png".into()];
    record
}

// ── Fetch ────────────────────────────────────────────────────────────

#[tokio::test]
async fn online_fetch_writes_through_to_cache() {
    let h = Harness::with_records(vec![event("a", "Headache"), event("b", "Rash")]);
    let filter = FilterSpec::all().with_category("symptom");

    let outcome = h.coordinator.fetch_list(&filter).await.unwrap();
    assert!(!outcome.is_offline);
    assert_eq!(outcome.records.len(), 2);

    let key = h.coordinator.cache().key_for(&filter);
    assert!(key.starts_with("records_cache:"));
    let raw = h.kv.read(&key).await.unwrap().unwrap();
    let envelope: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(envelope["data"].as_array().unwrap().len(), 2);
    assert_eq!(envelope["data"][0]["id"], "a");
    let stored_at: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(envelope["storedAt"].clone()).unwrap();
    assert_eq!(stored_at, t0());
}

#[tokio::test]
async fn offline_fetch_serves_fresh_cache_without_remote_call() {
    let h = Harness::with_records(vec![event("a", "Headache")]);
    let filter = FilterSpec::all();
    h.coordinator.fetch_list(&filter).await.unwrap();

    h.net.set_connected(false);
    h.clock.advance(Duration::minutes(4) + Duration::seconds(59));

    let outcome = h.coordinator.fetch_list(&filter).await.unwrap();
    assert!(outcome.is_offline);
    assert_eq!(outcome.records, vec![event("a", "Headache")]);
    assert_eq!(h.remote.list_calls(), 1);
}

#[tokio::test]
async fn offline_fetch_rejects_stale_cache() {
    let h = Harness::with_records(vec![event("a", "Headache")]);
    let filter = FilterSpec::all();
    h.coordinator.fetch_list(&filter).await.unwrap();

    h.net.set_connected(false);
    h.clock.advance(Duration::minutes(5) + Duration::seconds(1));

    let err = h.coordinator.fetch_list(&filter).await.unwrap_err();
    assert!(matches!(err, CoreError::NoConnectivity));
    assert_eq!(h.remote.list_calls(), 1);
}

#[tokio::test]
async fn snapshot_exactly_ttl_old_is_stale() {
    let h = Harness::with_records(vec![event("a", "Headache")]);
    let filter = FilterSpec::all();
    h.coordinator.fetch_list(&filter).await.unwrap();

    h.net.set_connected(false);
    h.clock.advance(Duration::minutes(5));

    assert!(matches!(
        h.coordinator.fetch_list(&filter).await,
        Err(CoreError::NoConnectivity)
    ));
}

#[tokio::test]
async fn offline_fetch_without_cache_fails() {
    let h = Harness::with_records(vec![event("a", "Headache")]);
    h.net.set_connected(false);

    let err = h.coordinator.fetch_list(&FilterSpec::all()).await.unwrap_err();
    assert!(matches!(err, CoreError::NoConnectivity));
    assert_eq!(h.remote.list_calls(), 0);
}

#[tokio::test]
async fn cache_is_scoped_to_the_filter() {
    let h = Harness::with_records(vec![event("a", "Headache")]);
    h.coordinator.fetch_list(&FilterSpec::all()).await.unwrap();
    h.net.set_connected(false);

    let narrower = FilterSpec::all().with_resolved(true);
    assert!(matches!(
        h.coordinator.fetch_list(&narrower).await,
        Err(CoreError::NoConnectivity)
    ));
}

#[tokio::test]
async fn online_remote_failure_is_not_a_connectivity_error() {
    let h = Harness::with_records(vec![event("a", "Headache")]);
    let filter = FilterSpec::all();
    h.coordinator.fetch_list(&filter).await.unwrap();

    h.remote.fail_list_with(RemoteError::Failed {
        message: "upstream timeout".into(),
        status: Some(504),
    });
    let err = h.coordinator.fetch_list(&filter).await.unwrap_err();
    match err {
        CoreError::Remote { message, status } => {
            assert_eq!(message, "upstream timeout");
            assert_eq!(status, Some(504));
        }
        other => panic!("expected Remote, got {other:?}"),
    }

    // The earlier snapshot is still there for a later offline read.
    h.net.set_connected(false);
    let outcome = h.coordinator.fetch_list(&filter).await.unwrap();
    assert!(outcome.is_offline);
}

#[tokio::test]
async fn broken_storage_never_fails_an_online_fetch() {
    let net = Arc::new(StaticConnectivity::online());
    let remote = Arc::new(FakeRemote::with_records(vec![event("a", "Headache")]));
    let cache = Arc::new(CacheStore::new(Arc::new(BrokenKv), &SyncConfig::default()));
    let coordinator: SyncCoordinator<HealthEvent> =
        SyncCoordinator::new(net.clone(), remote, Arc::new(FakeBlobs::default()), cache);

    let outcome = coordinator.fetch_list(&FilterSpec::all()).await.unwrap();
    assert_eq!(outcome.records.len(), 1);

    net.set_connected(false);
    assert!(matches!(
        coordinator.fetch_list(&FilterSpec::all()).await,
        Err(CoreError::NoConnectivity)
    ));
}

// ── Cache invalidation ───────────────────────────────────────────────

#[tokio::test]
async fn clear_is_idempotent() {
    let h = Harness::with_records(vec![event("a", "Headache")]);
    let filter = FilterSpec::all();
    h.coordinator.fetch_list(&filter).await.unwrap();

    h.coordinator.cache().clear(&filter).await;
    h.coordinator.cache().clear(&filter).await;

    h.net.set_connected(false);
    assert!(matches!(
        h.coordinator.fetch_list(&filter).await,
        Err(CoreError::NoConnectivity)
    ));
}

#[tokio::test]
async fn clear_all_only_touches_cache_keys() {
    let h = Harness::with_records(vec![event("a", "Headache")]);
    h.kv.write("tutorial_completed", b"true").await.unwrap();
    h.coordinator.fetch_list(&FilterSpec::all()).await.unwrap();
    h.coordinator
        .fetch_list(&FilterSpec::all().with_resolved(false))
        .await
        .unwrap();
    assert_eq!(h.kv.len(), 3);

    h.coordinator.cache().clear_all().await;
    assert_eq!(h.kv.keys().await.unwrap(), vec!["tutorial_completed".to_owned()]);
}

// ── Create ───────────────────────────────────────────────────────────

#[tokio::test]
async fn create_links_every_uploaded_attachment() {
    let h = Harness::with_records(Vec::new());
    let input = NewRecord::new(fields("Migraine"))
        .attach(Attachment::new("a.png", vec![1, 2, 3]).with_content_type("image/png"))
        .attach(Attachment::new("b.pdf", vec![4]));

    let record = h.coordinator.create(input).await.unwrap();
    assert_eq!(record.title, "Migraine");
    assert_eq!(record.attachments.len(), 2);
    assert!(record.attachments[0].ends_with("-a.png"));
    assert!(record.attachments[1].ends_with("-b.pdf"));
}

#[tokio::test]
async fn create_with_failing_upload_writes_nothing() {
    let h = Harness::new(FakeRemote::default(), FakeBlobs::failing_on("b.png"));
    let input = NewRecord::new(fields("Migraine"))
        .attach(Attachment::new("a.png", vec![1]))
        .attach(Attachment::new("b.png", vec![2]));

    let err = h.coordinator.create(input).await.unwrap_err();
    match err {
        CoreError::Remote { message, .. } => {
            assert!(message.contains("upload of 'b.png' failed"), "{message}");
        }
        other => panic!("expected Remote, got {other:?}"),
    }
    assert_eq!(h.remote.write_calls(), 0);
    assert!(h.remote.records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn writes_fail_fast_while_offline() {
    let h = Harness::with_records(vec![event("a", "Headache")]);
    h.net.set_connected(false);

    let input = NewRecord::new(fields("Migraine")).attach(Attachment::new("a.png", vec![1]));
    assert!(matches!(
        h.coordinator.create(input).await,
        Err(CoreError::NoConnectivity)
    ));
    assert!(matches!(
        h.coordinator
            .update(&RecordId::from("a"), RecordChanges::new(fields("x")))
            .await,
        Err(CoreError::NoConnectivity)
    ));
    assert!(matches!(
        h.coordinator.delete(&RecordId::from("a")).await,
        Err(CoreError::NoConnectivity)
    ));
    assert!(h.blobs.uploaded().is_empty());
    assert_eq!(h.remote.write_calls(), 0);
}

// ── Update ───────────────────────────────────────────────────────────

#[tokio::test]
async fn update_swaps_attachments_then_deletes_removed_blobs() {
    let old = "https://blobs.test/old.png";
    let h = Harness::with_records(vec![attached(old)]);

    let changes = RecordChanges::new(fields("Sprained ankle, healing"))
        .detach(old)
        .attach(Attachment::new("xray.png", vec![9]));
    let record = h
        .coordinator
        .update(&RecordId::from("r1"), changes)
        .await
        .unwrap();

    assert_eq!(record.title, "Sprained ankle, healing");
    assert_eq!(record.attachments.len(), 2);
    assert_eq!(record.attachments[0], "https://blobs.test/keep.png");
    assert!(record.attachments[1].ends_with("-xray.png"));
    assert_eq!(h.blobs.deleted(), vec![old.to_owned()]);
}

#[tokio::test]
async fn failed_update_keeps_removed_blobs() {
    let old = "https://blobs.test/old.png";
    let h = Harness::with_records(vec![attached(old)]);
    h.remote.fail_writes_with(RemoteError::Failed {
        message: "validation failed".into(),
        status: Some(422),
    });

    let changes = RecordChanges::new(fields("Sprained ankle")).detach(old);
    let err = h
        .coordinator
        .update(&RecordId::from("r1"), changes)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Remote { status: Some(422), .. }));
    assert!(h.blobs.deleted().is_empty());
}

#[tokio::test]
async fn update_never_deletes_unlinked_blobs() {
    let h = Harness::with_records(vec![attached("https://blobs.test/old.png")]);
    let changes =
        RecordChanges::new(fields("Sprained ankle")).detach("https://blobs.test/someone-else.png");

    h.coordinator
        .update(&RecordId::from("r1"), changes)
        .await
        .unwrap();
    assert!(h.blobs.deleted().is_empty());
}

#[tokio::test]
async fn update_of_missing_record_is_not_found() {
    let h = Harness::with_records(Vec::new());
    let changes = RecordChanges::new(fields("ghost")).attach(Attachment::new("a.png", vec![1]));

    let err = h
        .coordinator
        .update(&RecordId::from("gone"), changes)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { ref id } if id.as_str() == "gone"));
    assert!(h.blobs.uploaded().is_empty());
}

// ── Delete ───────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_removes_record_and_its_blobs() {
    let h = Harness::with_records(vec![attached("https://blobs.test/old.png")]);

    h.coordinator.delete(&RecordId::from("r1")).await.unwrap();
    assert!(h.remote.records.lock().unwrap().is_empty());
    assert_eq!(
        h.blobs.deleted(),
        vec![
            "https://blobs.test/old.png".to_owned(),
            "https://blobs.test/keep.png".to_owned()
        ]
    );
}

#[tokio::test]
async fn delete_of_missing_record_is_not_found() {
    let h = Harness::with_records(Vec::new());
    let err = h.coordinator.delete(&RecordId::from("gone")).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
    assert_eq!(h.remote.write_calls(), 0);
}
