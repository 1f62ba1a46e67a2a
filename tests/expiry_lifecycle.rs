//! Expiry Lifecycle Integration Tests
//!
//! End-to-end checks of the deadline lifecycle: set, sweep, rename
//! carry-over, and persistence round-trips.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use dropspot::{
    BroadcastHub, Category, ContentStore, EntryId, ExpirationTracker, ExpiryOption, Service,
};

async fn open_service(temp: &TempDir) -> Service {
    let store = ContentStore::open(temp.path().join("data")).await.unwrap();
    let hub = BroadcastHub::new();
    let tracker = Arc::new(
        ExpirationTracker::load(
            temp.path().join("expirations.json"),
            store.clone(),
            hub.clone(),
        )
        .await,
    );
    Service::from_parts(store, tracker, hub)
}

#[tokio::test]
async fn test_entries_without_expiry_are_never_swept() {
    let temp = TempDir::new().unwrap();
    let service = open_service(&temp).await;

    service
        .add(Category::Text, "forever.md", b"keep me", &ExpiryOption::Never)
        .await
        .unwrap();

    assert!(service.sweep().await.is_empty());
    assert!(service.sweep().await.is_empty());

    let rows = service.list(Category::Text).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].expires_at.is_none());
}

#[tokio::test]
async fn test_one_hour_entry_survives_immediate_sweep() {
    let temp = TempDir::new().unwrap();
    let service = open_service(&temp).await;

    let id = service
        .add(Category::Text, "soon.md", b"ticking", &ExpiryOption::OneHour)
        .await
        .unwrap();

    assert!(service.sweep().await.is_empty());
    assert!(service.tracker().deadline(&id).await.is_some());
}

#[tokio::test]
async fn test_entry_past_deadline_is_swept_with_its_file() {
    let temp = TempDir::new().unwrap();
    let service = open_service(&temp).await;

    let id = service
        .add(Category::Text, "stale.md", b"old", &ExpiryOption::OneHour)
        .await
        .unwrap();

    // Push the deadline into the past instead of waiting an hour.
    service
        .tracker()
        .set_deadline(&id, Utc::now() - Duration::hours(1))
        .await;

    let removed = service.sweep().await;
    assert_eq!(removed, vec![id.clone()]);

    assert!(service.read(&id).await.is_err());
    assert!(service.list(Category::Text).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_never_clears_any_prior_option() {
    let temp = TempDir::new().unwrap();
    let service = open_service(&temp).await;

    let id = service
        .add(Category::Text, "note.md", b"x", &ExpiryOption::OneDay)
        .await
        .unwrap();

    for option in [
        ExpiryOption::OneHour,
        ExpiryOption::Custom("2w".to_string()),
        ExpiryOption::FourHours,
    ] {
        service.set_expiration(&id, &option).await.unwrap();
        assert!(service.tracker().deadline(&id).await.is_some());

        service.set_expiration(&id, &ExpiryOption::Never).await.unwrap();
        assert!(service.tracker().deadline(&id).await.is_none());
    }
}

#[tokio::test]
async fn test_rename_keeps_deadline_and_count() {
    let temp = TempDir::new().unwrap();
    let service = open_service(&temp).await;

    let id = service
        .add(Category::Files, "report.pdf", b"pdf", &ExpiryOption::OneDay)
        .await
        .unwrap();
    let deadline = service.tracker().deadline(&id).await.unwrap();
    assert_eq!(service.tracker().tracked().await, 1);

    let new_id = service.rename(&id, "quarterly.pdf").await.unwrap();

    assert_eq!(service.tracker().tracked().await, 1);
    assert_eq!(service.tracker().deadline(&new_id).await, Some(deadline));
    assert!(service.tracker().deadline(&id).await.is_none());
    assert_eq!(service.read(&new_id).await.unwrap(), b"pdf");
}

#[tokio::test]
async fn test_expired_link_is_removed_from_list_file() {
    let temp = TempDir::new().unwrap();
    let service = open_service(&temp).await;

    let keep = service
        .add_link("https://example.com/keep", &ExpiryOption::Never)
        .await
        .unwrap();
    let drop = service
        .add_link("https://example.com/drop", &ExpiryOption::OneHour)
        .await
        .unwrap();

    service
        .tracker()
        .set_deadline(&drop, Utc::now() - Duration::minutes(1))
        .await;
    let removed = service.sweep().await;
    assert_eq!(removed, vec![drop]);

    let rows = service.list(Category::Links).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, keep);
}

#[tokio::test]
async fn test_deadlines_round_trip_through_persisted_file() {
    let temp = TempDir::new().unwrap();
    let state_path = temp.path().join("expirations.json");
    let store = ContentStore::open(temp.path().join("data")).await.unwrap();

    let tracker = ExpirationTracker::load(
        state_path.clone(),
        store.clone(),
        BroadcastHub::new(),
    )
    .await;

    let ids: Vec<EntryId> = (0..8)
        .map(|i| EntryId::new(Category::Files, format!("file-{}.bin", i)))
        .collect();
    for (i, id) in ids.iter().enumerate() {
        tracker
            .set_deadline(id, Utc::now() + Duration::hours(i as i64 + 1))
            .await;
    }

    // The persisted document has the expected shape.
    let raw = std::fs::read_to_string(&state_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["expirations"].as_object().unwrap().len(), 8);

    let reloaded = ExpirationTracker::load(state_path, store, BroadcastHub::new()).await;
    assert_eq!(reloaded.tracked().await, 8);
    for id in &ids {
        assert_eq!(reloaded.deadline(id).await, tracker.deadline(id).await);
    }
}

#[tokio::test]
async fn test_custom_duration_resolution() {
    let custom = |s: &str| ExpiryOption::Custom(s.to_string()).duration();

    assert_eq!(custom("3m"), Some(Duration::minutes(5)));
    assert_eq!(custom("10m"), Some(Duration::minutes(10)));
    assert_eq!(custom("2d"), Some(Duration::hours(48)));
    assert_eq!(custom("abc"), Some(Duration::minutes(5)));
}

#[tokio::test]
async fn test_sweep_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let service = open_service(&temp).await;

    let id = service
        .add(Category::Text, "once.md", b"x", &ExpiryOption::OneHour)
        .await
        .unwrap();
    service
        .tracker()
        .set_deadline(&id, Utc::now() - Duration::minutes(1))
        .await;

    assert_eq!(service.sweep().await.len(), 1);
    assert!(service.sweep().await.is_empty());
    assert!(service.sweep().await.is_empty());
}
