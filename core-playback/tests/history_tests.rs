//! Play history integration tests
//!
//! - `append_if_absent` is called once per item identity
//! - History store failures never interrupt playback
//! - Persisted history seeds the "previously played" listings on start

mod common;

use async_trait::async_trait;
use bridge_desktop::SqliteSettingsStore;
use bridge_traits::SettingsStore;
use common::{chapter, chapters, harness_with, track, tracks, FakeFactory};
use core_playback::{
    ContentKind, ControllerHandle, MediaItem, PlayHistoryStore, PlaybackError, PlaybackState,
    Result,
};
use core_runtime::config::CoreConfig;
use mockall::mock;
use std::sync::Arc;

mock! {
    History {}

    #[async_trait]
    impl PlayHistoryStore for History {
        async fn append_if_absent(&self, item: &MediaItem) -> Result<bool>;
        async fn snapshot(&self, kind: ContentKind) -> Result<Vec<MediaItem>>;
    }
}

fn spawn_with(store: Arc<MockHistory>) -> (ControllerHandle, Arc<FakeFactory>) {
    let factory = Arc::new(FakeFactory::default());
    let config = CoreConfig::builder()
        .resource_factory(factory.clone())
        .progress_interval(std::time::Duration::from_secs(10))
        .build()
        .unwrap();
    let controller = ControllerHandle::spawn_with_history(config, store).unwrap();
    (controller, factory)
}

/// Shut the controller down and wait until it released the store, so mock
/// expectations are verified on this task.
async fn finish(controller: ControllerHandle, store: Arc<MockHistory>) {
    controller.shutdown().await.unwrap();
    drop(controller);
    while Arc::strong_count(&store) > 1 {
        tokio::task::yield_now().await;
    }
}

// ============================================================================
// Mocked store
// ============================================================================

#[tokio::test]
async fn test_append_called_once_per_item() {
    let mut store = MockHistory::new();
    store.expect_snapshot().times(2).returning(|_| Ok(Vec::new()));
    store
        .expect_append_if_absent()
        .withf(|item| item.locator() == track(1).locator())
        .times(1)
        .returning(|_| Ok(true));
    store
        .expect_append_if_absent()
        .withf(|item| item.locator() == track(2).locator())
        .times(1)
        .returning(|_| Ok(true));
    let store = Arc::new(store);

    let (controller, factory) = spawn_with(store.clone());
    for _ in 0..3 {
        controller
            .activate(ContentKind::Track, vec![track(1)], 0)
            .await
            .unwrap();
    }
    controller
        .activate(ContentKind::Track, tracks(2), 1)
        .await
        .unwrap();
    factory.last().ready(Some(30.0));

    // Transport never touches history.
    controller.pause().await.unwrap();
    controller.play().await.unwrap();
    controller.seek(std::time::Duration::from_secs(3)).await.unwrap();
    controller.retreat().await.unwrap();
    controller.advance().await.unwrap();

    assert_eq!(
        controller.history(ContentKind::Track).await.unwrap(),
        tracks(2)
    );
    finish(controller, store).await;
}

#[tokio::test]
async fn test_store_failure_does_not_block_playback() {
    let mut store = MockHistory::new();
    store.expect_snapshot().returning(|_| Ok(Vec::new()));
    store
        .expect_append_if_absent()
        .times(1)
        .returning(|_| Err(PlaybackError::History("disk full".into())));
    let store = Arc::new(store);

    let (controller, _factory) = spawn_with(store.clone());
    let snapshot = controller
        .activate(ContentKind::AudioBookChapter, vec![chapter(1)], 0)
        .await
        .unwrap();
    assert_eq!(snapshot.state, PlaybackState::Loading);

    // The in-memory listing still reflects the play, and the item is not retried.
    controller
        .activate(ContentKind::AudioBookChapter, vec![chapter(1)], 0)
        .await
        .unwrap();
    assert_eq!(
        controller
            .history(ContentKind::AudioBookChapter)
            .await
            .unwrap(),
        vec![chapter(1)]
    );
    finish(controller, store).await;
}

#[tokio::test]
async fn test_seeded_history_is_not_appended_again() {
    let mut store = MockHistory::new();
    store.expect_snapshot().returning(|kind| match kind {
        ContentKind::Track => Ok(vec![track(1), track(2)]),
        ContentKind::AudioBookChapter => Ok(Vec::new()),
    });
    store.expect_append_if_absent().never();
    let store = Arc::new(store);

    let (controller, _factory) = spawn_with(store.clone());
    assert_eq!(
        controller.history(ContentKind::Track).await.unwrap(),
        tracks(2)
    );

    let snapshot = controller
        .play_from_history(ContentKind::Track, 1)
        .await
        .unwrap();
    assert_eq!(snapshot.active_item, Some(track(2)));
    finish(controller, store).await;
}

#[tokio::test]
async fn test_unreadable_store_starts_empty() {
    let mut store = MockHistory::new();
    store
        .expect_snapshot()
        .returning(|_| Err(PlaybackError::History("corrupt".into())));
    store.expect_append_if_absent().returning(|_| Ok(true));
    let store = Arc::new(store);

    let (controller, _factory) = spawn_with(store.clone());
    assert!(controller
        .history(ContentKind::Track)
        .await
        .unwrap()
        .is_empty());
    controller
        .activate(ContentKind::Track, vec![track(4)], 0)
        .await
        .unwrap();
    assert_eq!(
        controller.history(ContentKind::Track).await.unwrap(),
        vec![track(4)]
    );
    finish(controller, store).await;
}

// ============================================================================
// Persisted store
// ============================================================================

#[tokio::test]
async fn test_history_survives_restart() {
    let settings: Arc<dyn SettingsStore> = Arc::new(SqliteSettingsStore::in_memory().await.unwrap());

    let first = {
        let settings = Arc::clone(&settings);
        harness_with(move |builder| builder.settings_store(settings).persist_history(true))
    };
    first
        .controller
        .activate(ContentKind::AudioBookChapter, chapters(3), 0)
        .await
        .unwrap();
    first.controller.advance().await.unwrap();
    first
        .controller
        .activate(ContentKind::Track, vec![track(9).with_genre("Jazz")], 0)
        .await
        .unwrap();
    first.controller.shutdown().await.unwrap();

    let raw = settings
        .get_string("PlayedAudioBooksKey")
        .await
        .unwrap()
        .unwrap();
    let records: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 2);
    assert_eq!(records[0]["collectionName"], "Chapter 1");
    assert_eq!(
        records[1]["previewUrl"],
        "https://audio.example/book/2.mp3"
    );

    let raw = settings.get_string("PlayedSongsKey").await.unwrap().unwrap();
    let records: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(records[0]["trackName"], "Song 9");
    assert_eq!(records[0]["primaryGenreName"], "Jazz");

    let second = {
        let settings = Arc::clone(&settings);
        harness_with(move |builder| builder.settings_store(settings).persist_history(true))
    };
    assert_eq!(
        second
            .controller
            .history(ContentKind::AudioBookChapter)
            .await
            .unwrap(),
        vec![chapter(1), chapter(2)]
    );
    let tracks_played = second.controller.history(ContentKind::Track).await.unwrap();
    assert_eq!(tracks_played[0].genre(), Some("Jazz"));

    // Playing a seeded item again does not duplicate it.
    second
        .controller
        .play_from_history(ContentKind::AudioBookChapter, 0)
        .await
        .unwrap();
    second.controller.shutdown().await.unwrap();
    let raw = settings
        .get_string("PlayedAudioBooksKey")
        .await
        .unwrap()
        .unwrap();
    let records: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_custom_history_keys() {
    let settings: Arc<dyn SettingsStore> = Arc::new(SqliteSettingsStore::in_memory().await.unwrap());

    let h = {
        let settings = Arc::clone(&settings);
        harness_with(move |builder| {
            builder
                .settings_store(settings)
                .history_keys(core_runtime::config::HistoryKeys::new("songs", "books"))
                .persist_history(true)
        })
    };
    h.controller
        .activate(ContentKind::Track, vec![track(1)], 0)
        .await
        .unwrap();
    h.controller.shutdown().await.unwrap();

    assert!(settings.has_key("songs").await.unwrap());
    assert!(!settings.has_key("PlayedSongsKey").await.unwrap());
}
