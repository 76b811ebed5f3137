//! Play history tracking
//!
//! Append-only, de-duplicated record of items that became active, kept per
//! content kind in first-played order. The controller only appends and reads
//! snapshots; storage is pluggable.

use crate::error::{PlaybackError, Result};
use crate::media::{ContentKind, MediaItem};
use async_trait::async_trait;
use bridge_traits::SettingsStore;
use core_runtime::config::HistoryKeys;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage contract for play history.
#[async_trait]
pub trait PlayHistoryStore: Send + Sync {
    /// Append `item` to its kind's history unless an item with the same
    /// identity is already recorded. Returns `true` when it was added.
    async fn append_if_absent(&self, item: &MediaItem) -> Result<bool>;

    /// Ordered history for `kind`, oldest first.
    async fn snapshot(&self, kind: ContentKind) -> Result<Vec<MediaItem>>;
}

/// Process-local history store.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    records: Mutex<HashMap<ContentKind, Vec<MediaItem>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlayHistoryStore for InMemoryHistoryStore {
    async fn append_if_absent(&self, item: &MediaItem) -> Result<bool> {
        let mut records = self.records.lock();
        let list = records.entry(item.kind()).or_default();
        if list.contains(item) {
            return Ok(false);
        }
        list.push(item.clone());
        Ok(true)
    }

    async fn snapshot(&self, kind: ContentKind) -> Result<Vec<MediaItem>> {
        Ok(self.records.lock().get(&kind).cloned().unwrap_or_default())
    }
}

/// History persisted as one JSON array per content kind in a [`SettingsStore`].
///
/// Records use the field names of the catalog search API the items came from
/// (`trackName`, `previewUrl`, ...) so histories written by earlier releases
/// load unchanged.
pub struct SettingsHistoryStore {
    settings: Arc<dyn SettingsStore>,
    keys: HistoryKeys,
    // Serializes read-modify-write cycles against the settings store.
    write_lock: tokio::sync::Mutex<()>,
}

impl SettingsHistoryStore {
    pub fn new(settings: Arc<dyn SettingsStore>, keys: HistoryKeys) -> Self {
        Self {
            settings,
            keys,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn key_for(&self, kind: ContentKind) -> &str {
        match kind {
            ContentKind::Track => &self.keys.tracks,
            ContentKind::AudioBookChapter => &self.keys.audio_book_chapters,
        }
    }

    async fn load(&self, kind: ContentKind) -> Result<Vec<MediaItem>> {
        let key = self.key_for(kind);
        let Some(json) = self.settings.get_string(key).await? else {
            return Ok(Vec::new());
        };

        match decode_records(kind, &json) {
            Ok(items) => Ok(items),
            Err(err) => {
                // Unreadable history is treated as empty and replaced on the next append.
                warn!(key, error = %err, "Discarding unreadable play history");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, kind: ContentKind, items: &[MediaItem]) -> Result<()> {
        let json = encode_records(items)?;
        self.settings.set_string(self.key_for(kind), &json).await?;
        Ok(())
    }
}

#[async_trait]
impl PlayHistoryStore for SettingsHistoryStore {
    async fn append_if_absent(&self, item: &MediaItem) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let kind = item.kind();
        let mut items = self.load(kind).await?;
        if items.contains(item) {
            return Ok(false);
        }
        items.push(item.clone());
        self.save(kind, &items).await?;
        debug!(%kind, count = items.len(), "Play history persisted");
        Ok(true)
    }

    async fn snapshot(&self, kind: ContentKind) -> Result<Vec<MediaItem>> {
        self.load(kind).await
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackRecord {
    track_name: String,
    artist_name: String,
    artwork_url100: String,
    preview_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    primary_genre_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChapterRecord {
    collection_name: String,
    artist_name: String,
    artwork_url100: String,
    preview_url: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum StoredRecord {
    Track(TrackRecord),
    Chapter(ChapterRecord),
}

impl From<&MediaItem> for StoredRecord {
    fn from(item: &MediaItem) -> Self {
        match item {
            MediaItem::Track {
                title,
                artist,
                artwork_url,
                locator,
                genre,
            } => StoredRecord::Track(TrackRecord {
                track_name: title.clone(),
                artist_name: artist.clone(),
                artwork_url100: artwork_url.clone(),
                preview_url: locator.clone(),
                primary_genre_name: genre.clone(),
            }),
            MediaItem::AudioBookChapter {
                title,
                artist,
                artwork_url,
                locator,
            } => StoredRecord::Chapter(ChapterRecord {
                collection_name: title.clone(),
                artist_name: artist.clone(),
                artwork_url100: artwork_url.clone(),
                preview_url: locator.clone(),
            }),
        }
    }
}

fn encode_records(items: &[MediaItem]) -> Result<String> {
    let records: Vec<StoredRecord> = items.iter().map(StoredRecord::from).collect();
    serde_json::to_string(&records).map_err(|e| PlaybackError::History(e.to_string()))
}

fn decode_records(kind: ContentKind, json: &str) -> serde_json::Result<Vec<MediaItem>> {
    let items = match kind {
        ContentKind::Track => serde_json::from_str::<Vec<TrackRecord>>(json)?
            .into_iter()
            .map(|record| MediaItem::Track {
                title: record.track_name,
                artist: record.artist_name,
                artwork_url: record.artwork_url100,
                locator: record.preview_url,
                genre: record.primary_genre_name,
            })
            .collect(),
        ContentKind::AudioBookChapter => serde_json::from_str::<Vec<ChapterRecord>>(json)?
            .into_iter()
            .map(|record| MediaItem::AudioBookChapter {
                title: record.collection_name,
                artist: record.artist_name,
                artwork_url: record.artwork_url100,
                locator: record.preview_url,
            })
            .collect(),
    };
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::BridgeError;
    use std::result::Result as StdResult;

    #[derive(Default)]
    struct MemorySettings {
        values: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl SettingsStore for MemorySettings {
        async fn set_string(&self, key: &str, value: &str) -> StdResult<(), BridgeError> {
            self.values.lock().insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn get_string(&self, key: &str) -> StdResult<Option<String>, BridgeError> {
            Ok(self.values.lock().get(key).cloned())
        }

        async fn delete(&self, key: &str) -> StdResult<(), BridgeError> {
            self.values.lock().remove(key);
            Ok(())
        }

        async fn list_keys(&self) -> StdResult<Vec<String>, BridgeError> {
            Ok(self.values.lock().keys().cloned().collect())
        }

        async fn clear_all(&self) -> StdResult<(), BridgeError> {
            self.values.lock().clear();
            Ok(())
        }
    }

    fn song(n: u32) -> MediaItem {
        MediaItem::track(
            format!("Song {}", n),
            "Band",
            format!("https://art/{}.jpg", n),
            format!("https://preview/{}.m4a", n),
        )
    }

    #[tokio::test]
    async fn in_memory_deduplicates_and_preserves_order() {
        let store = InMemoryHistoryStore::new();
        assert!(store.append_if_absent(&song(2)).await.unwrap());
        assert!(store.append_if_absent(&song(1)).await.unwrap());
        assert!(!store.append_if_absent(&song(2)).await.unwrap());

        let tracks = store.snapshot(ContentKind::Track).await.unwrap();
        assert_eq!(
            tracks.iter().map(|i| i.title()).collect::<Vec<_>>(),
            vec!["Song 2", "Song 1"]
        );
        assert!(store
            .snapshot(ContentKind::AudioBookChapter)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn settings_store_persists_per_kind_key() {
        let settings = Arc::new(MemorySettings::default());
        let store = SettingsHistoryStore::new(settings.clone(), HistoryKeys::default());

        assert!(store.append_if_absent(&song(1).with_genre("Pop")).await.unwrap());
        assert!(store
            .append_if_absent(&MediaItem::audio_book_chapter(
                "Book",
                "Author",
                "https://art/b.jpg",
                "https://preview/b.m4a"
            ))
            .await
            .unwrap());
        assert!(!store.append_if_absent(&song(1)).await.unwrap());

        let raw = settings.get_string("PlayedSongsKey").await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[0]["trackName"], "Song 1");
        assert_eq!(json[0]["previewUrl"], "https://preview/1.m4a");
        assert_eq!(json[0]["primaryGenreName"], "Pop");

        let raw = settings
            .get_string("PlayedAudioBooksKey")
            .await
            .unwrap()
            .unwrap();
        assert!(raw.contains("\"collectionName\":\"Book\""));
    }

    #[tokio::test]
    async fn settings_store_reads_existing_history() {
        let settings = Arc::new(MemorySettings::default());
        settings
            .set_string(
                "PlayedSongsKey",
                r#"[{"trackName":"Old","artistName":"A","artworkUrl100":"https://a/1.jpg","previewUrl":"https://p/old.m4a"}]"#,
            )
            .await
            .unwrap();
        let store = SettingsHistoryStore::new(settings, HistoryKeys::default());

        let history = store.snapshot(ContentKind::Track).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].locator(), "https://p/old.m4a");
        assert_eq!(history[0].genre(), None);
    }

    #[tokio::test]
    async fn corrupt_history_is_replaced() {
        let settings = Arc::new(MemorySettings::default());
        settings
            .set_string("PlayedSongsKey", "not json")
            .await
            .unwrap();
        let store = SettingsHistoryStore::new(settings.clone(), HistoryKeys::default());

        assert!(store.snapshot(ContentKind::Track).await.unwrap().is_empty());
        assert!(store.append_if_absent(&song(3)).await.unwrap());
        assert_eq!(store.snapshot(ContentKind::Track).await.unwrap().len(), 1);
    }
}
