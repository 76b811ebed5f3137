//! Fan-out of session snapshots to OS now-playing surfaces.

use crate::session::SessionSnapshot;
use bridge_traits::{NowPlayingInfo, NowPlayingPublisher};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct NowPlayingFanout {
    publishers: Vec<Arc<dyn NowPlayingPublisher>>,
}

impl NowPlayingFanout {
    pub fn new(publishers: Vec<Arc<dyn NowPlayingPublisher>>) -> Self {
        Self { publishers }
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }

    /// Push `snapshot` to every publisher, or clear them when nothing is active.
    pub fn publish(&self, snapshot: &SessionSnapshot) {
        match now_playing_info(snapshot) {
            Some(info) => self.publishers.iter().for_each(|p| p.publish(&info)),
            None => self.clear(),
        }
    }

    pub fn clear(&self) {
        self.publishers.iter().for_each(|p| p.clear());
    }
}

/// Build the OS now-playing entry for a snapshot.
pub fn now_playing_info(snapshot: &SessionSnapshot) -> Option<NowPlayingInfo> {
    let item = snapshot.active_item.as_ref()?;
    let artwork_url = Some(item.artwork_url())
        .filter(|url| !url.is_empty())
        .map(str::to_string);

    Some(NowPlayingInfo {
        title: item.title().to_string(),
        artist: item.artist().to_string(),
        album_title: item.title().to_string(),
        artwork_url,
        elapsed: snapshot.elapsed,
        duration: snapshot.duration,
        playback_rate: snapshot.playback_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaItem;
    use crate::session::{FailureReason, PlaybackState};
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recording {
        published: Mutex<Vec<NowPlayingInfo>>,
        clears: Mutex<usize>,
    }

    impl NowPlayingPublisher for Recording {
        fn publish(&self, info: &NowPlayingInfo) {
            self.published.lock().push(info.clone());
        }

        fn clear(&self) {
            *self.clears.lock() += 1;
        }
    }

    fn snapshot(item: Option<MediaItem>, state: PlaybackState, rate: f32) -> SessionSnapshot {
        SessionSnapshot {
            state,
            active_kind: item.as_ref().map(|i| i.kind()),
            active_item: item,
            active_index: Some(0),
            elapsed: Duration::from_secs(12),
            duration: Some(Duration::from_secs(30)),
            generation: 2,
            playback_rate: rate,
            last_error: None,
        }
    }

    #[test]
    fn every_publisher_receives_update() {
        let a = Arc::new(Recording::default());
        let b = Arc::new(Recording::default());
        let publishers: Vec<Arc<dyn NowPlayingPublisher>> = vec![a.clone(), b.clone()];
        let fanout = NowPlayingFanout::new(publishers);

        let item = MediaItem::track("Song", "Band", "https://art/1.jpg", "https://p/1");
        fanout.publish(&snapshot(Some(item), PlaybackState::Playing, 1.0));

        for publisher in [&a, &b] {
            let published = publisher.published.lock();
            assert_eq!(published.len(), 1);
            assert_eq!(published[0].title, "Song");
            assert_eq!(published[0].album_title, "Song");
            assert_eq!(published[0].artwork_url.as_deref(), Some("https://art/1.jpg"));
            assert_eq!(published[0].playback_rate, 1.0);
        }
    }

    #[test]
    fn no_active_item_clears() {
        let publisher = Arc::new(Recording::default());
        let fanout = NowPlayingFanout::new(vec![publisher.clone() as Arc<dyn NowPlayingPublisher>]);

        fanout.publish(&snapshot(None, PlaybackState::Idle, 0.0));

        assert!(publisher.published.lock().is_empty());
        assert_eq!(*publisher.clears.lock(), 1);
    }

    #[test]
    fn failed_item_publishes_zero_rate_and_no_artwork() {
        let item = MediaItem::audio_book_chapter("Ch 2", "Author", "", "https://p/2");
        let info = now_playing_info(&snapshot(
            Some(item),
            PlaybackState::Failed(FailureReason::ResourceFailed),
            0.0,
        ))
        .unwrap();

        assert_eq!(info.playback_rate, 0.0);
        assert_eq!(info.artwork_url, None);
        assert_eq!(info.duration, Some(Duration::from_secs(30)));
    }
}
