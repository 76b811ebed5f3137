//! Now-playing publisher for desktop hosts without an OS media surface.

use bridge_traits::now_playing::{NowPlayingInfo, NowPlayingPublisher};
use parking_lot::Mutex;
use tracing::{debug, info};

/// Logs now-playing changes and keeps the latest entry for status displays.
///
/// Progress-only updates are logged at `debug` so a playing item does not
/// flood the log at the tick cadence.
#[derive(Default)]
pub struct TracingNowPlayingPublisher {
    current: Mutex<Option<NowPlayingInfo>>,
}

impl TracingNowPlayingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently published entry, if any.
    pub fn current(&self) -> Option<NowPlayingInfo> {
        self.current.lock().clone()
    }
}

impl NowPlayingPublisher for TracingNowPlayingPublisher {
    fn publish(&self, info: &NowPlayingInfo) {
        let mut current = self.current.lock();
        let same_item = current
            .as_ref()
            .is_some_and(|prev| prev.title == info.title && prev.artist == info.artist);
        let same_rate = current
            .as_ref()
            .is_some_and(|prev| prev.playback_rate == info.playback_rate);

        if same_item && same_rate {
            debug!(
                title = %info.title,
                elapsed_ms = info.elapsed.as_millis() as u64,
                "Now playing progress"
            );
        } else {
            info!(
                title = %info.title,
                artist = %info.artist,
                rate = info.playback_rate,
                duration_ms = info.duration.map(|d| d.as_millis() as u64),
                "Now playing"
            );
        }
        *current = Some(info.clone());
    }

    fn clear(&self) {
        if self.current.lock().take().is_some() {
            info!("Now playing cleared");
        }
    }
}
