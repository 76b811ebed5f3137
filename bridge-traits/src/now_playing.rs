//! OS media-session surfaces.
//!
//! The core pushes a [`NowPlayingInfo`] after every accepted transition and
//! progress sample. Hosts mirror it into their lock-screen / control-center
//! widgets.

use std::time::Duration;

/// Snapshot of what is currently playing.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingInfo {
    pub title: String,
    pub artist: String,
    /// Album line shown by the OS widget. Items without an album reuse their
    /// title.
    pub album_title: String,
    pub artwork_url: Option<String>,
    pub elapsed: Duration,
    /// `None` while the duration is unknown.
    pub duration: Option<Duration>,
    /// `1.0` while playing, `0.0` otherwise.
    pub playback_rate: f32,
}

/// Sink for now-playing updates.
///
/// Both methods are fire-and-forget and must return promptly.
pub trait NowPlayingPublisher: Send + Sync {
    fn publish(&self, info: &NowPlayingInfo);

    /// Remove any now-playing entry from the OS surface.
    fn clear(&self);
}
