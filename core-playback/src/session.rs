//! Session state and the snapshots handed to subscribers.

use crate::media::{ContentKind, MediaItem};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why a session entered [`PlaybackState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The host could not construct a resource.
    ResourceUnavailable,
    /// The resource reported an unrecoverable error.
    ResourceFailed,
    /// The item's locator is not an absolute URI.
    InvalidLocator,
}

/// Playback lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason")]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Paused,
    Failed(FailureReason),
}

impl PlaybackState {
    pub fn is_failed(&self) -> bool {
        matches!(self, PlaybackState::Failed(_))
    }

    /// `Playing` or `Paused`: a resource is ready and progress is meaningful.
    pub fn is_engaged(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }
}

/// Mutable session owned by the controller.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub active_kind: Option<ContentKind>,
    pub state: PlaybackState,
    /// Bumped on every resource start and teardown. Events tagged with an
    /// older generation are stale.
    pub generation: u64,
    pub elapsed: Duration,
    /// Known only once the resource reports a finite, non-negative value.
    pub duration: Option<Duration>,
    /// Cleared when a pause arrives while `Loading`.
    pub play_when_ready: bool,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            active_kind: None,
            state: PlaybackState::Idle,
            generation: 0,
            elapsed: Duration::ZERO,
            duration: None,
            play_when_ready: true,
        }
    }
}

impl PlaybackSession {
    pub fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn reset_progress(&mut self) {
        self.elapsed = Duration::ZERO;
        self.duration = None;
    }

    pub fn playback_rate(&self) -> f32 {
        if self.state == PlaybackState::Playing {
            1.0
        } else {
            0.0
        }
    }

    /// Clamp a requested position into `[0, duration]`.
    pub fn clamp_position(&self, position: Duration) -> Option<Duration> {
        self.duration.map(|duration| position.min(duration))
    }
}

/// Convert a renderer-reported duration in seconds into a trusted value.
///
/// `NaN`, infinities and negative values mean "unknown".
pub fn normalize_duration(raw: Option<f64>) -> Option<Duration> {
    let seconds = raw?;
    if seconds.is_finite() && seconds >= 0.0 {
        Duration::try_from_secs_f64(seconds).ok()
    } else {
        None
    }
}

/// Immutable view of the session delivered to subscribers and callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub active_kind: Option<ContentKind>,
    pub active_item: Option<MediaItem>,
    pub active_index: Option<usize>,
    pub elapsed: Duration,
    pub duration: Option<Duration>,
    pub generation: u64,
    pub playback_rate: f32,
    /// Message of the failure that moved the session into `Failed`.
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    /// Fraction of the item played, when the duration is known and non-zero.
    pub fn progress(&self) -> Option<f64> {
        let duration = self.duration?.as_secs_f64();
        if duration <= 0.0 {
            return None;
        }
        Some((self.elapsed.as_secs_f64() / duration).clamp(0.0, 1.0))
    }

    /// Seeking requires a known, non-zero duration.
    pub fn can_seek(&self) -> bool {
        self.duration.is_some_and(|d| !d.is_zero())
    }
}

/// Which observable parts of the session changed in one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionChanges {
    pub state: bool,
    pub active_kind: bool,
    pub active_item: bool,
    pub elapsed: bool,
    pub duration: bool,
}

impl SessionChanges {
    pub fn is_empty(&self) -> bool {
        !(self.state || self.active_kind || self.active_item || self.elapsed || self.duration)
    }

    /// Only the progress fields moved.
    pub fn is_progress_only(&self) -> bool {
        !self.is_empty() && !(self.state || self.active_kind || self.active_item)
    }
}
