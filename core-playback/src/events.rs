//! Events broadcast to playback subscribers.

use crate::media::ContentKind;
use crate::session::{PlaybackState, SessionChanges, SessionSnapshot};
use core_runtime::events::{CoreEvent, EventSeverity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum PlaybackEvent {
    /// One batch per accepted transition or progress sample.
    SessionUpdated {
        snapshot: SessionSnapshot,
        changes: SessionChanges,
    },
    /// An item became active for the first time and joined its history.
    HistoryRecorded {
        kind: ContentKind,
        title: String,
        position: usize,
    },
}

impl CoreEvent for PlaybackEvent {
    fn description(&self) -> String {
        match self {
            PlaybackEvent::SessionUpdated { snapshot, changes } => {
                let title = snapshot
                    .active_item
                    .as_ref()
                    .map(|item| item.title())
                    .unwrap_or("nothing");
                if changes.is_progress_only() {
                    format!("{} at {:.1}s", title, snapshot.elapsed.as_secs_f64())
                } else {
                    format!("{:?}: {}", snapshot.state, title)
                }
            }
            PlaybackEvent::HistoryRecorded { kind, title, .. } => {
                format!("{} '{}' added to history", kind, title)
            }
        }
    }

    fn severity(&self) -> EventSeverity {
        match self {
            PlaybackEvent::SessionUpdated { snapshot, changes }
                if changes.state && snapshot.state.is_failed() =>
            {
                EventSeverity::Error
            }
            PlaybackEvent::SessionUpdated { changes, .. } if changes.is_progress_only() => {
                EventSeverity::Debug
            }
            PlaybackEvent::SessionUpdated { .. } | PlaybackEvent::HistoryRecorded { .. } => {
                EventSeverity::Info
            }
        }
    }
}

impl PlaybackEvent {
    /// Snapshot carried by a session update.
    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        match self {
            PlaybackEvent::SessionUpdated { snapshot, .. } => Some(snapshot),
            PlaybackEvent::HistoryRecorded { .. } => None,
        }
    }

    pub fn state(&self) -> Option<PlaybackState> {
        self.snapshot().map(|snapshot| snapshot.state)
    }
}
