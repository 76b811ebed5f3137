//! # Playback Session Core
//!
//! Single-device playback controller for two kinds of audio content: music
//! tracks and audiobook chapters.
//!
//! ## Overview
//!
//! This crate handles:
//! - One ordered queue per content kind, with circular next/previous
//! - A session state machine (`Idle`, `Loading`, `Playing`, `Paused`, `Failed`)
//!   driving exactly one live playback resource at a time
//! - Generation tagging so events from torn-down resources are ignored
//! - Periodic progress sampling while a resource is live
//! - Per-kind play history, optionally persisted through a `SettingsStore`
//! - Now-playing publication and OS remote command handling
//!
//! The audio renderer itself lives behind [`bridge_traits::ResourceFactory`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{ContentKind, ControllerHandle, MediaItem};
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .resource_factory(factory)
//!     .now_playing_publisher(publisher)
//!     .build()?;
//! let controller = ControllerHandle::spawn(config)?;
//!
//! let mut events = controller.subscribe();
//! controller
//!     .activate(ContentKind::Track, vec![MediaItem::track(
//!         "Song", "Band", "https://art/1.jpg", "https://audio/1.m4a",
//!     )], 0)
//!     .await?;
//! ```

mod actor;
mod controller;
pub mod error;
pub mod events;
pub mod handle;
pub mod history;
pub mod media;
pub mod now_playing;
pub mod queue;
pub mod remote;
pub mod session;
mod ticker;

pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use handle::{ControllerHandle, WeakControllerHandle};
pub use history::{InMemoryHistoryStore, PlayHistoryStore, SettingsHistoryStore};
pub use media::{ContentKind, MediaItem, MediaKey};
pub use now_playing::{now_playing_info, NowPlayingFanout};
pub use queue::MediaQueue;
pub use remote::status_for;
pub use session::{
    normalize_duration, FailureReason, PlaybackSession, PlaybackState, SessionChanges,
    SessionSnapshot,
};
