//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the host.
//! Each trait represents a capability that the core requires but that must be
//! implemented differently per platform (desktop, iOS, Android).
//!
//! ## Traits
//!
//! ### Playback
//! - [`ResourceFactory`](playback::ResourceFactory) - Opens a renderer for one media locator
//! - [`PlaybackResource`](playback::PlaybackResource) - Controls an open renderer
//! - [`ResourceEventSink`](playback::ResourceEventSink) - Carries renderer lifecycle events back to the core
//!
//! ### Media Session
//! - [`NowPlayingPublisher`](now_playing::NowPlayingPublisher) - Lock-screen / control-center metadata
//! - [`RemoteCommandSource`](remote::RemoteCommandSource) - Headset, lock-screen and widget commands
//!
//! ### Storage & Utilities
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences storage
//! - [`LoggerSink`](logger::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing:
//!
//! ```ignore
//! let factory = config.resource_factory
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "ResourceFactory".to_string(),
//!         message: "No playback resource factory provided. \
//!                  Inject the platform's audio renderer.".to_string(),
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All fallible bridge methods return [`BridgeError`](error::BridgeError).
//! Platform implementations should convert platform-specific errors to
//! `BridgeError` and include actionable context.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared across the
//! core's async tasks.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::now_playing::{NowPlayingInfo, NowPlayingPublisher};
//!
//! struct ConsolePublisher;
//!
//! impl NowPlayingPublisher for ConsolePublisher {
//!     fn publish(&self, info: &NowPlayingInfo) {
//!         println!("{} - {} ({:?})", info.artist, info.title, info.elapsed);
//!     }
//!
//!     fn clear(&self) {}
//! }
//! ```

pub mod error;
pub mod logger;
pub mod now_playing;
pub mod playback;
pub mod remote;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use logger::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use now_playing::{NowPlayingInfo, NowPlayingPublisher};
pub use playback::{
    PlaybackResource, ResourceEvent, ResourceEventSink, ResourceFactory, ResourceRequest,
};
pub use remote::{RemoteCommand, RemoteCommandSource, RemoteCommandStatus};
pub use storage::SettingsStore;
