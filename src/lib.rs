//! Workspace facade crate.
//!
//! Host applications can depend on `playback-workspace` alone and reach the
//! playback controller, its configuration and the bridge traits through one
//! import path. The `desktop-shims` feature (default) also exposes the desktop
//! bridge implementations.

pub use bridge_traits as bridge;
pub use core_playback as playback;
pub use core_runtime as runtime;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop as desktop;

pub use core_playback::{
    ContentKind, ControllerHandle, MediaItem, PlaybackError, PlaybackEvent, PlaybackState,
    SessionSnapshot,
};
pub use core_runtime::config::CoreConfig;
