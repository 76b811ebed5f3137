//! # Desktop Bridge Implementations
//!
//! Default implementations of the playback bridge traits for desktop
//! platforms (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `SettingsStore` using a SQLite-backed key-value store
//! - `NowPlayingPublisher` that logs through `tracing` and keeps the latest entry
//! - `RemoteCommandSource` fed through a channel by media keys or tray actions
//!
//! Desktop hosts still supply their own `ResourceFactory`; rendering audio is
//! up to the application.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ChannelRemoteCommandSource, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = SqliteSettingsStore::new("settings.db".into()).await?;
//!     let (remote, media_keys) = ChannelRemoteCommandSource::new();
//!
//!     // Use in core configuration
//! }
//! ```

mod now_playing;
mod remote;
mod settings;

pub use now_playing::TracingNowPlayingPublisher;
pub use remote::{ChannelRemoteCommandSource, RemoteCommandSender};
pub use settings::SqliteSettingsStore;
