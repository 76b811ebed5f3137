//! Remote command boundary (headset buttons, lock screen, widgets).

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Command issued by an OS remote-control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "position")]
pub enum RemoteCommand {
    Play,
    Pause,
    TogglePlayPause,
    Next,
    Previous,
    SeekTo(Duration),
}

/// Outcome reported back to the OS surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteCommandStatus {
    Success,
    /// Nothing is loaded that the command could apply to.
    NoSuchContent,
    CommandFailed,
}

/// Source of remote commands.
///
/// `commands` is called once when the core starts; the returned stream is
/// drained until it ends or the core shuts down.
pub trait RemoteCommandSource: Send + Sync {
    fn commands(&self) -> BoxStream<'static, RemoteCommand>;

    /// Receives the outcome of each command taken from the stream.
    fn acknowledge(&self, _command: RemoteCommand, _status: RemoteCommandStatus) {}
}
