//! # Playback Error Types
//!
//! Error types for the playback session controller.

use crate::session::FailureReason;
use thiserror::Error;

/// Errors returned by queue and controller operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Queue Errors
    // ========================================================================
    /// The operation needs at least one item.
    #[error("Queue is empty")]
    EmptyQueue,

    /// Requested start index does not exist in the supplied items.
    #[error("Index {index} out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// The item's locator is not an absolute URI.
    #[error("Invalid media locator: {0}")]
    InvalidLocator(String),

    /// The host could not construct a resource for the item.
    #[error("Playback resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// The live resource reported an unrecoverable failure.
    #[error("Playback resource failed: {0}")]
    ResourceFailed(String),

    // ========================================================================
    // Control Errors
    // ========================================================================
    /// Seeking requires a known duration.
    #[error("Seek unavailable until the duration is known")]
    SeekUnavailable,

    /// The command has no valid target in the current state.
    #[error("Command declined: {0}")]
    CommandDeclined(String),

    /// The controller task has shut down.
    #[error("Playback controller is closed")]
    ControllerClosed,

    // ========================================================================
    // Collaborator Errors
    // ========================================================================
    /// Play history store failure.
    #[error("History store error: {0}")]
    History(String),

    /// Configuration rejected at start-up.
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    /// Host bridge failure.
    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),
}

impl PlaybackError {
    /// Returns `true` for synchronous queue validation errors. These never
    /// change session state.
    pub fn is_queue_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::EmptyQueue | PlaybackError::IndexOutOfRange { .. }
        )
    }

    /// The failure state an accepted error moves the session into, if any.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            PlaybackError::InvalidLocator(_) => Some(FailureReason::InvalidLocator),
            PlaybackError::ResourceUnavailable(_) => Some(FailureReason::ResourceUnavailable),
            PlaybackError::ResourceFailed(_) => Some(FailureReason::ResourceFailed),
            _ => None,
        }
    }

    /// Returns `true` when the error means "nothing to act on" rather than a
    /// malfunction. Remote surfaces map these to "no such content".
    pub fn is_no_content(&self) -> bool {
        matches!(
            self,
            PlaybackError::EmptyQueue | PlaybackError::CommandDeclined(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
