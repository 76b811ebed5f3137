//! Playback resource bridge traits.
//!
//! A [`PlaybackResource`] is the host renderer bound to exactly one media
//! locator. The core asks a [`ResourceFactory`] for a fresh resource every time
//! the current item changes and hands it a [`ResourceEventSink`] through which
//! lifecycle notifications flow back. Every request carries the generation it
//! was created for; hosts should not interpret it beyond echoing it in logs.

use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// Request describing the resource a host should open.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRequest {
    /// Playable locator (absolute URI).
    pub locator: String,
    /// Generation the resource belongs to.
    pub generation: u64,
    /// Display title, useful for host-side diagnostics.
    pub title: String,
}

impl ResourceRequest {
    pub fn new(locator: impl Into<String>, generation: u64, title: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            generation,
            title: title.into(),
        }
    }
}

/// Lifecycle notification emitted by a resource.
///
/// Durations are raw seconds as reported by the renderer. Streams of unknown
/// length commonly report `NaN` or infinity; the core normalizes those to
/// "unknown" rather than trusting them.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    /// The resource can render and reports its (possibly unknown) duration.
    Ready { duration: Option<f64> },
    /// The resource failed and will not recover.
    Failed { message: String },
    /// Rendering reached the end of the item.
    ReachedEnd,
    /// Periodic progress sample.
    Tick {
        elapsed: Duration,
        duration: Option<f64>,
    },
}

impl ResourceEvent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ResourceEvent::Ready { .. } => "ready",
            ResourceEvent::Failed { .. } => "failed",
            ResourceEvent::ReachedEnd => "reached_end",
            ResourceEvent::Tick { .. } => "tick",
        }
    }
}

/// Receiver for resource lifecycle events.
///
/// Implementations must never block: the core forwards events into its own
/// mailbox and returns immediately. Events emitted after the resource has been
/// torn down are silently discarded.
pub trait ResourceEventSink: Send + Sync {
    fn emit(&self, event: ResourceEvent);
}

/// Host renderer bound to a single locator.
#[async_trait::async_trait]
pub trait PlaybackResource: Send + Sync {
    /// Start rendering as soon as the resource is able to.
    async fn play(&self) -> Result<()>;

    /// Pause rendering without releasing the resource.
    async fn pause(&self) -> Result<()>;

    /// Continue rendering after a pause.
    async fn resume(&self) -> Result<()> {
        self.play().await
    }

    /// Seek to an absolute position.
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Stop rendering and release native resources. Called exactly once.
    async fn stop(&self) -> Result<()>;

    /// Current rendering position.
    async fn position(&self) -> Result<Duration>;

    /// Total duration in seconds, when the renderer knows it.
    async fn duration(&self) -> Option<f64> {
        None
    }
}

/// Creates playback resources.
///
/// `open` must not block on network or decoding work; it returns a resource
/// that reports readiness later through `events`. Returning an error means the
/// resource could not even be constructed.
pub trait ResourceFactory: Send + Sync {
    fn open(
        &self,
        request: ResourceRequest,
        events: Arc<dyn ResourceEventSink>,
    ) -> Result<Arc<dyn PlaybackResource>>;
}
