//! # Playback Session Controller
//!
//! State machine that owns both content queues, the session and the single
//! live playback resource.
//!
//! ## Transitions
//!
//! ```text
//!            activate / advance / retreat / play (restart)
//!   Idle ───────────────────────────────────────────────> Loading
//!   Failed ─────────────────────────────────────────────>   │
//!                                                            │ ready (current generation)
//!                      pause                                 v
//!   Paused <─────────────────────────────────────────── Playing
//!     │    ─────────────────────────────────────────────>   │
//!     │                 play / resume                        │ reached_end -> Loading (next item)
//!     └── failed (current generation) ──> Failed <───────────┘
//! ```
//!
//! Every resource start bumps the session generation, and teardown happens
//! before the next resource exists. Events are tagged with the generation they
//! were produced for. Anything older than the current one is dropped without
//! touching state.
//!
//! The controller is only ever driven by the actor task in [`crate::actor`],
//! so no method needs to guard against concurrent access.

use crate::actor::{Command, GenerationSink, Operation};
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::history::PlayHistoryStore;
use crate::media::{ContentKind, MediaItem, MediaKey};
use crate::now_playing::NowPlayingFanout;
use crate::queue::MediaQueue;
use crate::session::{
    normalize_duration, FailureReason, PlaybackSession, PlaybackState, SessionChanges,
    SessionSnapshot,
};
use crate::ticker::ProgressTicker;
use bridge_traits::{
    PlaybackResource, RemoteCommand, ResourceEvent, ResourceFactory, ResourceRequest,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::EventBus;
use core_runtime::logging::redact_locator;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// One value per content kind.
#[derive(Debug, Clone, Default)]
struct PerKind<T> {
    tracks: T,
    chapters: T,
}

impl<T> PerKind<T> {
    fn get(&self, kind: ContentKind) -> &T {
        match kind {
            ContentKind::Track => &self.tracks,
            ContentKind::AudioBookChapter => &self.chapters,
        }
    }

    fn get_mut(&mut self, kind: ContentKind) -> &mut T {
        match kind {
            ContentKind::Track => &mut self.tracks,
            ContentKind::AudioBookChapter => &mut self.chapters,
        }
    }
}

struct LiveResource {
    generation: u64,
    resource: Arc<dyn PlaybackResource>,
    sink: Arc<GenerationSink>,
    ticker: ProgressTicker,
}

/// The observable parts of the session, compared before and after each
/// operation to build one change batch.
#[derive(Debug, Clone, PartialEq)]
struct Observed {
    state: PlaybackState,
    active_kind: Option<ContentKind>,
    item: Option<MediaKey>,
    index: Option<usize>,
    elapsed: Duration,
    duration: Option<Duration>,
}

impl Observed {
    fn changes_since(&self, before: &Observed) -> SessionChanges {
        SessionChanges {
            state: self.state != before.state,
            active_kind: self.active_kind != before.active_kind,
            active_item: self.item != before.item || self.index != before.index,
            elapsed: self.elapsed != before.elapsed,
            duration: self.duration != before.duration,
        }
    }
}

pub(crate) struct SessionController {
    session: PlaybackSession,
    queues: PerKind<MediaQueue>,
    played: PerKind<Vec<MediaItem>>,
    recorded: HashSet<MediaKey>,
    live: Option<LiveResource>,
    last_error: Option<String>,

    factory: Arc<dyn ResourceFactory>,
    history_store: Arc<dyn PlayHistoryStore>,
    now_playing: NowPlayingFanout,
    events: EventBus<PlaybackEvent>,
    mailbox: mpsc::WeakUnboundedSender<Command>,
    progress_interval: Duration,
    auto_advance: bool,
}

impl SessionController {
    pub(crate) fn new(
        config: &CoreConfig,
        history_store: Arc<dyn PlayHistoryStore>,
        events: EventBus<PlaybackEvent>,
        mailbox: mpsc::WeakUnboundedSender<Command>,
    ) -> Self {
        Self {
            session: PlaybackSession::default(),
            queues: PerKind::default(),
            played: PerKind::default(),
            recorded: HashSet::new(),
            live: None,
            last_error: None,
            factory: Arc::clone(&config.resource_factory),
            history_store,
            now_playing: NowPlayingFanout::new(config.now_playing_publishers.clone()),
            events,
            mailbox,
            progress_interval: config.progress_interval,
            auto_advance: config.features.auto_advance,
        }
    }

    /// Load persisted history so "previously played" listings survive restarts
    /// and already-recorded items are never appended twice.
    pub(crate) async fn seed_history(&mut self) {
        for kind in ContentKind::ALL {
            match self.history_store.snapshot(kind).await {
                Ok(items) => {
                    let list = self.played.get_mut(kind);
                    for item in items {
                        if self.recorded.insert(item.key()) {
                            list.push(item);
                        }
                    }
                    debug!(%kind, count = list.len(), "Play history loaded");
                }
                Err(err) => warn!(%kind, error = %err, "Failed to load play history"),
            }
        }
    }

    /// Apply one operation and publish at most one change batch for it.
    #[instrument(level = "debug", skip_all, fields(op = operation.name()))]
    pub(crate) async fn apply(&mut self, operation: Operation) -> Result<SessionSnapshot> {
        let before = self.observe();
        let mut tick_accepted = false;

        let result = match operation {
            Operation::Activate {
                kind,
                items,
                starting_at,
            } => self.activate(kind, items, starting_at).await,
            Operation::Play => self.play().await,
            Operation::Pause => self.pause().await,
            Operation::Advance => self.advance().await,
            Operation::Retreat => self.retreat().await,
            Operation::Seek(position) => self.seek(position).await,
            Operation::Stop => self.stop().await,
            Operation::TogglePlayPause(kind) => self.toggle_play_pause(kind).await,
            Operation::PlayFromHistory { kind, index } => {
                self.play_from_history(kind, index).await
            }
            Operation::Remote(command) => self.remote(command).await,
            Operation::Resource { generation, event } => {
                tick_accepted = self.on_resource_event(generation, event).await;
                Ok(())
            }
        };

        self.commit(&before, tick_accepted);
        result.map(|()| self.snapshot())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.session.state,
            active_kind: self.session.active_kind,
            active_item: self.active_item().cloned(),
            active_index: self.active_index(),
            elapsed: self.session.elapsed,
            duration: self.session.duration,
            generation: self.session.generation,
            playback_rate: self.session.playback_rate(),
            last_error: self.last_error.clone(),
        }
    }

    pub(crate) fn current_item(&self, kind: ContentKind) -> Option<MediaItem> {
        if self.session.active_kind != Some(kind) {
            return None;
        }
        self.queues.get(kind).current().cloned()
    }

    pub(crate) fn history(&self, kind: ContentKind) -> Vec<MediaItem> {
        self.played.get(kind).clone()
    }

    pub(crate) fn queue(&self, kind: ContentKind) -> MediaQueue {
        self.queues.get(kind).clone()
    }

    fn active_item(&self) -> Option<&MediaItem> {
        self.session
            .active_kind
            .and_then(|kind| self.queues.get(kind).current())
    }

    fn active_index(&self) -> Option<usize> {
        self.session
            .active_kind
            .and_then(|kind| self.queues.get(kind).current_index())
    }

    // ------------------------------------------------------------------
    // Caller operations
    // ------------------------------------------------------------------

    async fn activate(
        &mut self,
        kind: ContentKind,
        items: Vec<MediaItem>,
        starting_at: usize,
    ) -> Result<()> {
        self.queues.get_mut(kind).replace(items, starting_at)?;

        if self.session.active_kind.is_some_and(|active| active != kind) {
            info!(from = ?self.session.active_kind, to = %kind, "Switching content kind");
        }
        self.start_current(kind).await
    }

    async fn play(&mut self) -> Result<()> {
        match self.session.state {
            PlaybackState::Playing => Ok(()),
            PlaybackState::Loading => {
                if !self.session.play_when_ready {
                    self.session.play_when_ready = true;
                    self.live_resource()?.play().await?;
                }
                Ok(())
            }
            PlaybackState::Paused => {
                self.live_resource()?.resume().await?;
                self.session.state = PlaybackState::Playing;
                Ok(())
            }
            PlaybackState::Idle | PlaybackState::Failed(_) => {
                let kind = self
                    .session
                    .active_kind
                    .filter(|kind| self.queues.get(*kind).current().is_some())
                    .ok_or_else(|| PlaybackError::CommandDeclined("nothing to play".into()))?;
                debug!(%kind, "Restarting current item");
                self.start_current(kind).await
            }
        }
    }

    async fn pause(&mut self) -> Result<()> {
        match self.session.state {
            PlaybackState::Playing => {
                self.live_resource()?.pause().await?;
                self.session.state = PlaybackState::Paused;
                Ok(())
            }
            PlaybackState::Loading => {
                // Keep loading, but land in Paused once ready.
                self.session.play_when_ready = false;
                self.live_resource()?.pause().await?;
                Ok(())
            }
            PlaybackState::Paused => Ok(()),
            PlaybackState::Idle | PlaybackState::Failed(_) => Err(
                PlaybackError::CommandDeclined("nothing is playing".into()),
            ),
        }
    }

    async fn advance(&mut self) -> Result<()> {
        let kind = self.active_kind_or_decline()?;
        self.queues.get_mut(kind).advance()?;
        self.start_current(kind).await
    }

    async fn retreat(&mut self) -> Result<()> {
        let kind = self.active_kind_or_decline()?;
        self.queues.get_mut(kind).retreat()?;
        self.start_current(kind).await
    }

    async fn seek(&mut self, position: Duration) -> Result<()> {
        let target = self
            .session
            .clamp_position(position)
            .ok_or(PlaybackError::SeekUnavailable)?;
        self.live_resource()?.seek(target).await?;
        self.session.elapsed = target;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if self.live.is_none()
            && self.session.active_kind.is_none()
            && self.session.state == PlaybackState::Idle
        {
            return Ok(());
        }

        self.teardown().await;
        let generation = self.session.bump_generation();
        self.session.state = PlaybackState::Idle;
        self.session.active_kind = None;
        self.session.play_when_ready = true;
        self.session.reset_progress();
        self.last_error = None;
        info!(generation, "Playback stopped");
        Ok(())
    }

    async fn toggle_play_pause(&mut self, kind: ContentKind) -> Result<()> {
        if self.session.active_kind != Some(kind) {
            let history = self.played.get(kind).clone();
            if history.is_empty() {
                return Err(PlaybackError::CommandDeclined(format!(
                    "no {} history to resume",
                    kind
                )));
            }
            return self.activate(kind, history, 0).await;
        }

        match self.session.state {
            PlaybackState::Playing => self.pause().await,
            PlaybackState::Loading if self.session.play_when_ready => self.pause().await,
            _ => self.play().await,
        }
    }

    async fn play_from_history(&mut self, kind: ContentKind, index: usize) -> Result<()> {
        let history = self.played.get(kind).clone();
        self.activate(kind, history, index).await
    }

    async fn remote(&mut self, command: RemoteCommand) -> Result<()> {
        debug!(?command, "Remote command");
        match command {
            RemoteCommand::Play => self.play().await,
            RemoteCommand::Pause => self.pause().await,
            RemoteCommand::TogglePlayPause => {
                let kind = self.active_kind_or_decline()?;
                self.toggle_play_pause(kind).await
            }
            RemoteCommand::Next => self.advance().await,
            RemoteCommand::Previous => self.retreat().await,
            RemoteCommand::SeekTo(position) => self.seek(position).await,
        }
    }

    // ------------------------------------------------------------------
    // Resource events
    // ------------------------------------------------------------------

    /// Returns `true` when the event was a progress tick the session accepted.
    async fn on_resource_event(&mut self, generation: u64, event: ResourceEvent) -> bool {
        let live_generation = self.live.as_ref().map(|live| live.generation);
        if generation != self.session.generation || live_generation != Some(generation) {
            debug!(
                generation,
                current = self.session.generation,
                event = event.kind_name(),
                "Dropping stale resource event"
            );
            return false;
        }

        match event {
            ResourceEvent::Ready { duration } => self.on_ready(duration),
            ResourceEvent::Failed { message } => {
                if matches!(
                    self.session.state,
                    PlaybackState::Loading | PlaybackState::Playing | PlaybackState::Paused
                ) {
                    error!(generation, %message, "Playback resource failed");
                    self.fail(FailureReason::ResourceFailed, message).await;
                }
            }
            ResourceEvent::ReachedEnd => {
                if self.session.state.is_engaged() {
                    self.on_reached_end().await;
                }
            }
            ResourceEvent::Tick { elapsed, duration } => {
                if self.session.state.is_engaged() {
                    if let Some(duration) = normalize_duration(duration) {
                        self.session.duration = Some(duration);
                    }
                    self.session.elapsed = match self.session.duration {
                        Some(duration) => elapsed.min(duration),
                        None => elapsed,
                    };
                    return true;
                }
            }
        }
        false
    }

    fn on_ready(&mut self, duration: Option<f64>) {
        let duration = normalize_duration(duration);
        if self.session.state != PlaybackState::Loading {
            // Late duration report for an item that is already playing.
            if self.session.duration.is_none() && duration.is_some() {
                self.session.duration = duration;
            }
            return;
        }

        self.session.duration = duration;
        self.session.elapsed = Duration::ZERO;
        self.session.state = if self.session.play_when_ready {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        };
        debug!(
            generation = self.session.generation,
            state = ?self.session.state,
            duration = ?duration,
            "Resource ready"
        );
    }

    async fn on_reached_end(&mut self) {
        if !self.auto_advance {
            self.teardown().await;
            self.session.state = PlaybackState::Idle;
            if let Some(duration) = self.session.duration {
                self.session.elapsed = duration;
            }
            return;
        }

        if let Err(err) = self.advance().await {
            warn!(error = %err, "Auto-advance failed");
        }
    }

    // ------------------------------------------------------------------
    // Resource lifecycle
    // ------------------------------------------------------------------

    /// Tear down whatever is live and start the queue's current item for
    /// `kind` under a fresh generation.
    async fn start_current(&mut self, kind: ContentKind) -> Result<()> {
        self.teardown().await;
        let generation = self.session.bump_generation();
        self.session.active_kind = Some(kind);
        self.session.reset_progress();
        self.session.play_when_ready = true;
        self.last_error = None;

        let Some(item) = self.queues.get(kind).current().cloned() else {
            self.session.state = PlaybackState::Idle;
            return Err(PlaybackError::EmptyQueue);
        };

        if let Err(err) = validate_locator(item.locator()) {
            self.fail(FailureReason::InvalidLocator, err.to_string())
                .await;
            return Err(err);
        }

        self.record_history(&item).await;

        info!(
            generation,
            %kind,
            title = item.title(),
            locator = redact_locator(item.locator()),
            "Opening playback resource"
        );

        let sink = Arc::new(GenerationSink::new(generation, self.mailbox.clone()));
        let request = ResourceRequest::new(item.locator(), generation, item.title());
        let resource = match self.factory.open(request, sink.clone()) {
            Ok(resource) => resource,
            Err(err) => {
                let message = err.to_string();
                self.fail(FailureReason::ResourceUnavailable, message.clone())
                    .await;
                return Err(PlaybackError::ResourceUnavailable(message));
            }
        };

        let ticker = ProgressTicker::spawn(
            Arc::clone(&resource),
            sink.clone(),
            generation,
            self.progress_interval,
        );
        self.live = Some(LiveResource {
            generation,
            resource: Arc::clone(&resource),
            sink,
            ticker,
        });
        self.session.state = PlaybackState::Loading;

        if let Err(err) = resource.play().await {
            let message = err.to_string();
            self.fail(FailureReason::ResourceUnavailable, message.clone())
                .await;
            return Err(PlaybackError::ResourceUnavailable(message));
        }

        Ok(())
    }

    /// Release the live resource and park the session in `Failed`. No retry.
    async fn fail(&mut self, reason: FailureReason, message: String) {
        self.teardown().await;
        warn!(
            generation = self.session.generation,
            ?reason,
            %message,
            "Playback failed"
        );
        self.session.state = PlaybackState::Failed(reason);
        self.last_error = Some(message);
    }

    /// Detach, cancel and stop the live resource. Never creates one.
    async fn teardown(&mut self) {
        let Some(live) = self.live.take() else {
            return;
        };

        live.sink.detach();
        live.ticker.cancel();
        if let Err(err) = live.resource.stop().await {
            warn!(generation = live.generation, error = %err, "Failed to stop playback resource");
        }
        debug!(generation = live.generation, "Resource torn down");
    }

    pub(crate) async fn shutdown(&mut self) {
        let had_resource = self.live.is_some();
        self.teardown().await;
        if had_resource || self.session.active_kind.is_some() {
            self.now_playing.clear();
        }
    }

    // ------------------------------------------------------------------
    // History and notifications
    // ------------------------------------------------------------------

    async fn record_history(&mut self, item: &MediaItem) {
        if !self.recorded.insert(item.key()) {
            return;
        }

        let kind = item.kind();
        let list = self.played.get_mut(kind);
        list.push(item.clone());
        let position = list.len() - 1;

        match self.history_store.append_if_absent(item).await {
            Ok(added) => debug!(%kind, position, added, "Recorded play history"),
            Err(err) => warn!(%kind, error = %err, "Failed to persist play history"),
        }

        let _ = self.events.emit(PlaybackEvent::HistoryRecorded {
            kind,
            title: item.title().to_string(),
            position,
        });
    }

    fn observe(&self) -> Observed {
        Observed {
            state: self.session.state,
            active_kind: self.session.active_kind,
            item: self.active_item().map(MediaItem::key),
            index: self.active_index(),
            elapsed: self.session.elapsed,
            duration: self.session.duration,
        }
    }

    fn commit(&self, before: &Observed, tick_accepted: bool) {
        let changes = self.observe().changes_since(before);
        if changes.is_empty() {
            // Accepted ticks refresh now-playing even when nothing moved.
            if tick_accepted {
                self.now_playing.publish(&self.snapshot());
            }
            return;
        }

        let snapshot = self.snapshot();
        self.now_playing.publish(&snapshot);
        // No subscribers is not an error.
        let _ = self
            .events
            .emit(PlaybackEvent::SessionUpdated { snapshot, changes });
    }

    fn live_resource(&self) -> Result<Arc<dyn PlaybackResource>> {
        self.live
            .as_ref()
            .map(|live| Arc::clone(&live.resource))
            .ok_or_else(|| PlaybackError::CommandDeclined("no live resource".into()))
    }

    fn active_kind_or_decline(&self) -> Result<ContentKind> {
        self.session
            .active_kind
            .ok_or_else(|| PlaybackError::CommandDeclined("no content is active".into()))
    }
}

fn validate_locator(locator: &str) -> Result<()> {
    Url::parse(locator)
        .map(|_| ())
        .map_err(|err| PlaybackError::InvalidLocator(format!("{}: {}", redact_locator(locator), err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_must_be_absolute() {
        assert!(validate_locator("https://audio.example/p/1.m4a").is_ok());
        assert!(validate_locator("file:///music/chapter1.mp3").is_ok());
        assert!(matches!(
            validate_locator("relative/path.m4a"),
            Err(PlaybackError::InvalidLocator(_))
        ));
        assert!(matches!(
            validate_locator(""),
            Err(PlaybackError::InvalidLocator(_))
        ));
    }

    #[test]
    fn invalid_locator_message_is_redacted() {
        let err = validate_locator("no scheme?token=secret").unwrap_err();
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn observed_changes() {
        let before = Observed {
            state: PlaybackState::Loading,
            active_kind: Some(ContentKind::Track),
            item: None,
            index: Some(0),
            elapsed: Duration::ZERO,
            duration: None,
        };
        let after = Observed {
            state: PlaybackState::Playing,
            duration: Some(Duration::from_secs(30)),
            ..before.clone()
        };

        let changes = after.changes_since(&before);
        assert!(changes.state);
        assert!(changes.duration);
        assert!(!changes.elapsed);
        assert!(!changes.active_kind);
        assert!(!changes.active_item);
        assert!(before.changes_since(&before).is_empty());
    }
}
