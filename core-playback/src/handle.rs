//! Public entry point of the playback core.
//!
//! [`ControllerHandle::spawn`] starts the controller task and returns a
//! cheaply cloneable handle. Every method enqueues a command on the ordered
//! mailbox and waits for the controller's reply, so callers observe the same
//! serialized order as resource events and remote commands.
//!
//! The controller stops once every handle is dropped or [`shutdown`] is
//! called. Calls made afterwards fail with [`PlaybackError::ControllerClosed`].
//!
//! [`shutdown`]: ControllerHandle::shutdown

use crate::actor::{self, Command, Operation, Reply};
use crate::controller::SessionController;
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::history::{InMemoryHistoryStore, PlayHistoryStore, SettingsHistoryStore};
use crate::media::{ContentKind, MediaItem};
use crate::queue::MediaQueue;
use crate::remote::spawn_remote_pump;
use crate::session::SessionSnapshot;
use bridge_traits::{RemoteCommand, ResourceEvent};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<Command>,
    events: EventBus<PlaybackEvent>,
    stopped: CancellationToken,
}

/// Handle that does not keep the controller alive.
#[derive(Clone)]
pub struct WeakControllerHandle {
    tx: mpsc::WeakUnboundedSender<Command>,
    events: EventBus<PlaybackEvent>,
    stopped: CancellationToken,
}

impl WeakControllerHandle {
    pub fn upgrade(&self) -> Option<ControllerHandle> {
        self.tx.upgrade().map(|tx| ControllerHandle {
            tx,
            events: self.events.clone(),
            stopped: self.stopped.clone(),
        })
    }
}

impl ControllerHandle {
    /// Start the controller on the current tokio runtime.
    ///
    /// History is persisted through the configured `SettingsStore` when
    /// `persist_history` is enabled and kept in memory otherwise.
    pub fn spawn(config: CoreConfig) -> Result<Self> {
        let history: Arc<dyn PlayHistoryStore> =
            match (config.features.persist_history, &config.settings_store) {
                (true, Some(store)) => Arc::new(SettingsHistoryStore::new(
                    Arc::clone(store),
                    config.history_keys.clone(),
                )),
                _ => Arc::new(InMemoryHistoryStore::new()),
            };
        Self::spawn_with_history(config, history)
    }

    /// Start the controller with an explicit history store.
    pub fn spawn_with_history(
        config: CoreConfig,
        history: Arc<dyn PlayHistoryStore>,
    ) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|err| {
            PlaybackError::Config(core_runtime::Error::Internal(format!(
                "playback controller needs a tokio runtime: {}",
                err
            )))
        })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let events = EventBus::new(config.event_buffer_size);
        let stopped = CancellationToken::new();

        let controller =
            SessionController::new(&config, history, events.clone(), tx.downgrade());
        runtime.spawn(actor::run(controller, rx, stopped.clone()));

        let handle = Self {
            tx,
            events,
            stopped,
        };

        if let Some(source) = config.remote_command_source.clone() {
            spawn_remote_pump(source, handle.downgrade(), handle.stopped.clone());
        }

        info!(
            progress_interval_ms = config.progress_interval.as_millis() as u64,
            publishers = config.now_playing_publishers.len(),
            auto_advance = config.features.auto_advance,
            persist_history = config.features.persist_history,
            "Playback controller spawned"
        );
        Ok(handle)
    }

    pub fn downgrade(&self) -> WeakControllerHandle {
        WeakControllerHandle {
            tx: self.tx.downgrade(),
            events: self.events.clone(),
            stopped: self.stopped.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Replace the queue for `kind` and start `items[starting_at]`.
    pub async fn activate(
        &self,
        kind: ContentKind,
        items: Vec<MediaItem>,
        starting_at: usize,
    ) -> Result<SessionSnapshot> {
        self.apply(Operation::Activate {
            kind,
            items,
            starting_at,
        })
        .await
    }

    pub async fn play(&self) -> Result<SessionSnapshot> {
        self.apply(Operation::Play).await
    }

    pub async fn pause(&self) -> Result<SessionSnapshot> {
        self.apply(Operation::Pause).await
    }

    pub async fn advance(&self) -> Result<SessionSnapshot> {
        self.apply(Operation::Advance).await
    }

    pub async fn retreat(&self) -> Result<SessionSnapshot> {
        self.apply(Operation::Retreat).await
    }

    /// Seek within the active item. Positions past the end are clamped.
    pub async fn seek(&self, position: Duration) -> Result<SessionSnapshot> {
        self.apply(Operation::Seek(position)).await
    }

    pub async fn stop(&self) -> Result<SessionSnapshot> {
        self.apply(Operation::Stop).await
    }

    /// Pause or resume `kind`, starting its history from the top when another
    /// kind is active.
    pub async fn toggle_play_pause(&self, kind: ContentKind) -> Result<SessionSnapshot> {
        self.apply(Operation::TogglePlayPause(kind)).await
    }

    /// Activate the "previously played" listing of `kind` at `index`.
    pub async fn play_from_history(
        &self,
        kind: ContentKind,
        index: usize,
    ) -> Result<SessionSnapshot> {
        self.apply(Operation::PlayFromHistory { kind, index }).await
    }

    pub async fn handle_remote_command(&self, command: RemoteCommand) -> Result<SessionSnapshot> {
        self.apply(Operation::Remote(command)).await
    }

    /// Feed a resource event tagged with the generation it was produced for.
    ///
    /// Resources normally report through the sink they were opened with. This
    /// is for hosts that route renderer callbacks themselves.
    pub async fn deliver_resource_event(
        &self,
        generation: u64,
        event: ResourceEvent,
    ) -> Result<SessionSnapshot> {
        self.apply(Operation::Resource { generation, event }).await
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.query(Command::Snapshot).await
    }

    /// The active item of `kind`, or `None` when another kind is active.
    pub async fn current_item(&self, kind: ContentKind) -> Result<Option<MediaItem>> {
        self.query(|reply| Command::CurrentItem(kind, reply)).await
    }

    pub async fn history(&self, kind: ContentKind) -> Result<Vec<MediaItem>> {
        self.query(|reply| Command::History(kind, reply)).await
    }

    pub async fn queue(&self, kind: ContentKind) -> Result<MediaQueue> {
        self.query(|reply| Command::Queue(kind, reply)).await
    }

    // ------------------------------------------------------------------
    // Events and lifecycle
    // ------------------------------------------------------------------

    pub fn subscribe(&self) -> EventStream<PlaybackEvent> {
        self.events.stream()
    }

    pub fn subscribe_raw(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.stopped.is_cancelled()
    }

    /// Resolves once the controller task has exited.
    pub async fn closed(&self) {
        self.stopped.cancelled().await
    }

    /// Tear down the live resource and stop the controller task.
    pub async fn shutdown(&self) -> Result<()> {
        match self.query(Command::Shutdown).await {
            Ok(()) | Err(PlaybackError::ControllerClosed) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn apply(&self, operation: Operation) -> Result<SessionSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Apply {
                operation,
                reply: Some(reply),
            })
            .map_err(|_| PlaybackError::ControllerClosed)?;
        rx.await.map_err(|_| PlaybackError::ControllerClosed)?
    }

    async fn query<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .map_err(|_| PlaybackError::ControllerClosed)?;
        rx.await.map_err(|_| PlaybackError::ControllerClosed)
    }
}

impl std::fmt::Debug for ControllerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerHandle")
            .field("closed", &self.is_closed())
            .field("subscribers", &self.events.subscriber_count())
            .finish()
    }
}
