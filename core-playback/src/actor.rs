//! Serialized entry point.
//!
//! Every caller request, resource event, progress tick and remote command is a
//! message on one ordered mailbox drained by a single task that owns the
//! [`SessionController`]. No controller state is shared between tasks.

use crate::controller::SessionController;
use crate::error::Result;
use crate::media::{ContentKind, MediaItem};
use crate::queue::MediaQueue;
use crate::session::SessionSnapshot;
use bridge_traits::{RemoteCommand, ResourceEvent, ResourceEventSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub(crate) type Reply<T> = oneshot::Sender<T>;

/// State-changing operations applied by the controller.
#[derive(Debug)]
pub(crate) enum Operation {
    Activate {
        kind: ContentKind,
        items: Vec<MediaItem>,
        starting_at: usize,
    },
    Play,
    Pause,
    Advance,
    Retreat,
    Seek(Duration),
    Stop,
    TogglePlayPause(ContentKind),
    PlayFromHistory {
        kind: ContentKind,
        index: usize,
    },
    Remote(RemoteCommand),
    Resource {
        generation: u64,
        event: ResourceEvent,
    },
}

impl Operation {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Operation::Activate { .. } => "activate",
            Operation::Play => "play",
            Operation::Pause => "pause",
            Operation::Advance => "advance",
            Operation::Retreat => "retreat",
            Operation::Seek(_) => "seek",
            Operation::Stop => "stop",
            Operation::TogglePlayPause(_) => "toggle_play_pause",
            Operation::PlayFromHistory { .. } => "play_from_history",
            Operation::Remote(_) => "remote",
            Operation::Resource { .. } => "resource_event",
        }
    }
}

pub(crate) enum Command {
    Apply {
        operation: Operation,
        reply: Option<Reply<Result<SessionSnapshot>>>,
    },
    Snapshot(Reply<SessionSnapshot>),
    CurrentItem(ContentKind, Reply<Option<MediaItem>>),
    History(ContentKind, Reply<Vec<MediaItem>>),
    Queue(ContentKind, Reply<MediaQueue>),
    Shutdown(Reply<()>),
}

/// Resource event sink bound to one generation.
///
/// Holds only a weak reference to the mailbox so outstanding resources never
/// keep the controller alive. Once detached, emitted events are discarded.
pub(crate) struct GenerationSink {
    generation: u64,
    mailbox: mpsc::WeakUnboundedSender<Command>,
    attached: AtomicBool,
}

impl GenerationSink {
    pub(crate) fn new(generation: u64, mailbox: mpsc::WeakUnboundedSender<Command>) -> Self {
        Self {
            generation,
            mailbox,
            attached: AtomicBool::new(true),
        }
    }

    pub(crate) fn detach(&self) {
        self.attached.store(false, Ordering::Release);
    }
}

impl ResourceEventSink for GenerationSink {
    fn emit(&self, event: ResourceEvent) {
        if !self.attached.load(Ordering::Acquire) {
            return;
        }
        let Some(mailbox) = self.mailbox.upgrade() else {
            return;
        };
        let _ = mailbox.send(Command::Apply {
            operation: Operation::Resource {
                generation: self.generation,
                event,
            },
            reply: None,
        });
    }
}

/// Drain the mailbox until every handle is dropped or shutdown is requested.
pub(crate) async fn run(
    mut controller: SessionController,
    mut mailbox: mpsc::UnboundedReceiver<Command>,
    stopped: CancellationToken,
) {
    controller.seed_history().await;
    info!("Playback controller started");

    while let Some(command) = mailbox.recv().await {
        match command {
            Command::Apply { operation, reply } => {
                let result = controller.apply(operation).await;
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(controller.snapshot());
            }
            Command::CurrentItem(kind, reply) => {
                let _ = reply.send(controller.current_item(kind));
            }
            Command::History(kind, reply) => {
                let _ = reply.send(controller.history(kind));
            }
            Command::Queue(kind, reply) => {
                let _ = reply.send(controller.queue(kind));
            }
            Command::Shutdown(reply) => {
                controller.shutdown().await;
                let _ = reply.send(());
                stopped.cancel();
                debug!("Playback controller shut down on request");
                return;
            }
        }
    }

    controller.shutdown().await;
    stopped.cancel();
    debug!("Playback controller shut down, all handles dropped");
}
