//! Channel-backed remote command source.
//!
//! Desktop hosts forward media keys, tray menu actions or IPC requests through
//! a [`RemoteCommandSender`]; the playback core drains them as a stream.

use bridge_traits::remote::{RemoteCommand, RemoteCommandSource, RemoteCommandStatus};
use futures_util::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Cloneable sender half handed to whatever produces commands.
#[derive(Clone, Debug)]
pub struct RemoteCommandSender {
    tx: mpsc::UnboundedSender<RemoteCommand>,
}

impl RemoteCommandSender {
    /// Queue a command. Returns `false` once the source has been dropped.
    pub fn send(&self, command: RemoteCommand) -> bool {
        self.tx.send(command).is_ok()
    }
}

type Acknowledger = Box<dyn Fn(RemoteCommand, RemoteCommandStatus) + Send + Sync>;

pub struct ChannelRemoteCommandSource {
    rx: Mutex<Option<mpsc::UnboundedReceiver<RemoteCommand>>>,
    on_acknowledge: Option<Acknowledger>,
}

impl ChannelRemoteCommandSource {
    pub fn new() -> (Self, RemoteCommandSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Self {
            rx: Mutex::new(Some(rx)),
            on_acknowledge: None,
        };
        (source, RemoteCommandSender { tx })
    }

    /// Observe the outcome of every command, e.g. to flash a tray icon.
    pub fn with_acknowledger<F>(mut self, callback: F) -> Self
    where
        F: Fn(RemoteCommand, RemoteCommandStatus) + Send + Sync + 'static,
    {
        self.on_acknowledge = Some(Box::new(callback));
        self
    }
}

impl RemoteCommandSource for ChannelRemoteCommandSource {
    /// The receiver can only be taken once; later calls get an empty stream.
    fn commands(&self) -> BoxStream<'static, RemoteCommand> {
        match self.rx.lock().take() {
            Some(rx) => stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|command| (command, rx))
            })
            .boxed(),
            None => {
                warn!("Remote command stream already taken");
                stream::empty().boxed()
            }
        }
    }

    fn acknowledge(&self, command: RemoteCommand, status: RemoteCommandStatus) {
        debug!(?command, ?status, "Remote command acknowledged");
        if let Some(callback) = &self.on_acknowledge {
            callback(command, status);
        }
    }
}
