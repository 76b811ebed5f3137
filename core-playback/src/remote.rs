//! Remote command pump.
//!
//! Drains the host's [`RemoteCommandSource`] into the controller mailbox and
//! reports each outcome back to the OS surface.

use crate::error::{PlaybackError, Result};
use crate::handle::WeakControllerHandle;
use crate::session::SessionSnapshot;
use bridge_traits::{RemoteCommandSource, RemoteCommandStatus};
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Map a controller result onto the status an OS remote surface understands.
pub fn status_for(result: &Result<SessionSnapshot>) -> RemoteCommandStatus {
    match result {
        Ok(_) => RemoteCommandStatus::Success,
        Err(err) if err.is_no_content() => RemoteCommandStatus::NoSuchContent,
        Err(_) => RemoteCommandStatus::CommandFailed,
    }
}

pub(crate) fn spawn_remote_pump(
    source: Arc<dyn RemoteCommandSource>,
    controller: WeakControllerHandle,
    stopped: CancellationToken,
) {
    tokio::spawn(async move {
        let mut commands = source.commands();

        loop {
            let command = tokio::select! {
                _ = stopped.cancelled() => break,
                next = commands.next() => match next {
                    Some(command) => command,
                    None => break,
                },
            };

            let Some(handle) = controller.upgrade() else {
                break;
            };
            let result = handle.handle_remote_command(command).await;
            drop(handle);

            let status = status_for(&result);
            if let Err(err) = &result {
                warn!(?command, ?status, error = %err, "Remote command not applied");
            }
            source.acknowledge(command, status);
        }

        debug!("Remote command pump finished");
    });
}
