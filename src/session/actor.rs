//! SessionActor - single consumer for everything that touches a session
//!
//! Notifications from the transport and requests from the user arrive on one
//! channel and are handled strictly in order, so the session needs no locks.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace};

use super::actor_handle::SessionActorHandle;
use super::commands::{ApplyOutcome, SessionCommand};
use super::store::Session;
use crate::blemidi::format_hex;
use crate::transport::Transport;

/// Actor owning a `Session` and the outbound transport
///
/// ```text
///  transport ──notify──┐
///                      ▼
///  REPL ──commands──► command_rx ──► SessionActor { session } ──write──► transport
/// ```
pub struct SessionActor {
    session: Session,
    transport: Arc<dyn Transport>,
    command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    /// Notifications processed, for the shutdown log
    notification_count: u64,
}

impl SessionActor {
    /// Spawn the actor on the current tokio runtime and return its handle
    pub fn spawn(session: Session, transport: Arc<dyn Transport>) -> SessionActorHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let actor = SessionActor {
            session,
            transport,
            command_rx: cmd_rx,
            notification_count: 0,
        };

        tokio::spawn(actor.run());
        info!("SessionActor spawned");

        SessionActorHandle::new(cmd_tx)
    }

    async fn run(mut self) {
        debug!(transport = self.transport.name(), "SessionActor run loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            trace!(?cmd, "Processing command");

            match cmd {
                SessionCommand::Notification(packet) => {
                    self.notification_count += 1;
                    self.session.on_notification(&packet);
                }
                SessionCommand::SetParam { key, value } => {
                    self.session.set_param(key, value);
                    debug!(param = %key, value, "Parameter set");
                }
                SessionCommand::NudgeParam { key, direction } => {
                    let value = self.session.nudge_param(key, direction);
                    debug!(param = %key, ?direction, value, "Parameter nudged");
                }
                SessionCommand::Connected(device) => {
                    self.session.connect(device);
                }
                SessionCommand::Disconnected => {
                    self.session.disconnect();
                }
                SessionCommand::Apply { force, response } => {
                    let outcome = self.handle_apply(force).await;
                    let _ = response.send(outcome);
                }
                SessionCommand::Snapshot { response } => {
                    let _ = response.send(self.session.snapshot());
                }
                SessionCommand::Shutdown => {
                    info!("SessionActor received shutdown command");
                    break;
                }
            }
        }

        info!(
            notifications = self.notification_count,
            "SessionActor run loop terminated"
        );
    }

    /// Validate, gate on changes, encode and commit, then write.
    ///
    /// The snapshot is committed before the write; a failed write is
    /// reported but leaves the session as committed.
    async fn handle_apply(&mut self, force: bool) -> ApplyOutcome {
        let applied = match self.session.apply(force) {
            Ok(Some(applied)) => applied,
            Ok(None) => {
                debug!("Parameters unchanged, nothing to send");
                return ApplyOutcome::Unchanged;
            }
            Err(e) => {
                error!("Failed to encode MixyParams: {}", e);
                return ApplyOutcome::Rejected {
                    reason: e.to_string(),
                };
            }
        };
        let values = applied.values;

        if !self.session.is_connected() {
            debug!("No device connected, parameters committed locally");
            return ApplyOutcome::CommittedLocally { values };
        }

        match self.transport.write(&applied.buffer).await {
            Ok(()) => {
                debug!(
                    transport = self.transport.name(),
                    buffer = %format_hex(&applied.buffer),
                    "Parameters written"
                );
                ApplyOutcome::Sent { values }
            }
            Err(e) => {
                error!("Failed to send MixyParams: {}", e);
                ApplyOutcome::SendFailed {
                    values,
                    reason: e.to_string(),
                }
            }
        }
    }
}
