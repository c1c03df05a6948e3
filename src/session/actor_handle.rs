//! SessionActorHandle - public API for the SessionActor
//!
//! Fire-and-forget methods for notifications and edits, async methods with
//! oneshot replies for apply and snapshot.

use tokio::sync::{mpsc, oneshot};

use super::commands::{ApplyOutcome, SessionCommand};
use super::store::{DeviceInfo, SessionSnapshot};
use crate::params::{Nudge, ParamKey};

/// Handle for interacting with the SessionActor
///
/// Cheap to clone; every clone feeds the same actor.
#[derive(Clone)]
pub struct SessionActorHandle {
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionActorHandle {
    pub fn new(cmd_tx: mpsc::UnboundedSender<SessionCommand>) -> Self {
        Self { cmd_tx }
    }

    // =========================================================================
    // Hot path methods (fire-and-forget, no await)
    // =========================================================================

    /// Push one BLE-MIDI notification payload
    pub fn notify(&self, packet: Vec<u8>) {
        let _ = self.cmd_tx.send(SessionCommand::Notification(packet));
    }

    /// Set a parameter value (clamped on apply)
    pub fn set_param(&self, key: ParamKey, value: i32) {
        let _ = self.cmd_tx.send(SessionCommand::SetParam { key, value });
    }

    /// Move a parameter one step up or down
    pub fn nudge_param(&self, key: ParamKey, direction: Nudge) {
        let _ = self
            .cmd_tx
            .send(SessionCommand::NudgeParam { key, direction });
    }

    /// Report that the transport connected to `device`
    pub fn connected(&self, device: DeviceInfo) {
        let _ = self.cmd_tx.send(SessionCommand::Connected(device));
    }

    /// Report that the transport lost the device
    pub fn disconnected(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Disconnected);
    }

    // =========================================================================
    // Request-response methods
    // =========================================================================

    /// Apply the current parameters. See `SessionCommand::Apply`.
    pub async fn apply(&self, force: bool) -> ApplyOutcome {
        let (response_tx, response_rx) = oneshot::channel();
        let closed = || ApplyOutcome::Rejected {
            reason: "session closed".to_string(),
        };

        if self
            .cmd_tx
            .send(SessionCommand::Apply {
                force,
                response: response_tx,
            })
            .is_err()
        {
            return closed();
        }

        response_rx.await.unwrap_or_else(|_| closed())
    }

    /// Copy of the session state, or None if the actor has stopped
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let (response_tx, response_rx) = oneshot::channel();
        let cmd = SessionCommand::Snapshot {
            response: response_tx,
        };

        if self.cmd_tx.send(cmd).is_err() {
            return None;
        }

        response_rx.await.ok()
    }

    // =========================================================================
    // Lifecycle methods
    // =========================================================================

    /// Returns false once the actor's channel is closed
    pub fn is_alive(&self) -> bool {
        !self.cmd_tx.is_closed()
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<SessionActorHandle>();
    }

    #[tokio::test]
    async fn test_is_alive_when_channel_open() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = SessionActorHandle::new(tx);
        assert!(handle.is_alive());
    }

    #[tokio::test]
    async fn test_is_alive_when_channel_closed() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let handle = SessionActorHandle::new(tx);
        assert!(!handle.is_alive());
        assert!(handle.snapshot().await.is_none());
    }
}
