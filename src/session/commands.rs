//! Command enum for the session actor
//!
//! Hot-path commands (notifications, edits) are fire-and-forget. Queries and
//! apply requests carry a oneshot channel for the reply.

use tokio::sync::oneshot;

use super::store::{DeviceInfo, SessionSnapshot};
use crate::params::{Nudge, ParamKey, ParamValues};

/// Outcome of an apply request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Nothing differed from the last-sent snapshot; nothing encoded
    Unchanged,
    /// Encoded and committed; no device connected so nothing was written
    CommittedLocally { values: ParamValues },
    /// Encoded, committed and written to the transport
    Sent { values: ParamValues },
    /// Encoded and committed, but the transport write failed
    SendFailed { values: ParamValues, reason: String },
    /// Encoding failed; nothing committed
    Rejected { reason: String },
}

impl ApplyOutcome {
    /// Values committed as last sent, if any
    pub fn committed(&self) -> Option<ParamValues> {
        match self {
            ApplyOutcome::CommittedLocally { values }
            | ApplyOutcome::Sent { values }
            | ApplyOutcome::SendFailed { values, .. } => Some(*values),
            ApplyOutcome::Unchanged | ApplyOutcome::Rejected { .. } => None,
        }
    }
}

/// Commands for the session actor
#[derive(Debug)]
pub enum SessionCommand {
    // -------------------------------------------------------------------------
    // Hot path commands (no response - fire and forget)
    // -------------------------------------------------------------------------
    /// Raw BLE-MIDI notification payload from the transport
    Notification(Vec<u8>),

    /// Set a parameter value (unclamped until apply)
    SetParam { key: ParamKey, value: i32 },

    /// Move a parameter one step
    NudgeParam { key: ParamKey, direction: Nudge },

    /// The transport connected to a device
    Connected(DeviceInfo),

    /// The transport lost the device
    Disconnected,

    // -------------------------------------------------------------------------
    // Request-response commands
    // -------------------------------------------------------------------------
    /// Validate, encode, commit and send the parameters.
    ///
    /// Without `force`, nothing happens when the parameters equal the
    /// last-sent snapshot.
    Apply {
        force: bool,
        response: oneshot::Sender<ApplyOutcome>,
    },

    /// Copy of the current session state
    Snapshot {
        response: oneshot::Sender<SessionSnapshot>,
    },

    /// Stop the actor
    Shutdown,
}
