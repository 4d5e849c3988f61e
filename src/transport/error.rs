use std::error::Error as StdError;

use crate::domain::{TransportStatus, ValidationError};

#[derive(Debug, thiserror::Error)]
/// Diagnostic reported by a backend collaborator.
///
/// Backends are opaque to this crate; the only requirement is that their
/// failures map into one of these shapes with the original diagnostic
/// preserved rather than discarded.
pub enum BackendError {
    /// The backend could not be reached (DNS, TLS, timeouts, I/O).
    #[error("backend unreachable: {0}")]
    Unreachable(#[source] Box<dyn StdError + Send + Sync>),

    /// The backend answered but refused the operation (bad credentials,
    /// quota, invalid recipient, service-side error).
    #[error("backend refused: {reason}")]
    Refused { reason: String },

    /// The backend answered with something this crate could not interpret.
    #[error("malformed backend response: {0}")]
    Malformed(#[source] Box<dyn StdError + Send + Sync>),
}

#[derive(Debug, thiserror::Error)]
/// Failure to establish a session with the backend.
///
/// Recoverable: the transport stays `Failed` and a later `connect` may
/// succeed.
pub enum ConnectError {
    /// `connect` was called while the transport was connected or a connect
    /// attempt was already in flight.
    #[error("cannot connect while {status}")]
    InvalidState { status: TransportStatus },

    /// The backend rejected the session or could not be reached.
    #[error("session establishment failed: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, thiserror::Error)]
/// Failure while polling the backend for inbound messages.
pub enum ReceiveError {
    /// `poll_inbound` was called while the transport held no session.
    #[error("transport is not connected ({status})")]
    NotConnected { status: TransportStatus },

    /// The backend rejected the query or could not be reached.
    #[error("inbound query failed: {0}")]
    Backend(#[from] BackendError),

    /// A backend record could not be translated into an [`InboundMessage`]
    /// (malformed sender or body). Surfaced instead of silently corrupting
    /// or dropping data.
    ///
    /// [`InboundMessage`]: crate::domain::InboundMessage
    #[error("inbound message translation failed: {0}")]
    Translation(#[from] ValidationError),
}

#[derive(Debug, thiserror::Error)]
/// Failure to hand one outbound message to the backend.
pub enum SendError {
    /// `send` was called while the transport held no session.
    #[error("transport is not connected ({status})")]
    NotConnected { status: TransportStatus },

    /// The backend rejected the message or could not be reached.
    #[error("delivery failed: {0}")]
    Backend(#[from] BackendError),
}
