use async_trait::async_trait;

use crate::domain::{InboundMessage, OutboundMessage, RawAddress, TransportId, TransportStatus};
use crate::transport::error::{ConnectError, ReceiveError, SendError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Static capability facts of a backend.
///
/// These are properties of the backend technology, not runtime-negotiated;
/// a given implementation always returns the same value.
pub struct TransportCapabilities {
    /// The backend can carry binary payloads.
    pub binary_sending: bool,
    /// The backend can send extended (UCS-2, non-ASCII) character sets.
    pub ucs2_sending: bool,
    /// The backend can receive messages at all.
    pub receive: bool,
    /// Traffic between this crate and the backend is encrypted.
    pub encrypted: bool,
}

/// Receives each inbound message surfaced by a poll cycle.
///
/// [`SmsTransport::poll_into`] invokes this at most once per distinct
/// inbound message per poll cycle, in the order the backend returned them.
pub trait InboundListener: Send + Sync {
    fn on_message(&self, transport: &TransportId, message: InboundMessage);
}

#[async_trait]
/// One addressable SMS-capable endpoint with a connect/disconnect lifecycle
/// and send/receive operations, independent of the backend technology.
///
/// A transport owns exactly one logical session. Lifecycle operations are
/// meant to be driven from a single management task; [`status`] may be read
/// concurrently from any thread. The transport performs no retries and no
/// timeouts of its own; both belong to the caller.
///
/// State machine: `Disconnected --connect ok--> Connected`,
/// `Disconnected --connect err--> Failed`,
/// `Connected --disconnect--> Disconnected`,
/// `Failed --connect retry--> Connected | Failed`.
///
/// [`status`]: SmsTransport::status
pub trait SmsTransport: Send + Sync {
    /// Stable identifier, unique per configured account.
    fn identifier(&self) -> &TransportId;

    /// Address presented as the sender on outgoing messages, when configured.
    fn sender_address(&self) -> Option<&RawAddress>;

    /// Static capability facts of the underlying backend.
    fn capabilities(&self) -> TransportCapabilities;

    /// Whether the owner configured this transport for sending.
    fn use_for_sending(&self) -> bool;

    /// Whether the owner configured this transport for receiving.
    fn use_for_receiving(&self) -> bool;

    /// Current lifecycle state. Never `Connecting` between calls.
    fn status(&self) -> TransportStatus;

    /// Establish a session with the backend.
    ///
    /// Valid only while `Disconnected` or `Failed`; a violation is
    /// [`ConnectError::InvalidState`]. Terminates in `Connected` or
    /// `Failed`; on failure the error carries a human-readable cause.
    async fn connect(&self) -> Result<(), ConnectError>;

    /// Release the session (best-effort). Idempotent; always ends
    /// `Disconnected` regardless of the prior state.
    async fn disconnect(&self);

    /// Query the backend for newly available messages.
    ///
    /// Valid only while `Connected`. Each backend record is translated into
    /// an [`InboundMessage`]; a malformed record is a
    /// [`ReceiveError::Translation`], never silent corruption. Dispatching
    /// the returned messages is the caller's responsibility (see
    /// [`poll_into`]); the transport does not retry delivery to a listener.
    ///
    /// [`poll_into`]: SmsTransport::poll_into
    async fn poll_inbound(&self) -> Result<Vec<InboundMessage>, ReceiveError>;

    /// Hand one outbound message to the backend.
    ///
    /// Valid only while `Connected`. Backend rejection is surfaced as a
    /// [`SendError`] with the backend diagnostic preserved; no retry is
    /// performed here, retry policy belongs to the caller.
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError>;

    /// Poll and dispatch every surfaced message to `listener`, in backend
    /// order, each at most once. Returns the number dispatched.
    async fn poll_into(&self, listener: &dyn InboundListener) -> Result<usize, ReceiveError> {
        let messages = self.poll_inbound().await?;
        let count = messages.len();
        for message in messages {
            listener.on_message(self.identifier(), message);
        }
        Ok(count)
    }
}
