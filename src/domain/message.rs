use crate::domain::validation::ValidationError;
use crate::domain::value::{MessageBody, RawAddress, UnixTimestamp};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A message flowing into the system via a transport.
///
/// Produced by a transport's inbound poll and handed to a listener; the
/// transport does not retain it after delivery. Sender and body are
/// preserved exactly as the backend supplied them.
pub struct InboundMessage {
    sender: RawAddress,
    body: MessageBody,
    received_at: UnixTimestamp,
}

impl InboundMessage {
    /// Assemble an inbound message from already-validated parts.
    pub fn new(sender: RawAddress, body: MessageBody, received_at: UnixTimestamp) -> Self {
        Self {
            sender,
            body,
            received_at,
        }
    }

    /// Address the message was sent from.
    pub fn sender(&self) -> &RawAddress {
        &self.sender
    }

    /// Message text.
    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    /// Arrival time reported by the backend.
    pub fn received_at(&self) -> UnixTimestamp {
        self.received_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A message flowing out of the system via a transport.
///
/// Supplied by the caller; not retained after the send attempt completes.
pub struct OutboundMessage {
    recipient: RawAddress,
    body: MessageBody,
}

impl OutboundMessage {
    /// Create an outbound message, validating recipient and body.
    pub fn new(
        recipient: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            recipient: RawAddress::new(recipient)?,
            body: MessageBody::new(body)?,
        })
    }

    /// Assemble an outbound message from already-validated parts.
    pub fn from_parts(recipient: RawAddress, body: MessageBody) -> Self {
        Self { recipient, body }
    }

    /// Address the message is sent to.
    pub fn recipient(&self) -> &RawAddress {
        &self.recipient
    }

    /// Message text.
    pub fn body(&self) -> &MessageBody {
        &self.body
    }
}
