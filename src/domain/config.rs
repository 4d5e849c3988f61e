use crate::domain::validation::ValidationError;
use crate::domain::value::{RawAddress, Secret, Username};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Authentication material for one backend account.
///
/// Immutable once a transport is constructed; supplied by external
/// configuration before `connect` is called.
pub struct Credentials {
    username: Username,
    secret: Secret,
    sender: Option<RawAddress>,
}

impl Credentials {
    /// Create validated credentials without a sender address.
    pub fn new(
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            username: Username::new(username)?,
            secret: Secret::new(secret)?,
            sender: None,
        })
    }

    /// Attach the address to present as the sender on outgoing messages.
    pub fn with_sender(mut self, sender: RawAddress) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Account name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Account secret.
    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    /// Sender address for outgoing messages, when configured.
    pub fn sender(&self) -> Option<&RawAddress> {
        self.sender.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Per-transport configuration supplied by the hosting application.
///
/// The use flags describe how the owner intends to employ the transport;
/// the transport itself treats them as read-only facts and does not
/// enforce them.
pub struct TransportConfig {
    pub credentials: Credentials,
    pub use_for_sending: bool,
    pub use_for_receiving: bool,
}

impl TransportConfig {
    /// Configuration with both use flags enabled.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            use_for_sending: true,
            use_for_receiving: true,
        }
    }
}
