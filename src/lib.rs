//! Pluggable SMS transport abstraction with a typed connection lifecycle.
//!
//! An [`SmsTransport`] represents one addressable SMS-capable endpoint
//! (an account on a web service, or a modem) behind a uniform contract:
//! a connect/disconnect lifecycle, inbound polling, and outbound
//! delivery, with failures surfaced as typed errors instead of flags.
//! The design follows a domain layer of strong types, a transport
//! contract with typed errors, and a reference backend for account-based
//! web services.
//!
//! ```rust,no_run
//! use smslink::{
//!     Credentials, OutboundMessage, SmsTransport, TransportConfig, WebAccountTransport,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::new("alice", "hunter2")?;
//!     let config = TransportConfig::new(credentials);
//!     let transport =
//!         WebAccountTransport::builder(config, "https://sms.example.net/api").build()?;
//!
//!     transport.connect().await?;
//!     let message = OutboundMessage::new("+15551234567", "hello")?;
//!     transport.send(&message).await?;
//!
//!     for inbound in transport.poll_inbound().await? {
//!         println!("{}: {}", inbound.sender().raw(), inbound.body().as_str());
//!     }
//!     transport.disconnect().await;
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod domain;
pub mod transport;
pub mod webaccount;

pub use domain::{
    Credentials, InboundMessage, MessageBody, OutboundMessage, PhoneNumber, RawAddress, Secret,
    StatusCell, TransportConfig, TransportId, TransportStatus, UnixTimestamp, Username,
    ValidationError,
};
pub use transport::{
    BackendError, ConnectError, InboundListener, ReceiveError, SendError, SmsTransport,
    TransportCapabilities,
};
pub use webaccount::{BuildError, WebAccountTransport, WebAccountTransportBuilder};
