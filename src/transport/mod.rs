//! Transport contract: the [`SmsTransport`] trait, capability flags, the
//! inbound listener hand-off, and the typed error kinds.

mod contract;
mod error;

pub use contract::{InboundListener, SmsTransport, TransportCapabilities};
pub use error::{BackendError, ConnectError, ReceiveError, SendError};
