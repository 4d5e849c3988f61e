//! Domain layer: strong types with validation and invariants (no I/O).

mod config;
mod message;
mod status;
mod validation;
mod value;

pub use config::{Credentials, TransportConfig};
pub use message::{InboundMessage, OutboundMessage};
pub use status::{StatusCell, TransportStatus};
pub use validation::ValidationError;
pub use value::{
    MessageBody, PhoneNumber, RawAddress, Secret, TransportId, UnixTimestamp, Username,
};
