use std::io;

use smslink::{
    Credentials, InboundListener, InboundMessage, SmsTransport, TransportConfig, TransportId,
    WebAccountTransport,
};

struct PrintingListener;

impl InboundListener for PrintingListener {
    fn on_message(&self, transport: &TransportId, message: InboundMessage) {
        println!(
            "[{transport}] {} at {}: {}",
            message.sender().raw(),
            message.received_at().value(),
            message.body().as_str()
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = std::env::var("SMSLINK_BASE_URL").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "SMSLINK_BASE_URL environment variable is required",
        )
    })?;
    let username = std::env::var("SMSLINK_USERNAME").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "SMSLINK_USERNAME environment variable is required",
        )
    })?;
    let secret = std::env::var("SMSLINK_SECRET").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "SMSLINK_SECRET environment variable is required",
        )
    })?;

    let credentials = Credentials::new(username, secret)?;
    let transport =
        WebAccountTransport::builder(TransportConfig::new(credentials), base_url).build()?;

    transport.connect().await?;
    let count = transport.poll_into(&PrintingListener).await?;
    println!("dispatched {count} inbound message(s)");

    transport.disconnect().await;
    Ok(())
}
