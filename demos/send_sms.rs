use std::io;

use smslink::{
    Credentials, OutboundMessage, SmsTransport, TransportConfig, WebAccountTransport,
};

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
    let recipient = std::env::var("SMSLINK_RECIPIENT").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "SMSLINK_RECIPIENT environment variable is required",
        )
    })?;
    let text = std::env::var("SMSLINK_MESSAGE")
        .unwrap_or_else(|_| "Hello from the smslink demo.".to_owned());

    let credentials = Credentials::new(username, secret)?;
    let transport =
        WebAccountTransport::builder(TransportConfig::new(credentials), base_url).build()?;

    transport.connect().await?;
    println!("{} is {}", transport.identifier(), transport.status());

    let message = OutboundMessage::new(recipient, text)?;
    transport.send(&message).await?;
    println!("message handed to backend");

    transport.disconnect().await;
    Ok(())
}
