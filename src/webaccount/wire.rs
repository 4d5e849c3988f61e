//! Wire format of the account service: form encoding and JSON envelopes.

use serde::Deserialize;

use crate::domain::{
    Credentials, InboundMessage, MessageBody, OutboundMessage, RawAddress, Secret, UnixTimestamp,
    Username, ValidationError,
};

const TOKEN_FIELD: &str = "token";
const FROM_FIELD: &str = "from";

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response is missing required field: {field}")]
    MissingField { field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub status: Status,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboxResponse {
    pub status: Status,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub messages: Vec<InboundRecord>,
}

#[derive(Debug, Clone, Deserialize)]
/// One inbound message in the service's native schema.
pub struct InboundRecord {
    pub from: String,
    pub text: String,
    pub received_at: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendReceipt {
    pub status: Status,
    #[serde(default)]
    pub status_text: Option<String>,
}

pub fn encode_auth_form(credentials: &Credentials) -> Vec<(String, String)> {
    vec![
        (
            Username::FIELD.to_owned(),
            credentials.username().as_str().to_owned(),
        ),
        (
            Secret::FIELD.to_owned(),
            credentials.secret().as_str().to_owned(),
        ),
    ]
}

pub fn encode_inbox_form(token: &str) -> Vec<(String, String)> {
    vec![(TOKEN_FIELD.to_owned(), token.to_owned())]
}

pub fn encode_send_form(
    token: &str,
    sender: Option<&RawAddress>,
    message: &OutboundMessage,
) -> Vec<(String, String)> {
    let mut params = vec![
        (TOKEN_FIELD.to_owned(), token.to_owned()),
        (
            RawAddress::FIELD.to_owned(),
            message.recipient().raw().to_owned(),
        ),
        (
            MessageBody::FIELD.to_owned(),
            message.body().as_str().to_owned(),
        ),
    ];
    if let Some(from) = sender {
        params.push((FROM_FIELD.to_owned(), from.raw().to_owned()));
    }
    params
}

pub fn decode_auth_response(json: &str) -> Result<AuthResponse, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn decode_inbox_response(json: &str) -> Result<InboxResponse, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn decode_send_receipt(json: &str) -> Result<SendReceipt, WireError> {
    Ok(serde_json::from_str(json)?)
}

/// Translate a native record into the generic [`InboundMessage`].
///
/// Sender and body are carried over exactly as received; a record with an
/// empty sender or body fails validation instead of being dropped.
pub fn translate_inbound(record: InboundRecord) -> Result<InboundMessage, ValidationError> {
    let sender = RawAddress::new(record.from)?;
    let body = MessageBody::new(record.text)?;
    Ok(InboundMessage::new(
        sender,
        body,
        UnixTimestamp::new(record.received_at),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_auth_form_carries_both_credentials() {
        let credentials = Credentials::new("alice", "hunter2").unwrap();
        assert_eq!(
            encode_auth_form(&credentials),
            vec![
                ("username".to_owned(), "alice".to_owned()),
                ("secret".to_owned(), "hunter2".to_owned()),
            ]
        );
    }

    #[test]
    fn encode_send_form_includes_sender_only_when_configured() {
        let message = OutboundMessage::new("+15551234567", "hello").unwrap();

        let params = encode_send_form("tok", None, &message);
        assert_eq!(
            params,
            vec![
                ("token".to_owned(), "tok".to_owned()),
                ("to".to_owned(), "+15551234567".to_owned()),
                ("text".to_owned(), "hello".to_owned()),
            ]
        );

        let from = RawAddress::new("+15550001111").unwrap();
        let params = encode_send_form("tok", Some(&from), &message);
        assert!(
            params
                .iter()
                .any(|(k, v)| k == "from" && v == "+15550001111")
        );
    }

    #[test]
    fn decode_auth_response_reads_token_and_status() {
        let json = r#"{"status": "OK", "token": "abc123"}"#;
        let parsed = decode_auth_response(json).unwrap();
        assert_eq!(parsed.status, Status::Ok);
        assert_eq!(parsed.token.as_deref(), Some("abc123"));
        assert!(parsed.status_text.is_none());
    }

    #[test]
    fn decode_inbox_response_keeps_backend_order() {
        let json = r#"
        {
          "status": "OK",
          "messages": [
            {"from": "+15551234", "text": "hi", "received_at": 1700000000},
            {"from": "+15559999", "text": "ok", "received_at": 1700000060}
          ]
        }
        "#;
        let parsed = decode_inbox_response(json).unwrap();
        assert_eq!(parsed.status, Status::Ok);
        assert_eq!(parsed.messages.len(), 2);
        assert_eq!(parsed.messages[0].from, "+15551234");
        assert_eq!(parsed.messages[1].from, "+15559999");
    }

    #[test]
    fn decode_rejects_invalid_json() {
        assert!(matches!(
            decode_inbox_response("{ not json }"),
            Err(WireError::Json(_))
        ));
    }

    #[test]
    fn translate_inbound_preserves_fields_exactly() {
        let record = InboundRecord {
            from: "+15551234".to_owned(),
            text: "  spaced body  ".to_owned(),
            received_at: 1_700_000_000,
        };

        let message = translate_inbound(record).unwrap();
        assert_eq!(message.sender().raw(), "+15551234");
        assert_eq!(message.body().as_str(), "  spaced body  ");
        assert_eq!(message.received_at().value(), 1_700_000_000);
    }

    #[test]
    fn translate_inbound_rejects_empty_sender_or_body() {
        let record = InboundRecord {
            from: "   ".to_owned(),
            text: "hi".to_owned(),
            received_at: 0,
        };
        assert!(translate_inbound(record).is_err());

        let record = InboundRecord {
            from: "+15551234".to_owned(),
            text: "".to_owned(),
            received_at: 0,
        };
        assert!(translate_inbound(record).is_err());
    }
}
