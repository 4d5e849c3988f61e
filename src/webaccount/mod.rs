//! Account-based web service backend: one [`SmsTransport`] over an HTTP
//! account API with authenticate / list-inbound / send-one endpoints.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use url::Url;

use crate::domain::{
    Credentials, InboundMessage, OutboundMessage, RawAddress, StatusCell, TransportConfig,
    TransportId, TransportStatus,
};
use crate::transport::{
    BackendError, ConnectError, ReceiveError, SendError, SmsTransport, TransportCapabilities,
};

mod wire;

/// Identifier scheme of this backend, e.g. `webaccount:alice`.
pub const BACKEND_SCHEME: &str = "webaccount";

const AUTH_PATH: &str = "auth";
const INBOX_PATH: &str = "inbox";
const SEND_PATH: &str = "send";

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Opaque session handle issued by the account service at authentication.
struct SessionToken(String);

impl SessionToken {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Seam between the transport and the account service.
///
/// The production implementation talks HTTP; tests substitute a scripted
/// fake to observe calls without I/O.
trait AccountBackend: Send + Sync {
    fn authenticate<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<SessionToken, BackendError>>;

    fn list_inbound<'a>(
        &'a self,
        session: &'a SessionToken,
    ) -> BoxFuture<'a, Result<Vec<wire::InboundRecord>, BackendError>>;

    fn send_one<'a>(
        &'a self,
        session: &'a SessionToken,
        sender: Option<&'a RawAddress>,
        message: &'a OutboundMessage,
    ) -> BoxFuture<'a, Result<(), BackendError>>;
}

#[derive(Debug, Clone)]
struct HttpAccountBackend {
    client: reqwest::Client,
    auth_endpoint: Url,
    inbox_endpoint: Url,
    send_endpoint: Url,
}

impl HttpAccountBackend {
    async fn post_form(
        &self,
        url: &Url,
        params: Vec<(String, String)>,
    ) -> Result<String, BackendError> {
        let response = self
            .client
            .post(url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|err| BackendError::Unreachable(Box::new(err)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| BackendError::Unreachable(Box::new(err)))?;

        if !(200..=299).contains(&status) {
            return Err(BackendError::Refused {
                reason: http_refusal_reason(status, &body),
            });
        }
        Ok(body)
    }
}

fn http_refusal_reason(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("unexpected HTTP status {status}")
    } else {
        format!("unexpected HTTP status {status}: {trimmed}")
    }
}

fn service_refusal(status_text: Option<String>, fallback: &str) -> BackendError {
    BackendError::Refused {
        reason: status_text.unwrap_or_else(|| fallback.to_owned()),
    }
}

fn malformed(err: wire::WireError) -> BackendError {
    BackendError::Malformed(Box::new(err))
}

impl AccountBackend for HttpAccountBackend {
    fn authenticate<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<SessionToken, BackendError>> {
        Box::pin(async move {
            let params = wire::encode_auth_form(credentials);
            let body = self.post_form(&self.auth_endpoint, params).await?;
            let parsed = wire::decode_auth_response(&body).map_err(malformed)?;

            if parsed.status != wire::Status::Ok {
                return Err(service_refusal(
                    parsed.status_text,
                    "authentication rejected",
                ));
            }
            let token = parsed
                .token
                .ok_or_else(|| malformed(wire::WireError::MissingField { field: "token" }))?;
            Ok(SessionToken(token))
        })
    }

    fn list_inbound<'a>(
        &'a self,
        session: &'a SessionToken,
    ) -> BoxFuture<'a, Result<Vec<wire::InboundRecord>, BackendError>> {
        Box::pin(async move {
            let params = wire::encode_inbox_form(session.as_str());
            let body = self.post_form(&self.inbox_endpoint, params).await?;
            let parsed = wire::decode_inbox_response(&body).map_err(malformed)?;

            if parsed.status != wire::Status::Ok {
                return Err(service_refusal(parsed.status_text, "inbox query rejected"));
            }
            Ok(parsed.messages)
        })
    }

    fn send_one<'a>(
        &'a self,
        session: &'a SessionToken,
        sender: Option<&'a RawAddress>,
        message: &'a OutboundMessage,
    ) -> BoxFuture<'a, Result<(), BackendError>> {
        Box::pin(async move {
            let params = wire::encode_send_form(session.as_str(), sender, message);
            let body = self.post_form(&self.send_endpoint, params).await?;
            let receipt = wire::decode_send_receipt(&body).map_err(malformed)?;

            // A non-OK receipt is a delivery failure.
            if receipt.status != wire::Status::Ok {
                return Err(service_refusal(receipt.status_text, "message rejected"));
            }
            Ok(())
        })
    }
}

#[derive(Debug, thiserror::Error)]
/// Errors raised while assembling a [`WebAccountTransport`].
pub enum BuildError {
    /// The base URL could not be parsed or extended with the API paths.
    #[error("invalid endpoint URL: {input}")]
    InvalidEndpoint {
        input: String,
        #[source]
        source: url::ParseError,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("failed to construct HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
/// Builder for [`WebAccountTransport`].
///
/// Use this to point the transport at a service base URL and optionally
/// customize the HTTP timeout or user-agent.
pub struct WebAccountTransportBuilder {
    config: TransportConfig,
    base_url: String,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl WebAccountTransportBuilder {
    /// Create a builder with no timeout or user-agent override.
    pub fn new(config: TransportConfig, base_url: impl Into<String>) -> Self {
        Self {
            config,
            base_url: base_url.into(),
            timeout: None,
            user_agent: None,
        }
    }

    /// Set an HTTP client timeout applied to each backend request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the HTTP `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build a disconnected [`WebAccountTransport`].
    pub fn build(self) -> Result<WebAccountTransport, BuildError> {
        let (auth_endpoint, inbox_endpoint, send_endpoint) = resolve_endpoints(&self.base_url)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        let client = builder.build().map_err(BuildError::HttpClient)?;

        let backend = Arc::new(HttpAccountBackend {
            client,
            auth_endpoint,
            inbox_endpoint,
            send_endpoint,
        });
        Ok(WebAccountTransport::with_backend(self.config, backend))
    }
}

fn resolve_endpoints(base_url: &str) -> Result<(Url, Url, Url), BuildError> {
    // `Url::join` replaces the last path segment unless the base ends with
    // a slash, so normalize before joining.
    let mut base = base_url.trim().to_owned();
    if !base.ends_with('/') {
        base.push('/');
    }

    let invalid = |source: url::ParseError| BuildError::InvalidEndpoint {
        input: base_url.to_owned(),
        source,
    };
    let base = Url::parse(&base).map_err(invalid)?;
    Ok((
        base.join(AUTH_PATH).map_err(invalid)?,
        base.join(INBOX_PATH).map_err(invalid)?,
        base.join(SEND_PATH).map_err(invalid)?,
    ))
}

/// [`SmsTransport`] over an account-based web SMS service.
///
/// Holds one logical session at a time. `connect`/`disconnect` and the
/// send/receive operations serialize on the session lock; the lifecycle
/// status may be read concurrently from any thread.
pub struct WebAccountTransport {
    id: TransportId,
    config: TransportConfig,
    status: StatusCell,
    session: Mutex<Option<SessionToken>>,
    backend: Arc<dyn AccountBackend>,
}

impl WebAccountTransport {
    /// Start building a transport pointed at `base_url`.
    pub fn builder(
        config: TransportConfig,
        base_url: impl Into<String>,
    ) -> WebAccountTransportBuilder {
        WebAccountTransportBuilder::new(config, base_url)
    }

    fn with_backend(config: TransportConfig, backend: Arc<dyn AccountBackend>) -> Self {
        let id = TransportId::scoped(BACKEND_SCHEME, config.credentials.username());
        Self {
            id,
            config,
            status: StatusCell::new(),
            session: Mutex::new(None),
            backend,
        }
    }
}

#[async_trait]
impl SmsTransport for WebAccountTransport {
    fn identifier(&self) -> &TransportId {
        &self.id
    }

    fn sender_address(&self) -> Option<&RawAddress> {
        self.config.credentials.sender()
    }

    fn capabilities(&self) -> TransportCapabilities {
        // The account service carries plain text over HTTPS only.
        TransportCapabilities {
            binary_sending: false,
            ucs2_sending: false,
            receive: true,
            encrypted: true,
        }
    }

    fn use_for_sending(&self) -> bool {
        self.config.use_for_sending
    }

    fn use_for_receiving(&self) -> bool {
        self.config.use_for_receiving
    }

    fn status(&self) -> TransportStatus {
        self.status.load()
    }

    async fn connect(&self) -> Result<(), ConnectError> {
        let mut session = self.session.lock().await;
        if let Err(status) = self.status.begin_connect() {
            return Err(ConnectError::InvalidState { status });
        }

        match self.backend.authenticate(&self.config.credentials).await {
            Ok(token) => {
                *session = Some(token);
                self.status.finish_connect(true);
                tracing::debug!(id = %self.id, "session established");
                Ok(())
            }
            Err(err) => {
                *session = None;
                self.status.finish_connect(false);
                tracing::warn!(id = %self.id, error = %err, "session establishment failed");
                Err(ConnectError::Backend(err))
            }
        }
    }

    async fn disconnect(&self) {
        let mut session = self.session.lock().await;
        // The service needs no explicit teardown; dropping the token is the
        // whole release.
        *session = None;
        self.status.disconnect();
        tracing::debug!(id = %self.id, "disconnected");
    }

    async fn poll_inbound(&self) -> Result<Vec<InboundMessage>, ReceiveError> {
        let session = self.session.lock().await;
        let token = session.as_ref().ok_or(ReceiveError::NotConnected {
            status: self.status.load(),
        })?;

        let records = self.backend.list_inbound(token).await?;
        let mut messages = Vec::with_capacity(records.len());
        for record in records {
            messages.push(wire::translate_inbound(record)?);
        }
        tracing::debug!(id = %self.id, count = messages.len(), "inbound poll completed");
        Ok(messages)
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError> {
        let session = self.session.lock().await;
        let token = session.as_ref().ok_or(SendError::NotConnected {
            status: self.status.load(),
        })?;

        self.backend
            .send_one(token, self.config.credentials.sender(), message)
            .await?;
        tracing::debug!(id = %self.id, to = message.recipient().raw(), "message handed to backend");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use crate::domain::MessageBody;
    use crate::transport::InboundListener;

    use super::*;

    #[derive(Clone)]
    struct FakeBackend {
        state: Arc<StdMutex<FakeBackendState>>,
    }

    struct FakeBackendState {
        auth_calls: usize,
        list_calls: usize,
        send_calls: usize,
        reject_auth: Option<String>,
        reject_send: Option<String>,
        inbound: Vec<wire::InboundRecord>,
        last_sent: Option<(Option<String>, String, String)>,
    }

    impl FakeBackend {
        fn new() -> Self {
            Self {
                state: Arc::new(StdMutex::new(FakeBackendState {
                    auth_calls: 0,
                    list_calls: 0,
                    send_calls: 0,
                    reject_auth: None,
                    reject_send: None,
                    inbound: Vec::new(),
                    last_sent: None,
                })),
            }
        }

        fn rejecting_auth(reason: &str) -> Self {
            let fake = Self::new();
            fake.state.lock().unwrap().reject_auth = Some(reason.to_owned());
            fake
        }

        fn accept_auth(&self) {
            self.state.lock().unwrap().reject_auth = None;
        }

        fn reject_send(&self, reason: &str) {
            self.state.lock().unwrap().reject_send = Some(reason.to_owned());
        }

        fn push_inbound(&self, from: &str, text: &str, received_at: u64) {
            self.state.lock().unwrap().inbound.push(wire::InboundRecord {
                from: from.to_owned(),
                text: text.to_owned(),
                received_at,
            });
        }

        fn calls(&self) -> (usize, usize, usize) {
            let state = self.state.lock().unwrap();
            (state.auth_calls, state.list_calls, state.send_calls)
        }

        fn last_sent(&self) -> Option<(Option<String>, String, String)> {
            self.state.lock().unwrap().last_sent.clone()
        }
    }

    impl AccountBackend for FakeBackend {
        fn authenticate<'a>(
            &'a self,
            _credentials: &'a Credentials,
        ) -> BoxFuture<'a, Result<SessionToken, BackendError>> {
            Box::pin(async move {
                let mut state = self.state.lock().unwrap();
                state.auth_calls += 1;
                match &state.reject_auth {
                    Some(reason) => Err(BackendError::Refused {
                        reason: reason.clone(),
                    }),
                    None => Ok(SessionToken("fake-token".to_owned())),
                }
            })
        }

        fn list_inbound<'a>(
            &'a self,
            _session: &'a SessionToken,
        ) -> BoxFuture<'a, Result<Vec<wire::InboundRecord>, BackendError>> {
            Box::pin(async move {
                let mut state = self.state.lock().unwrap();
                state.list_calls += 1;
                Ok(std::mem::take(&mut state.inbound))
            })
        }

        fn send_one<'a>(
            &'a self,
            _session: &'a SessionToken,
            sender: Option<&'a RawAddress>,
            message: &'a OutboundMessage,
        ) -> BoxFuture<'a, Result<(), BackendError>> {
            Box::pin(async move {
                let mut state = self.state.lock().unwrap();
                state.send_calls += 1;
                state.last_sent = Some((
                    sender.map(|it| it.raw().to_owned()),
                    message.recipient().raw().to_owned(),
                    message.body().as_str().to_owned(),
                ));
                match &state.reject_send {
                    Some(reason) => Err(BackendError::Refused {
                        reason: reason.clone(),
                    }),
                    None => Ok(()),
                }
            })
        }
    }

    #[derive(Clone)]
    struct RecordingListener {
        received: Arc<StdMutex<Vec<(String, String, String)>>>,
    }

    impl RecordingListener {
        fn new() -> Self {
            Self {
                received: Arc::new(StdMutex::new(Vec::new())),
            }
        }

        fn messages(&self) -> Vec<(String, String, String)> {
            self.received.lock().unwrap().clone()
        }
    }

    impl InboundListener for RecordingListener {
        fn on_message(&self, transport: &TransportId, message: InboundMessage) {
            self.received.lock().unwrap().push((
                transport.as_str().to_owned(),
                message.sender().raw().to_owned(),
                message.body().as_str().to_owned(),
            ));
        }
    }

    fn make_transport(backend: FakeBackend) -> WebAccountTransport {
        let credentials = Credentials::new("alice", "hunter2")
            .unwrap()
            .with_sender(RawAddress::new("+15550001111").unwrap());
        WebAccountTransport::with_backend(TransportConfig::new(credentials), Arc::new(backend))
    }

    #[tokio::test]
    async fn connect_with_valid_credentials_reaches_connected() {
        let backend = FakeBackend::new();
        let transport = make_transport(backend.clone());

        assert_eq!(transport.status(), TransportStatus::Disconnected);
        transport.connect().await.unwrap();
        assert_eq!(transport.status(), TransportStatus::Connected);
        assert_eq!(backend.calls(), (1, 0, 0));
    }

    #[tokio::test]
    async fn connect_with_rejected_credentials_reaches_failed_with_cause() {
        let backend = FakeBackend::rejecting_auth("bad password");
        let transport = make_transport(backend);

        let err = transport.connect().await.unwrap_err();
        assert_eq!(transport.status(), TransportStatus::Failed);

        let cause = err.to_string();
        assert!(!cause.is_empty());
        assert!(cause.contains("bad password"), "cause was: {cause}");
    }

    #[tokio::test]
    async fn connect_while_connected_is_an_invalid_state_error() {
        let backend = FakeBackend::new();
        let transport = make_transport(backend.clone());

        transport.connect().await.unwrap();
        let err = transport.connect().await.unwrap_err();
        match err {
            ConnectError::InvalidState { status } => {
                assert_eq!(status, TransportStatus::Connected);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The second attempt never reached the backend.
        assert_eq!(backend.calls().0, 1);
    }

    #[tokio::test]
    async fn connect_retry_after_failure_can_succeed() {
        let backend = FakeBackend::rejecting_auth("temporary outage");
        let transport = make_transport(backend.clone());

        transport.connect().await.unwrap_err();
        assert_eq!(transport.status(), TransportStatus::Failed);

        backend.accept_auth();
        transport.connect().await.unwrap();
        assert_eq!(transport.status(), TransportStatus::Connected);
    }

    #[tokio::test]
    async fn disconnect_is_idempotent_from_any_state() {
        let transport = make_transport(FakeBackend::new());

        transport.disconnect().await;
        transport.disconnect().await;
        assert_eq!(transport.status(), TransportStatus::Disconnected);

        transport.connect().await.unwrap();
        transport.disconnect().await;
        transport.disconnect().await;
        assert_eq!(transport.status(), TransportStatus::Disconnected);
    }

    #[tokio::test]
    async fn poll_inbound_translates_and_preserves_fields() {
        let backend = FakeBackend::new();
        backend.push_inbound("+15551234", "hi", 1_700_000_000);
        backend.push_inbound("+15559999", "ok", 1_700_000_060);
        let transport = make_transport(backend);

        transport.connect().await.unwrap();
        let messages = transport.poll_inbound().await.unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender().raw(), "+15551234");
        assert_eq!(messages[0].body().as_str(), "hi");
        assert_eq!(messages[0].received_at().value(), 1_700_000_000);
        assert_eq!(messages[1].sender().raw(), "+15559999");
        assert_eq!(messages[1].body().as_str(), "ok");
    }

    #[tokio::test]
    async fn poll_into_dispatches_in_backend_order_exactly_once() {
        let backend = FakeBackend::new();
        backend.push_inbound("+15551234", "hi", 1);
        backend.push_inbound("+15559999", "ok", 2);
        let transport = make_transport(backend);
        let listener = RecordingListener::new();

        transport.connect().await.unwrap();
        let count = transport.poll_into(&listener).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            listener.messages(),
            vec![
                (
                    "webaccount:alice".to_owned(),
                    "+15551234".to_owned(),
                    "hi".to_owned()
                ),
                (
                    "webaccount:alice".to_owned(),
                    "+15559999".to_owned(),
                    "ok".to_owned()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn poll_inbound_while_disconnected_errors_without_backend_io() {
        let backend = FakeBackend::new();
        let transport = make_transport(backend.clone());

        let err = transport.poll_inbound().await.unwrap_err();
        match err {
            ReceiveError::NotConnected { status } => {
                assert_eq!(status, TransportStatus::Disconnected);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(backend.calls(), (0, 0, 0));
    }

    #[tokio::test]
    async fn poll_translation_failure_surfaces_as_translation_error() {
        let backend = FakeBackend::new();
        backend.push_inbound("   ", "hi", 1);
        let transport = make_transport(backend);

        transport.connect().await.unwrap();
        let err = transport.poll_inbound().await.unwrap_err();
        assert!(matches!(err, ReceiveError::Translation(_)));
    }

    #[tokio::test]
    async fn send_while_disconnected_errors_without_backend_io() {
        let backend = FakeBackend::new();
        let transport = make_transport(backend.clone());
        let message = OutboundMessage::new("+15551234567", "hello").unwrap();

        let err = transport.send(&message).await.unwrap_err();
        match err {
            SendError::NotConnected { status } => {
                assert_eq!(status, TransportStatus::Disconnected);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(backend.calls(), (0, 0, 0));
    }

    #[tokio::test]
    async fn send_delegates_recipient_body_and_sender() {
        let backend = FakeBackend::new();
        let transport = make_transport(backend.clone());
        let message = OutboundMessage::from_parts(
            RawAddress::new("+15551234567").unwrap(),
            MessageBody::new("hello").unwrap(),
        );

        transport.connect().await.unwrap();
        transport.send(&message).await.unwrap();

        assert_eq!(
            backend.last_sent(),
            Some((
                Some("+15550001111".to_owned()),
                "+15551234567".to_owned(),
                "hello".to_owned()
            ))
        );
    }

    #[tokio::test]
    async fn send_rejection_surfaces_backend_reason() {
        let backend = FakeBackend::new();
        backend.reject_send("quota exhausted");
        let transport = make_transport(backend);
        let message = OutboundMessage::new("+15551234567", "hello").unwrap();

        transport.connect().await.unwrap();
        let err = transport.send(&message).await.unwrap_err();

        assert!(err.to_string().contains("quota exhausted"));
        // A failed send does not tear the session down.
        assert_eq!(transport.status(), TransportStatus::Connected);
    }

    #[tokio::test]
    async fn status_is_terminal_after_connect_returns() {
        let transport = make_transport(FakeBackend::new());
        transport.connect().await.unwrap();
        assert_ne!(transport.status(), TransportStatus::Connecting);

        let transport = make_transport(FakeBackend::rejecting_auth("no"));
        transport.connect().await.unwrap_err();
        assert_ne!(transport.status(), TransportStatus::Connecting);
    }

    #[tokio::test]
    async fn identity_and_capability_accessors() {
        let transport = make_transport(FakeBackend::new());

        assert_eq!(transport.identifier().as_str(), "webaccount:alice");
        assert_eq!(
            transport.sender_address().map(|it| it.raw()),
            Some("+15550001111")
        );
        assert!(transport.use_for_sending());
        assert!(transport.use_for_receiving());

        let capabilities = transport.capabilities();
        assert!(!capabilities.binary_sending);
        assert!(!capabilities.ucs2_sending);
        assert!(capabilities.receive);
        assert!(capabilities.encrypted);
    }

    #[test]
    fn resolve_endpoints_joins_api_paths() {
        let (auth, inbox, send) = resolve_endpoints("https://sms.example.net/api").unwrap();
        assert_eq!(auth.as_str(), "https://sms.example.net/api/auth");
        assert_eq!(inbox.as_str(), "https://sms.example.net/api/inbox");
        assert_eq!(send.as_str(), "https://sms.example.net/api/send");

        // A trailing slash resolves to the same endpoints.
        let (auth_slash, _, _) = resolve_endpoints("https://sms.example.net/api/").unwrap();
        assert_eq!(auth_slash, auth);
    }

    #[test]
    fn resolve_endpoints_rejects_invalid_base() {
        assert!(matches!(
            resolve_endpoints("not a url"),
            Err(BuildError::InvalidEndpoint { .. })
        ));
    }
}
