//! Real-time notification stream with auto-reconnect.
//!
//! Connects to the controller's `/api/v1/events/ws` endpoint with the
//! client's bearer token and fans parsed notifications out through a
//! [`tokio::sync::broadcast`] channel.
//!
//! # Example
//!
//! ```rust,ignore
//! use unifi_access_api::{AccessClient, ClientConfig, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = AccessClient::new(ClientConfig::new("10.0.0.5", token))?;
//! let stream = client
//!     .notifications(ReconnectConfig::default(), CancellationToken::new())?;
//! let mut rx = stream.subscribe();
//!
//! while let Ok(note) = rx.recv().await {
//!     println!("{}: {}", note.kind, note.data);
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::{DigitallySignedStruct, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio_tungstenite::Connector;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::client::AccessClient;
use crate::error::Error;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ── Notification ─────────────────────────────────────────────────────

/// Category of a pushed notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    AccessEvent,
    DoorStatus,
    DeviceStatus,
    SystemAlert,
    /// Any type this crate does not know about, verbatim.
    Other(String),
}

impl NotificationKind {
    fn from_wire(kind: &str) -> Self {
        match kind {
            "access_event" => Self::AccessEvent,
            "door_status" => Self::DoorStatus,
            "device_status" => Self::DeviceStatus,
            "system_alert" => Self::SystemAlert,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::AccessEvent => "access_event",
            Self::DoorStatus => "door_status",
            Self::DeviceStatus => "device_status",
            Self::SystemAlert => "system_alert",
            Self::Other(kind) => kind,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message from the notification stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    /// Payload exactly as the controller sent it.
    pub data: serde_json::Value,
}

/// Wire frame: `{ "type": "door_status", "data": { ... } }`. Older
/// controllers name the kind `event`; when both are sent `type` wins.
#[derive(Deserialize)]
struct Frame {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Fixed-delay reconnection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Wait between a dropped connection and the next attempt. Default: 5s.
    pub delay: Duration,
    /// Consecutive failures tolerated before giving up. `None` retries
    /// forever. Default: 10.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            max_attempts: Some(10),
        }
    }
}

// ── NotificationStream ───────────────────────────────────────────────

/// Handle to a running notification task.
///
/// Dropping the handle or calling [`shutdown`](Self::shutdown) stops the
/// task; receivers obtained from [`subscribe`](Self::subscribe) then see
/// the channel close.
pub struct NotificationStream {
    event_rx: broadcast::Receiver<Arc<Notification>>,
    cancel: CancellationToken,
}

impl NotificationStream {
    /// New receiver. Slow consumers get
    /// [`broadcast::error::RecvError::Lagged`] rather than blocking others.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Notification>> {
        self.event_rx.resubscribe()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

impl Drop for NotificationStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl AccessClient {
    /// Spawn the notification task and return its handle.
    ///
    /// The first connection happens in the background. Cancelling `cancel`
    /// stops the task as well as dropping the handle does. Must be called
    /// from within a Tokio runtime.
    pub fn notifications(
        &self,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<NotificationStream, Error> {
        if self.is_closed() {
            return Err(Error::Closed);
        }

        let connector = if self.config().verify_ssl {
            None
        } else {
            Some(accept_any_connector()?)
        };
        let session = Session {
            url: self.events_url().clone(),
            token: self.config().token.clone(),
            connector,
        };

        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = cancel.child_token();
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            ws_loop(session, event_tx, reconnect, task_cancel).await;
        });

        Ok(NotificationStream { event_rx, cancel })
    }
}

// ── Background reconnection loop ─────────────────────────────────────

struct Session {
    url: Url,
    token: SecretString,
    connector: Option<Connector>,
}

/// connect → read → on drop, wait → reconnect.
async fn ws_loop(
    session: Session,
    event_tx: broadcast::Sender<Arc<Notification>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut failures: u32 = 0;

    loop {
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            outcome = run_session(&session, &event_tx, &cancel, &mut failures) => outcome,
        };
        if cancel.is_cancelled() {
            break;
        }

        match outcome {
            Ok(()) => info!("notification stream closed by controller"),
            Err(e) => warn!(error = %e, failures, "notification stream error"),
        }

        failures = failures.saturating_add(1);
        if let Some(max) = reconnect.max_attempts {
            if failures >= max {
                error!(max_attempts = max, "notification reconnect limit reached, giving up");
                break;
            }
        }

        info!(
            delay_ms = u64::try_from(reconnect.delay.as_millis()).unwrap_or(u64::MAX),
            failures,
            "waiting before reconnect"
        );
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(reconnect.delay) => {}
        }
    }

    debug!("notification loop exiting");
}

/// One connection lifetime. A successful handshake resets `failures`.
async fn run_session(
    session: &Session,
    event_tx: &broadcast::Sender<Arc<Notification>>,
    cancel: &CancellationToken,
    failures: &mut u32,
) -> Result<(), Error> {
    info!(url = %session.url, "connecting to notification stream");

    let uri: tungstenite::http::Uri = session
        .url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;
    let request = ClientRequestBuilder::new(uri).with_header(
        "Authorization",
        format!("Bearer {}", session.token.expose_secret()),
    );

    let (ws_stream, _response) = tokio_tungstenite::connect_async_tls_with_config(
        request,
        None,
        false,
        session.connector.clone(),
    )
    .await
    .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    info!("notification stream connected");
    *failures = 0;

    let (_write, read) = ws_stream.split();
    read_frames(read, event_tx, cancel).await
}

/// Read frames until the stream ends, the peer closes or `cancel` fires.
async fn read_frames<S>(
    mut read: S,
    event_tx: &broadcast::Sender<Arc<Notification>>,
    cancel: &CancellationToken,
) -> Result<(), Error>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => parse_and_broadcast(&text, event_tx),
                Some(Ok(Message::Ping(_))) => trace!("notification stream ping"),
                Some(Ok(Message::Close(frame))) => {
                    match frame {
                        Some(cf) => {
                            info!(code = %cf.code, reason = %cf.reason, "close frame received");
                        }
                        None => info!("close frame received"),
                    }
                    return Ok(());
                }
                Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
                None => return Ok(()),
                Some(Ok(_)) => {}
            },
        }
    }
}

// ── Message parsing ──────────────────────────────────────────────────

/// Parse one text frame and broadcast it. Malformed frames are skipped.
fn parse_and_broadcast(text: &str, event_tx: &broadcast::Sender<Arc<Notification>>) {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!(error = %e, "skipping malformed notification");
            return;
        }
    };

    let Some(kind) = frame.kind.or(frame.event) else {
        debug!("skipping notification without a type");
        return;
    };

    let notification = Notification {
        kind: NotificationKind::from_wire(&kind),
        data: frame.data,
    };
    trace!(kind = %notification.kind, "notification received");

    // No subscribers is not an error.
    let _ = event_tx.send(Arc::new(notification));
}

// ── TLS ──────────────────────────────────────────────────────────────

/// Connector that accepts any server certificate, for self-signed
/// controllers when `verify_ssl` is off. Signatures are still checked.
fn accept_any_connector() -> Result<Connector, Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCert(provider)))
        .with_no_client_auth();
    Ok(Connector::Rustls(Arc::new(config)))
}

#[derive(Debug)]
struct AcceptAnyCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
