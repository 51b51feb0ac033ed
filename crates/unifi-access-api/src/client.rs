// Developer API client
//
// Owns the transport slot, the retry policy and the `{code, msg, data}`
// envelope handling. Endpoint methods live in `resources/` as inherent
// impls on `AccessClient`, so this module stays focused on request
// mechanics.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use reqwest::{Method, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::config::{ClientConfig, api_base_from_root};
use crate::error::Error;
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, RawResponse, TlsMode, TransportConfig};

const SUCCESS_CODE: &str = "SUCCESS";
const EVENTS_PATH: &str = "/api/v1/events/ws";

// ── Response envelope ────────────────────────────────────────────────

/// `{ "code": "SUCCESS", "msg": "...", "data": ... }`
///
/// Some firmware sends `message` next to (or instead of) `msg`, so both
/// are read as separate keys.
#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    /// A present, non-`SUCCESS` code is a failure even on HTTP 2xx.
    fn check(self, status: StatusCode) -> Result<Option<T>, Error> {
        match self.code {
            Some(code) if code != SUCCESS_CODE => {
                let msg = self.msg.or(self.message).filter(|m| !m.is_empty());
                Err(Error::from_envelope_code(&code, msg, status))
            }
            _ => Ok(self.data),
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for one UniFi Access controller.
///
/// Every method takes `&self`; share the client behind an `Arc` to issue
/// calls concurrently. All calls go through the configured
/// [`RetryPolicy`]. After [`close`](Self::close) every call fails with
/// [`Error::Closed`].
pub struct AccessClient {
    config: ClientConfig,
    transport: ArcSwapOption<HttpTransport>,
    retry: RetryPolicy,
    events_url: Url,
}

impl AccessClient {
    /// Build a client for `https://{host}:{port}/api/v1/developer/`.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let base_url = config.base_url()?;
        let events_url = config.events_url()?;
        Self::build(config, base_url, events_url)
    }

    /// Build a client against an explicit root URL such as
    /// `http://127.0.0.1:8080` or a reverse proxy. The developer API path
    /// is appended unless already present. `host` and `port` from the
    /// config are ignored.
    pub fn with_base_url(root: &str, config: ClientConfig) -> Result<Self, Error> {
        let base_url = api_base_from_root(root)?;
        let events_url = events_url_for(&base_url)?;
        Self::build(config, base_url, events_url)
    }

    fn build(config: ClientConfig, base_url: Url, events_url: Url) -> Result<Self, Error> {
        let transport_config = TransportConfig {
            tls: TlsMode::from_verify_flag(config.verify_ssl),
            timeout: config.timeout,
        };
        let transport = HttpTransport::new(base_url, &config.token, &transport_config)?;
        info!(
            base_url = %transport.base_url(),
            verify_ssl = config.verify_ssl,
            max_retries = config.max_retries,
            "access client ready"
        );

        Ok(Self {
            retry: config.retry_policy(),
            transport: ArcSwapOption::from_pointee(transport),
            config,
            events_url,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Developer API base URL, or `None` once closed.
    pub fn base_url(&self) -> Option<Url> {
        self.transport.load().as_ref().map(|t| t.base_url().clone())
    }

    pub(crate) fn events_url(&self) -> &Url {
        &self.events_url
    }

    /// Release the connection pool. Idempotent. In-flight calls finish on
    /// the handle they already hold; new calls fail with [`Error::Closed`].
    pub fn close(&self) {
        if self.transport.swap(None).is_some() {
            info!("access client closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.transport.load().is_none()
    }

    // ── Request execution ────────────────────────────────────────────

    /// Send one request through the retry policy. Non-2xx statuses are
    /// mapped to errors before the policy sees them.
    async fn execute(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<RawResponse, Error> {
        self.retry
            .run(move || {
                let method = method.clone();
                async move { self.attempt(method, segments, query, body).await }
            })
            .await
    }

    async fn attempt(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<RawResponse, Error> {
        let transport: Arc<HttpTransport> = self.transport.load_full().ok_or(Error::Closed)?;
        let resp = transport.send(method, segments, query, body).await?;
        if resp.status.is_success() {
            Ok(resp)
        } else {
            Err(Error::from_response(
                resp.status,
                &resp.body,
                resp.retry_after_secs,
            ))
        }
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let resp = self.execute(Method::GET, segments, query, None).await?;
        decode(&resp)
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let body = to_body(body)?;
        let resp = self
            .execute(Method::POST, segments, &[], Some(&body))
            .await?;
        decode(&resp)
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let body = to_body(body)?;
        let resp = self.execute(Method::PUT, segments, &[], Some(&body)).await?;
        decode(&resp)
    }

    /// PUT where the controller answers with no meaningful `data`.
    pub(crate) async fn put_no_response<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<(), Error> {
        let body = to_body(body)?;
        let resp = self.execute(Method::PUT, segments, &[], Some(&body)).await?;
        decode_empty(&resp)
    }

    pub(crate) async fn delete(&self, segments: &[&str]) -> Result<(), Error> {
        let resp = self.execute(Method::DELETE, segments, &[], None).await?;
        decode_empty(&resp)
    }
}

impl fmt::Debug for AccessClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessClient")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("retry", &self.retry)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ── Response decoding ────────────────────────────────────────────────

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, Error> {
    serde_json::to_value(body).map_err(|e| Error::Deserialization {
        message: format!("failed to encode request body: {e}"),
        body: String::new(),
    })
}

fn parse_envelope<T: DeserializeOwned>(resp: &RawResponse) -> Result<Envelope<T>, Error> {
    serde_json::from_str(&resp.body).map_err(|e| {
        let preview: String = resp.body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: resp.body.clone(),
        }
    })
}

/// Unwrap `data` from a 2xx envelope.
fn decode<T: DeserializeOwned>(resp: &RawResponse) -> Result<T, Error> {
    let data = parse_envelope::<T>(resp)?.check(resp.status)?;
    data.ok_or_else(|| Error::Deserialization {
        message: "response envelope has no data".into(),
        body: resp.body.clone(),
    })
}

/// Check a 2xx envelope, discarding any `data`. An empty body is success.
fn decode_empty(resp: &RawResponse) -> Result<(), Error> {
    if resp.body.trim().is_empty() {
        return Ok(());
    }
    parse_envelope::<IgnoredAny>(resp)?.check(resp.status)?;
    debug!(status = resp.status.as_u16(), "request acknowledged");
    Ok(())
}

/// `http(s)://host/...` → `ws(s)://host/api/v1/events/ws`.
fn events_url_for(base_url: &Url) -> Result<Url, Error> {
    let mut url = base_url.clone();
    let scheme = if url.scheme() == "http" { "ws" } else { "wss" };
    url.set_scheme(scheme)
        .map_err(|()| Error::invalid(format!("cannot derive websocket URL from {base_url}")))?;
    url.set_path(EVENTS_PATH);
    url.set_query(None);
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.into(),
            retry_after_secs: None,
        }
    }

    #[test]
    fn decode_unwraps_data() {
        let value: Vec<String> =
            decode(&raw(200, r#"{"code":"SUCCESS","msg":"success","data":["a","b"]}"#)).unwrap();
        assert_eq!(value, ["a", "b"]);
    }

    #[test]
    fn decode_accepts_missing_code() {
        let value: u32 = decode(&raw(200, r#"{"data":7}"#)).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn failure_code_on_200_is_an_error() {
        let err = decode::<Value>(&raw(
            200,
            r#"{"code":"CODE_PARAMS_INVALID","msg":"bad phone","data":null}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, Error::Validation { ref message, .. } if message == "bad phone"));
    }

    #[test]
    fn msg_and_message_may_both_appear() {
        let value: u32 = decode(&raw(
            200,
            r#"{"code":"SUCCESS","msg":"success","message":"ok","data":3}"#,
        ))
        .unwrap();
        assert_eq!(value, 3);

        let err = decode::<Value>(&raw(
            200,
            r#"{"code":"CODE_SYSTEM_ERROR","message":"disk full"}"#,
        ))
        .unwrap_err();
        assert_eq!(err.to_string(), "API error (HTTP 200): disk full");
    }

    #[test]
    fn missing_data_is_a_decode_error() {
        let err = decode::<Value>(&raw(200, r#"{"code":"SUCCESS"}"#)).unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }

    #[test]
    fn garbage_body_keeps_raw_text() {
        let err = decode::<Value>(&raw(200, "<html>")).unwrap_err();
        match err {
            Error::Deserialization { body, .. } => assert_eq!(body, "<html>"),
            other => panic!("expected Deserialization, got {other:?}"),
        }
    }

    #[test]
    fn decode_empty_accepts_blank_and_success() {
        assert!(decode_empty(&raw(204, "")).is_ok());
        assert!(decode_empty(&raw(200, r#"{"code":"SUCCESS","data":{"id":"x"}}"#)).is_ok());
        assert!(decode_empty(&raw(200, r#"{"code":"CODE_NOT_EXISTS"}"#))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn events_url_follows_scheme() {
        let https = Url::parse("https://10.0.0.5:12445/api/v1/developer/").unwrap();
        assert_eq!(
            events_url_for(&https).unwrap().as_str(),
            "wss://10.0.0.5:12445/api/v1/events/ws"
        );
        let http = Url::parse("http://127.0.0.1:9000/api/v1/developer/").unwrap();
        assert_eq!(
            events_url_for(&http).unwrap().as_str(),
            "ws://127.0.0.1:9000/api/v1/events/ws"
        );
    }

    #[test]
    fn close_is_idempotent() {
        let client = AccessClient::new(ClientConfig::new("10.0.0.5", "t".to_string())).unwrap();
        assert!(!client.is_closed());
        assert!(client.base_url().is_some());
        client.close();
        client.close();
        assert!(client.is_closed());
        assert!(client.base_url().is_none());
    }
}
