// HTTP transport for the developer API.
//
// Builds the `reqwest::Client` (TLS policy, timeout, bearer header) and
// issues raw requests. Status classification and envelope decoding live
// in the client; this layer only reports what came back on the wire.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;

const USER_AGENT: &str = concat!("unifi-access-api/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Accept any certificate (for self-signed controllers).
    DangerAcceptInvalid,
}

impl TlsMode {
    /// `verify_ssl = true` maps to the system store, `false` to accept-any.
    pub fn from_verify_flag(verify_ssl: bool) -> Self {
        if verify_ssl {
            Self::System
        } else {
            Self::DangerAcceptInvalid
        }
    }
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` that sends `Authorization: Bearer <token>`
    /// on every request.
    pub fn build_client(&self, token: &SecretString) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid token header value: {e}"),
                status: 401,
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers);

        if self.tls == TlsMode::DangerAcceptInvalid {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// What came back from one request, before any classification.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
    /// `Retry-After` header in seconds, when the controller sent one.
    pub retry_after_secs: Option<u64>,
}

/// One controller's HTTP connection pool plus its base URL.
#[derive(Debug)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport that authenticates with `token`.
    pub fn new(
        base_url: Url,
        token: &SecretString,
        config: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = config.build_client(token)?;
        Ok(Self {
            http,
            base_url,
            timeout: config.timeout,
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: Url, http: reqwest::Client, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issue one request and read the whole body.
    ///
    /// Non-2xx statuses are returned as data, not errors. Only socket,
    /// DNS, TLS and timeout failures produce `Err`.
    pub async fn send(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<RawResponse, Error> {
        let url = self.url(segments)?;
        debug!("{method} {url}");

        let mut request = self.http.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| Error::from_reqwest(&e, self.timeout))?;

        let status = resp.status();
        let retry_after_secs = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        let body = resp
            .text()
            .await
            .map_err(|e| Error::from_reqwest(&e, self.timeout))?;

        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        Ok(RawResponse {
            status,
            body,
            retry_after_secs,
        })
    }
}
