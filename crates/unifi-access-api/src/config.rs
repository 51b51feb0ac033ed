// ── Client connection configuration ──
//
// Describes *how* to reach a UniFi Access controller. Immutable once a
// client is built; the config crate or the caller constructs it and
// hands it in. Nothing here touches disk.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::Error;
use crate::retry::{Backoff, RetryPolicy};

/// Default developer API port on UniFi Access controllers.
pub const DEFAULT_PORT: u16 = 12445;

const API_BASE_PATH: &str = "/api/v1/developer/";
const EVENTS_PATH: &str = "/api/v1/events/ws";

/// Connection settings for a single controller.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Controller hostname or IP address (no scheme).
    pub host: String,
    /// Developer API bearer token.
    pub token: SecretString,
    /// Developer API port.
    pub port: u16,
    /// Verify the controller's TLS certificate. Controllers ship
    /// self-signed certificates, so this is off by default.
    pub verify_ssl: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Delay between retries (base delay for exponential backoff).
    pub retry_delay: Duration,
    /// How the retry delay evolves between attempts.
    pub backoff: Backoff,
}

impl ClientConfig {
    /// Config with the documented defaults: port 12445, no TLS
    /// verification, 30s timeout, 3 retries spaced 1s apart.
    pub fn new(host: impl Into<String>, token: impl Into<SecretString>) -> Self {
        let host: String = host.into();
        Self {
            host: host.trim().trim_end_matches('/').to_owned(),
            token: token.into(),
            port: DEFAULT_PORT,
            verify_ssl: false,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            backoff: Backoff::Fixed,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// The retry policy described by this config.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delay: self.retry_delay,
            backoff: self.backoff,
        }
    }

    /// `https://{host}:{port}/api/v1/developer/`
    pub fn base_url(&self) -> Result<Url, Error> {
        self.check_host()?;
        let url = Url::parse(&format!("https://{}:{}{API_BASE_PATH}", self.host, self.port))?;
        Ok(url)
    }

    /// `wss://{host}:{port}/api/v1/events/ws`
    pub fn events_url(&self) -> Result<Url, Error> {
        self.check_host()?;
        let url = Url::parse(&format!("wss://{}:{}{EVENTS_PATH}", self.host, self.port))?;
        Ok(url)
    }

    fn check_host(&self) -> Result<(), Error> {
        if self.host.is_empty() {
            return Err(Error::invalid("host must not be empty"));
        }
        Ok(())
    }
}

/// Append the developer API path to an arbitrary root URL.
///
/// Used when the controller sits behind a proxy or in tests where the
/// root is a plain `http://127.0.0.1:port`.
pub(crate) fn api_base_from_root(root: &str) -> Result<Url, Error> {
    let root = root.trim_end_matches('/');
    if root.ends_with(API_BASE_PATH.trim_end_matches('/')) {
        return Ok(Url::parse(&format!("{root}/"))?);
    }
    Ok(Url::parse(&format!("{root}{API_BASE_PATH}"))?)
}
