use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Top-level error type for the `unifi-access-api` crate.
///
/// Every failure a caller can see flows through this enum: errors mapped
/// from controller responses, transport failures, local validation and
/// the notification stream. Match on a variant to handle one case, or
/// on [`Error::kind`] to handle a whole class.
#[derive(Debug, Error)]
pub enum Error {
    // ── Mapped from controller responses ────────────────────────────
    /// The bearer token was rejected (HTTP 401, or 403 without a permission marker).
    #[error("Authentication failed (HTTP {status}): {message}")]
    Authentication { message: String, status: u16 },

    /// The token is valid but lacks rights for the operation (HTTP 403).
    #[error("Permission denied: {message}")]
    Permission {
        message: String,
        code: Option<String>,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Input rejected, either locally before any request or by the controller (HTTP 400).
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        /// `None` when the input was rejected locally.
        status: Option<u16>,
        /// Raw error payload from the controller, if any.
        details: Option<serde_json::Value>,
    },

    /// Too many requests (HTTP 429).
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Any other non-success response.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// Socket, DNS or protocol failure before a response arrived.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// No response within the configured timeout.
    #[error("Request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// URL construction failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The client was closed before the call was made.
    #[error("Client is closed")]
    Closed,

    // ── Data ────────────────────────────────────────────────────────
    /// JSON (de)serialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// Notification stream connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),
}

/// Flat classification of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authentication,
    Permission,
    NotFound,
    Validation,
    RateLimit,
    Api,
    Connection,
    Timeout,
}

impl Error {
    /// Local input validation failure. Never carries a status code.
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            status: None,
            details: None,
        }
    }

    /// Map a `reqwest` failure into a transport error.
    pub(crate) fn from_reqwest(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout }
        } else {
            Self::Connection(err.to_string())
        }
    }

    /// Classify a non-success response.
    ///
    /// `body` is the raw response text; it is parsed leniently so a plain
    /// text or empty body still produces a useful message.
    pub fn from_response(status: StatusCode, body: &str, retry_after_secs: Option<u64>) -> Self {
        let payload: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let fields = payload
            .as_ref()
            .and_then(|v| ErrorPayload::deserialize(v).ok())
            .unwrap_or_default();

        let message = fields.message().map_or_else(
            || {
                if body.trim().is_empty() || payload.is_some() {
                    status.to_string()
                } else {
                    body.trim().to_owned()
                }
            },
            str::to_owned,
        );

        match status.as_u16() {
            400 => Self::Validation {
                message,
                status: Some(400),
                details: payload,
            },
            401 => Self::Authentication {
                message,
                status: 401,
            },
            403 if fields.code.as_deref().is_some_and(is_permission_code) => Self::Permission {
                message,
                code: fields.code,
            },
            403 => Self::Authentication {
                message,
                status: 403,
            },
            404 => Self::NotFound { message },
            429 => Self::RateLimited {
                message,
                retry_after_secs,
            },
            other => Self::Api {
                status: other,
                message,
                code: fields.code,
            },
        }
    }

    /// Classify a `{code, msg}` envelope that arrived with HTTP 2xx but
    /// a non-`SUCCESS` code.
    pub(crate) fn from_envelope_code(code: &str, msg: Option<String>, status: StatusCode) -> Self {
        let message = msg.unwrap_or_else(|| code.to_owned());
        match code {
            "CODE_PARAMS_INVALID" => Self::Validation {
                message,
                status: Some(status.as_u16()),
                details: None,
            },
            "CODE_AUTH_FAILED" | "CODE_UNAUTHORIZED" | "CODE_TOKEN_INVALID" => {
                Self::Authentication {
                    message,
                    status: status.as_u16(),
                }
            }
            c if is_permission_code(c) => Self::Permission {
                message,
                code: Some(code.to_owned()),
            },
            "CODE_RESOURCE_NOT_FOUND" | "CODE_NOT_EXISTS" => Self::NotFound { message },
            _ => Self::Api {
                status: status.as_u16(),
                message,
                code: Some(code.to_owned()),
            },
        }
    }

    /// The error class this variant belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Permission { .. } => ErrorKind::Permission,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation { .. } | Self::InvalidUrl(_) => ErrorKind::Validation,
            Self::RateLimited { .. } => ErrorKind::RateLimit,
            Self::Api { .. } | Self::Deserialization { .. } => ErrorKind::Api,
            Self::Connection(_) | Self::Tls(_) | Self::Closed | Self::WebSocketConnect(_) => {
                ErrorKind::Connection
            }
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// HTTP status of the response that produced this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Validation { status, .. } => *status,
            Self::Permission { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Returns `true` if the failure may resolve on retry:
    /// connection failures, timeouts and HTTP 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Extract the controller's error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } | Self::Permission { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Codes the controller uses for "authenticated but not allowed".
fn is_permission_code(code: &str) -> bool {
    let upper = code.to_ascii_uppercase();
    upper.contains("FORBIDDEN") || upper.contains("PERMISSION")
}

/// Error fields the controller may put in a failure body.
#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorPayload {
    fn message(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .filter(|m| !m.is_empty())
    }
}
