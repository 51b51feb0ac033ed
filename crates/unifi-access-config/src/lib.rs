//! Configuration for UniFi Access clients.
//!
//! TOML profiles, environment overrides, credential resolution
//! (env var → keyring → plaintext) and translation to
//! `unifi_access_api::ClientConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use unifi_access_api::{ClientConfig, DEFAULT_PORT};

/// Prefix of every environment variable this crate reads.
pub const ENV_PREFIX: &str = "UNIFI_ACCESS_";
/// Environment variable holding the bearer token.
pub const TOKEN_ENV: &str = "UNIFI_ACCESS_TOKEN";
const HOST_ENV: &str = "UNIFI_ACCESS_HOST";
const KEYRING_SERVICE: &str = "unifi-access";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    /// Values for any setting a profile leaves out.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile<'a>(
        &'a self,
        name: Option<&'a str>,
    ) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|profile| (name, profile))
            .ok_or_else(|| ConfigError::UnknownProfile(name.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub verify_ssl: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between retries in seconds; fractions allowed.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: f64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            port: default_port(),
            verify_ssl: false,
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay() -> f64 {
    1.0
}

/// A named controller profile. Unset fields fall back to [`Defaults`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Controller hostname or IP (no scheme).
    pub host: String,

    pub port: Option<u16>,

    /// Bearer token (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    pub verify_ssl: Option<bool>,

    pub timeout: Option<u64>,

    pub max_retries: Option<u32>,

    pub retry_delay: Option<f64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "unifi-access", "unifi-access").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("unifi-access");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical path.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults merged with the TOML file at `path`. A missing file
/// yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .extract()?;
    Ok(config)
}

/// Build a profile from `UNIFI_ACCESS_*` variables alone.
///
/// Returns `None` when `UNIFI_ACCESS_HOST` is unset. The token is always
/// read from `UNIFI_ACCESS_TOKEN` at resolution time.
pub fn profile_from_env() -> Result<Option<Profile>, ConfigError> {
    if std::env::var_os(HOST_ENV).is_none() {
        return Ok(None);
    }

    let mut profile: Profile = Figment::new()
        .merge(Env::prefixed(ENV_PREFIX).only(&[
            "host",
            "port",
            "verify_ssl",
            "timeout",
            "max_retries",
            "retry_delay",
        ]))
        .extract()?;
    profile.token_env = Some(TOKEN_ENV.into());
    Ok(Some(profile))
}

/// The `ClientConfig` a process should use: the environment when
/// `UNIFI_ACCESS_HOST` is set, otherwise the named (or default) profile
/// from the config file.
pub fn load_client_config(profile_name: Option<&str>) -> Result<ClientConfig, ConfigError> {
    let config = load_config()?;
    if let Some(profile) = profile_from_env()? {
        debug!("using connection settings from environment");
        return profile_to_client_config(&profile, "env", &config.defaults);
    }
    let (name, profile) = config.profile(profile_name)?;
    profile_to_client_config(profile, name, &config.defaults)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token"))
}

/// Resolve a token: `token_env` variable, then system keyring, then
/// plaintext in the profile.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(secret) = keyring_entry(profile_name).and_then(|entry| entry.get_password()) {
        return Ok(SecretString::from(secret));
    }

    if let Some(ref token) = profile.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a profile's token in the system keyring.
pub fn store_token(profile_name: &str, token: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token.expose_secret())?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ClientConfig` from a profile, filling gaps from `defaults`.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let host = profile.host.trim();
    if host.is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("profile '{profile_name}' has no host"),
        });
    }
    if host.contains("://") {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("expected a bare hostname, got '{host}'"),
        });
    }

    let retry_delay = profile.retry_delay.unwrap_or(defaults.retry_delay);
    let retry_delay =
        Duration::try_from_secs_f64(retry_delay).map_err(|_| ConfigError::Validation {
            field: "retry_delay".into(),
            reason: format!("expected a non-negative number of seconds, got {retry_delay}"),
        })?;

    let timeout = profile.timeout.unwrap_or(defaults.timeout);
    if timeout == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let token = resolve_token(profile, profile_name)?;

    Ok(ClientConfig::new(host, token)
        .with_port(profile.port.unwrap_or(defaults.port))
        .with_verify_ssl(profile.verify_ssl.unwrap_or(defaults.verify_ssl))
        .with_timeout(Duration::from_secs(timeout))
        .with_max_retries(profile.max_retries.unwrap_or(defaults.max_retries))
        .with_retry_delay(retry_delay))
}
