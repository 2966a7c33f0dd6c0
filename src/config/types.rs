//! Core configuration types.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::defaults::{
    default_channel_capacity, default_client_version, default_connect_timeout_ms,
    default_greeting_delay_ms, default_pong_token, default_read_timeout_ms, default_true,
    default_write_timeout_ms,
};
use super::validation::{ValidationError, validate};
use crate::network::{ConnectOptions, ConnectionSettings, Registration, TlsMode};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Behaviour shared by every Connection.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Default registration identity.
    pub identity: Option<IdentityConfig>,
    /// Raw traffic log.
    #[serde(default)]
    pub raw_log: RawLogConfig,
    /// Networks to connect to.
    #[serde(default, rename = "network")]
    pub networks: Vec<NetworkConfig>,
}

/// Settings applied to every outbound Connection.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Sent in CTCP VERSION replies.
    #[serde(default = "default_client_version")]
    pub client_version: String,
    /// Sent as `PONG <token>` in reply to every PING.
    #[serde(default = "default_pong_token")]
    pub pong_token: String,
    /// Capacity of the shared line channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Read deadline, also the shutdown poll interval.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Pause after connecting and after registering.
    #[serde(default = "default_greeting_delay_ms")]
    pub greeting_delay_ms: u64,
    /// Deadline for TCP connect plus TLS handshake.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Deadline for writing one line.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            client_version: default_client_version(),
            pong_token: default_pong_token(),
            channel_capacity: default_channel_capacity(),
            read_timeout_ms: default_read_timeout_ms(),
            greeting_delay_ms: default_greeting_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

impl GatewayConfig {
    /// Convert into the settings the Connections run with.
    pub fn settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            client_version: self.client_version.clone(),
            pong_token: self.pong_token.clone(),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            greeting_delay: Duration::from_millis(self.greeting_delay_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
        }
    }
}

/// Default nick and display name sent during registration.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub nick: String,
    /// Display name (realname); defaults to the nick.
    pub name: Option<String>,
}

/// Raw traffic log configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLogConfig {
    /// Log file path. Raw logging is off when unset.
    pub path: Option<PathBuf>,
}

/// One IRC network to connect to.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// `host:port` of the server (e.g. "irc.libera.chat:6697").
    pub address: String,
    /// Nick override for this network.
    pub nick: Option<String>,
    /// Display name override for this network.
    pub name: Option<String>,
    /// NickServ password, sent once after connecting.
    pub password: Option<String>,
    /// Force TLS on or off. Unset means TLS on port 6697 only.
    pub tls: Option<bool>,
    /// Verify the server certificate (only applies to TLS).
    #[serde(default = "default_true")]
    pub verify_cert: bool,
    /// Connect at startup.
    #[serde(default = "default_true")]
    pub autoconnect: bool,
}

impl NetworkConfig {
    /// Registration for this network: its own nick, else the identity's.
    /// `None` when neither is configured.
    pub fn registration(&self, identity: Option<&IdentityConfig>) -> Option<Registration> {
        let nick = self
            .nick
            .clone()
            .or_else(|| identity.map(|i| i.nick.clone()))?;
        let name = self
            .name
            .clone()
            .or_else(|| identity.and_then(|i| i.name.clone()))
            .unwrap_or_else(|| nick.clone());
        Some(Registration { nick, name })
    }

    /// Options used to dial this network.
    pub fn connect_options(&self, identity: Option<&IdentityConfig>) -> ConnectOptions {
        ConnectOptions {
            registration: self.registration(identity),
            tls: match self.tls {
                None => TlsMode::Auto,
                Some(true) => TlsMode::Always,
                Some(false) => TlsMode::Never,
            },
            verify_cert: self.verify_cert,
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        validate(&config).map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Registration used by networks without their own nick.
    pub fn default_registration(&self) -> Option<Registration> {
        let identity = self.identity.as_ref()?;
        Some(Registration {
            nick: identity.nick.clone(),
            name: identity
                .name
                .clone()
                .unwrap_or_else(|| identity.nick.clone()),
        })
    }
}
