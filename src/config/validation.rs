//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::collections::HashSet;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("gateway.channel_capacity must be at least 1")]
    ZeroChannelCapacity,
    #[error("gateway.read_timeout_ms must be at least 1")]
    ZeroReadTimeout,
    #[error("gateway.connect_timeout_ms must be at least 1")]
    ZeroConnectTimeout,
    #[error("gateway.write_timeout_ms must be at least 1")]
    ZeroWriteTimeout,
    #[error("gateway.pong_token must be a single non-empty word, got {0:?}")]
    InvalidPongToken(String),
    #[error("network.address is required")]
    MissingAddress,
    #[error("network {0} is configured more than once")]
    DuplicateNetwork(String),
    #[error("nick for network {0} must not be empty or contain spaces")]
    InvalidNick(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.gateway.channel_capacity == 0 {
        errors.push(ValidationError::ZeroChannelCapacity);
    }
    if config.gateway.read_timeout_ms == 0 {
        errors.push(ValidationError::ZeroReadTimeout);
    }
    if config.gateway.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }
    if config.gateway.write_timeout_ms == 0 {
        errors.push(ValidationError::ZeroWriteTimeout);
    }
    let token = &config.gateway.pong_token;
    if token.is_empty() || token.contains(char::is_whitespace) {
        errors.push(ValidationError::InvalidPongToken(token.clone()));
    }

    let mut seen = HashSet::new();
    for network in &config.networks {
        if network.address.trim().is_empty() {
            errors.push(ValidationError::MissingAddress);
            continue;
        }
        if !seen.insert(network.address.as_str()) {
            errors.push(ValidationError::DuplicateNetwork(network.address.clone()));
        }
        if let Some(registration) = network.registration(config.identity.as_ref())
            && (registration.nick.is_empty() || registration.nick.contains(' '))
        {
            errors.push(ValidationError::InvalidNick(network.address.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
