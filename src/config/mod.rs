//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions (Config, GatewayConfig, NetworkConfig)
//! - [`defaults`]: serde default value functions
//! - [`validation`]: startup checks (ValidationError)

mod defaults;
mod types;
mod validation;

pub use types::{Config, ConfigError, GatewayConfig, IdentityConfig, NetworkConfig, RawLogConfig};
pub use validation::{ValidationError, validate};
