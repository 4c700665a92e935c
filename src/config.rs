// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and the startup loader.
//! Configuration is read from the environment once at startup; missing
//! authentication secrets fail fast rather than silently disabling
//! verification.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `INIT_DATA_SECRET` | Application secret for the Mini App scheme | Scheme disabled if unset |
//! | `INIT_DATA_MAX_AGE_SECS` | Maximum accepted credential age | `86400` |
//! | `AUTH_JWKS_BASE_URL` | Identity backend base URL (well-known key-set path is appended) | Scheme disabled if unset |
//! | `AUTH_ISSUER` | Expected JWT issuer claim | Optional |
//! | `AUTH_AUDIENCE` | Expected JWT audience claim | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! At least one of `INIT_DATA_SECRET` / `AUTH_JWKS_BASE_URL` must be set.

use std::env;
use std::time::Duration;

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the Mini App application secret.
///
/// The long-lived shared secret the host application issues for this
/// deployment. Setting it enables the `tma` credential scheme.
pub const INIT_DATA_SECRET_ENV: &str = "INIT_DATA_SECRET";

/// Environment variable name for the Mini App credential max age override.
pub const INIT_DATA_MAX_AGE_ENV: &str = "INIT_DATA_MAX_AGE_SECS";

/// Environment variable name for the identity backend base URL.
///
/// The key-set endpoint is derived by appending the well-known path.
/// Setting it enables the `Bearer` token scheme.
pub const JWKS_BASE_URL_ENV: &str = "AUTH_JWKS_BASE_URL";

/// Environment variable name for the expected token issuer.
pub const ISSUER_ENV: &str = "AUTH_ISSUER";

/// Environment variable name for the expected token audience.
pub const AUDIENCE_ENV: &str = "AUTH_AUDIENCE";

/// Environment variable name selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Configuration loading errors. Startup aborts on any of these.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "no authentication scheme configured: set {INIT_DATA_SECRET_ENV} and/or {JWKS_BASE_URL_ENV}"
    )]
    NoSchemeConfigured,

    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: &'static str, message: String },
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub init_data_secret: Option<String>,
    pub init_data_max_age: Duration,
    pub jwks_base_url: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary lookup, so tests can supply
    /// values without touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                var: PORT_ENV,
                message: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let init_data_secret = lookup(INIT_DATA_SECRET_ENV).filter(|s| !s.is_empty());

        let init_data_max_age = match lookup(INIT_DATA_MAX_AGE_ENV) {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    var: INIT_DATA_MAX_AGE_ENV,
                    message: e.to_string(),
                })?;
                Duration::from_secs(secs)
            }
            None => crate::auth::init_data::DEFAULT_MAX_AGE,
        };

        let jwks_base_url = lookup(JWKS_BASE_URL_ENV).filter(|s| !s.is_empty());

        if init_data_secret.is_none() && jwks_base_url.is_none() {
            return Err(ConfigError::NoSchemeConfigured);
        }

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host,
            port,
            init_data_secret,
            init_data_max_age,
            jwks_base_url,
            issuer: lookup(ISSUER_ENV).filter(|s| !s.is_empty()),
            audience: lookup(AUDIENCE_ENV).filter(|s| !s.is_empty()),
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[test]
    fn rejects_empty_configuration() {
        let result = AppConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::NoSchemeConfigured)));
    }

    #[test]
    fn single_scheme_is_sufficient() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("INIT_DATA_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.init_data_secret.as_deref(), Some("s3cret"));
        assert!(config.jwks_base_url.is_none());

        let config = AppConfig::from_lookup(lookup_from(&[(
            "AUTH_JWKS_BASE_URL",
            "https://issuer.example.com",
        )]))
        .unwrap();
        assert!(config.init_data_secret.is_none());
        assert_eq!(
            config.jwks_base_url.as_deref(),
            Some("https://issuer.example.com")
        );
    }

    #[test]
    fn empty_strings_do_not_enable_a_scheme() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("INIT_DATA_SECRET", ""),
            ("AUTH_JWKS_BASE_URL", ""),
        ]));
        assert!(matches!(result, Err(ConfigError::NoSchemeConfigured)));
    }

    #[test]
    fn defaults_apply() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("INIT_DATA_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.init_data_max_age, Duration::from_secs(86_400));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("INIT_DATA_SECRET", "s3cret"),
            ("PORT", "not-a-port"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { var: "PORT", .. })
        ));
    }

    #[test]
    fn max_age_override_parses() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("INIT_DATA_SECRET", "s3cret"),
            ("INIT_DATA_MAX_AGE_SECS", "3600"),
        ]))
        .unwrap();
        assert_eq!(config.init_data_max_age, Duration::from_secs(3600));
    }

    #[test]
    fn json_log_format_is_selected() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("INIT_DATA_SECRET", "s3cret"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
