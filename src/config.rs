// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! [`AppConfig`] object built from them. Configuration is loaded from the
//! environment once at startup and never re-read.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `FORUM_BASE_URL` | Base URL of the NodeBB forum | Required |
//! | `FORUM_BEARER_TOKEN` | Service bearer token used for user creation | Optional |
//! | `FORUM_TIMEOUT_SECS` | Deadline for each upstream request | `15` |
//! | `FORUM_SESSION_COOKIE` | Name of the forum session cookie | `express.sid` |
//! | `DIRECTORY_PATH` | redb file backing the account directory | In-memory |
//! | `DIRECTORY_COLLECTION` | Account directory collection name | `users` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `COOKIE_SECURE` | Mark cookies set by the gateway as `Secure` | `true` |
//! | `FRONTEND_ORIGINS` | Comma-separated CORS origins | Permissive |
//! | `TLS_CERT_PATH` | PEM certificate chain (HTTPS when set with key) | Optional |
//! | `TLS_KEY_PATH` | PEM private key | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{path::PathBuf, time::Duration};

use url::Url;

pub const FORUM_BASE_URL_ENV: &str = "FORUM_BASE_URL";
pub const FORUM_BEARER_TOKEN_ENV: &str = "FORUM_BEARER_TOKEN";
pub const FORUM_TIMEOUT_SECS_ENV: &str = "FORUM_TIMEOUT_SECS";
pub const FORUM_SESSION_COOKIE_ENV: &str = "FORUM_SESSION_COOKIE";
pub const DIRECTORY_PATH_ENV: &str = "DIRECTORY_PATH";
pub const DIRECTORY_COLLECTION_ENV: &str = "DIRECTORY_COLLECTION";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const COOKIE_SECURE_ENV: &str = "COOKIE_SECURE";
pub const FRONTEND_ORIGINS_ENV: &str = "FRONTEND_ORIGINS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Cookie name NodeBB (express-session) uses for the session.
pub const DEFAULT_SESSION_COOKIE: &str = "express.sid";

/// Upstream request deadline.
///
/// A hung forum must not hang the inbound request forever; once the deadline
/// passes the call is reported as unreachable (504).
pub const DEFAULT_FORUM_TIMEOUT_SECS: u64 = 15;

pub const DEFAULT_DIRECTORY_COLLECTION: &str = "users";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Default tracing filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::Invalid {
                name: LOG_FORMAT_ENV,
                reason: format!("expected `json` or `pretty`, got `{other}`"),
            }),
        }
    }
}

/// TLS certificate and key locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Process-wide configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub forum_base_url: Url,
    pub forum_bearer_token: Option<String>,
    pub forum_timeout: Duration,
    pub session_cookie_name: String,
    pub directory_path: Option<PathBuf>,
    pub directory_collection: String,
    pub host: String,
    pub port: u16,
    pub secure_cookies: bool,
    pub frontend_origins: Vec<String>,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let raw_url = get(FORUM_BASE_URL_ENV).ok_or(ConfigError::Missing(FORUM_BASE_URL_ENV))?;
        let forum_base_url = Url::parse(&raw_url).map_err(|e| ConfigError::Invalid {
            name: FORUM_BASE_URL_ENV,
            reason: e.to_string(),
        })?;
        if !matches!(forum_base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                name: FORUM_BASE_URL_ENV,
                reason: format!("unsupported scheme `{}`", forum_base_url.scheme()),
            });
        }

        let forum_timeout = match get(FORUM_TIMEOUT_SECS_ENV) {
            Some(raw) => match parse_number(FORUM_TIMEOUT_SECS_ENV, &raw)? {
            0 => {
                return Err(ConfigError::Invalid {
                    name: FORUM_TIMEOUT_SECS_ENV,
                    reason: "timeout must be at least one second".to_string(),
                })
            }
            secs => Duration::from_secs(secs),
        },
            None => Duration::from_secs(DEFAULT_FORUM_TIMEOUT_SECS),
        };

        let port = match get(PORT_ENV) {
            Some(raw) => parse_number(PORT_ENV, &raw)?,
            None => DEFAULT_PORT,
        };

        let secure_cookies = match get(COOKIE_SECURE_ENV) {
            Some(raw) => parse_bool(COOKIE_SECURE_ENV, &raw)?,
            None => true,
        };

        let frontend_origins = get(FRONTEND_ORIGINS_ENV)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(raw) => LogFormat::parse(&raw)?,
            None => LogFormat::default(),
        };

        Ok(Self {
            forum_base_url,
            forum_bearer_token: get(FORUM_BEARER_TOKEN_ENV),
            forum_timeout,
            session_cookie_name: get(FORUM_SESSION_COOKIE_ENV)
                .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string()),
            directory_path: get(DIRECTORY_PATH_ENV).map(PathBuf::from),
            directory_collection: get(DIRECTORY_COLLECTION_ENV)
                .unwrap_or_else(|| DEFAULT_DIRECTORY_COLLECTION.to_string()),
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            secure_cookies,
            frontend_origins,
            tls,
            log_format,
        })
    }

    /// Minimal configuration pointing at `base_url`, used by tests.
    pub fn for_forum(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = base_url.to_string();
        Self::from_lookup(move |name| (name == FORUM_BASE_URL_ENV).then(|| base_url.clone()))
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got `{other}`"),
        }),
    }
}
