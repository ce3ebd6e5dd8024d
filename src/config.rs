// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the start-up loader. The
//! configuration is read and validated once; nothing reads the environment
//! at request time.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ENCRYPTION_PASSPHRASE` | Passphrase protecting every stored item | Required |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWKS_URL` | Identity provider JWKS endpoint (https) | Unset: development auth |
//! | `TOKEN_ISSUER` | Expected JWT issuer claim | Optional |
//! | `TOKEN_AUDIENCE` | Expected JWT audience claim | Optional |
//! | `IDENTITY_REGION` | Region prefix of resolved identity ids | `eu-central-1` |
//! | `STORE_PAGE_SIZE` | Listing page size of the in-memory store | `10` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate chain and key | Unset: plain HTTP |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;

pub const ENCRYPTION_PASSPHRASE_ENV: &str = "ENCRYPTION_PASSPHRASE";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWKS_URL_ENV: &str = "JWKS_URL";
pub const TOKEN_ISSUER_ENV: &str = "TOKEN_ISSUER";
pub const TOKEN_AUDIENCE_ENV: &str = "TOKEN_AUDIENCE";
pub const IDENTITY_REGION_ENV: &str = "IDENTITY_REGION";
pub const STORE_PAGE_SIZE_ENV: &str = "STORE_PAGE_SIZE";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_IDENTITY_REGION: &str = "eu-central-1";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Configuration errors detected at start-up.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set to a non-empty value")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// PEM files enabling HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Application configuration loaded from the environment.
#[derive(Clone)]
pub struct AppConfig {
    pub encryption_passphrase: String,
    pub bind_addr: SocketAddr,
    pub jwks_url: Option<String>,
    pub token_issuer: Option<String>,
    pub token_audience: Option<String>,
    pub identity_region: String,
    pub store_page_size: usize,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("encryption_passphrase", &"[REDACTED]")
            .field("bind_addr", &self.bind_addr)
            .field("jwks_url", &self.jwks_url)
            .field("token_issuer", &self.token_issuer)
            .field("token_audience", &self.token_audience)
            .field("identity_region", &self.identity_region)
            .field("store_page_size", &self.store_page_size)
            .field("tls", &self.tls)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let encryption_passphrase =
            get(ENCRYPTION_PASSPHRASE_ENV).ok_or(ConfigError::Missing(ENCRYPTION_PASSPHRASE_ENV))?;

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(port) => port.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let bind_addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: HOST_ENV,
                reason: e.to_string(),
            })?;

        let jwks_url = get(JWKS_URL_ENV)
            .map(|raw| validate_jwks_url(&raw).map(|_| raw))
            .transpose()?;

        let store_page_size = match get(STORE_PAGE_SIZE_ENV) {
            Some(size) => match size.parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: STORE_PAGE_SIZE_ENV,
                        reason: format!("expected a positive integer, got {size:?}"),
                    })
                }
            },
            None => crate::storage::memory::DEFAULT_PAGE_SIZE,
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    name: TLS_CERT_PATH_ENV,
                    reason: format!("{TLS_CERT_PATH_ENV} and {TLS_KEY_PATH_ENV} must be set together"),
                })
            }
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            encryption_passphrase,
            bind_addr,
            jwks_url,
            token_issuer: get(TOKEN_ISSUER_ENV),
            token_audience: get(TOKEN_AUDIENCE_ENV),
            identity_region: get(IDENTITY_REGION_ENV)
                .unwrap_or_else(|| DEFAULT_IDENTITY_REGION.to_string()),
            store_page_size,
            tls,
            log_format,
        })
    }
}

/// JWKS must be fetched over HTTPS.
fn validate_jwks_url(raw: &str) -> Result<(), ConfigError> {
    let url = url::Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name: JWKS_URL_ENV,
        reason: e.to_string(),
    })?;
    if url.scheme() != "https" {
        return Err(ConfigError::Invalid {
            name: JWKS_URL_ENV,
            reason: "must use https".to_string(),
        });
    }
    Ok(())
}
