// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup (a `.env`
//! file in the working directory is loaded first, if present) and is
//! immutable afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for user and task records | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8000` |
//! | `JWT_SECRET` | HMAC secret for signing access tokens | Required |
//! | `JWT_ALGORITHM` | `HS256`, `HS384` or `HS512` | `HS256` |
//! | `ACCESS_TOKEN_EXPIRE_MINUTES` | Access token lifetime, 1 to 525600 | `30` |
//! | `ARGON2_MEMORY_KIB` | Argon2 memory cost | `19456` |
//! | `ARGON2_TIME_COST` | Argon2 iterations | `2` |
//! | `ARGON2_PARALLELISM` | Argon2 lanes | `1` |
//! | `SEED_ADMIN_USERNAME` | Admin account created at startup if missing | unset |
//! | `SEED_ADMIN_EMAIL` | Email for the seeded admin | unset |
//! | `SEED_ADMIN_PASSWORD` | Password for the seeded admin | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::str::FromStr;

use chrono::Duration;
use jsonwebtoken::Algorithm;
use thiserror::Error;

use crate::auth::{AuthSettings, HashingParams};

pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_ALGORITHM_ENV: &str = "JWT_ALGORITHM";
pub const TOKEN_TTL_ENV: &str = "ACCESS_TOKEN_EXPIRE_MINUTES";
pub const ARGON2_MEMORY_ENV: &str = "ARGON2_MEMORY_KIB";
pub const ARGON2_TIME_ENV: &str = "ARGON2_TIME_COST";
pub const ARGON2_PARALLELISM_ENV: &str = "ARGON2_PARALLELISM";
pub const SEED_ADMIN_USERNAME_ENV: &str = "SEED_ADMIN_USERNAME";
pub const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;
/// Upper bound on the token lifetime: one year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Configuration errors. Startup aborts on any of them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Credentials for an admin account created at startup.
#[derive(Clone)]
pub struct SeedAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAdmin")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// `json` selects JSON output; anything else is pretty.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Process-wide configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: String,
    pub host: String,
    pub port: u16,
    pub auth: AuthSettings,
    pub seed_admin: Option<SeedAdmin>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let secret = get(JWT_SECRET_ENV).ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;

        let algorithm = match get(JWT_ALGORITHM_ENV) {
            Some(raw) => parse_algorithm(&raw)?,
            None => Algorithm::HS256,
        };

        let ttl_minutes: i64 = parse_or(get(TOKEN_TTL_ENV), TOKEN_TTL_ENV, DEFAULT_TOKEN_TTL_MINUTES)?;
        if ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                name: TOKEN_TTL_ENV,
                reason: "must be positive".to_string(),
            });
        }
        if ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            return Err(ConfigError::Invalid {
                name: TOKEN_TTL_ENV,
                reason: format!("must be at most {MAX_TOKEN_TTL_MINUTES}"),
            });
        }
        let access_token_ttl = Duration::try_minutes(ttl_minutes).ok_or(ConfigError::Invalid {
            name: TOKEN_TTL_ENV,
            reason: "out of range".to_string(),
        })?;

        let defaults = HashingParams::default();
        let hashing = HashingParams {
            memory_kib: parse_or(get(ARGON2_MEMORY_ENV), ARGON2_MEMORY_ENV, defaults.memory_kib)?,
            time_cost: parse_or(get(ARGON2_TIME_ENV), ARGON2_TIME_ENV, defaults.time_cost)?,
            parallelism: parse_or(
                get(ARGON2_PARALLELISM_ENV),
                ARGON2_PARALLELISM_ENV,
                defaults.parallelism,
            )?,
        };

        let seed_admin = match (
            get(SEED_ADMIN_USERNAME_ENV),
            get(SEED_ADMIN_EMAIL_ENV),
            get(SEED_ADMIN_PASSWORD_ENV),
        ) {
            (Some(username), Some(email), Some(password)) => Some(SeedAdmin {
                username,
                email,
                password,
            }),
            (None, None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    name: SEED_ADMIN_USERNAME_ENV,
                    reason: "seed admin needs username, email and password together".to_string(),
                })
            }
        };

        let log_format = LogFormat::parse(get(LOG_FORMAT_ENV).as_deref());

        Ok(Self {
            data_dir: get(DATA_DIR_ENV).unwrap_or_else(|| crate::storage::paths::DATA_ROOT.to_string()),
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(get(PORT_ENV), PORT_ENV, DEFAULT_PORT)?,
            auth: AuthSettings {
                secret,
                algorithm,
                access_token_ttl,
                hashing,
            },
            seed_admin,
            log_format,
        })
    }
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    let algorithm = Algorithm::from_str(raw.trim()).map_err(|_| ConfigError::Invalid {
        name: JWT_ALGORITHM_ENV,
        reason: format!("unknown algorithm {raw}"),
    })?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        _ => Err(ConfigError::Invalid {
            name: JWT_ALGORITHM_ENV,
            reason: "only HS256, HS384 and HS512 are supported".to_string(),
        }),
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn secret_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing(JWT_SECRET_ENV))));
        assert!(matches!(
            load(&[(JWT_SECRET_ENV, "  ")]),
            Err(ConfigError::Missing(JWT_SECRET_ENV))
        ));
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[(JWT_SECRET_ENV, "s3cret")]).unwrap();
        assert_eq!(config.auth.algorithm, Algorithm::HS256);
        assert_eq!(config.auth.access_token_ttl, Duration::minutes(30));
        assert_eq!(config.auth.hashing, HashingParams::default());
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.data_dir, "./data");
        assert!(config.seed_admin.is_none());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn overrides_apply() {
        let config = load(&[
            (JWT_SECRET_ENV, "s3cret"),
            (JWT_ALGORITHM_ENV, "HS512"),
            (TOKEN_TTL_ENV, "90"),
            (PORT_ENV, "9000"),
            (LOG_FORMAT_ENV, "json"),
            (ARGON2_MEMORY_ENV, "8192"),
        ])
        .unwrap();
        assert_eq!(config.auth.algorithm, Algorithm::HS512);
        assert_eq!(config.auth.access_token_ttl, Duration::minutes(90));
        assert_eq!(config.auth.hashing.memory_kib, 8192);
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn asymmetric_algorithm_is_rejected() {
        let result = load(&[(JWT_SECRET_ENV, "s"), (JWT_ALGORITHM_ENV, "RS256")]);
        assert!(matches!(result, Err(ConfigError::Invalid { name: JWT_ALGORITHM_ENV, .. })));

        let result = load(&[(JWT_SECRET_ENV, "s"), (JWT_ALGORITHM_ENV, "none")]);
        assert!(matches!(result, Err(ConfigError::Invalid { name: JWT_ALGORITHM_ENV, .. })));
    }

    #[test]
    fn oversized_ttl_is_rejected() {
        let result = load(&[(JWT_SECRET_ENV, "s"), (TOKEN_TTL_ENV, "1000000000000")]);
        assert!(matches!(result, Err(ConfigError::Invalid { name: TOKEN_TTL_ENV, .. })));

        let max = MAX_TOKEN_TTL_MINUTES.to_string();
        let config = load(&[(JWT_SECRET_ENV, "s"), (TOKEN_TTL_ENV, max.as_str())]).unwrap();
        assert_eq!(config.auth.access_token_ttl, Duration::minutes(MAX_TOKEN_TTL_MINUTES));
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        let result = load(&[(JWT_SECRET_ENV, "s"), (TOKEN_TTL_ENV, "0")]);
        assert!(matches!(result, Err(ConfigError::Invalid { name: TOKEN_TTL_ENV, .. })));

        let result = load(&[(JWT_SECRET_ENV, "s"), (TOKEN_TTL_ENV, "soon")]);
        assert!(matches!(result, Err(ConfigError::Invalid { name: TOKEN_TTL_ENV, .. })));
    }

    #[test]
    fn partial_seed_admin_is_rejected() {
        let result = load(&[(JWT_SECRET_ENV, "s"), (SEED_ADMIN_USERNAME_ENV, "root")]);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));

        let config = load(&[
            (JWT_SECRET_ENV, "s"),
            (SEED_ADMIN_USERNAME_ENV, "root"),
            (SEED_ADMIN_EMAIL_ENV, "root@example.com"),
            (SEED_ADMIN_PASSWORD_ENV, "changeme123"),
        ])
        .unwrap();
        let seed = config.seed_admin.unwrap();
        assert_eq!(seed.username, "root");
        assert!(!format!("{seed:?}").contains("changeme123"));
    }

    #[test]
    fn debug_output_hides_secret() {
        let config = load(&[(JWT_SECRET_ENV, "do-not-print")]).unwrap();
        assert!(!format!("{config:?}").contains("do-not-print"));
    }
}
