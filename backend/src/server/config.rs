//! Process configuration read from the environment.
//!
//! Values are read through [`mockable::Env`] so tests can drive every branch
//! with `MockEnv`. Debug builds tolerate missing or malformed values and fall
//! back to development defaults with a warning; release builds fail fast.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use mockable::{DefaultEnv, Env};
use rand::RngCore;
use thiserror::Error;
use tracing::warn;
use vita_backend::domain::DEFAULT_TOKEN_TTL_MINUTES;
use vita_backend::outbound::security::MIN_SECRET_LEN;
use zeroize::{Zeroize, Zeroizing};

pub(crate) const BIND_ADDR_ENV: &str = "BIND_ADDR";
pub(crate) const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub(crate) const SECRET_FILE_ENV: &str = "TOKEN_SECRET_FILE";
pub(crate) const ALLOW_EPHEMERAL_ENV: &str = "TOKEN_ALLOW_EPHEMERAL";
pub(crate) const TOKEN_TTL_ENV: &str = "TOKEN_TTL_MINUTES";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const SECRET_DEFAULT_PATH: &str = "/var/run/secrets/token_secret";
const EPHEMERAL_SECRET_LEN: usize = 64;
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SOCKET_EXPECTED: &str = "host:port";
const TTL_EXPECTED: &str = "positive integer minutes";

/// Build mode used to decide how strict configuration parsing should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    pub fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Errors raised when the environment cannot produce valid settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?} (expected {expected})")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read token secret at {path}: {source}")]
    SecretRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("token secret at {path} is {length} bytes; need at least {min_len}")]
    SecretTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("TOKEN_ALLOW_EPHEMERAL=1 is not permitted in release builds")]
    EphemeralNotAllowed,
}

/// Settings needed to bootstrap the server.
pub struct AppSettings {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub token_secret: Zeroizing<Vec<u8>>,
    pub token_ttl: Duration,
}

impl AppSettings {
    /// Read settings from `env`, applying the strictness of `mode`.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a release build meets a missing secret,
    /// a malformed value, or an ephemeral-secret request.
    pub fn from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Self, ConfigError> {
        let bind_addr = bind_addr_from_env(env, mode)?;
        let database_url = database_url_from_env(env);
        let allow_ephemeral = allow_ephemeral_from_env(env, mode)?;
        let token_secret = token_secret_from_env(env, mode, allow_ephemeral)?;
        let token_ttl = token_ttl_from_env(env, mode)?;
        Ok(Self {
            bind_addr,
            database_url,
            token_secret,
            token_ttl,
        })
    }
}

/// Load settings from the process environment for the current build.
///
/// # Errors
/// See [`AppSettings::from_env`].
pub fn load_settings() -> Result<AppSettings, ConfigError> {
    AppSettings::from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn bind_addr_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<SocketAddr, ConfigError> {
    let Some(value) = env.string(BIND_ADDR_ENV) else {
        return Ok(default_bind_addr());
    };
    match value.trim().parse::<SocketAddr>() {
        Ok(addr) => Ok(addr),
        Err(_) if mode.is_debug() => {
            warn!(value = %value, default = DEFAULT_BIND_ADDR, "invalid BIND_ADDR, using default");
            Ok(default_bind_addr())
        }
        Err(_) => Err(ConfigError::InvalidEnv {
            name: BIND_ADDR_ENV,
            value,
            expected: SOCKET_EXPECTED,
        }),
    }
}

fn database_url_from_env<E: Env>(env: &E) -> Option<String> {
    match env.string(DATABASE_URL_ENV) {
        Some(url) if !url.trim().is_empty() => Some(normalise_database_url(url.trim())),
        _ => {
            warn!("DATABASE_URL not set; using in-memory repositories");
            None
        }
    }
}

pub(crate) fn normalise_database_url(url: &str) -> String {
    match url.strip_prefix("postgres://") {
        Some(rest) => format!("postgresql://{rest}"),
        None => url.to_owned(),
    }
}

fn allow_ephemeral_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<bool, ConfigError> {
    let Some(value) = env.string(ALLOW_EPHEMERAL_ENV) else {
        return Ok(false);
    };
    match parse_bool(&value) {
        Some(true) if mode.is_debug() => Ok(true),
        Some(true) => Err(ConfigError::EphemeralNotAllowed),
        Some(false) => Ok(false),
        None if mode.is_debug() => {
            warn!(value = %value, "invalid TOKEN_ALLOW_EPHEMERAL; defaulting to disabled");
            Ok(false)
        }
        None => Err(ConfigError::InvalidEnv {
            name: ALLOW_EPHEMERAL_ENV,
            value,
            expected: BOOL_EXPECTED,
        }),
    }
}

fn token_secret_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Zeroizing<Vec<u8>>, ConfigError> {
    let secret_path = env
        .string(SECRET_FILE_ENV)
        .unwrap_or_else(|| SECRET_DEFAULT_PATH.to_string());
    let path = PathBuf::from(secret_path);

    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < MIN_SECRET_LEN {
                bytes.zeroize();
                return Err(ConfigError::SecretTooShort {
                    path,
                    length,
                    min_len: MIN_SECRET_LEN,
                });
            }
            Ok(Zeroizing::new(bytes))
        }
        Err(error) => {
            if mode.is_debug() || allow_ephemeral {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "using temporary token secret (dev only)"
                );
                Ok(ephemeral_secret())
            } else {
                Err(ConfigError::SecretRead {
                    path,
                    source: error,
                })
            }
        }
    }
}

fn ephemeral_secret() -> Zeroizing<Vec<u8>> {
    let mut secret = Zeroizing::new(vec![0_u8; EPHEMERAL_SECRET_LEN]);
    rand::thread_rng().fill_bytes(secret.as_mut_slice());
    secret
}

fn token_ttl_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Duration, ConfigError> {
    let default_ttl = Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES);
    let Some(value) = env.string(TOKEN_TTL_ENV) else {
        return Ok(default_ttl);
    };
    match value.trim().parse::<i64>() {
        Ok(minutes) if minutes > 0 => Ok(Duration::minutes(minutes)),
        _ if mode.is_debug() => {
            warn!(value = %value, "invalid TOKEN_TTL_MINUTES, using default");
            Ok(default_ttl)
        }
        _ => Err(ConfigError::InvalidEnv {
            name: TOKEN_TTL_ENV,
            value,
            expected: TTL_EXPECTED,
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
