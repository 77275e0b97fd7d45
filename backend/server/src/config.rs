use std::{env, fmt::Display, fs::read_to_string, io::ErrorKind, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

const SECRETS_DIR: &str = "/run/secrets";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to read secret {name}: {reason}")]
    Secret { name: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub redis_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let redis_url = match var("REDIS_URL") {
            Some(url) => Some(with_password(&url, read_secret("REDIS_PASSWORD")?.as_deref())),
            None => {
                info!("REDIS_URL not set, keeping observations in memory");
                None
            }
        };

        Ok(Self {
            port: try_load("RUST_PORT", "1111")?,
            redis_url,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    parse(key, var(key), default)
}

fn parse<T: FromStr>(key: &str, value: Option<String>, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    value
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");

            ConfigError::InvalidValue {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
}

/// Docker secret, `None` when the file is absent.
fn read_secret(secret_name: &str) -> Result<Option<String>, ConfigError> {
    let path = format!("{SECRETS_DIR}/{secret_name}");

    match read_to_string(&path) {
        Ok(s) => Ok(Some(s.trim().to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => {
            warn!("Failed to read {secret_name} from file: {e}");

            Err(ConfigError::Secret {
                name: secret_name.to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Splices a password into a `redis://host` style URL that has no credentials yet.
fn with_password(url: &str, password: Option<&str>) -> String {
    let Some(password) = password.filter(|p| !p.is_empty()) else {
        return url.to_string();
    };

    match url.split_once("://") {
        Some((scheme, rest)) if !rest.contains('@') => format!("{scheme}://:{password}@{rest}"),
        _ => url.to_string(),
    }
}
