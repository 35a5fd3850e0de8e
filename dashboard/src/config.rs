use std::env::{self, VarError};
use std::str::FromStr;
use std::time::Duration;

use coordinator::{CoordinatorOptions, DEFAULT_CACHE_DURATION, DEFAULT_DEBOUNCE};
use payloads::api_client::DEFAULT_TIMEOUT;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the StarFrete backend, without the `/api` suffix.
    pub backend_url: String,
    pub request_timeout: Duration,
    /// Cache lifetime of the public freight listing. The role dashboards
    /// keep their own lifetimes, tuned to how often their data changes.
    pub cache_duration: Duration,
    /// Debounce of the public freight listing's search.
    pub debounce: Duration,
    /// Credentials to log in with at startup, if any.
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend_url = optional("BACKEND_URL")?
            .ok_or(ConfigError::Missing("BACKEND_URL"))?;

        Ok(Config {
            backend_url,
            request_timeout: parsed::<u64>("REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            cache_duration: parsed::<u64>("CACHE_DURATION_MS")?
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_CACHE_DURATION),
            debounce: parsed::<u64>("DEBOUNCE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_DEBOUNCE),
            email: optional("STARFRETE_EMAIL")?,
            password: optional("STARFRETE_PASSWORD")?,
        })
    }

    /// Coordinator options for the public freight listing.
    pub fn listing_options<T>(&self) -> CoordinatorOptions<T> {
        CoordinatorOptions::default()
            .cache_duration(self.cache_duration)
            .debounce(self.debounce)
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.email.as_deref()?, self.password.as_deref()?))
    }
}

/// Unset and empty variables both read as `None`.
fn optional(name: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(value)) => Err(ConfigError::Invalid {
            name,
            value: value.to_string_lossy().into_owned(),
        }),
    }
}

fn parsed<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    let Some(value) = optional(name)? else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::Invalid { name, value })
}
