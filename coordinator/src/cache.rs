use std::time::Duration;

use payloads::envelope::{self, Normalized};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;

use crate::FetchError;

/// Cached result of one coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub data: Option<T>,
    pub last_fetched_at: Option<Instant>,
    pub error: Option<String>,
}

impl<T> CacheEntry<T> {
    pub fn new(initial_data: Option<T>) -> Self {
        Self {
            data: initial_data,
            last_fetched_at: None,
            error: None,
        }
    }

    /// True if nothing was fetched yet or the last fetch is at least
    /// `max_age` old.
    pub fn is_stale(&self, max_age: Duration, now: Instant) -> bool {
        match self.last_fetched_at {
            None => true,
            Some(fetched_at) => now.saturating_duration_since(fetched_at) >= max_age,
        }
    }

    /// True if there is data young enough to serve without a request.
    pub fn is_fresh(&self, max_age: Duration, now: Instant) -> bool {
        self.data.is_some() && !self.is_stale(max_age, now)
    }

    pub fn store(&mut self, data: T, now: Instant) {
        self.data = Some(data);
        self.last_fetched_at = Some(now);
        self.error = None;
    }

    /// Record a failure; the last good data stays in place.
    pub fn fail(&mut self, message: String) {
        self.error = Some(message);
    }

    pub fn reset(&mut self, initial_data: Option<T>) {
        *self = Self::new(initial_data);
    }
}

/// Result of a remote read after envelope normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Ok(T),
    Failed { message: String },
}

impl<T: DeserializeOwned> FetchOutcome<T> {
    /// Interpret a remote read. Cancellations yield `None`.
    pub fn from_response(response: Result<Value, FetchError>) -> Option<Self> {
        let body = match response {
            Ok(body) => body,
            Err(e) if e.is_cancelled() => return None,
            Err(e) => {
                return Some(Self::Failed {
                    message: e.user_message(),
                });
            }
        };

        Some(match envelope::normalize(body) {
            Normalized::Error(message) => Self::Failed { message },
            payload => match payload.decode() {
                Ok(data) => Self::Ok(data),
                Err(message) => Self::Failed {
                    message: FetchError::Decode(message).user_message(),
                },
            },
        })
    }
}
