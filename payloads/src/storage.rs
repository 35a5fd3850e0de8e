//! Typed access to the client's persisted session values.
//!
//! In the browser this is backed by `localStorage`; native clients and tests
//! use [`MemoryStorage`]. Callers never deal with raw string keys.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, SecretString};

use crate::responses::{AuthTokens, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    AccessToken,
    RefreshToken,
    CurrentUser,
}

impl StorageKey {
    /// Key name used by the persisted store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "starfrete.access_token",
            Self::RefreshToken => "starfrete.refresh_token",
            Self::CurrentUser => "starfrete.user",
        }
    }
}

pub trait SessionStorage: Send + Sync {
    fn get(&self, key: StorageKey) -> Option<String>;
    fn set(&self, key: StorageKey, value: String);
    fn remove(&self, key: StorageKey);
}

/// Typed helpers on top of the raw key/value interface.
pub trait SessionStorageExt: SessionStorage {
    fn access_token(&self) -> Option<SecretString> {
        self.get(StorageKey::AccessToken).map(SecretString::from)
    }

    fn refresh_token(&self) -> Option<SecretString> {
        self.get(StorageKey::RefreshToken).map(SecretString::from)
    }

    /// Stored profile of the logged in user. A value that no longer parses
    /// is treated as absent.
    fn current_user(&self) -> Option<UserProfile> {
        let raw = self.get(StorageKey::CurrentUser)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Discarding unreadable stored user: {e}");
                None
            }
        }
    }

    fn store_tokens(&self, tokens: &AuthTokens) {
        self.set(
            StorageKey::AccessToken,
            tokens.access_token.expose_secret().to_string(),
        );
        if let Some(refresh_token) = &tokens.refresh_token {
            self.set(
                StorageKey::RefreshToken,
                refresh_token.expose_secret().to_string(),
            );
        }
        if let Some(user) = &tokens.user
            && let Ok(raw) = serde_json::to_string(user)
        {
            self.set(StorageKey::CurrentUser, raw);
        }
    }

    fn clear_session(&self) {
        self.remove(StorageKey::AccessToken);
        self.remove(StorageKey::RefreshToken);
        self.remove(StorageKey::CurrentUser);
    }
}

impl<S: SessionStorage + ?Sized> SessionStorageExt for S {}

/// In-memory storage, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<RwLock<HashMap<StorageKey, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: StorageKey) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .cloned()
    }

    fn set(&self, key: StorageKey, value: String) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, value);
    }

    fn remove(&self, key: StorageKey) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&key);
    }
}
