use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{AbortHandle, Abortable, join_all};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::{
    CacheEntry, CoordinatorOptions, FetchError, FetchOutcome, Fetcher,
};

/// Checks that a payload has the shape its consumers will decode.
type Validator = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// One keyed read of a [`MultiCoordinator`].
pub struct FetchSpec {
    pub key: String,
    pub fetcher: Fetcher<()>,
    pub options: CoordinatorOptions<Value>,
    validate: Validator,
}

impl FetchSpec {
    /// A read whose payload is stored whatever its shape.
    pub fn new(key: impl Into<String>, fetcher: Fetcher<()>) -> Self {
        Self {
            key: key.into(),
            fetcher,
            options: CoordinatorOptions::default(),
            validate: Arc::new(|_: &Value| Ok(())),
        }
    }

    /// A read whose payload must deserialize into `T`. A payload that does
    /// not is recorded as the key's error and the previous data is kept.
    pub fn typed<T>(key: impl Into<String>, fetcher: Fetcher<()>) -> Self
    where
        T: DeserializeOwned + 'static,
    {
        Self {
            validate: Arc::new(|data: &Value| {
                serde_json::from_value::<T>(data.clone())
                    .map(drop)
                    .map_err(|e| e.to_string())
            }),
            ..Self::new(key, fetcher)
        }
    }

    pub fn with_options(mut self, options: CoordinatorOptions<Value>) -> Self {
        self.options = options;
        self
    }
}

/// Per-key part of a [`MultiSnapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct KeyState {
    pub data: Option<Value>,
    pub error: Option<String>,
    pub loading: bool,
}

impl KeyState {
    /// Deserialize the key's data. Data of the wrong shape reads as `None`.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        let data = self.data.clone()?;
        serde_json::from_value(data).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiSnapshot {
    pub states: BTreeMap<String, KeyState>,
    /// True while any `fetch_all` is running.
    pub global_loading: bool,
}

impl MultiSnapshot {
    pub fn get(&self, key: &str) -> Option<&KeyState> {
        self.states.get(key)
    }

    pub fn decode<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)?.decode()
    }

    /// Errors of all keys that have one, in key order.
    pub fn errors(&self) -> Vec<(&str, &str)> {
        self.states
            .iter()
            .filter_map(|(key, state)| {
                state.error.as_deref().map(|error| (key.as_str(), error))
            })
            .collect()
    }
}

/// Runs several keyed reads together and aggregates their results.
///
/// Each key keeps its own cache; one key failing never affects the others.
#[derive(Clone)]
pub struct MultiCoordinator {
    inner: Arc<MultiInner>,
}

struct MultiInner {
    specs: Vec<FetchSpec>,
    state: Mutex<MultiState>,
    snapshots: watch::Sender<MultiSnapshot>,
}

struct MultiState {
    keys: BTreeMap<String, KeyEntry>,
    /// Number of `fetch_all` calls currently running.
    active: usize,
}

struct KeyEntry {
    entry: CacheEntry<Value>,
    generation: u64,
    abort: Option<AbortHandle>,
    validate: Validator,
}

impl MultiState {
    fn snapshot(&self) -> MultiSnapshot {
        MultiSnapshot {
            states: self
                .keys
                .iter()
                .map(|(key, key_entry)| {
                    let state = KeyState {
                        data: key_entry.entry.data.clone(),
                        error: key_entry.entry.error.clone(),
                        loading: key_entry.abort.is_some(),
                    };
                    (key.clone(), state)
                })
                .collect(),
            global_loading: self.active > 0,
        }
    }
}

impl MultiCoordinator {
    pub fn new(specs: Vec<FetchSpec>) -> Self {
        let keys = specs
            .iter()
            .map(|spec| {
                let key_entry = KeyEntry {
                    entry: CacheEntry::new(spec.options.initial_data.clone()),
                    generation: 0,
                    abort: None,
                    validate: spec.validate.clone(),
                };
                (spec.key.clone(), key_entry)
            })
            .collect();
        let state = MultiState { keys, active: 0 };
        let (snapshots, _) = watch::channel(state.snapshot());
        Self {
            inner: Arc::new(MultiInner {
                specs,
                state: Mutex::new(state),
                snapshots,
            }),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.specs.iter().map(|spec| spec.key.as_str())
    }

    pub fn snapshot(&self) -> MultiSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<MultiSnapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn global_loading(&self) -> bool {
        self.inner.lock().active > 0
    }

    /// Issue every read concurrently and wait for all of them to settle.
    ///
    /// Keys with fresh cached data are skipped unless `force_refresh`. A
    /// key's previous request is cancelled before its new one is issued.
    pub async fn fetch_all(&self, force_refresh: bool) -> MultiSnapshot {
        let mut pending = PendingFetch {
            inner: self.inner.clone(),
            issued: Vec::new(),
            finished: false,
        };
        let requests = {
            let mut state = self.inner.lock();
            state.active += 1;
            let now = Instant::now();

            let mut requests = Vec::new();
            for spec in &self.inner.specs {
                let Some(key_entry) = state.keys.get_mut(&spec.key) else {
                    continue;
                };
                if !force_refresh
                    && key_entry.entry.is_fresh(spec.options.cache_duration, now)
                {
                    tracing::debug!("{}: serving cached data", spec.key);
                    continue;
                }
                if let Some(previous) = key_entry.abort.take() {
                    tracing::debug!("{}: superseding request in flight", spec.key);
                    previous.abort();
                }
                key_entry.generation += 1;

                let fetcher = spec.fetcher.clone();
                let (abort, registration) = AbortHandle::new_pair();
                key_entry.abort = Some(abort);
                let request =
                    Abortable::new(async move { fetcher(()).await }, registration);
                pending.issued.push((spec.key.clone(), key_entry.generation));
                requests.push((spec.key.clone(), key_entry.generation, request));
            }
            self.inner.publish(&state);
            requests
        };

        let settled = join_all(requests.into_iter().map(
            |(key, generation, request)| async move {
                (key, generation, request.await)
            },
        ))
        .await;

        let mut state = self.inner.lock();
        let now = Instant::now();
        for (key, generation, response) in settled {
            let Some(key_entry) = state.keys.get_mut(&key) else {
                continue;
            };
            if key_entry.generation != generation {
                tracing::debug!("{key}: discarding superseded response");
                continue;
            }
            key_entry.abort = None;

            let outcome = response
                .ok()
                .and_then(FetchOutcome::<Value>::from_response)
                .map(|outcome| match outcome {
                    FetchOutcome::Ok(data) => match (key_entry.validate)(&data) {
                        Ok(()) => FetchOutcome::Ok(data),
                        Err(message) => FetchOutcome::Failed {
                            message: FetchError::Decode(message).user_message(),
                        },
                    },
                    failed => failed,
                });
            match outcome {
                None => tracing::debug!("{key}: request cancelled"),
                Some(FetchOutcome::Ok(data)) => key_entry.entry.store(data, now),
                Some(FetchOutcome::Failed { message }) => {
                    tracing::warn!("{key}: fetch failed: {message}");
                    key_entry.entry.fail(message);
                }
            }
        }
        pending.finish(&mut state);
        self.inner.publish(&state);
        state.snapshot()
    }

    /// Same as `fetch_all(true)`.
    pub async fn refresh(&self) -> MultiSnapshot {
        self.fetch_all(true).await
    }

    /// Start the coordinator's lifetime by fetching every key once.
    pub async fn mount(&self) -> MultiSnapshot {
        self.fetch_all(false).await
    }

    /// Cancel every request in flight. Cached data is kept.
    pub fn unmount(&self) {
        let mut state = self.inner.lock();
        for (key, key_entry) in state.keys.iter_mut() {
            if let Some(abort) = key_entry.abort.take() {
                tracing::debug!("{key}: cancelled request on unmount");
                abort.abort();
                key_entry.generation += 1;
            }
        }
        self.inner.publish(&state);
    }
}

impl MultiInner {
    fn lock(&self) -> MutexGuard<'_, MultiState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &MultiState) {
        self.snapshots.send_replace(state.snapshot());
    }
}

/// Bookkeeping of one `fetch_all` call. If the call is dropped before its
/// reads settle, the guard releases `global_loading` and the loading flags
/// of the keys it issued.
struct PendingFetch {
    inner: Arc<MultiInner>,
    issued: Vec<(String, u64)>,
    finished: bool,
}

impl PendingFetch {
    fn finish(&mut self, state: &mut MultiState) {
        state.active = state.active.saturating_sub(1);
        self.finished = true;
    }
}

impl Drop for PendingFetch {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut state = self.inner.lock();
        state.active = state.active.saturating_sub(1);
        for (key, generation) in &self.issued {
            let Some(key_entry) = state.keys.get_mut(key) else {
                continue;
            };
            if key_entry.generation != *generation {
                continue;
            }
            if let Some(abort) = key_entry.abort.take() {
                tracing::debug!("{key}: fetch_all dropped, cancelling request");
                abort.abort();
            }
        }
        self.inner.publish(&state);
    }
}
