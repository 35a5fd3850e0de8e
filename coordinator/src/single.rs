use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::future::{AbortHandle, Abortable, Aborted, BoxFuture, Shared};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::{CacheEntry, CoordinatorOptions, FetchError, FetchOutcome, Fetcher};

/// What consumers render: the cached data with its loading and error flags.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSnapshot<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_fetched_at: Option<Instant>,
}

/// Caches, de-duplicates and debounces one remote read.
///
/// Cloning is cheap; clones share the same cache and in-flight request.
/// Debounced fetches are spawned on the current tokio runtime.
pub struct Coordinator<T, A = ()> {
    inner: Arc<Inner<T, A>>,
}

impl<T, A> Clone for Coordinator<T, A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct Inner<T, A> {
    name: String,
    fetcher: Fetcher<A>,
    options: CoordinatorOptions<T>,
    state: Mutex<State<T>>,
    snapshots: watch::Sender<FetchSnapshot<T>>,
}

struct State<T> {
    entry: CacheEntry<T>,
    in_flight: Option<InFlight<T>>,
    /// Bumped for every request issued; only the newest may settle.
    generation: u64,
    debounce: Option<JoinHandle<()>>,
    /// Bumped for every debounced call; a timer only fires if still newest.
    debounce_seq: u64,
    dependencies: Option<u64>,
}

struct InFlight<T> {
    generation: u64,
    abort: AbortHandle,
    result: Shared<BoxFuture<'static, Option<T>>>,
}

impl<T> State<T> {
    fn snapshot(&self) -> FetchSnapshot<T>
    where
        T: Clone,
    {
        FetchSnapshot {
            data: self.entry.data.clone(),
            loading: self.in_flight.is_some(),
            error: self.entry.error.clone(),
            last_fetched_at: self.entry.last_fetched_at,
        }
    }

    fn cancel_in_flight(&mut self) -> bool {
        match self.in_flight.take() {
            Some(flight) => {
                flight.abort.abort();
                true
            }
            None => false,
        }
    }

    fn cancel_debounce(&mut self) {
        self.debounce_seq += 1;
        if let Some(pending) = self.debounce.take() {
            pending.abort();
        }
    }
}

impl<T, A> Coordinator<T, A>
where
    T: Clone + DeserializeOwned + Send + Sync + 'static,
    A: Send + 'static,
{
    pub fn new(
        name: impl Into<String>,
        fetcher: Fetcher<A>,
        options: CoordinatorOptions<T>,
    ) -> Self {
        let entry = CacheEntry::new(options.initial_data.clone());
        let state = State {
            entry,
            in_flight: None,
            generation: 0,
            debounce: None,
            debounce_seq: 0,
            dependencies: None,
        };
        let (snapshots, _) = watch::channel(state.snapshot());
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                fetcher,
                options,
                state: Mutex::new(state),
                snapshots,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn options(&self) -> &CoordinatorOptions<T> {
        &self.inner.options
    }

    pub fn data(&self) -> Option<T> {
        self.inner.lock().entry.data.clone()
    }

    pub fn loading(&self) -> bool {
        self.inner.lock().in_flight.is_some()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.lock().entry.error.clone()
    }

    pub fn snapshot(&self) -> FetchSnapshot<T> {
        self.inner.lock().snapshot()
    }

    /// Receive a new snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<FetchSnapshot<T>> {
        self.inner.snapshots.subscribe()
    }

    /// True if there is no successful fetch younger than the cache duration.
    pub fn is_stale(&self) -> bool {
        self.inner
            .lock()
            .entry
            .is_stale(self.inner.options.cache_duration, Instant::now())
    }

    /// Fetch the data, going to the backend only when needed.
    ///
    /// Without `force_refresh`, a call made while a request is in flight
    /// joins that request, and a call made while the cache is fresh returns
    /// the cached data. Otherwise a new request is issued, cancelling any
    /// request still in flight.
    ///
    /// Resolves to the data after the call settles. Failed requests resolve
    /// to the previous data, with the failure recorded in [`Self::error`].
    pub async fn fetch_data(&self, force_refresh: bool, args: A) -> Option<T> {
        let flight = {
            let mut state = self.inner.lock();
            let joined = match &state.in_flight {
                Some(flight) if !force_refresh => Some(flight.result.clone()),
                _ => None,
            };
            if let Some(result) = joined {
                tracing::debug!(
                    "{}: joining request already in flight",
                    self.inner.name
                );
                result
            } else if !force_refresh
                && state
                    .entry
                    .is_fresh(self.inner.options.cache_duration, Instant::now())
            {
                tracing::debug!("{}: serving cached data", self.inner.name);
                return state.entry.data.clone();
            } else {
                self.start_request(&mut state, args)
            }
        };
        flight.await
    }

    /// Same as `fetch_data(true, args)`.
    pub async fn refresh(&self, args: A) -> Option<T> {
        self.fetch_data(true, args).await
    }

    /// Fetch after the debounce period, unless called again before then.
    /// Only the arguments of the last call are used.
    pub fn fetch_data_debounced(&self, args: A) {
        let mut state = self.inner.lock();
        state.cancel_debounce();
        let seq = state.debounce_seq;
        let delay = self.inner.options.debounce;
        let coordinator = self.clone();

        state.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut state = coordinator.inner.lock();
                if state.debounce_seq != seq {
                    return;
                }
                state.debounce = None;
            }
            coordinator.fetch_data(false, args).await;
        }));
    }

    /// Reset the data to its initial value and forget the last fetch.
    /// A request in flight is not cancelled and still stores its result.
    pub fn clear_cache(&self) {
        let mut state = self.inner.lock();
        state.entry.reset(self.inner.options.initial_data.clone());
        self.inner.publish(&state);
    }

    /// Mark the cached data stale without discarding it.
    pub fn invalidate(&self) {
        let mut state = self.inner.lock();
        state.entry.last_fetched_at = None;
        self.inner.publish(&state);
    }

    /// Start the coordinator's lifetime: fetch once if configured to.
    pub async fn mount(&self, args: A) -> Option<T> {
        if self.inner.options.auto_fetch_on_mount {
            self.fetch_data(false, args).await
        } else {
            self.data()
        }
    }

    /// End the coordinator's lifetime: cancel the request in flight and any
    /// pending debounced fetch, and drop the cached data.
    pub fn unmount(&self) {
        let mut state = self.inner.lock();
        if state.cancel_in_flight() {
            tracing::debug!("{}: cancelled request on unmount", self.inner.name);
        }
        state.cancel_debounce();
        state.dependencies = None;
        state.entry.reset(self.inner.options.initial_data.clone());
        self.inner.publish(&state);
    }

    /// Record the values the remote read depends on.
    ///
    /// When they differ from the previously recorded ones, the request in
    /// flight and any pending debounced fetch are cancelled, the cache is
    /// marked stale, and, if auto-fetch is enabled, the data is fetched
    /// again with `args`. The first call behaves like [`Self::mount`].
    ///
    /// Returns whether the dependencies changed.
    pub async fn update_dependencies<D>(&self, dependencies: &D, args: A) -> bool
    where
        D: Hash + ?Sized,
    {
        self.apply_dependencies(dependency_hash(dependencies), args)
            .await
    }

    /// [`Self::update_dependencies`] after the debounce period, unless
    /// called again before then. Meant for values typed by the user, such
    /// as a search box.
    pub fn update_dependencies_debounced<D>(&self, dependencies: &D, args: A)
    where
        D: Hash + ?Sized,
    {
        let hash = dependency_hash(dependencies);
        let mut state = self.inner.lock();
        state.cancel_debounce();
        let seq = state.debounce_seq;
        let delay = self.inner.options.debounce;
        let coordinator = self.clone();

        state.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut state = coordinator.inner.lock();
                if state.debounce_seq != seq {
                    return;
                }
                state.debounce = None;
            }
            coordinator.apply_dependencies(hash, args).await;
        }));
    }

    async fn apply_dependencies(&self, hash: u64, args: A) -> bool {
        let first = {
            let mut state = self.inner.lock();
            if state.dependencies == Some(hash) {
                return false;
            }
            let first = state.dependencies.replace(hash).is_none();
            if !first {
                tracing::debug!("{}: dependencies changed", self.inner.name);
                state.cancel_in_flight();
                state.cancel_debounce();
                state.entry.last_fetched_at = None;
                self.inner.publish(&state);
            }
            first
        };

        if self.inner.options.auto_fetch_on_mount {
            self.fetch_data(!first, args).await;
        }
        true
    }

    fn start_request(
        &self,
        state: &mut State<T>,
        args: A,
    ) -> Shared<BoxFuture<'static, Option<T>>> {
        if state.cancel_in_flight() {
            tracing::debug!(
                "{}: superseding request in flight",
                self.inner.name
            );
        }
        state.generation += 1;
        let generation = state.generation;

        // The remote read is only invoked on first poll, after the state
        // lock is released, so a fetcher may read this coordinator.
        let fetcher = self.inner.fetcher.clone();
        let (abort, registration) = AbortHandle::new_pair();
        let request =
            Abortable::new(async move { fetcher(args).await }, registration);
        let inner: Weak<Inner<T, A>> = Arc::downgrade(&self.inner);

        let result = async move {
            let response = request.await;
            let inner = inner.upgrade()?;
            inner.settle(generation, response)
        }
        .boxed()
        .shared();

        state.in_flight = Some(InFlight {
            generation,
            abort,
            result: result.clone(),
        });
        self.inner.publish(state);
        result
    }
}

fn dependency_hash<D: Hash + ?Sized>(dependencies: &D) -> u64 {
    let mut hasher = DefaultHasher::new();
    dependencies.hash(&mut hasher);
    hasher.finish()
}

impl<T, A> Inner<T, A>
where
    T: Clone + DeserializeOwned,
{
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &State<T>) {
        self.snapshots.send_replace(state.snapshot());
    }

    /// Apply the response of request `generation` and return the data
    /// callers of that request should see.
    fn settle(
        &self,
        generation: u64,
        response: Result<Result<Value, FetchError>, Aborted>,
    ) -> Option<T> {
        let mut state = self.lock();
        let current = state
            .in_flight
            .as_ref()
            .is_some_and(|flight| flight.generation == generation);
        if !current {
            tracing::debug!("{}: discarding superseded response", self.name);
            return state.entry.data.clone();
        }
        state.in_flight = None;

        let outcome = response
            .ok()
            .and_then(FetchOutcome::<T>::from_response);
        match outcome {
            None => {
                tracing::debug!("{}: request cancelled", self.name);
            }
            Some(FetchOutcome::Ok(data)) => {
                state.entry.store(data, Instant::now());
            }
            Some(FetchOutcome::Failed { message }) => {
                tracing::warn!("{}: fetch failed: {message}", self.name);
                state.entry.fail(message);
            }
        }
        self.publish(&state);
        state.entry.data.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher;
    use serde_json::json;
    use std::sync::OnceLock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting(calls: Arc<AtomicUsize>) -> Coordinator<Vec<u32>> {
        Coordinator::new(
            "numbers",
            fetcher(move |()| {
                let n = calls.fetch_add(1, Ordering::SeqCst) as u32;
                async move { Ok::<_, FetchError>(json!([n])) }
            }),
            CoordinatorOptions::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_reports_initial_data_before_first_fetch() {
        let coordinator: Coordinator<Vec<u32>> = Coordinator::new(
            "empty",
            fetcher(|()| async { Ok::<_, FetchError>(json!([])) }),
            CoordinatorOptions::default()
                .initial_data(vec![])
                .auto_fetch_on_mount(false),
        );
        assert_eq!(coordinator.mount(()).await, Some(vec![]));
        let snapshot = coordinator.snapshot();
        assert_eq!(snapshot.data, Some(vec![]));
        assert!(!snapshot.loading);
        assert!(snapshot.last_fetched_at.is_none());
        assert!(coordinator.is_stale());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_cache_resets_to_initial_data() {
        let calls = Arc::new(AtomicUsize::new(0));
        let coordinator = counting(calls.clone());

        coordinator.fetch_data(false, ()).await;
        assert_eq!(coordinator.data(), Some(vec![0]));

        coordinator.clear_cache();
        assert_eq!(coordinator.data(), None);
        assert!(coordinator.is_stale());

        assert_eq!(coordinator.fetch_data(false, ()).await, Some(vec![1]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_keeps_data_but_refetches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let coordinator = counting(calls.clone());

        coordinator.fetch_data(false, ()).await;
        coordinator.invalidate();
        assert_eq!(coordinator.data(), Some(vec![0]));
        assert_eq!(coordinator.fetch_data(false, ()).await, Some(vec![1]));
    }

    #[tokio::test(start_paused = true)]
    async fn cache_expires_after_duration() {
        let calls = Arc::new(AtomicUsize::new(0));
        let coordinator = counting(calls.clone());

        coordinator.fetch_data(false, ()).await;
        tokio::time::advance(Duration::from_millis(29_999)).await;
        assert!(!coordinator.is_stale());
        coordinator.fetch_data(false, ()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(coordinator.is_stale());
        assert_eq!(coordinator.fetch_data(false, ()).await, Some(vec![1]));
    }

    #[tokio::test(start_paused = true)]
    async fn dependency_change_refetches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let coordinator = counting(calls.clone());

        assert!(coordinator.update_dependencies("company-a", ()).await);
        assert!(!coordinator.update_dependencies("company-a", ()).await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(coordinator.update_dependencies("company-b", ()).await);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(coordinator.data(), Some(vec![1]));
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_dependency_updates_collapse() {
        let calls = Arc::new(AtomicUsize::new(0));
        let coordinator = counting(calls.clone());
        coordinator.update_dependencies("", ()).await;

        for query in ["s", "sa", "sao"] {
            coordinator.update_dependencies_debounced(query, ());
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(400)).await;
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(coordinator.data(), Some(vec![1]));
    }

    #[tokio::test]
    async fn fetcher_may_read_its_own_coordinator() {
        let cell: Arc<OnceLock<Coordinator<Vec<bool>>>> = Arc::default();
        let coordinator = Coordinator::new(
            "reentrant",
            fetcher({
                let cell = cell.clone();
                move |()| {
                    let loading = cell.get().map(|c| c.loading());
                    async move { Ok::<_, FetchError>(json!([loading == Some(true)])) }
                }
            }),
            CoordinatorOptions::default(),
        );
        let _ = cell.set(coordinator.clone());

        // the read runs while the request is registered as in flight
        assert_eq!(coordinator.fetch_data(false, ()).await, Some(vec![true]));
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_latest_snapshot() {
        let calls = Arc::new(AtomicUsize::new(0));
        let coordinator = counting(calls);
        let mut snapshots = coordinator.subscribe();

        coordinator.fetch_data(false, ()).await;
        let latest = snapshots.borrow_and_update().clone();
        assert_eq!(latest.data, Some(vec![0]));
        assert!(!latest.loading);
    }
}
