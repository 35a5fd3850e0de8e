use std::sync::Arc;
use std::time::Duration;

use coordinator::{
    CoordinatorOptions, FetchSpec, MultiCoordinator, MultiSnapshot, fetcher,
};
use payloads::responses::{Freight, PlatformStats, UserSummary};
use tokio::sync::watch;

use crate::{MarketplaceApi, Notifier};

pub const ADMIN_CACHE_DURATION: Duration = Duration::from_secs(120);

pub const USERS: &str = "users";
pub const FREIGHTS: &str = "freights";
pub const STATS: &str = "stats";

/// Admin console: users, freights and platform statistics fetched together.
#[derive(Clone)]
pub struct AdminDashboard {
    reads: MultiCoordinator,
    notifier: Notifier,
}

impl AdminDashboard {
    pub fn new(api: Arc<dyn MarketplaceApi>, notifier: Notifier) -> Self {
        let options =
            CoordinatorOptions::default().cache_duration(ADMIN_CACHE_DURATION);

        let users = {
            let api = api.clone();
            fetcher(move |()| {
                let api = api.clone();
                async move { api.admin_list_users().await }
            })
        };
        let freights = {
            let api = api.clone();
            fetcher(move |()| {
                let api = api.clone();
                async move { api.admin_list_freights().await }
            })
        };
        let stats = fetcher(move |()| {
            let api = api.clone();
            async move { api.admin_stats().await }
        });

        let reads = MultiCoordinator::new(vec![
            FetchSpec::typed::<Vec<UserSummary>>(USERS, users)
                .with_options(options.clone()),
            FetchSpec::typed::<Vec<Freight>>(FREIGHTS, freights)
                .with_options(options.clone()),
            FetchSpec::typed::<PlatformStats>(STATS, stats).with_options(options),
        ]);
        Self { reads, notifier }
    }

    pub fn users(&self) -> Vec<UserSummary> {
        self.reads.snapshot().decode(USERS).unwrap_or_default()
    }

    pub fn freights(&self) -> Vec<Freight> {
        self.reads.snapshot().decode(FREIGHTS).unwrap_or_default()
    }

    pub fn stats(&self) -> PlatformStats {
        self.reads.snapshot().decode(STATS).unwrap_or_default()
    }

    pub fn global_loading(&self) -> bool {
        self.reads.global_loading()
    }

    pub fn snapshot(&self) -> MultiSnapshot {
        self.reads.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<MultiSnapshot> {
        self.reads.subscribe()
    }

    pub async fn mount(&self) -> MultiSnapshot {
        self.reads.mount().await
    }

    /// Refetch every read regardless of the cache, notifying the user of
    /// each key that failed.
    pub async fn refresh(&self) -> MultiSnapshot {
        let snapshot = self.reads.refresh().await;
        for (key, error) in snapshot.errors() {
            self.notifier.error(format!("Failed to load {key}: {error}"));
        }
        snapshot
    }

    pub fn unmount(&self) {
        self.reads.unmount();
    }
}
