use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use coordinator::{Coordinator, CoordinatorOptions, FetchSnapshot, fetcher};
use payloads::requests::FreightFilters;
use payloads::responses::Freight;
use tokio::sync::watch;

use crate::{MarketplaceApi, Notifier};

pub const FREIGHTS_CACHE_DURATION: Duration = Duration::from_secs(30);

/// Open freight listings with filters and a debounced search.
#[derive(Clone)]
pub struct FreightsFacade {
    freights: Coordinator<Vec<Freight>, FreightFilters>,
    filters: Arc<Mutex<FreightFilters>>,
    notifier: Notifier,
}

impl FreightsFacade {
    pub fn new(api: Arc<dyn MarketplaceApi>, notifier: Notifier) -> Self {
        let options = CoordinatorOptions::default()
            .cache_duration(FREIGHTS_CACHE_DURATION);
        Self::with_options(api, notifier, options)
    }

    pub fn with_options(
        api: Arc<dyn MarketplaceApi>,
        notifier: Notifier,
        options: CoordinatorOptions<Vec<Freight>>,
    ) -> Self {
        let freights = Coordinator::new(
            "freights",
            fetcher(move |filters: FreightFilters| {
                let api = api.clone();
                async move { api.list_freights(&filters).await }
            }),
            options.initial_data(Vec::new()),
        );
        Self {
            freights,
            filters: Arc::default(),
            notifier,
        }
    }

    pub fn freights(&self) -> Vec<Freight> {
        self.freights.data().unwrap_or_default()
    }

    pub fn loading(&self) -> bool {
        self.freights.loading()
    }

    pub fn error(&self) -> Option<String> {
        self.freights.error()
    }

    pub fn snapshot(&self) -> FetchSnapshot<Vec<Freight>> {
        self.freights.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchSnapshot<Vec<Freight>>> {
        self.freights.subscribe()
    }

    pub fn filters(&self) -> FreightFilters {
        self.filters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn mount(&self) -> Vec<Freight> {
        let filters = self.filters();
        self.freights
            .update_dependencies(&filters, filters.clone())
            .await;
        self.freights()
    }

    /// Replace the filters, refetching when they changed.
    pub async fn set_filters(&self, filters: FreightFilters) -> Vec<Freight> {
        *self.filters.lock().unwrap_or_else(PoisonError::into_inner) =
            filters.clone();
        self.freights
            .update_dependencies(&filters, filters.clone())
            .await;
        self.freights()
    }

    /// Update the free text search. The listing is refetched once the user
    /// stops typing for the debounce period.
    pub fn search(&self, text: &str) {
        let filters = {
            let mut filters =
                self.filters.lock().unwrap_or_else(PoisonError::into_inner);
            let text = text.trim();
            filters.search = (!text.is_empty()).then(|| text.to_string());
            filters.clone()
        };
        self.freights
            .update_dependencies_debounced(&filters, filters.clone());
    }

    /// Refetch regardless of the cache, notifying the user on failure.
    pub async fn refresh(&self) -> Vec<Freight> {
        self.freights.refresh(self.filters()).await;
        if let Some(error) = self.freights.error() {
            self.notifier
                .error(format!("Failed to load freights: {error}"));
        }
        self.freights()
    }

    pub fn unmount(&self) {
        self.freights.unmount();
    }
}
