use std::sync::Arc;
use std::time::Duration;

use coordinator::{Coordinator, CoordinatorOptions, fetcher};
use payloads::responses::{CompanyStats, Freight};
use payloads::{CompanyId, FreightStatus};

use crate::{MarketplaceApi, Notifier};

/// Company freights change as drivers express interest.
pub const COMPANY_FREIGHTS_CACHE_DURATION: Duration = Duration::from_secs(15);
pub const COMPANY_STATS_CACHE_DURATION: Duration = Duration::from_secs(120);

/// Dashboard of a company: its freights and its statistics.
#[derive(Clone)]
pub struct CompanyDashboard {
    company_id: CompanyId,
    freights: Coordinator<Vec<Freight>>,
    stats: Coordinator<CompanyStats>,
    notifier: Notifier,
}

impl CompanyDashboard {
    pub fn new(
        api: Arc<dyn MarketplaceApi>,
        company_id: CompanyId,
        notifier: Notifier,
    ) -> Self {
        let freights = {
            let api = api.clone();
            Coordinator::new(
                "company_freights",
                fetcher(move |()| {
                    let api = api.clone();
                    async move { api.list_company_freights(&company_id).await }
                }),
                CoordinatorOptions::default()
                    .cache_duration(COMPANY_FREIGHTS_CACHE_DURATION)
                    .initial_data(Vec::new()),
            )
        };
        let stats = Coordinator::new(
            "company_stats",
            fetcher(move |()| {
                let api = api.clone();
                async move { api.company_stats(&company_id).await }
            }),
            CoordinatorOptions::default()
                .cache_duration(COMPANY_STATS_CACHE_DURATION),
        );
        Self {
            company_id,
            freights,
            stats,
            notifier,
        }
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn freights(&self) -> Vec<Freight> {
        self.freights.data().unwrap_or_default()
    }

    /// Statistics, zeroed until the first successful fetch.
    pub fn stats(&self) -> CompanyStats {
        self.stats.data().unwrap_or_default()
    }

    pub fn loading(&self) -> bool {
        self.freights.loading() || self.stats.loading()
    }

    pub fn errors(&self) -> Vec<String> {
        [self.freights.error(), self.stats.error()]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Number of the company's freights in each status, in
    /// [`FreightStatus::ALL`] order. Statuses without freights count zero.
    pub fn status_counts(&self) -> Vec<(FreightStatus, usize)> {
        let freights = self.freights();
        FreightStatus::ALL
            .into_iter()
            .map(|status| {
                let count =
                    freights.iter().filter(|f| f.status == status).count();
                (status, count)
            })
            .collect()
    }

    pub fn active_freights(&self) -> Vec<Freight> {
        self.freights()
            .into_iter()
            .filter(|f| f.status.is_active())
            .collect()
    }

    pub async fn mount(&self) {
        tokio::join!(self.freights.mount(()), self.stats.mount(()));
    }

    /// Refetch everything regardless of the cache, notifying the user of
    /// each failure.
    pub async fn refresh(&self) {
        tokio::join!(self.freights.refresh(()), self.stats.refresh(()));
        for error in self.errors() {
            self.notifier
                .error(format!("Failed to load company dashboard: {error}"));
        }
    }

    pub fn unmount(&self) {
        self.freights.unmount();
        self.stats.unmount();
    }
}
