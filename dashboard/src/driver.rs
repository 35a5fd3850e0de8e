use std::sync::Arc;
use std::time::Duration;

use coordinator::{Coordinator, CoordinatorOptions, fetcher};
use payloads::matching::compatible_freights;
use payloads::requests::{ExpressInterest, FreightFilters, INTEREST_MESSAGE_MAX_LEN};
use payloads::responses::{Freight, FreightInterest, Vehicle};
use payloads::{FreightId, FreightStatus};

use crate::{DashboardError, MarketplaceApi, Notifier};

pub const AVAILABLE_FREIGHTS_CACHE_DURATION: Duration = Duration::from_secs(30);
/// Vehicles rarely change during a session.
pub const VEHICLES_CACHE_DURATION: Duration = Duration::from_secs(60);
pub const INTERESTS_CACHE_DURATION: Duration = Duration::from_secs(30);

/// Dashboard of a driver: open freights, the driver's vehicles and the
/// interests the driver has expressed.
#[derive(Clone)]
pub struct DriverDashboard {
    api: Arc<dyn MarketplaceApi>,
    freights: Coordinator<Vec<Freight>>,
    vehicles: Coordinator<Vec<Vehicle>>,
    interests: Coordinator<Vec<FreightInterest>>,
    notifier: Notifier,
}

impl DriverDashboard {
    pub fn new(api: Arc<dyn MarketplaceApi>, notifier: Notifier) -> Self {
        let freights = {
            let api = api.clone();
            Coordinator::new(
                "available_freights",
                fetcher(move |()| {
                    let api = api.clone();
                    let filters = FreightFilters {
                        status: Some(FreightStatus::Open),
                        ..Default::default()
                    };
                    async move { api.list_freights(&filters).await }
                }),
                CoordinatorOptions::default()
                    .cache_duration(AVAILABLE_FREIGHTS_CACHE_DURATION)
                    .initial_data(Vec::new()),
            )
        };
        let vehicles = {
            let api = api.clone();
            Coordinator::new(
                "driver_vehicles",
                fetcher(move |()| {
                    let api = api.clone();
                    async move { api.list_vehicles().await }
                }),
                CoordinatorOptions::default()
                    .cache_duration(VEHICLES_CACHE_DURATION)
                    .initial_data(Vec::new()),
            )
        };
        let interests = {
            let api = api.clone();
            Coordinator::new(
                "driver_interests",
                fetcher(move |()| {
                    let api = api.clone();
                    async move { api.list_driver_interests().await }
                }),
                CoordinatorOptions::default()
                    .cache_duration(INTERESTS_CACHE_DURATION)
                    .initial_data(Vec::new()),
            )
        };
        Self {
            api,
            freights,
            vehicles,
            interests,
            notifier,
        }
    }

    pub fn available_freights(&self) -> Vec<Freight> {
        self.freights.data().unwrap_or_default()
    }

    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.vehicles.data().unwrap_or_default()
    }

    pub fn interests(&self) -> Vec<FreightInterest> {
        self.interests.data().unwrap_or_default()
    }

    /// Open freights at least one of the driver's vehicles can carry.
    /// Empty while the driver has no vehicles.
    pub fn compatible_freights(&self) -> Vec<Freight> {
        let vehicles = self.vehicles();
        let freights = self.available_freights();
        compatible_freights(&vehicles, &freights)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn has_interest(&self, freight_id: FreightId) -> bool {
        self.interests()
            .iter()
            .any(|interest| interest.freight_id == freight_id)
    }

    pub fn loading(&self) -> bool {
        self.freights.loading()
            || self.vehicles.loading()
            || self.interests.loading()
    }

    pub fn errors(&self) -> Vec<String> {
        [
            self.freights.error(),
            self.vehicles.error(),
            self.interests.error(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub async fn mount(&self) {
        tokio::join!(
            self.freights.mount(()),
            self.vehicles.mount(()),
            self.interests.mount(()),
        );
    }

    /// Refetch everything regardless of the cache, notifying the user of
    /// each failure.
    pub async fn refresh(&self) {
        tokio::join!(
            self.freights.refresh(()),
            self.vehicles.refresh(()),
            self.interests.refresh(()),
        );
        for error in self.errors() {
            self.notifier
                .error(format!("Failed to load driver dashboard: {error}"));
        }
    }

    /// Tell the company the driver wants to carry a freight.
    ///
    /// On success the interest list is refetched so the new interest shows
    /// up. Either way the user is notified.
    pub async fn express_interest(
        &self,
        details: &ExpressInterest,
    ) -> Result<FreightInterest, DashboardError> {
        if details.message_too_long() {
            let error = DashboardError::MessageTooLong {
                max: INTEREST_MESSAGE_MAX_LEN,
            };
            self.notifier.error(error.to_string());
            return Err(error);
        }

        match self.api.express_interest(details).await {
            Ok(interest) => {
                tracing::info!(
                    "Expressed interest {} in freight {}",
                    interest.id,
                    interest.freight_id
                );
                self.notifier.success("Interest sent to the company");
                self.interests.refresh(()).await;
                Ok(interest)
            }
            Err(e) => {
                let message = e
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| e.to_string());
                self.notifier
                    .error(format!("Failed to express interest: {message}"));
                Err(e.into())
            }
        }
    }

    pub fn unmount(&self) {
        self.freights.unmount();
        self.vehicles.unmount();
        self.interests.unmount();
    }
}
